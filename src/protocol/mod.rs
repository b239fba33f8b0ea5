//! Peer protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Response metadata
//!     → header.rs (normalize into ProtocolHeader)
//!     → schema.rs (protocol response or plain public API response?)
//!
//! Monitor height check
//!     → verify.rs (does the peer's latest block agree with our chain?)
//! ```
//!
//! # Design Decisions
//! - Decoding never fails; rejection is the schema's job
//! - Schema and verifier are traits so the node can plug in its own engines

pub mod header;
pub mod schema;
pub mod verify;

pub use header::{BlockHeader, ProtocolHeader, RawHeaders};
pub use schema::{HeaderSchema, PeerHeaderSchema, SchemaViolation};
pub use verify::{BlockVerifier, TrustingVerifier, Verdict, VerifyError};
