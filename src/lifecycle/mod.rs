//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind context → Insert peers
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Cancel every peer monitor → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger the daemon's Shutdown
//! ```
//!
//! # Design Decisions
//! - Every peer monitor owns its own `Shutdown`; the daemon owns one more
//! - Cancellation is level-triggered so late subscribers never miss it

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
