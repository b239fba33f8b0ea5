//! Block header verification seam.

use serde_json::Value;
use thiserror::Error;

/// Outcome of checking a peer's block header against the local chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The peer's chain agrees with ours.
    Agrees,
    /// The peer's chain has diverged from ours.
    Forked,
}

/// The verifier could not reach a verdict.
#[derive(Debug, Error)]
#[error("block header verification failed: {0}")]
pub struct VerifyError(pub String);

/// Verifies block headers reported by peers.
pub trait BlockVerifier: Send + Sync {
    fn verify_block_header(&self, header: &Value) -> Result<Verdict, VerifyError>;
}

/// Verifier used when no chain state is available locally.
///
/// Accepts any header object and refuses to judge anything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustingVerifier;

impl BlockVerifier for TrustingVerifier {
    fn verify_block_header(&self, header: &Value) -> Result<Verdict, VerifyError> {
        if header.is_object() {
            Ok(Verdict::Agrees)
        } else {
            Err(VerifyError(format!("expected a block header object, got {}", header)))
        }
    }
}
