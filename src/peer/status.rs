//! Peer status state machine.
//!
//! # States
//! - NEW: nothing classified yet
//! - OK: protocol compatible and on our chain
//! - FORK: protocol compatible but on a diverged chain
//! - ERESPONSE: last call returned a non-200 status
//! - ENETHASH: peer reported another network
//! - EUNAVAILABLE / ETIMEOUT: last call failed at the transport level
//!
//! # State Transitions
//! ```text
//! any       → OK            successful call (FORK excepted, see below)
//! any       → ERESPONSE     non-200 response
//! any       → ENETHASH      protocol header with foreign nethash
//! any       → EUNAVAILABLE  connection failed
//! any       → ETIMEOUT      request timed out
//! any       → FORK / OK     monitor verification verdict
//! FORK      → FORK          any other successful call
//! ```
//!
//! Ordinary calls never clear FORK. Only the monitor's own block header
//! verification moves a peer out of it.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::protocol::Verdict;
use crate::transport::{ETIMEOUT, EUNAVAILABLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PeerStatus {
    #[default]
    New,
    Ok,
    Fork,
    EResponse,
    ENethash,
    EUnavailable,
    ETimeout,
}

impl PeerStatus {
    pub const ALL: [PeerStatus; 7] = [
        PeerStatus::New,
        PeerStatus::Ok,
        PeerStatus::Fork,
        PeerStatus::EResponse,
        PeerStatus::ENethash,
        PeerStatus::EUnavailable,
        PeerStatus::ETimeout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PeerStatus::New => "NEW",
            PeerStatus::Ok => "OK",
            PeerStatus::Fork => "FORK",
            PeerStatus::EResponse => "ERESPONSE",
            PeerStatus::ENethash => "ENETHASH",
            PeerStatus::EUnavailable => EUNAVAILABLE,
            PeerStatus::ETimeout => ETIMEOUT,
        }
    }

    /// Status after a successful call, with or without a protocol header.
    pub fn after_success(self) -> PeerStatus {
        if self == PeerStatus::Fork {
            return PeerStatus::Fork;
        }
        PeerStatus::Ok
    }

    /// Status after a transport failure. Only the two recognized codes are
    /// recorded; anything else leaves the status as it was.
    pub fn after_transport_error(self, code: &str) -> PeerStatus {
        match code {
            EUNAVAILABLE => PeerStatus::EUnavailable,
            ETIMEOUT => PeerStatus::ETimeout,
            _ => self,
        }
    }

    /// Status after the monitor verified the peer's latest block header.
    pub fn after_verification(verdict: Verdict) -> PeerStatus {
        match verdict {
            Verdict::Forked => PeerStatus::Fork,
            Verdict::Agrees => PeerStatus::Ok,
        }
    }

    pub fn is_healthy(&self) -> bool {
        *self == PeerStatus::Ok
    }
}

impl fmt::Display for PeerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PeerStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_new() {
        assert_eq!(PeerStatus::default(), PeerStatus::New);
    }

    #[test]
    fn test_success_sets_ok_except_fork() {
        for status in PeerStatus::ALL {
            let expected = if status == PeerStatus::Fork {
                PeerStatus::Fork
            } else {
                PeerStatus::Ok
            };
            assert_eq!(status.after_success(), expected, "from {}", status);
        }
    }

    #[test]
    fn test_transport_error_codes() {
        assert_eq!(PeerStatus::Ok.after_transport_error("ETIMEOUT"), PeerStatus::ETimeout);
        assert_eq!(
            PeerStatus::Fork.after_transport_error("EUNAVAILABLE"),
            PeerStatus::EUnavailable
        );
        assert_eq!(PeerStatus::Ok.after_transport_error("ECONNREFUSED"), PeerStatus::Ok);
        assert_eq!(PeerStatus::New.after_transport_error("EPARSE"), PeerStatus::New);
    }

    #[test]
    fn test_verification_is_the_only_way_out_of_fork() {
        assert_eq!(PeerStatus::after_verification(Verdict::Agrees), PeerStatus::Ok);
        assert_eq!(PeerStatus::after_verification(Verdict::Forked), PeerStatus::Fork);
    }

    #[test]
    fn test_only_ok_is_healthy() {
        let healthy: Vec<_> = PeerStatus::ALL.into_iter().filter(|s| s.is_healthy()).collect();
        assert_eq!(healthy, vec![PeerStatus::Ok]);
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(PeerStatus::ENethash.to_string(), "ENETHASH");
        assert_eq!(
            serde_json::to_string(&PeerStatus::ETimeout).unwrap(),
            "\"ETIMEOUT\""
        );
    }
}
