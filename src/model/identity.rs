//! Opaque identity token.

use serde::{Deserialize, Serialize};

/// An opaque, globally unique identity.
///
/// Identities have no payload and no structure beyond existence. Every
/// entity in the system — a graph element, a set — is addressed by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity(pub u64);

impl Identity {
    /// The identity `n` positions after this one in the id sequence.
    ///
    /// Used to walk a contiguous reserved block.
    pub fn offset(self, n: u64) -> Identity {
        Identity(self.0 + n)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Identity {
    fn from(raw: u64) -> Self {
        Identity(raw)
    }
}
