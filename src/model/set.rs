//! Set handle.

use serde::{Deserialize, Serialize};

use super::Identity;

/// A Set, named by its backing identity.
///
/// A Set *is* exactly one identity plus zero or more containment rows.
/// Because the backing identity lives in the same id space as every other
/// identity, a Set can itself be a member of another Set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SetId(pub Identity);

impl SetId {
    /// The backing identity of this Set.
    pub fn identity(self) -> Identity {
        self.0
    }
}

impl std::fmt::Display for SetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Identity> for SetId {
    fn from(id: Identity) -> Self {
        SetId(id)
    }
}
