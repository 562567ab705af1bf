//! Identity allocation.
//!
//! Issues and retires opaque identities. The one nontrivial contract here
//! is `create_many`: the returned ids form a contiguous reserved block,
//! which the element store's batch protocol resolves relative references
//! against.

use tracing::debug;

use crate::model::Identity;
use crate::Result;
use crate::store::{RelationalStore, in_read_tx, in_write_tx};

/// Issues and retires opaque identities.
pub struct IdentityAllocator<'a, S: RelationalStore> {
    store: &'a S,
}

impl<'a, S: RelationalStore> IdentityAllocator<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Does the identity exist?
    pub fn exists(&self, id: Identity) -> Result<bool> {
        in_read_tx(self.store, |s, tx| s.identity_exists(tx, id))
    }

    /// True iff every given identity exists. Vacuously true for empty input.
    pub fn exists_all(&self, ids: &[Identity]) -> Result<bool> {
        in_read_tx(self.store, |s, tx| {
            Ok(s.missing_identities(tx, ids)?.is_empty())
        })
    }

    /// True iff at least one of the given identities exists.
    pub fn exists_any(&self, ids: &[Identity]) -> Result<bool> {
        in_read_tx(self.store, |s, tx| {
            for id in ids {
                if s.identity_exists(tx, *id)? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// Allocate a single fresh identity.
    pub fn create_one(&self) -> Result<Identity> {
        in_write_tx(self.store, |s, tx| s.reserve_identities(tx, 1))
    }

    /// Allocate `n` fresh identities as one contiguous reserved block,
    /// returned in ascending order. `n == 0` yields an empty list.
    pub fn create_many(&self, n: u64) -> Result<Vec<Identity>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let first = in_write_tx(self.store, |s, tx| s.reserve_identities(tx, n))?;
        debug!(first = %first, n, "reserved identity block");
        Ok((0..n).map(|i| first.offset(i)).collect())
    }

    /// Retire an identity. Deleting a nonexistent identity is a no-op.
    ///
    /// If the identity is the backing identity of a Set, that Set's
    /// containment rows are removed first, in the same transaction.
    pub fn delete(&self, id: Identity) -> Result<()> {
        in_write_tx(self.store, |s, tx| {
            let rows = s.delete_containments_of(tx, id)?;
            let existed = s.delete_identity(tx, id)?;
            if existed {
                debug!(id = %id, cascaded_rows = rows, "deleted identity");
            }
            Ok(())
        })
    }

    /// Retire many identities, cascading each. Absent ids are no-ops.
    pub fn delete_many(&self, ids: &[Identity]) -> Result<()> {
        in_write_tx(self.store, |s, tx| {
            for id in ids {
                s.delete_containments_of(tx, *id)?;
                s.delete_identity(tx, *id)?;
            }
            Ok(())
        })
    }

    /// Total number of live identities.
    pub fn count(&self) -> Result<u64> {
        in_read_tx(self.store, |s, tx| s.identity_count(tx))
    }
}
