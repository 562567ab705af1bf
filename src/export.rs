//! JSON snapshot export — serialize a whole store as one document.
//!
//! Produces a deterministic dump of the three tables (identities, elements,
//! containment rows) for debugging and snapshot tests, and as a migration
//! path between backing stores.
//!
//! ```text
//! Universe → export_snapshot() → { identities, elements, containment }
//!   → diff against a known-good fixture, or load elsewhere
//! ```

use std::io::Write;

use serde::Serialize;

use crate::Result;
use crate::model::{GraphElement, Identity};
use crate::store::{RelationalStore, in_read_tx};

/// The serialized form of a store: every row of every table, sorted.
#[derive(Debug, Serialize)]
struct Snapshot {
    identities: Vec<Identity>,
    elements: Vec<GraphElement>,
    containment: Vec<(Identity, Identity)>,
}

/// Export the full contents of a store as pretty-printed JSON.
///
/// All three tables are read inside one read-only transaction and emitted
/// in ascending order, so equal stores produce byte-identical output.
pub fn export_snapshot<S: RelationalStore>(store: &S, writer: &mut dyn Write) -> Result<()> {
    let snapshot = in_read_tx(store, |s, tx| {
        Ok(Snapshot {
            identities: s.all_identities(tx)?,
            elements: s.all_elements(tx)?,
            containment: s.all_containments(tx)?,
        })
    })?;

    serde_json::to_writer_pretty(&mut *writer, &snapshot)?;
    writeln!(writer)?;
    Ok(())
}
