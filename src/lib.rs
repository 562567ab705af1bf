//! # cantor — Computational Naive Set Theory
//!
//! Opaque identities, directed-graph-encoded relations between identities,
//! and a set-algebra layer backed by a relational store.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `RelationalStore` is the contract between the model
//!    and storage
//! 2. **Clean DTOs**: `Identity`, `GraphElement`, `SetId` cross all
//!    boundaries
//! 3. **Facts, not caches**: a containment row is the only evidence of
//!    membership; the algebra derives everything from rows
//! 4. **Materialized results**: algebra operations produce independent
//!    snapshot Sets, never views
//!
//! ## Quick Start
//!
//! ```rust
//! use cantor::{ElementSpec, EndpointRef, Universe};
//!
//! # fn example() -> cantor::Result<()> {
//! let universe = Universe::open_memory();
//!
//! // Build an interconnected mini-graph in one atomic batch:
//! // two nodes, then an edge from the first to the second.
//! let ids = universe.elements().create_batch(&[
//!     ElementSpec::node(),
//!     ElementSpec::node(),
//!     ElementSpec::new(EndpointRef::Relative(0), EndpointRef::Relative(1)),
//! ])?;
//!
//! // Set algebra over those identities.
//! let sets = universe.sets();
//! let nodes = sets.create_with_members(&ids[..2])?;
//! let all = sets.create_with_members(&ids)?;
//! assert!(sets.is_subset(nodes, all)?);
//!
//! let rest = sets.complement(nodes, all)?;
//! assert_eq!(sets.cardinality(rest)?, 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Storage Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | `MemoryStore` | In-memory reference implementation for testing/embedding |
//!
//! Anything implementing [`RelationalStore`] can take its place.

// ============================================================================
// Modules
// ============================================================================

pub mod alloc;
pub mod algebra;
pub mod containment;
pub mod export;
pub mod graph;
pub mod model;
pub mod store;
pub mod tx;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{ElementPattern, ElementSpec, EndpointRef, GraphElement, Identity, SetId};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use store::{MemoryStore, RelationalStore};

// ============================================================================
// Re-exports: Transactions
// ============================================================================

pub use tx::{Transaction, TxId, TxMode};

// ============================================================================
// Re-exports: Components
// ============================================================================

pub use alloc::IdentityAllocator;
pub use algebra::SetAlgebraEngine;
pub use containment::ContainmentStore;
pub use graph::{EndpointConflict, GraphElementStore};

// ============================================================================
// Top-level Universe handle
// ============================================================================

/// The primary entry point. A `Universe` wraps a relational store and hands
/// out the four component facades.
pub struct Universe<S: RelationalStore> {
    store: S,
}

impl<S: RelationalStore> Universe<S> {
    /// Create a Universe over the given store.
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// The identity allocator.
    pub fn identities(&self) -> IdentityAllocator<'_, S> {
        IdentityAllocator::new(&self.store)
    }

    /// The graph element store.
    pub fn elements(&self) -> GraphElementStore<'_, S> {
        GraphElementStore::new(&self.store)
    }

    /// The containment store.
    pub fn containment(&self) -> ContainmentStore<'_, S> {
        ContainmentStore::new(&self.store)
    }

    /// The set-algebra engine.
    pub fn sets(&self) -> SetAlgebraEngine<'_, S> {
        SetAlgebraEngine::new(&self.store)
    }

    /// Access the underlying store (for advanced use and exports).
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// In-memory universe for testing and embedding.
impl Universe<MemoryStore> {
    pub fn open_memory() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error taxonomy class, for mapping onto transport-level status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A specifically addressed id does not exist.
    NotFound,
    /// Malformed reference, empty required input, or violated call
    /// precondition.
    InvalidArgument,
    /// Delete blocked by endpoint protection.
    Conflict,
    /// Underlying store failure unrelated to caller input.
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// References to identities that do not exist. Carries *every*
    /// offending id so a caller can correct the whole request at once.
    #[error("unknown identities: [{}]", fmt_ids(.0))]
    UnknownIdentities(Vec<Identity>),

    /// Deletes blocked by endpoint protection, with all blockers listed.
    #[error("delete blocked by endpoint protection: {}", fmt_conflicts(.0))]
    EndpointProtected(Vec<EndpointConflict>),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("transaction error: {0}")]
    Tx(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidArgument(_) | Error::UnknownIdentities(_) => ErrorKind::InvalidArgument,
            Error::EndpointProtected(_) => ErrorKind::Conflict,
            Error::Storage(_) | Error::Tx(_) | Error::Serialize(_) | Error::Io(_) => {
                ErrorKind::Internal
            }
        }
    }
}

fn fmt_ids(ids: &[Identity]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_conflicts(conflicts: &[EndpointConflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
