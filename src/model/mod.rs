//! # Identity / Containment Model
//!
//! Clean DTOs for the naive-set-theory model. These types cross every
//! boundary: storage ↔ components ↔ user.
//!
//! Design rule: this module is pure data — no I/O, no locks, no state.

pub mod element;
pub mod identity;
pub mod set;

pub use element::{ElementPattern, ElementSpec, EndpointRef, GraphElement};
pub use identity::Identity;
pub use set::SetId;
