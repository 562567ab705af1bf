//! Graph element (directed relation) and its creation references.

use serde::{Deserialize, Serialize};

use super::Identity;

/// A directed relation between two identities, itself addressable by an
/// identity of its own.
///
/// The structural equality pattern among `(id, a, b)` determines the
/// element's role — see [`ElementPattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphElement {
    pub id: Identity,
    pub a: Identity,
    pub b: Identity,
}

impl GraphElement {
    pub fn new(id: Identity, a: Identity, b: Identity) -> Self {
        Self { id, a, b }
    }

    /// Classify this element by the canonical structural patterns.
    pub fn pattern(&self) -> ElementPattern {
        let Self { id, a, b } = *self;
        if a == id && b == id {
            ElementPattern::Node
        } else if a == b {
            // a == b != id
            ElementPattern::LoopOn(a)
        } else if b == id {
            // a != id (else Node above)
            ElementPattern::PendantFrom(a)
        } else if a == id {
            ElementPattern::PendantTo(b)
        } else {
            ElementPattern::Edge(a, b)
        }
    }

    /// True if some endpoint of this element equals `x`.
    pub fn references(&self, x: Identity) -> bool {
        self.a == x || self.b == x
    }

    /// True if this element is a node: `a == b == id`.
    pub fn is_node(&self) -> bool {
        matches!(self.pattern(), ElementPattern::Node)
    }
}

/// Canonical structural role of a [`GraphElement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "on")]
pub enum ElementPattern {
    /// `a == b == id` — a free-standing node.
    Node,
    /// `a == x, b == id, x != id` — a pendant hanging off `x`.
    PendantFrom(Identity),
    /// `a == id, b == x, x != id` — a pendant pointing at `x`.
    PendantTo(Identity),
    /// `a == b == x, id != x` — a loop on `x`.
    LoopOn(Identity),
    /// `a == x, b == y`, all three distinct — the general directed edge.
    Edge(Identity, Identity),
}

/// One endpoint of a creation request.
///
/// Replaces the historical overloaded-sign integer encoding with a tagged
/// type. The integer form survives only as a wire detail via
/// [`EndpointRef::from_raw`] / [`EndpointRef::to_raw`]:
///
/// | wire value | meaning |
/// |---|---|
/// | `> 0` | [`EndpointRef::Existing`] — an identity that must already exist |
/// | `0` | [`EndpointRef::NewSelf`] — this element's own (not yet known) id |
/// | `< 0` | [`EndpointRef::Relative`] — the element `-value` ids after the first id of the batch |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum EndpointRef {
    /// An already-existing identity.
    Existing(Identity),
    /// The new element's own reserved id.
    NewSelf,
    /// Another element of the same batch: `first_reserved_id + offset`.
    Relative(u64),
}

impl EndpointRef {
    /// Decode the wire integer encoding.
    pub fn from_raw(raw: i64) -> Self {
        if raw > 0 {
            EndpointRef::Existing(Identity(raw as u64))
        } else if raw == 0 {
            EndpointRef::NewSelf
        } else {
            EndpointRef::Relative(raw.unsigned_abs())
        }
    }

    /// Encode back to the wire integer form.
    ///
    /// `Relative(0)` has no integer spelling (zero means `NewSelf` on the
    /// wire); it round-trips as `0`, which resolves to the same id only for
    /// the first request of a batch.
    pub fn to_raw(self) -> i64 {
        match self {
            EndpointRef::Existing(id) => id.0 as i64,
            EndpointRef::NewSelf => 0,
            EndpointRef::Relative(n) => -(n as i64),
        }
    }
}

/// One element-creation request inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub a: EndpointRef,
    pub b: EndpointRef,
}

impl ElementSpec {
    pub fn new(a: EndpointRef, b: EndpointRef) -> Self {
        Self { a, b }
    }

    /// A free-standing node: both endpoints are the element itself.
    pub fn node() -> Self {
        Self::new(EndpointRef::NewSelf, EndpointRef::NewSelf)
    }

    /// A loop on an existing identity.
    pub fn loop_on(x: Identity) -> Self {
        Self::new(EndpointRef::Existing(x), EndpointRef::Existing(x))
    }

    /// An edge between two existing identities.
    pub fn edge(x: Identity, y: Identity) -> Self {
        Self::new(EndpointRef::Existing(x), EndpointRef::Existing(y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_classification() {
        let id = Identity(7);
        let x = Identity(3);
        let y = Identity(4);

        assert_eq!(GraphElement::new(id, id, id).pattern(), ElementPattern::Node);
        assert_eq!(
            GraphElement::new(id, x, id).pattern(),
            ElementPattern::PendantFrom(x)
        );
        assert_eq!(
            GraphElement::new(id, id, y).pattern(),
            ElementPattern::PendantTo(y)
        );
        assert_eq!(
            GraphElement::new(id, x, x).pattern(),
            ElementPattern::LoopOn(x)
        );
        assert_eq!(
            GraphElement::new(id, x, y).pattern(),
            ElementPattern::Edge(x, y)
        );
    }

    #[test]
    fn raw_reference_roundtrip() {
        assert_eq!(EndpointRef::from_raw(42), EndpointRef::Existing(Identity(42)));
        assert_eq!(EndpointRef::from_raw(0), EndpointRef::NewSelf);
        assert_eq!(EndpointRef::from_raw(-2), EndpointRef::Relative(2));

        assert_eq!(EndpointRef::Existing(Identity(42)).to_raw(), 42);
        assert_eq!(EndpointRef::NewSelf.to_raw(), 0);
        assert_eq!(EndpointRef::Relative(2).to_raw(), -2);
    }
}
