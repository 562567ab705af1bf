//! End-to-end tests for the graph element store: patterns, predicates,
//! counters, updates, and endpoint protection.

use cantor::{
    ElementPattern, ElementSpec, EndpointRef, Error, ErrorKind, Identity, Universe,
};
use pretty_assertions::assert_eq;

fn node(universe: &Universe<cantor::MemoryStore>) -> Identity {
    universe
        .elements()
        .create(EndpointRef::NewSelf, EndpointRef::NewSelf)
        .unwrap()
}

// ============================================================================
// 1. Canonical patterns
// ============================================================================

#[test]
fn test_node_pattern() {
    let universe = Universe::open_memory();
    let id = node(&universe);

    let el = universe.elements().get(id).unwrap().unwrap();
    assert_eq!(el.a, id);
    assert_eq!(el.b, id);
    assert!(universe.elements().is_node(id).unwrap());
    assert_eq!(
        universe.elements().pattern_of(id).unwrap(),
        Some(ElementPattern::Node)
    );
}

#[test]
fn test_pendant_patterns() {
    let universe = Universe::open_memory();
    let x = node(&universe);

    let from = universe
        .elements()
        .create(EndpointRef::Existing(x), EndpointRef::NewSelf)
        .unwrap();
    let to = universe
        .elements()
        .create(EndpointRef::NewSelf, EndpointRef::Existing(x))
        .unwrap();

    assert!(universe.elements().is_pendant_from(from, x).unwrap());
    assert!(!universe.elements().is_pendant_to(from, x).unwrap());
    assert!(universe.elements().is_pendant_to(to, x).unwrap());
    assert_eq!(
        universe.elements().pattern_of(to).unwrap(),
        Some(ElementPattern::PendantTo(x))
    );
}

#[test]
fn test_loop_and_edge_patterns() {
    let universe = Universe::open_memory();
    let x = node(&universe);
    let y = node(&universe);

    let lp = universe
        .elements()
        .create_batch(&[ElementSpec::loop_on(x)])
        .unwrap()[0];
    let edge = universe
        .elements()
        .create_batch(&[ElementSpec::edge(x, y)])
        .unwrap()[0];

    assert!(universe.elements().is_loop_on(lp, x).unwrap());
    assert!(!universe.elements().is_loop_on(lp, y).unwrap());
    assert_eq!(
        universe.elements().pattern_of(edge).unwrap(),
        Some(ElementPattern::Edge(x, y))
    );
}

// ============================================================================
// 2. Batched predicates: one bool per input, absent ids are false
// ============================================================================

#[test]
fn test_batched_predicates_absent_ids_are_false() {
    let universe = Universe::open_memory();
    let x = node(&universe);
    let lp = universe
        .elements()
        .create_batch(&[ElementSpec::loop_on(x)])
        .unwrap()[0];
    let ghost = Identity(777_777);

    assert_eq!(
        universe.elements().exist(&[x, ghost, lp]).unwrap(),
        vec![true, false, true]
    );
    assert_eq!(
        universe.elements().are_nodes(&[x, lp, ghost]).unwrap(),
        vec![true, false, false]
    );
    assert_eq!(
        universe.elements().are_endpoints(&[x, lp, ghost]).unwrap(),
        vec![true, false, false]
    );
}

// ============================================================================
// 3. is_endpoint_of ignores self-reference
// ============================================================================

#[test]
fn test_is_endpoint_of() {
    let universe = Universe::open_memory();
    let x = node(&universe);

    // A node references itself, which does not make it "an endpoint of"
    // anything else.
    assert!(!universe.elements().is_endpoint_of(x).unwrap());

    universe
        .elements()
        .create_batch(&[ElementSpec::loop_on(x)])
        .unwrap();
    assert!(universe.elements().is_endpoint_of(x).unwrap());
}

// ============================================================================
// 4. Counters
// ============================================================================

#[test]
fn test_counters() {
    let universe = Universe::open_memory();
    let x = node(&universe);
    let y = node(&universe);

    universe
        .elements()
        .create_batch(&[
            ElementSpec::new(EndpointRef::Existing(x), EndpointRef::NewSelf),
            ElementSpec::new(EndpointRef::Existing(x), EndpointRef::NewSelf),
            ElementSpec::new(EndpointRef::NewSelf, EndpointRef::Existing(x)),
            ElementSpec::loop_on(x),
            ElementSpec::edge(x, y),
        ])
        .unwrap();

    let elements = universe.elements();
    assert_eq!(elements.count_pendants_from(x).unwrap(), 2);
    assert_eq!(elements.count_pendants_to(x).unwrap(), 1);
    assert_eq!(elements.count_loops_on(x).unwrap(), 1);
    assert_eq!(elements.count_pendants_from(y).unwrap(), 0);
    assert_eq!(elements.count().unwrap(), 7);
}

// ============================================================================
// 5. Update: full endpoint replacement
// ============================================================================

#[test]
fn test_update_replaces_endpoints() {
    let universe = Universe::open_memory();
    let x = node(&universe);
    let y = node(&universe);
    let edge = universe
        .elements()
        .create_batch(&[ElementSpec::edge(x, y)])
        .unwrap()[0];

    universe.elements().update(edge, y, y).unwrap();
    assert_eq!(
        universe.elements().pattern_of(edge).unwrap(),
        Some(ElementPattern::LoopOn(y))
    );
    // x is no longer referenced by the edge.
    assert!(!universe.elements().is_endpoint_of(x).unwrap());
}

#[test]
fn test_update_missing_element_is_not_found() {
    let universe = Universe::open_memory();
    let x = node(&universe);

    let err = universe.elements().update(Identity(555_555), x, x).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_update_reports_all_unknown_endpoints() {
    let universe = Universe::open_memory();
    let x = node(&universe);
    let g1 = Identity(600_001);
    let g2 = Identity(600_002);

    let err = universe.elements().update(x, g1, g2).unwrap_err();
    match err {
        Error::UnknownIdentities(missing) => assert_eq!(missing, vec![g1, g2]),
        other => panic!("expected UnknownIdentities, got {other:?}"),
    }
}

// ============================================================================
// 6. Endpoint protection
// ============================================================================

#[test]
fn test_delete_blocked_by_pendant() {
    let universe = Universe::open_memory();
    let x = node(&universe);
    let pendant = universe
        .elements()
        .create(EndpointRef::Existing(x), EndpointRef::NewSelf)
        .unwrap();

    // Deleting the node fails: the pendant still points at it.
    let err = universe.elements().delete(x).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    match err {
        Error::EndpointProtected(conflicts) => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].element, x);
            assert_eq!(conflicts[0].referenced_by, vec![pendant]);
        }
        other => panic!("expected EndpointProtected, got {other:?}"),
    }
    assert!(universe.elements().exists(x).unwrap());

    // Pendant first, then the node: both succeed.
    assert!(universe.elements().delete(pendant).unwrap());
    assert!(universe.elements().delete(x).unwrap());
    assert!(!universe.elements().exists(x).unwrap());
}

#[test]
fn test_batched_delete_of_mutually_referencing_elements() {
    let universe = Universe::open_memory();
    let x = node(&universe);
    let lp = universe
        .elements()
        .create_batch(&[ElementSpec::loop_on(x)])
        .unwrap()[0];
    let pendant = universe
        .elements()
        .create(EndpointRef::Existing(x), EndpointRef::NewSelf)
        .unwrap();

    // One call deleting the node and everything pointing at it succeeds:
    // blockers inside the requested set don't count.
    let removed = universe.elements().delete_batch(&[x, lp, pendant]).unwrap();
    assert_eq!(removed, 3);
    assert_eq!(universe.elements().count().unwrap(), 0);
}

#[test]
fn test_batched_delete_reports_every_conflict() {
    let universe = Universe::open_memory();
    let x = node(&universe);
    let y = node(&universe);
    let lp_x = universe
        .elements()
        .create_batch(&[ElementSpec::loop_on(x)])
        .unwrap()[0];
    let lp_y = universe
        .elements()
        .create_batch(&[ElementSpec::loop_on(y)])
        .unwrap()[0];

    let err = universe.elements().delete_batch(&[x, y]).unwrap_err();
    match err {
        Error::EndpointProtected(conflicts) => {
            assert_eq!(conflicts.len(), 2);
            assert_eq!(conflicts[0].element, x);
            assert_eq!(conflicts[0].referenced_by, vec![lp_x]);
            assert_eq!(conflicts[1].element, y);
            assert_eq!(conflicts[1].referenced_by, vec![lp_y]);
        }
        other => panic!("expected EndpointProtected, got {other:?}"),
    }
    // Nothing was deleted.
    assert_eq!(universe.elements().count().unwrap(), 4);
}

#[test]
fn test_delete_retires_backing_identity() {
    let universe = Universe::open_memory();
    let x = node(&universe);

    assert!(universe.elements().delete(x).unwrap());
    assert!(!universe.identities().exists(x).unwrap());

    // Deleting an absent element is a no-op, not an error.
    assert!(!universe.elements().delete(x).unwrap());
}

#[test]
fn test_delete_cascades_containment_rows_of_element_id() {
    let universe = Universe::open_memory();
    let x = node(&universe);
    let member = universe.identities().create_one().unwrap();

    // The element's id doubles as a set reference.
    let as_set = cantor::SetId(x);
    universe.containment().add(as_set, member).unwrap();
    assert_eq!(universe.containment().count(as_set).unwrap(), 1);

    assert!(universe.elements().delete(x).unwrap());

    // Destroying the backing identity destroys its containment rows too.
    assert!(universe.containment().members_of(as_set).unwrap().is_empty());
    assert_eq!(universe.containment().count(as_set).unwrap(), 0);
    assert!(!universe.containment().contains(as_set, member).unwrap());
    // The member identity itself is untouched.
    assert!(universe.identities().exists(member).unwrap());
}
