//! End-to-end tests for the identity allocator.
//!
//! Each test exercises the public `Universe` facade against `MemoryStore`.

use cantor::{Identity, Universe};
use pretty_assertions::assert_eq;

// ============================================================================
// 1. create_many returns a contiguous block of fresh ids
// ============================================================================

#[test]
fn test_create_many_contiguous_and_fresh() {
    let universe = Universe::open_memory();
    let ids = universe.identities();

    let before = ids.create_one().unwrap();
    let block = ids.create_many(5).unwrap();

    assert_eq!(block.len(), 5);
    for pair in block.windows(2) {
        assert_eq!(pair[1].0, pair[0].0 + 1);
    }
    // Pairwise distinct and none of them pre-existing.
    assert!(!block.contains(&before));
    for id in &block {
        assert!(ids.exists(*id).unwrap());
    }
}

#[test]
fn test_create_many_zero_is_empty() {
    let universe = Universe::open_memory();
    assert_eq!(universe.identities().create_many(0).unwrap(), Vec::new());
}

// ============================================================================
// 2. delete is idempotent; exists flips immediately
// ============================================================================

#[test]
fn test_delete_then_exists_false() {
    let universe = Universe::open_memory();
    let ids = universe.identities();

    let id = ids.create_one().unwrap();
    assert!(ids.exists(id).unwrap());

    ids.delete(id).unwrap();
    assert!(!ids.exists(id).unwrap());

    // Deleting again (or deleting something never allocated) is a no-op.
    ids.delete(id).unwrap();
    ids.delete(Identity(999_999)).unwrap();
}

#[test]
fn test_delete_many() {
    let universe = Universe::open_memory();
    let ids = universe.identities();

    let block = ids.create_many(3).unwrap();
    ids.delete_many(&block).unwrap();
    for id in &block {
        assert!(!ids.exists(*id).unwrap());
    }
    assert_eq!(ids.count().unwrap(), 0);
}

#[test]
fn test_delete_many_cascades_containment_rows() {
    let universe = Universe::open_memory();

    let members = universe.identities().create_many(2).unwrap();
    let set_a = universe.sets().create_with_members(&members).unwrap();
    let set_b = universe.sets().create_with_members(&members[..1]).unwrap();

    universe
        .identities()
        .delete_many(&[set_a.identity(), set_b.identity()])
        .unwrap();

    // Both sets' containment rows go with their backing identities.
    assert!(universe.containment().members_of(set_a).unwrap().is_empty());
    assert!(universe.containment().members_of(set_b).unwrap().is_empty());
    // Member identities are untouched.
    assert!(universe.identities().exists_all(&members).unwrap());
}

// ============================================================================
// 3. exists_all / exists_any
// ============================================================================

#[test]
fn test_exists_all_and_any() {
    let universe = Universe::open_memory();
    let ids = universe.identities();

    let block = ids.create_many(2).unwrap();
    let ghost = Identity(424_242);

    assert!(ids.exists_all(&block).unwrap());
    assert!(ids.exists_all(&[]).unwrap()); // vacuous
    assert!(!ids.exists_all(&[block[0], ghost]).unwrap());

    assert!(ids.exists_any(&[ghost, block[1]]).unwrap());
    assert!(!ids.exists_any(&[ghost]).unwrap());
    assert!(!ids.exists_any(&[]).unwrap());
}

// ============================================================================
// 4. deleting a Set's backing identity cascades its containment rows
// ============================================================================

#[test]
fn test_delete_cascades_containment_rows() {
    let universe = Universe::open_memory();

    let members = universe.identities().create_many(3).unwrap();
    let set = universe.sets().create_with_members(&members).unwrap();
    assert_eq!(universe.sets().cardinality(set).unwrap(), 3);

    universe.identities().delete(set.identity()).unwrap();

    assert!(!universe.identities().exists(set.identity()).unwrap());
    assert_eq!(universe.sets().cardinality(set).unwrap(), 0);
    assert!(universe.containment().members_of(set).unwrap().is_empty());
    // Member identities are untouched.
    assert!(universe.identities().exists_all(&members).unwrap());
}
