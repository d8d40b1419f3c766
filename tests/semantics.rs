//! Contract tests for the rope and red-black tree
//!
//! These exercise the public API the way a caller would and document the
//! expected behavior at boundaries and on failure.

use rrope::debug::{print_rbtree, print_rope};
use rrope::output::write_rope;
use rrope::{Arena, Color, NodeId, RbTree, RopeError, Ropes};

fn rope_of(arena: &mut Arena, ropes: &mut Ropes, pieces: &[&str]) -> NodeId {
    let mut root: Option<NodeId> = None;
    for piece in pieces {
        let leaf = ropes.new_leaf_from_bytes(arena, piece.as_bytes()).unwrap();
        root = Some(match root {
            None => leaf,
            Some(root) => ropes.concat(arena, Some(root), Some(leaf)).unwrap(),
        });
    }
    root.unwrap()
}

fn text(arena: &Arena, ropes: &Ropes, root: Option<NodeId>) -> String {
    String::from_utf8(ropes.text(arena, root).unwrap()).unwrap()
}

// ============================================================
// Concrete scenario
// ============================================================

#[test]
fn test_hello_world_split_and_resplit() {
    let mut arena = Arena::new(1 << 16);
    let mut ropes = Ropes::new();
    let rope = rope_of(&mut arena, &mut ropes, &["Hello, ", "World!"]);
    assert_eq!(text(&arena, &ropes, Some(rope)), "Hello, World!");
    assert_eq!(ropes.count(&arena, Some(rope)).unwrap(), 13);

    let (first, second) = ropes.split(&mut arena, rope, 7).unwrap();
    assert_eq!(text(&arena, &ropes, first), "Hello, ");
    assert_eq!(text(&arena, &ropes, second), "World!");

    let joined = ropes.concat(&mut arena, first, second).unwrap();
    assert_eq!(text(&arena, &ropes, Some(joined)), "Hello, World!");

    let (first, _) = ropes.split(&mut arena, joined, 7).unwrap();
    let (hello, comma) = ropes.split(&mut arena, first.unwrap(), 5).unwrap();
    assert_eq!(text(&arena, &ropes, hello), "Hello");
    assert_eq!(text(&arena, &ropes, comma), ", ");
}

#[test]
fn test_demo_rope_every_offset() {
    let mut arena = Arena::new(1 << 20);
    let mut ropes = Ropes::new();
    let pieces = [
        "Hello, ",
        "Rope!",
        "_How was your day",
        "NO GOOD",
        " Pajaro Loco!",
        " ABCDEFG",
    ];
    let expected: String = pieces.concat();
    let mut rope = rope_of(&mut arena, &mut ropes, &pieces);

    for i in 0..=expected.len() {
        let (first, second) = ropes.split(&mut arena, rope, i).unwrap();
        assert_eq!(text(&arena, &ropes, first), &expected[..i], "offset {i}");
        assert_eq!(text(&arena, &ropes, second), &expected[i..], "offset {i}");
        rope = ropes.concat(&mut arena, first, second).unwrap();
        assert_eq!(ropes.validate(&arena, rope).unwrap(), expected.len());
    }
}

// ============================================================
// Boundaries
// ============================================================

#[test]
fn test_split_at_zero_is_identity() {
    let mut arena = Arena::new(1 << 12);
    let mut ropes = Ropes::new();
    let rope = rope_of(&mut arena, &mut ropes, &["ab", "cd"]);
    assert_eq!(ropes.split(&mut arena, rope, 0).unwrap(), (None, Some(rope)));
}

#[test]
fn test_split_at_end_leaves_second_absent() {
    let mut arena = Arena::new(1 << 12);
    let mut ropes = Ropes::new();
    let rope = rope_of(&mut arena, &mut ropes, &["ab", "cd"]);
    let (first, second) = ropes.split(&mut arena, rope, 4).unwrap();
    assert_eq!(text(&arena, &ropes, first), "abcd");
    assert!(second.is_none());
}

#[test]
fn test_split_past_end_is_reported() {
    let mut arena = Arena::new(1 << 12);
    let mut ropes = Ropes::new();
    let rope = rope_of(&mut arena, &mut ropes, &["ab", "cd"]);
    let err = ropes.split(&mut arena, rope, 5).unwrap_err();
    assert!(matches!(err, RopeError::IndexOutOfRange { index: 5, len: 4 }));
    // The rope is untouched
    assert_eq!(text(&arena, &ropes, Some(rope)), "abcd");
}

#[test]
fn test_index_matches_text() {
    let mut arena = Arena::new(1 << 12);
    let mut ropes = Ropes::new();
    let rope = rope_of(&mut arena, &mut ropes, &["The ", "quick ", "", "fox"]);
    let expected = b"The quick fox";
    for (i, &b) in expected.iter().enumerate() {
        assert_eq!(ropes.index(&arena, rope, i).unwrap(), b);
    }
    assert!(ropes.index(&arena, rope, expected.len()).is_err());
}

#[test]
fn test_rope_of_empty_leaves() {
    let mut arena = Arena::new(1 << 12);
    let mut ropes = Ropes::new();
    let rope = rope_of(&mut arena, &mut ropes, &["", "", ""]);
    assert_eq!(ropes.count(&arena, Some(rope)).unwrap(), 0);
    assert_eq!(ropes.leaf_count(&arena, Some(rope)).unwrap(), 3);
    assert_eq!(ropes.split(&mut arena, rope, 0).unwrap(), (None, Some(rope)));
}

#[test]
fn test_bytes_are_not_utf8_checked() {
    let mut arena = Arena::new(1 << 12);
    let mut ropes = Ropes::new();
    let a = ropes.new_leaf_from_bytes(&mut arena, b"\xff\x00").unwrap();
    let b = ropes.new_leaf_from_bytes(&mut arena, b"\xfe").unwrap();
    let rope = ropes.concat(&mut arena, Some(a), Some(b)).unwrap();
    let (first, second) = ropes.split(&mut arena, rope, 1).unwrap();
    assert_eq!(ropes.text(&arena, first).unwrap(), b"\xff");
    assert_eq!(ropes.text(&arena, second).unwrap(), b"\x00\xfe");
}

// ============================================================
// Arena discipline
// ============================================================

#[test]
fn test_arena_exhaustion_is_reported() {
    let mut arena = Arena::new(64);
    let mut ropes = Ropes::new();
    let mut last = Ok(());
    for _ in 0..16 {
        last = ropes
            .new_leaf_from_bytes(&mut arena, b"0123456789")
            .map(|_| ());
        if last.is_err() {
            break;
        }
    }
    assert!(matches!(last, Err(RopeError::OutOfCapacity { .. })));
    assert!(arena.used() <= arena.capacity());
}

#[test]
fn test_split_needs_room_to_rebuild() {
    let mut arena = Arena::new(1 << 12);
    let mut ropes = Ropes::new();
    let rope = rope_of(&mut arena, &mut ropes, &["abc", "def"]);

    // Use up whatever headroom is left
    arena.push(arena.remaining(), 1).unwrap();
    assert_eq!(arena.remaining(), 0);
    assert!(matches!(
        ropes.split(&mut arena, rope, 4),
        Err(RopeError::OutOfCapacity { .. })
    ));

    // Splitting at zero allocates nothing
    assert_eq!(ropes.split(&mut arena, rope, 0).unwrap(), (None, Some(rope)));
}

#[test]
fn test_clear_invalidates_every_handle() {
    let mut arena = Arena::new(1 << 12);
    let mut ropes = Ropes::new();
    let mut tree = RbTree::new();
    let rope = rope_of(&mut arena, &mut ropes, &["ab"]);
    let node = tree.alloc(&mut arena, 1).unwrap();
    let root = tree.insert(&arena, None, node).unwrap();

    arena.clear();
    assert_eq!(arena.used(), 0);
    assert!(matches!(
        ropes.text(&arena, Some(rope)),
        Err(RopeError::StaleHandle { .. })
    ));

    tree.alloc(&mut arena, 2).unwrap();
    assert!(matches!(tree.key(&arena, root), Err(RopeError::StaleHandle { .. })));
}

fn is_stale<T>(result: Result<T, RopeError>) -> bool {
    matches!(result, Err(RopeError::StaleHandle { handle: 0, current: 1 }))
}

#[test]
fn test_stale_handles_never_read_reused_memory() {
    let mut arena = Arena::new(1 << 12);
    let mut ropes = Ropes::new();
    let mut tree = RbTree::new();
    let rope = rope_of(&mut arena, &mut ropes, &["sec", "ret"]);
    let node = tree.alloc(&mut arena, 7).unwrap();
    let root = Some(tree.insert(&arena, None, node).unwrap());

    // Refill the cleared arena so old views would land on new bytes
    arena.clear();
    arena.alloc_bytes(b"REUSED").unwrap();

    let mut out = Vec::new();
    assert!(is_stale(write_rope(&mut out, &ropes, &arena, Some(rope))));
    assert!(is_stale(print_rope(&mut out, &ropes, &arena, Some(rope), 0)));
    assert!(is_stale(print_rbtree(&mut out, &tree, &arena, root, 0)));
    assert!(!out.windows(6).any(|w| w == b"REUSED"));

    assert!(is_stale(ropes.count(&arena, Some(rope))));
    assert!(is_stale(ropes.leaf_count(&arena, Some(rope))));
    assert!(is_stale(ropes.leaves(&arena, Some(rope))));
    assert!(is_stale(ropes.validate(&arena, rope)));
    assert!(is_stale(ropes.parent(&arena, rope)));
    assert!(is_stale(ropes.text(&arena, Some(rope))));

    assert!(is_stale(tree.find(&arena, root, 7)));
    assert!(is_stale(tree.in_order(&arena, root)));
    assert!(is_stale(tree.validate(&arena, root)));
    assert!(is_stale(tree.key(&arena, node)));

    // Nodes allocated after the clear still link into a fresh tree only
    let fresh = tree.alloc(&mut arena, 1).unwrap();
    assert!(is_stale(tree.insert(&arena, root, fresh)));
    let fresh_root = tree.insert(&arena, None, fresh).unwrap();
    assert_eq!(tree.in_order(&arena, Some(fresh_root)).unwrap(), vec![1]);
}

// ============================================================
// Red-black index tree
// ============================================================

#[test]
fn test_rb_insert_sequence() {
    let mut arena = Arena::new(1 << 12);
    let mut tree = RbTree::new();
    let mut root = None;
    for key in [7, 3, 18, 10, 22, 8, 11, 26] {
        let node = tree.alloc(&mut arena, key).unwrap();
        root = Some(tree.insert(&arena, root, node).unwrap());
    }
    assert_eq!(
        tree.in_order(&arena, root).unwrap(),
        vec![3, 7, 8, 10, 11, 18, 22, 26]
    );
    assert_eq!(tree.color(&arena, root.unwrap()).unwrap(), Color::Black);
    assert!(tree.validate(&arena, root).unwrap() >= 2);
}

#[test]
fn test_rb_remove_reports_not_implemented() {
    let mut arena = Arena::new(1 << 12);
    let mut tree = RbTree::new();
    let node = tree.alloc(&mut arena, 1).unwrap();
    let root = tree.insert(&arena, None, node).unwrap();
    let err = tree.remove(root, node).unwrap_err();
    assert!(matches!(err, RopeError::NotImplemented(_)));
    assert_eq!(err.to_string(), "not implemented: red-black deletion");
}
