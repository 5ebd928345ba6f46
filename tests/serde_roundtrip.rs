// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Anchors and operations survive a trip through JSON.

#![cfg(feature = "serde")]

use anchored::Anchor;
use anchored::Cursor;
use anchored::Text;
use anchored::crdt::op::Op;
use anchored::key::KeyPub;

#[test]
fn anchor_resolves_after_json_trip() {
    let mut text = Text::new(KeyPub::from_bytes([1; 32]));
    text.insert_at(0, "hello").unwrap();
    let cursor = text.cursor_at(3).unwrap();

    let json = serde_json::to_string(&cursor.anchor()).unwrap();
    let anchor: Anchor = serde_json::from_str(&json).unwrap();
    assert_eq!(anchor, cursor.anchor());

    text.insert_at(0, "oh ").unwrap();
    let restored = Cursor::from_anchor(anchor);
    assert_eq!(text.cursor_index(&restored), Ok(6));
}

#[test]
fn shipped_ops_rebuild_the_text() {
    let mut alice = Text::new(KeyPub::from_bytes([1; 32]));
    alice.insert_at(0, "hello").unwrap();
    alice.insert_embed(5, 9).unwrap();
    alice.delete_at(0).unwrap();

    let json = serde_json::to_string(alice.local_ops().ops()).unwrap();
    let ops: Vec<Op> = serde_json::from_str(&json).unwrap();
    assert_eq!(ops.as_slice(), alice.local_ops().ops());

    let mut bob = Text::new(KeyPub::from_bytes([2; 32]));
    bob.apply(ops).unwrap();
    assert_eq!(bob.to_string(), alice.to_string());
    assert_eq!(bob.sequence().digest(), alice.sequence().digest());
}
