// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Cursor behavior under local edits, remote edits, and merges.

use anchored::AnchorError;
use anchored::Crdt;
use anchored::Cursor;
use anchored::Text;
use anchored::key::KeyPub;

// =============================================================================
// Helper functions
// =============================================================================

fn alice() -> KeyPub {
    return KeyPub::from_bytes([1; 32]);
}

fn bob() -> KeyPub {
    return KeyPub::from_bytes([2; 32]);
}

fn text_from(content: &str) -> Text {
    let mut text = Text::new(alice());
    text.insert_at(0, content).unwrap();
    return text;
}

/// "hello" with a cursor at index 2, between "he" and "llo".
fn hello_with_cursor() -> (Text, Cursor) {
    let text = text_from("hello");
    let cursor = text.cursor_at(2).unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(2));
    return (text, cursor);
}

// =============================================================================
// Creation
// =============================================================================

#[test]
fn is_creatable_and_readable() {
    let text = Text::new(alice());
    let cursor = text.cursor_at(0).unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(0));
}

#[test]
fn can_be_created_on_a_merged_copy() {
    let original = Text::new(alice());
    let mut copy = Text::new(bob());
    copy.merge(&original);
    let cursor = copy.cursor_at(0).unwrap();
    assert_eq!(copy.cursor_index(&cursor), Ok(0));
}

#[test]
fn can_be_created_at_end_of_text() {
    let text = text_from("hello");
    let cursor = text.cursor_at(5).unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(5));
}

#[test]
fn resolves_to_its_creation_index() {
    let text = text_from("collaborate");
    for i in 0..=11 {
        let cursor = text.cursor_at(i).unwrap();
        assert_eq!(text.cursor_index(&cursor), Ok(i as usize));
    }
}

#[test]
fn rejects_negative_index() {
    let text = Text::new(alice());
    let err = text.cursor_at(-1).unwrap_err();
    assert_eq!(err, AnchorError::Negative { index: -1 });
    assert!(err.to_string().contains("negative"));
}

#[test]
fn rejects_index_past_end() {
    let text = Text::new(alice());
    let err = text.cursor_at(1).unwrap_err();
    assert_eq!(err, AnchorError::PastEnd { index: 1, len: 0 });
    assert!(err.to_string().contains("past"));
}

// =============================================================================
// Local edits
// =============================================================================

#[test]
fn moves_when_character_inserted_before() {
    let (mut text, cursor) = hello_with_cursor();
    text.insert_at(1, "i").unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(3));
}

#[test]
fn stays_when_character_inserted_after() {
    let (mut text, cursor) = hello_with_cursor();
    text.insert_at(3, "i").unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(2));
}

#[test]
fn stays_when_character_inserted_at_same_index() {
    let (mut text, cursor) = hello_with_cursor();
    text.insert_at(2, "i").unwrap();
    assert_eq!(text.to_string(), "heillo");
    assert_eq!(text.cursor_index(&cursor), Ok(2));
}

#[test]
fn moves_when_character_deleted_before() {
    let (mut text, cursor) = hello_with_cursor();
    text.delete_at(1).unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(1));
}

#[test]
fn stays_when_character_deleted_after() {
    let (mut text, cursor) = hello_with_cursor();
    text.delete_at(3).unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(2));
}

#[test]
fn stays_valid_for_deleted_character() {
    let (mut text, cursor) = hello_with_cursor();
    text.delete_at(2).unwrap();
    assert_eq!(text.to_string(), "helo");
    assert_eq!(text.cursor_index(&cursor), Ok(2));
}

#[test]
fn moves_by_length_of_inserted_run() {
    let (mut text, cursor) = hello_with_cursor();
    text.insert_at(0, "oh, ").unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(6));
}

#[test]
fn survives_deleting_everything() {
    let (mut text, cursor) = hello_with_cursor();
    text.delete_range(0, 5).unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(0));

    // New text at the start sorts before the tombstones
    text.insert_at(0, "new").unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(3));
}

#[test]
fn end_cursor_stays_before_appended_text() {
    let mut text = text_from("hello");
    let cursor = text.cursor_at(5).unwrap();
    text.insert_at(5, "!").unwrap();
    assert_eq!(text.cursor_index(&cursor), Ok(5));
}

// =============================================================================
// Remote edits
// =============================================================================

#[test]
fn follows_remote_insert_before_it() {
    let (mut local, cursor) = hello_with_cursor();
    let mut remote = Text::new(bob());
    remote.merge(&local);
    remote.insert_at(0, "well ").unwrap();

    local.apply(remote.local_ops().ops().iter().copied()).unwrap();
    assert_eq!(local.to_string(), "well hello");
    assert_eq!(local.cursor_index(&cursor), Ok(7));
}

#[test]
fn survives_remote_deletion_of_its_anchor() {
    let (mut local, cursor) = hello_with_cursor();
    let mut remote = Text::new(bob());
    remote.merge(&local);
    remote.delete_at(1).unwrap();
    remote.insert_at(1, "a").unwrap();

    local.merge(&remote);
    assert_eq!(local.to_string(), "hallo");
    assert_eq!(local.cursor_index(&cursor), Ok(2));
}

#[test]
fn resolves_identically_on_converged_replicas() {
    let (mut left, cursor) = hello_with_cursor();
    let mut right = Text::new(bob());
    right.merge(&left);

    left.insert_at(1, "XY").unwrap();
    right.insert_at(1, "Z").unwrap();
    right.delete_at(4).unwrap();

    let left_ops: Vec<_> = left.local_ops().ops().to_vec();
    let right_ops: Vec<_> = right.local_ops().ops().to_vec();
    left.apply(right_ops).unwrap();
    right.apply(left_ops).unwrap();

    assert_eq!(left.to_string(), right.to_string());
    assert_eq!(left.cursor_index(&cursor), right.cursor_index(&cursor));
    assert_eq!(left.cursor_index(&cursor), Ok(5));
}

#[test]
fn anchor_from_unmerged_replica_is_unknown() {
    let (text, cursor) = hello_with_cursor();
    let stranger = Text::new(bob());
    assert!(matches!(
        stranger.cursor_index(&cursor),
        Err(AnchorError::UnknownElement(_))
    ));
    assert_eq!(text.cursor_index(&cursor), Ok(2));
}
