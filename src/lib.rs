// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Anchored - stable cursors over a replicated text sequence.
//!
//! # Quick Start
//!
//! ```
//! use anchored::crdt::text::Text;
//! use anchored::key::KeyPub;
//!
//! let mut doc = Text::new(KeyPub::generate());
//! doc.insert_at(0, "hello").unwrap();
//!
//! // A cursor between "he" and "llo"
//! let cursor = doc.cursor_at(2).unwrap();
//!
//! doc.insert_at(0, ">> ").unwrap();
//! assert_eq!(doc.cursor_index(&cursor).unwrap(), 5);
//!
//! doc.delete_at(4).unwrap(); // the "e" the cursor was attached to
//! assert_eq!(doc.to_string(), ">> hllo");
//! assert_eq!(doc.cursor_index(&cursor).unwrap(), 4);
//! ```

pub mod crdt;
pub mod cursor;
pub mod error;
pub mod key;

pub use crdt::Crdt;
pub use crdt::id::ElementId;
pub use crdt::id::Origin;
pub use crdt::sequence::Sequence;
pub use crdt::text::Text;
pub use cursor::Anchor;
pub use cursor::Cursor;
pub use error::AnchorError;
pub use error::MergeError;
pub use error::SequenceError;
