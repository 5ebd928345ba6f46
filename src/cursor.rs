// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Stable cursors.
//!
//! A cursor never stores a number. It remembers the element immediately
//! before the boundary it was created at (or the start of the text) and
//! recomputes its index from the current sequence on every read.
//!
//! Binding to the predecessor is what makes the cursor behave:
//! - text typed exactly at the cursor lands after the anchor in canonical
//!   order, so the cursor stays put;
//! - text inserted or deleted before the anchor moves the cursor by the
//!   number of visible elements gained or lost;
//! - deleting the anchor itself turns it into a tombstone that keeps its
//!   canonical slot, so the cursor drops by one and sticks to whatever is
//!   visible after it.

use crate::crdt::id::ElementId;
use crate::crdt::sequence::Sequence;
use crate::error::AnchorError;

/// What a cursor is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anchor {
    /// Before every element; always resolves to 0.
    Start,
    /// Just after this element, live or tombstoned.
    After(ElementId),
}

/// Attach an anchor to the boundary before visible index `index`.
///
/// Valid indices run from 0 to the visible length inclusive. The index is
/// signed so that callers passing through user input get a proper error
/// for negative values.
pub fn create_anchor(seq: &Sequence, index: i64) -> Result<Anchor, AnchorError> {
    if index < 0 {
        return Err(AnchorError::Negative { index });
    }
    let len = seq.visible_len();
    if index as u64 > len as u64 {
        return Err(AnchorError::PastEnd { index, len });
    }
    if index == 0 {
        return Ok(Anchor::Start);
    }
    return match seq.element_at(index as usize - 1) {
        Ok(id) => Ok(Anchor::After(id)),
        Err(_) => Err(AnchorError::PastEnd { index, len }),
    };
}

/// The current visible index of an anchor.
///
/// Counts the visible elements at or before the anchor in canonical order.
pub fn resolve(seq: &Sequence, anchor: &Anchor) -> Result<usize, AnchorError> {
    return match anchor {
        Anchor::Start => Ok(0),
        Anchor::After(id) => seq
            .visible_through(id)
            .map_err(|_| AnchorError::UnknownElement(*id)),
    };
}

/// A position in the text that survives concurrent edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cursor {
    anchor: Anchor,
}

impl Cursor {
    pub fn at(seq: &Sequence, index: i64) -> Result<Cursor, AnchorError> {
        return Ok(Cursor { anchor: create_anchor(seq, index)? });
    }

    /// Rebuild a cursor from an anchor, e.g. one received from a peer.
    pub fn from_anchor(anchor: Anchor) -> Cursor {
        return Cursor { anchor };
    }

    pub fn anchor(&self) -> Anchor {
        return self.anchor;
    }

    /// Where the cursor is now.
    pub fn index(&self, seq: &Sequence) -> Result<usize, AnchorError> {
        return resolve(seq, &self.anchor);
    }
}
