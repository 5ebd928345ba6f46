// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Error types.
//!
//! Redundant operations (re-inserting an identical element, deleting twice,
//! deleting before the insert arrived) are absorbed and never show up here.

use thiserror::Error;

use crate::crdt::id::ElementId;

/// Failures of the replicated sequence store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("index {index} out of range (visible length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("origin {0} has not been inserted")]
    MissingOrigin(ElementId),

    #[error("element {0} already exists with a different origin or value")]
    DuplicateId(ElementId),

    #[error("element {0} is not in this sequence")]
    UnknownElement(ElementId),
}

/// Failures creating or resolving a cursor anchor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    #[error("cursor index {index} is negative")]
    Negative { index: i64 },

    #[error("cursor index {index} is past end of text (length {len})")]
    PastEnd { index: i64, len: usize },

    #[error("anchor element {0} is not in this sequence")]
    UnknownElement(ElementId),
}

/// Failures while reconciling remote operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error("deferred operation buffer is full ({limit} operations)")]
    BufferFull { limit: usize },

    #[error("origin {missing} never arrived; {waiting} operations are stuck behind it")]
    UnresolvedOrigin { missing: ElementId, waiting: usize },
}
