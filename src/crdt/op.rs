// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Operations exchanged between replicas.
//!
//! Each replica produces a stream of operations that, when replayed on any
//! other replica in any order, reconstruct the same sequence:
//! - Insert: "element X, holding this value, was typed after element O"
//! - Delete: "element X is gone"
//!
//! Ids and origins are stable across concurrent edits, unlike positional
//! indices, so the operations carry no positions at all.

use super::id::ElementId;
use super::id::Origin;
use super::sequence::Value;

/// An operation that can be applied to a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Op {
    Insert {
        id: ElementId,
        /// What the element was typed after.
        origin: Origin,
        value: Value,
    },

    Delete {
        id: ElementId,
    },
}

impl Op {
    pub fn insert(id: ElementId, origin: Origin, value: Value) -> Op {
        return Op::Insert { id, origin, value };
    }

    pub fn delete(id: ElementId) -> Op {
        return Op::Delete { id };
    }

    /// The element this operation creates or deletes.
    pub fn id(&self) -> ElementId {
        return match self {
            Op::Insert { id, .. } => *id,
            Op::Delete { id } => *id,
        };
    }
}

/// The operations a replica has produced, in the order it produced them.
///
/// Peers ship `since(offset)` to each other; the log never shrinks, so an
/// offset taken earlier stays valid.
#[derive(Clone, Debug, Default)]
pub struct OpLog {
    ops: Vec<Op>,
}

impl OpLog {
    pub fn new() -> OpLog {
        return OpLog { ops: Vec::new() };
    }

    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[Op] {
        return &self.ops;
    }

    /// Operations appended after the first `offset`.
    pub fn since(&self, offset: usize) -> &[Op] {
        return &self.ops[offset.min(self.ops.len())..];
    }

    pub fn len(&self) -> usize {
        return self.ops.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.ops.is_empty();
    }
}
