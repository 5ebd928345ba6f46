// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! CRDT primitives for collaborative text.

pub mod clock;
pub mod id;
pub mod merge;
pub mod op;
mod order_tree;
pub mod sequence;
pub mod text;

/// A CRDT is a data type with a merge operator that is commutative,
/// associative, and idempotent.
pub trait Crdt {
    /// Merge another instance into this one.
    fn merge(&mut self, other: &Self);
}
