// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Element identity and the sibling tie-break.
//!
//! # Ordering
//!
//! Every element records the element it was typed after (its origin).
//! The origins form a tree rooted at the start of the text, and the
//! canonical order is the pre-order traversal of that tree. Siblings,
//! i.e. concurrent inserts after the same origin, are visited in
//! descending `ElementId` order.
//!
//! `ElementId` compares by counter first and replica second. Counters come
//! from a Lamport clock, so a child always has a larger counter than its
//! origin and a freshly typed element lands first among its siblings.

use std::cmp::Ordering;

use crate::key::KeyPub;

/// Identifies the replica that minted an element.
pub type ReplicaId = KeyPub;

/// A globally unique identifier for a single element of the sequence.
///
/// The (counter, replica) pair is unique assuming replicas are unique and
/// each replica never reuses a counter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId {
    /// Lamport counter at the time of insertion.
    pub counter: u64,
    /// The replica that performed the insertion.
    pub replica: ReplicaId,
}

impl ElementId {
    pub fn new(counter: u64, replica: ReplicaId) -> ElementId {
        return ElementId { counter, replica };
    }
}

impl PartialOrd for ElementId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for ElementId {
    fn cmp(&self, other: &Self) -> Ordering {
        return match self.counter.cmp(&other.counter) {
            Ordering::Equal => self.replica.cmp(&other.replica),
            ordering => ordering,
        };
    }
}

impl std::fmt::Debug for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "ElementId({}, {:?})", self.counter, self.replica);
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}@{}", self.counter, self.replica);
    }
}

/// The left origin of an element: what it was inserted after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    /// The start-of-sequence sentinel.
    Start,
    /// A specific element, live or tombstoned.
    After(ElementId),
}

impl Origin {
    pub fn element(&self) -> Option<ElementId> {
        return match self {
            Origin::Start => None,
            Origin::After(id) => Some(*id),
        };
    }

    pub fn is_start(&self) -> bool {
        return matches!(self, Origin::Start);
    }
}

impl From<ElementId> for Origin {
    fn from(id: ElementId) -> Origin {
        return Origin::After(id);
    }
}

impl From<Option<ElementId>> for Origin {
    fn from(id: Option<ElementId>) -> Origin {
        return match id {
            Some(id) => Origin::After(id),
            None => Origin::Start,
        };
    }
}

/// Returns true if `sibling` is laid out before `new` when both share an
/// origin. Every replica must agree on this rule.
#[inline]
pub fn sorts_before(sibling: &ElementId, new: &ElementId) -> bool {
    return sibling > new;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(byte: u8) -> ReplicaId {
        return KeyPub::from_bytes([byte; 32]);
    }

    #[test]
    fn counter_dominates_replica() {
        let a = ElementId::new(1, replica(9));
        let b = ElementId::new(2, replica(1));
        assert!(a < b);
    }

    #[test]
    fn replica_breaks_counter_ties() {
        let a = ElementId::new(3, replica(1));
        let b = ElementId::new(3, replica(2));
        assert!(a < b);
        assert_ne!(a, b);
    }

    #[test]
    fn larger_sibling_goes_first() {
        let old = ElementId::new(1, replica(1));
        let new = ElementId::new(5, replica(1));
        assert!(sorts_before(&new, &old));
        assert!(!sorts_before(&old, &new));
    }

    #[test]
    fn origin_conversions() {
        let id = ElementId::new(4, replica(3));
        assert_eq!(Origin::from(id), Origin::After(id));
        assert_eq!(Origin::from(None), Origin::Start);
        assert_eq!(Origin::After(id).element(), Some(id));
        assert!(Origin::Start.is_start());
    }
}
