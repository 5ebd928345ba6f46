// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! The replicated sequence store.
//!
//! Elements live in an append-only arena and are addressed by a `Handle`
//! (their arena index). An `OrderTree` keeps the handles in canonical
//! order, weighted 1 while visible and 0 once tombstoned, which makes
//! insert, delete, rank and select O(log n) plus the sibling scan.
//!
//! Nothing is ever physically removed. Tombstones keep their slot in the
//! canonical order forever so that anchors pointing at them keep resolving.

use std::fmt;
use std::fmt::Write;

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use tracing::trace;
use tracing::warn;

use super::id::ElementId;
use super::id::Origin;
use super::id::sorts_before;
use super::op::Op;
use super::order_tree::Handle;
use super::order_tree::OrderTree;
use super::order_tree::Rank;
use crate::error::SequenceError;
use crate::key::Hash;

/// The content of one element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Char(char),
    /// Opaque handle to an object owned by the document model.
    Embed(u64),
}

impl Value {
    /// Rendered in text as U+FFFC for embeds.
    pub const EMBED_CHAR: char = '\u{FFFC}';

    pub fn as_char(&self) -> Option<char> {
        return match self {
            Value::Char(c) => Some(*c),
            Value::Embed(_) => None,
        };
    }

    fn render(&self) -> char {
        return match self {
            Value::Char(c) => *c,
            Value::Embed(_) => Value::EMBED_CHAR,
        };
    }
}

impl From<char> for Value {
    fn from(c: char) -> Value {
        return Value::Char(c);
    }
}

/// One atomic unit of the sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub id: ElementId,
    /// Fixed at insertion, never recomputed.
    pub origin: Origin,
    pub value: Value,
    pub deleted: bool,
}

/// How an edit moved the visible text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shift {
    /// A visible element appeared at `index`; everything at or after it moved right.
    Inserted { index: usize },
    /// The visible element at `index` disappeared; everything after it moved left.
    Deleted { index: usize },
    /// Nothing visible changed.
    Unchanged,
}

/// All elements of one replica, live and tombstoned, in canonical order.
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    /// Arena of elements, indexed by handle.
    elements: Vec<Element>,
    handles: FxHashMap<ElementId, Handle>,
    order: OrderTree,
    /// Deletes that arrived before their insert.
    deferred_deletes: FxHashSet<ElementId>,
    /// Highest counter of any element seen.
    max_counter: u64,
}

impl Sequence {
    pub fn new() -> Sequence {
        return Sequence::default();
    }

    /// Number of visible (non-deleted) elements.
    pub fn visible_len(&self) -> usize {
        return self.order.total_weight() as usize;
    }

    /// Number of elements including tombstones.
    pub fn len(&self) -> usize {
        return self.order.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.order.is_empty();
    }

    pub fn tombstone_count(&self) -> usize {
        return self.len() - self.visible_len();
    }

    /// Deletes still waiting for their element to arrive.
    pub fn deferred_delete_count(&self) -> usize {
        return self.deferred_deletes.len();
    }

    pub fn max_counter(&self) -> u64 {
        return self.max_counter;
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        return self.handles.contains_key(id);
    }

    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        let handle = *self.handles.get(id)?;
        return Some(&self.elements[handle as usize]);
    }

    fn rank_of(&self, id: &ElementId) -> Option<Rank> {
        let handle = *self.handles.get(id)?;
        return self.order.rank(handle);
    }

    /// Insert a new live element after `origin`.
    ///
    /// Re-inserting an element that already exists with the same origin and
    /// value is a no-op. If a delete for `id` arrived earlier, the element
    /// is inserted as a tombstone.
    pub fn insert_after(&mut self, origin: Origin, id: ElementId, value: Value) -> Result<Shift, SequenceError> {
        if let Some(&handle) = self.handles.get(&id) {
            let existing = &self.elements[handle as usize];
            if existing.origin == origin && existing.value == value {
                trace!(%id, "ignoring replayed insert");
                return Ok(Shift::Unchanged);
            }
            warn!(%id, "insert conflicts with an existing element");
            return Err(SequenceError::DuplicateId(id));
        }

        let start = match origin {
            Origin::Start => 0,
            Origin::After(origin_id) => match self.rank_of(&origin_id) {
                Some(rank) => rank.index + 1,
                None => return Err(SequenceError::MissingOrigin(origin_id)),
            },
        };
        let index = self.integration_index(start, origin, &id);

        let deleted = self.deferred_deletes.remove(&id);
        let handle = self.elements.len() as Handle;
        self.elements.push(Element { id, origin, value, deleted });
        self.handles.insert(id, handle);
        self.order.insert(index, handle, if deleted { 0 } else { 1 });
        self.max_counter = self.max_counter.max(id.counter);

        if deleted {
            trace!(%id, "inserted as tombstone, delete arrived first");
            return Ok(Shift::Unchanged);
        }
        let visible = self.order.rank(handle).map_or(0, |rank| rank.weight_before as usize);
        return Ok(Shift::Inserted { index: visible });
    }

    /// Find where a new element goes, starting just right of its origin.
    ///
    /// Siblings that sort before the new element are skipped together with
    /// their whole subtree. The subtree of a skipped sibling is exactly the
    /// run of following elements whose origin was itself skipped.
    fn integration_index(&self, start: usize, origin: Origin, id: &ElementId) -> usize {
        let mut index = start;
        let mut skipped: FxHashSet<ElementId> = FxHashSet::default();
        while let Some(handle) = self.order.get(index) {
            let other = &self.elements[handle as usize];
            let inside = if other.origin == origin {
                sorts_before(&other.id, id)
            } else {
                match other.origin {
                    Origin::After(parent) => skipped.contains(&parent),
                    Origin::Start => false,
                }
            };
            if !inside {
                break;
            }
            skipped.insert(other.id);
            index += 1;
        }
        return index;
    }

    /// Tombstone an element.
    ///
    /// Deleting twice is a no-op. Deleting an element that has not arrived
    /// yet records the intent and applies it when the insert shows up.
    pub fn mark_deleted(&mut self, id: ElementId) -> Shift {
        let handle = match self.handles.get(&id) {
            Some(&handle) => handle,
            None => {
                trace!(%id, "deferring delete of unseen element");
                self.deferred_deletes.insert(id);
                return Shift::Unchanged;
            }
        };

        let element = &mut self.elements[handle as usize];
        if element.deleted {
            return Shift::Unchanged;
        }
        element.deleted = true;
        self.order.set_weight(handle, 0);

        let visible = self.order.rank(handle).map_or(0, |rank| rank.weight_before as usize);
        return Shift::Deleted { index: visible };
    }

    /// Number of visible elements strictly before `id` in canonical order.
    ///
    /// Defined for tombstones too: it is where the deleted element would
    /// sit if it were still visible.
    pub fn visible_index_of(&self, id: &ElementId) -> Result<usize, SequenceError> {
        return match self.rank_of(id) {
            Some(rank) => Ok(rank.weight_before as usize),
            None => Err(SequenceError::UnknownElement(*id)),
        };
    }

    /// Number of visible elements at or before `id` in canonical order.
    pub fn visible_through(&self, id: &ElementId) -> Result<usize, SequenceError> {
        return match self.rank_of(id) {
            Some(rank) => Ok((rank.weight_before + rank.weight) as usize),
            None => Err(SequenceError::UnknownElement(*id)),
        };
    }

    /// The live element at a visible index.
    pub fn element_at(&self, index: usize) -> Result<ElementId, SequenceError> {
        return match self.order.find_by_weight(index as u64) {
            Some((_, handle)) => Ok(self.elements[handle as usize].id),
            None => Err(SequenceError::IndexOutOfRange { index, len: self.visible_len() }),
        };
    }

    /// All elements in canonical order, tombstones included.
    pub fn iter(&self) -> impl Iterator<Item = &Element> + '_ {
        return self.order.iter().map(move |handle| &self.elements[handle as usize]);
    }

    /// Visible values in order.
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        return self.iter().filter(|e| !e.deleted).map(|e| e.value);
    }

    /// The whole state as an operation stream.
    ///
    /// Inserts come in canonical order, so every origin precedes the
    /// elements typed after it. Deletes follow, including ones still
    /// waiting for their element.
    pub fn ops(&self) -> Vec<Op> {
        let mut ops = Vec::with_capacity(self.len() + self.tombstone_count());
        for element in self.iter() {
            ops.push(Op::insert(element.id, element.origin, element.value));
        }
        for element in self.iter() {
            if element.deleted {
                ops.push(Op::delete(element.id));
            }
        }
        let mut deferred: Vec<_> = self.deferred_deletes.iter().copied().collect();
        deferred.sort();
        ops.extend(deferred.into_iter().map(Op::delete));
        return ops;
    }

    /// Fingerprint of the canonical order and tombstone flags.
    ///
    /// Two replicas have converged iff their digests match.
    pub fn digest(&self) -> Hash {
        let mut bytes = Vec::with_capacity(self.len() * 50);
        for element in self.iter() {
            bytes.extend_from_slice(&element.id.counter.to_le_bytes());
            bytes.extend_from_slice(element.id.replica.as_bytes());
            match element.value {
                Value::Char(c) => {
                    bytes.push(0);
                    bytes.extend_from_slice(&(c as u32).to_le_bytes());
                }
                Value::Embed(handle) => {
                    bytes.push(1);
                    bytes.extend_from_slice(&handle.to_le_bytes());
                }
            }
            bytes.push(element.deleted as u8);
        }
        return crate::key::hash(&bytes);
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in self.values() {
            f.write_char(value.render())?;
        }
        return Ok(());
    }
}
