// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! A text replica edited by visible index.
//!
//! `Text` turns positional edits into id-based operations: it mints ids
//! from a Lamport clock, applies the operation to its own sequence, and
//! records it in an `OpLog` for shipping to peers. Remote operations come
//! back in through a `Reconciler`.

use std::fmt;

use tracing::warn;

use super::Crdt;
use super::clock::LamportClock;
use super::id::ElementId;
use super::id::Origin;
use super::id::ReplicaId;
use super::merge::MergeConfig;
use super::merge::Reconciler;
use super::op::Op;
use super::op::OpLog;
use super::sequence::Sequence;
use super::sequence::Shift;
use super::sequence::Value;
use crate::cursor::Cursor;
use crate::error::AnchorError;
use crate::error::MergeError;
use crate::error::SequenceError;

pub struct Text {
    seq: Sequence,
    replica: ReplicaId,
    clock: LamportClock,
    /// Operations this replica produced.
    log: OpLog,
    reconciler: Reconciler,
}

impl Text {
    pub fn new(replica: ReplicaId) -> Text {
        return Text::with_config(replica, MergeConfig::default());
    }

    pub fn with_config(replica: ReplicaId, config: MergeConfig) -> Text {
        return Text {
            seq: Sequence::new(),
            replica,
            clock: LamportClock::new(),
            log: OpLog::new(),
            reconciler: Reconciler::with_config(config),
        };
    }

    pub fn replica(&self) -> ReplicaId {
        return self.replica;
    }

    pub fn sequence(&self) -> &Sequence {
        return &self.seq;
    }

    /// Visible length.
    pub fn len(&self) -> usize {
        return self.seq.visible_len();
    }

    pub fn is_empty(&self) -> bool {
        return self.seq.visible_len() == 0;
    }

    fn next_id(&mut self) -> ElementId {
        let counter = self.clock.update(self.seq.max_counter());
        return ElementId::new(counter, self.replica);
    }

    /// Insert `text` so that its first character lands at visible `index`.
    pub fn insert_at(&mut self, index: usize, text: &str) -> Result<Vec<ElementId>, SequenceError> {
        return self.insert_values(index, text.chars().map(Value::Char));
    }

    /// Insert a single non-text element at visible `index`.
    pub fn insert_embed(&mut self, index: usize, handle: u64) -> Result<ElementId, SequenceError> {
        let ids = self.insert_values(index, std::iter::once(Value::Embed(handle)))?;
        return Ok(ids[0]);
    }

    fn insert_values<I>(&mut self, index: usize, values: I) -> Result<Vec<ElementId>, SequenceError>
    where
        I: Iterator<Item = Value>,
    {
        let len = self.seq.visible_len();
        if index > len {
            return Err(SequenceError::IndexOutOfRange { index, len });
        }
        let mut origin = match index {
            0 => Origin::Start,
            _ => Origin::After(self.seq.element_at(index - 1)?),
        };

        let mut ids = Vec::new();
        for value in values {
            let id = self.next_id();
            self.seq.insert_after(origin, id, value)?;
            self.log.push(Op::insert(id, origin, value));
            origin = Origin::After(id);
            ids.push(id);
        }
        return Ok(ids);
    }

    /// Delete the visible element at `index`.
    pub fn delete_at(&mut self, index: usize) -> Result<ElementId, SequenceError> {
        let id = self.seq.element_at(index)?;
        self.seq.mark_deleted(id);
        self.log.push(Op::delete(id));
        return Ok(id);
    }

    /// Delete `len` visible elements starting at `start`.
    pub fn delete_range(&mut self, start: usize, len: usize) -> Result<(), SequenceError> {
        let visible = self.seq.visible_len();
        let end = start.checked_add(len).unwrap_or(usize::MAX);
        if end > visible {
            return Err(SequenceError::IndexOutOfRange { index: end, len: visible });
        }
        for _ in 0..len {
            self.delete_at(start)?;
        }
        return Ok(());
    }

    /// Create a cursor at the boundary before visible `index`.
    pub fn cursor_at(&self, index: i64) -> Result<Cursor, AnchorError> {
        return Cursor::at(&self.seq, index);
    }

    pub fn cursor_index(&self, cursor: &Cursor) -> Result<usize, AnchorError> {
        return cursor.index(&self.seq);
    }

    /// Operations produced locally, in order.
    pub fn local_ops(&self) -> &OpLog {
        return &self.log;
    }

    /// Apply remote operations, in any order.
    pub fn apply<I>(&mut self, ops: I) -> Result<Vec<Shift>, MergeError>
    where
        I: IntoIterator<Item = Op>,
    {
        let shifts = self.reconciler.apply_all(&mut self.seq, ops)?;
        self.clock.observe(self.seq.max_counter());
        return Ok(shifts);
    }

    /// Remote inserts still waiting for their origin.
    pub fn pending_len(&self) -> usize {
        return self.reconciler.pending_len();
    }

    /// Fail if any remote insert is still waiting for its origin.
    pub fn finish(&self) -> Result<(), MergeError> {
        return self.reconciler.finish();
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return fmt::Display::fmt(&self.seq, f);
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("Text")
            .field("replica", &self.replica)
            .field("text", &self.seq.to_string())
            .field("pending", &self.reconciler.pending_len())
            .finish();
    }
}

impl Crdt for Text {
    fn merge(&mut self, other: &Self) {
        self.seq.merge(&other.seq);
        // The merge may have delivered origins that parked inserts wait on
        if let Err(err) = self.reconciler.release_ready(&mut self.seq) {
            warn!(error = %err, "releasing parked inserts after a state merge failed");
        }
        self.clock.observe(self.seq.max_counter());
    }
}
