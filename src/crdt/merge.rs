// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Applying remote operations in whatever order they arrive.
//!
//! The merge algorithm:
//! 1. Deletes go straight to the store, which defers them itself if the
//!    target has not arrived.
//! 2. An insert whose origin exists is applied immediately.
//! 3. An insert whose origin is missing waits in a queue keyed by that
//!    origin. Whenever an element is inserted, the inserts waiting on it
//!    are released, and so on transitively.
//!
//! All ordering decisions are made by `Sequence::insert_after`, so
//! replicas that apply the same set of operations converge no matter how
//! delivery was interleaved.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;
use tracing::warn;

use super::Crdt;
use super::id::ElementId;
use super::id::Origin;
use super::op::Op;
use super::sequence::Sequence;
use super::sequence::Shift;
use crate::error::MergeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeConfig {
    /// Upper bound on inserts parked while waiting for their origin.
    pub max_pending: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        return MergeConfig { max_pending: 1 << 16 };
    }
}

/// Buffers out-of-order inserts until their origin shows up.
#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    /// Parked inserts, keyed by the origin they are waiting for.
    waiting: FxHashMap<ElementId, SmallVec<[Op; 2]>>,
    pending: usize,
    config: MergeConfig,
}

impl Reconciler {
    pub fn new() -> Reconciler {
        return Reconciler::default();
    }

    pub fn with_config(config: MergeConfig) -> Reconciler {
        return Reconciler {
            waiting: FxHashMap::default(),
            pending: 0,
            config,
        };
    }

    /// Number of inserts parked behind a missing origin.
    pub fn pending_len(&self) -> usize {
        return self.pending;
    }

    /// Origins that parked inserts are waiting for.
    pub fn missing_origins(&self) -> impl Iterator<Item = &ElementId> + '_ {
        return self.waiting.keys();
    }

    /// Apply one remote operation, returning the visible shifts it caused.
    ///
    /// A single insert can release a chain of parked inserts, so more than
    /// one shift may come back.
    pub fn apply(&mut self, seq: &mut Sequence, op: Op) -> Result<Vec<Shift>, MergeError> {
        let mut shifts = Vec::new();
        match op {
            Op::Delete { id } => {
                push_shift(&mut shifts, seq.mark_deleted(id));
            }
            Op::Insert { id, origin, value } => {
                if let Origin::After(missing) = origin {
                    if !seq.contains(&missing) {
                        self.park(missing, op)?;
                        return Ok(shifts);
                    }
                }
                push_shift(&mut shifts, seq.insert_after(origin, id, value)?);
                self.release(seq, id, &mut shifts)?;
            }
        }
        return Ok(shifts);
    }

    /// Apply a batch of remote operations in the given order.
    pub fn apply_all<I>(&mut self, seq: &mut Sequence, ops: I) -> Result<Vec<Shift>, MergeError>
    where
        I: IntoIterator<Item = Op>,
    {
        let mut shifts = Vec::new();
        for op in ops {
            shifts.extend(self.apply(seq, op)?);
        }
        return Ok(shifts);
    }

    /// Check that nothing is stuck.
    ///
    /// Under a correct transport every origin eventually arrives. Calling
    /// this once the transport claims to be done turns a permanently
    /// missing origin into an error instead of silently lost text.
    pub fn finish(&self) -> Result<(), MergeError> {
        // Report the smallest id so the error is deterministic
        return match self.waiting.iter().min_by_key(|(missing, _)| **missing) {
            Some((missing, ops)) => Err(MergeError::UnresolvedOrigin {
                missing: *missing,
                waiting: ops.len(),
            }),
            None => Ok(()),
        };
    }

    fn park(&mut self, missing: ElementId, op: Op) -> Result<(), MergeError> {
        if self.pending >= self.config.max_pending {
            warn!(%missing, limit = self.config.max_pending, "deferred operation buffer full");
            return Err(MergeError::BufferFull { limit: self.config.max_pending });
        }
        debug!(%missing, id = %op.id(), "parking insert until its origin arrives");
        self.waiting.entry(missing).or_default().push(op);
        self.pending += 1;
        return Ok(());
    }

    /// Release inserts whose origin reached the sequence some other way,
    /// e.g. through a state merge.
    pub fn release_ready(&mut self, seq: &mut Sequence) -> Result<Vec<Shift>, MergeError> {
        let mut ready: Vec<ElementId> = self.waiting.keys().filter(|origin| seq.contains(origin)).copied().collect();
        ready.sort();

        let mut shifts = Vec::new();
        let mut first_error = None;
        for origin in ready {
            if let Err(err) = self.release(seq, origin, &mut shifts) {
                first_error.get_or_insert(err);
            }
        }
        return match first_error {
            Some(err) => Err(err),
            None => Ok(shifts),
        };
    }

    /// Insert everything that was waiting on `arrived`, transitively.
    ///
    /// A conflicting insert is dropped and reported once the rest of the
    /// released inserts have been applied.
    fn release(&mut self, seq: &mut Sequence, arrived: ElementId, shifts: &mut Vec<Shift>) -> Result<(), MergeError> {
        let mut ready: Vec<ElementId> = vec![arrived];
        let mut first_error = None;
        while let Some(origin) = ready.pop() {
            let parked = match self.waiting.remove(&origin) {
                Some(parked) => parked,
                None => continue,
            };
            self.pending -= parked.len();
            debug!(%origin, released = parked.len(), "origin arrived, releasing parked inserts");
            for op in parked {
                if let Op::Insert { id, origin, value } = op {
                    match seq.insert_after(origin, id, value) {
                        Ok(shift) => {
                            push_shift(shifts, shift);
                            ready.push(id);
                        }
                        Err(err) => {
                            warn!(%id, error = %err, "dropping released insert");
                            first_error.get_or_insert(MergeError::from(err));
                        }
                    }
                }
            }
        }
        return match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        };
    }
}

fn push_shift(shifts: &mut Vec<Shift>, shift: Shift) {
    if shift != Shift::Unchanged {
        shifts.push(shift);
    }
}

/// Merge a batch of remote operations into `local`.
///
/// Operations may arrive in any order; every dependency must be somewhere
/// in the batch or already in `local`.
pub fn merge<I>(local: &mut Sequence, remote_ops: I) -> Result<Vec<Shift>, MergeError>
where
    I: IntoIterator<Item = Op>,
{
    let mut reconciler = Reconciler::new();
    let shifts = reconciler.apply_all(local, remote_ops)?;
    reconciler.finish()?;
    return Ok(shifts);
}

impl Crdt for Sequence {
    fn merge(&mut self, other: &Self) {
        // other.ops() lists origins first, so only dependents of a
        // conflicting insert can end up parked
        let mut reconciler = Reconciler::new();
        for op in other.ops() {
            if let Err(err) = reconciler.apply(self, op) {
                warn!(id = %op.id(), error = %err, "state merge skipped a conflicting operation");
            }
        }
        if let Err(err) = reconciler.finish() {
            warn!(error = %err, "state merge left operations without an origin");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::sequence::Value;
    use crate::error::SequenceError;
    use crate::key::KeyPub;

    fn id(counter: u64, byte: u8) -> ElementId {
        return ElementId::new(counter, KeyPub::from_bytes([byte; 32]));
    }

    /// Ops typing `text` at the start, counters from 1.
    fn typing(text: &str, byte: u8) -> Vec<Op> {
        let mut ops = Vec::new();
        let mut origin = Origin::Start;
        for (i, c) in text.chars().enumerate() {
            let next = id(i as u64 + 1, byte);
            ops.push(Op::insert(next, origin, Value::Char(c)));
            origin = Origin::After(next);
        }
        return ops;
    }

    #[test]
    fn in_order_delivery() {
        let mut seq = Sequence::new();
        let shifts = merge(&mut seq, typing("abc", 1)).unwrap();
        assert_eq!(seq.to_string(), "abc");
        assert_eq!(shifts.len(), 3);
    }

    #[test]
    fn reversed_delivery_is_buffered() {
        let mut seq = Sequence::new();
        let mut reconciler = Reconciler::new();
        let mut ops = typing("abc", 1);
        ops.reverse();

        reconciler.apply(&mut seq, ops[0]).unwrap();
        reconciler.apply(&mut seq, ops[1]).unwrap();
        assert_eq!(reconciler.pending_len(), 2);
        assert!(seq.is_empty());

        let shifts = reconciler.apply(&mut seq, ops[2]).unwrap();
        assert_eq!(shifts.len(), 3);
        assert_eq!(reconciler.pending_len(), 0);
        assert_eq!(seq.to_string(), "abc");
        assert!(reconciler.finish().is_ok());
    }

    #[test]
    fn delete_before_insert() {
        let mut seq = Sequence::new();
        let mut ops = typing("ab", 1);
        ops.insert(0, Op::delete(id(1, 1)));
        merge(&mut seq, ops).unwrap();
        assert_eq!(seq.to_string(), "b");
    }

    #[test]
    fn replay_is_idempotent() {
        let mut seq = Sequence::new();
        merge(&mut seq, typing("abc", 1)).unwrap();
        merge(&mut seq, vec![Op::delete(id(2, 1))]).unwrap();
        let before = seq.digest();

        let mut again = typing("abc", 1);
        again.push(Op::delete(id(2, 1)));
        let shifts = merge(&mut seq, again).unwrap();
        assert!(shifts.is_empty());
        assert_eq!(seq.digest(), before);
    }

    #[test]
    fn missing_origin_is_reported() {
        let mut seq = Sequence::new();
        let ops = vec![Op::insert(id(5, 1), Origin::After(id(4, 1)), Value::Char('x'))];
        let result = merge(&mut seq, ops);
        assert_eq!(
            result,
            Err(MergeError::UnresolvedOrigin { missing: id(4, 1), waiting: 1 })
        );
    }

    #[test]
    fn buffer_limit_is_enforced() {
        let mut seq = Sequence::new();
        let mut reconciler = Reconciler::with_config(MergeConfig { max_pending: 1 });
        let mut ops = typing("abc", 1);
        ops.reverse();

        reconciler.apply(&mut seq, ops[0]).unwrap();
        assert_eq!(
            reconciler.apply(&mut seq, ops[1]),
            Err(MergeError::BufferFull { limit: 1 })
        );
    }

    #[test]
    fn missing_origins_lists_what_is_awaited() {
        let mut seq = Sequence::new();
        let mut reconciler = Reconciler::new();
        let ops = typing("ab", 1);
        reconciler.apply(&mut seq, ops[1]).unwrap();
        let missing: Vec<_> = reconciler.missing_origins().copied().collect();
        assert_eq!(missing, vec![id(1, 1)]);
    }

    #[test]
    fn state_merge_converges() {
        let mut base = Sequence::new();
        merge(&mut base, typing("hello", 1)).unwrap();

        let mut left = base.clone();
        let mut right = base.clone();
        left.insert_after(Origin::After(id(1, 1)), id(6, 2), Value::Char('X')).unwrap();
        right.insert_after(Origin::After(id(1, 1)), id(6, 3), Value::Char('Y')).unwrap();
        right.mark_deleted(id(5, 1));

        let left_before = left.clone();
        left.merge(&right);
        right.merge(&left_before);

        assert_eq!(left.digest(), right.digest());
        assert_eq!(left.to_string(), "hYXell");
    }

    #[test]
    fn conflicting_release_keeps_its_siblings() {
        let mut seq = Sequence::new();
        seq.insert_after(Origin::Start, id(2, 1), Value::Char('q')).unwrap();

        let mut reconciler = Reconciler::new();
        reconciler.apply(&mut seq, Op::insert(id(2, 1), Origin::After(id(1, 1)), Value::Char('x'))).unwrap();
        reconciler.apply(&mut seq, Op::insert(id(3, 1), Origin::After(id(1, 1)), Value::Char('y'))).unwrap();
        assert_eq!(reconciler.pending_len(), 2);

        let result = reconciler.apply(&mut seq, Op::insert(id(1, 1), Origin::Start, Value::Char('a')));
        assert_eq!(result, Err(MergeError::Sequence(SequenceError::DuplicateId(id(2, 1)))));
        assert!(seq.contains(&id(3, 1)));
        assert_eq!(reconciler.pending_len(), 0);
        assert_eq!(seq.to_string(), "qay");
    }

    #[test]
    fn state_merge_skips_only_the_conflicting_op() {
        let mut other = Sequence::new();
        merge(&mut other, typing("abc", 1)).unwrap();
        other.mark_deleted(id(1, 1));

        let mut local = Sequence::new();
        local.insert_after(Origin::Start, id(3, 1), Value::Char('z')).unwrap();
        local.merge(&other);

        assert!(local.contains(&id(2, 1)));
        assert!(local.get(&id(1, 1)).unwrap().deleted);
        assert_eq!(local.get(&id(3, 1)).unwrap().value, Value::Char('z'));
        assert_eq!(local.to_string(), "zb");
    }
}
