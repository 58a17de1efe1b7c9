#![forbid(unsafe_code)]

//! Single-slot, cancellable deadline timers.
//!
//! [`TimerQueue`] replaces ad-hoc "set a timeout, clear the timeout" pairs with
//! one keyed table. Arming a key that is already pending replaces its deadline,
//! so at most one timer per key exists at any time.
//!
//! Nothing here reads a clock. The owner polls with [`TimerQueue::pop_due`]
//! whenever it learns the current time.
//!
//! # Invariants
//!
//! 1. At most one pending deadline per key.
//! 2. `pop_due(now)` yields keys in deadline order; ties break by arm order.
//! 3. A cancelled key never fires, even if its old deadline has passed.

use std::hash::Hash;

use ahash::AHashMap;
use web_time::Instant;

#[derive(Debug, Clone, Copy)]
struct Slot {
    deadline: Instant,
    seq: u64,
}

/// Keyed single-slot timer table.
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    slots: AHashMap<K, Slot>,
    next_seq: u64,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            slots: AHashMap::new(),
            next_seq: 0,
        }
    }
}

impl<K: Copy + Eq + Hash> TimerQueue<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key` to fire at `deadline`, replacing any pending deadline for it.
    pub fn schedule_once(&mut self, key: K, deadline: Instant) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.slots.insert(key, Slot { deadline, seq });
    }

    /// Disarm `key`. Returns whether it was pending.
    pub fn cancel(&mut self, key: K) -> bool {
        self.slots.remove(&key).is_some()
    }

    /// Disarm every key matching `pred`. Returns how many were removed.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.slots.len();
        self.slots.retain(|k, _| !pred(k));
        before - self.slots.len()
    }

    /// Disarm everything.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    #[inline]
    #[must_use]
    pub fn is_pending(&self, key: K) -> bool {
        self.slots.contains_key(&key)
    }

    /// Deadline of `key`, if pending.
    #[must_use]
    pub fn deadline(&self, key: K) -> Option<Instant> {
        self.slots.get(&key).map(|s| s.deadline)
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.values().map(|s| s.deadline).min()
    }

    /// Remove and return the earliest timer due at or before `now`.
    ///
    /// Call repeatedly until `None`: a handler that re-arms or cancels other
    /// keys between pops is observed by the next pop.
    pub fn pop_due(&mut self, now: Instant) -> Option<(K, Instant)> {
        let (key, slot) = self
            .slots
            .iter()
            .filter(|(_, s)| s.deadline <= now)
            .min_by(|(_, a), (_, b)| a.deadline.cmp(&b.deadline).then(a.seq.cmp(&b.seq)))
            .map(|(k, s)| (*k, *s))?;
        self.slots.remove(&key);
        Some((key, slot.deadline))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
