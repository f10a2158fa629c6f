//! Per-resource admission queue
//!
//! A `Resource` is one contended name: at most one active lock plus a FIFO
//! queue of waiting locks. Promotion pops the queue head, skipping (and
//! closing) expired waiters along the way, so an expired waiter is never
//! promoted.

use std::collections::VecDeque;

use tracing::debug;

use crate::lock::{CloseReason, Lock, LockSnapshot};

/// One contended name holding an active slot and a FIFO waiting queue.
#[derive(Debug)]
pub struct Resource {
    name: String,
    active: Option<Lock>,
    waiters: VecDeque<Lock>,
}

impl Resource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: None,
            waiters: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// No active lock and no waiters.
    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.waiters.is_empty()
    }

    /// Sole admission entry point: activate immediately when the slot is
    /// free, otherwise append to the queue tail.
    pub fn add_lock(&mut self, mut lock: Lock) {
        if self.active.is_none() {
            // An empty active slot implies a drained queue (promote never
            // leaves a promotable waiter behind).
            debug_assert!(self.waiters.is_empty());
            lock.mark_active();
            debug!(resource = %self.name, uid = %lock.uid(), "lock activated immediately");
            self.active = Some(lock);
        } else {
            debug!(resource = %self.name, uid = %lock.uid(), "lock queued");
            self.waiters.push_back(lock);
        }
    }

    /// Close the active lock with `reason` and promote the first non-expired
    /// waiter, closing expired ones encountered along the way. Returns
    /// whether there was an active lock to close.
    pub fn promote(&mut self, reason: CloseReason) -> bool {
        let Some(mut previous) = self.active.take() else {
            return false;
        };
        previous.close(reason);
        while let Some(mut lock) = self.waiters.pop_front() {
            if lock.is_expired() {
                lock.close(CloseReason::Expired);
                continue;
            }
            lock.mark_active();
            debug!(resource = %self.name, uid = %lock.uid(), "waiting lock promoted");
            self.active = Some(lock);
            break;
        }
        true
    }

    /// Release the active lock, only for a matching, non-expired uid.
    /// An expired-but-unswept holder is already dead to its caller; the
    /// sweep tick performs its promotion.
    pub fn release(&mut self, uid: &str) -> bool {
        match &self.active {
            Some(lock) if lock.uid() == uid && !lock.is_expired() => {
                self.promote(CloseReason::ReleasedByHolder)
            }
            _ => false,
        }
    }

    /// Delete one lock by uid, active or waiting. Deleting the active lock
    /// releases it via promotion; a queued lock is closed and removed.
    pub fn delete_lock(&mut self, uid: &str, reason: CloseReason) -> bool {
        if self.active.as_ref().is_some_and(|lock| lock.uid() == uid) {
            return self.promote(reason);
        }
        if let Some(position) = self.waiters.iter().position(|lock| lock.uid() == uid)
            && let Some(mut lock) = self.waiters.remove(position)
        {
            lock.close(reason);
            return true;
        }
        false
    }

    /// Close and drop every lock (queue first, then the active one).
    /// Returns whether anything existed.
    pub fn delete_all_locks(&mut self, reason: CloseReason) -> bool {
        let had_any = !self.is_empty();
        for mut lock in self.waiters.drain(..) {
            lock.close(reason);
        }
        if let Some(mut lock) = self.active.take() {
            lock.close(reason);
        }
        had_any
    }

    /// Read-only lookup by uid. An expired match is reported as not-found
    /// but left in place for the next sweep.
    pub fn get(&self, uid: &str) -> Option<LockSnapshot> {
        self.active
            .iter()
            .chain(self.waiters.iter())
            .find(|lock| lock.uid() == uid)
            .filter(|lock| !lock.is_expired())
            .map(Lock::snapshot)
    }

    /// Snapshots of every lock, active first, then waiters in FIFO order.
    pub fn snapshots(&self) -> Vec<LockSnapshot> {
        self.active
            .iter()
            .chain(self.waiters.iter())
            .map(Lock::snapshot)
            .collect()
    }

    /// One expiry pass: evict and close expired waiters preserving survivor
    /// order, then promote if the active lock itself is expired. Safe to
    /// interleave with any other mutation; sweeping a freshly promoted or
    /// emptied resource is a no-op.
    pub fn sweep_expired(&mut self) {
        let mut survivors = VecDeque::with_capacity(self.waiters.len());
        while let Some(mut lock) = self.waiters.pop_front() {
            if lock.is_expired() {
                debug!(resource = %self.name, uid = %lock.uid(), "waiting lock expired");
                lock.close(CloseReason::Expired);
            } else {
                survivors.push_back(lock);
            }
        }
        self.waiters = survivors;
        if self.active.as_ref().is_some_and(Lock::is_expired) {
            debug!(resource = %self.name, "active lock expired");
            self.promote(CloseReason::Expired);
        }
    }
}
