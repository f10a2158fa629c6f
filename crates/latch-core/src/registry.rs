//! Lock engine: the resource registry and its exclusion domain
//!
//! `LockEngine` owns every `Resource` behind a single mutex; concurrent
//! acquires, releases, deletions, and sweep ticks serialize on it. No I/O
//! happens under the mutex: notification delivery is a one-shot channel
//! send (a task wakeup), and HAL rendering happens on snapshots taken
//! after the guard is dropped.
//!
//! The engine is an explicitly constructed handle passed into every
//! transport handler; there is no process-wide singleton.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::{debug, info};

use latch_common::LatchError;

use crate::lock::{CloseReason, Lock, LockOutcome, LockSnapshot};
use crate::resource::Resource;

/// Parameters of one lock acquisition, as posted by the client.
#[derive(Clone, Debug, Deserialize)]
pub struct AcquireRequest {
    pub title: String,
    pub wait: i64,
    pub lifetime: i64,
}

impl AcquireRequest {
    pub fn new(title: &str, wait: i64, lifetime: i64) -> Self {
        Self {
            title: title.to_string(),
            wait,
            lifetime,
        }
    }

    pub fn validate(&self) -> Result<(), LatchError> {
        if self.title.trim().is_empty() {
            return Err(LatchError::InvalidParams(
                "title must not be empty".to_string(),
            ));
        }
        if self.wait < 0 {
            return Err(LatchError::InvalidParams(
                "wait must be a non-negative integer".to_string(),
            ));
        }
        if self.lifetime < 0 {
            return Err(LatchError::InvalidParams(
                "lifetime must be a non-negative integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Handle returned by [`LockEngine::acquire`]: the lock's uid plus the
/// one-shot receiver resolving to its terminal outcome.
#[derive(Debug)]
pub struct PendingLock {
    pub uid: String,
    pub outcome: oneshot::Receiver<LockOutcome>,
}

/// Cloneable handle over the lock registry.
#[derive(Clone, Default)]
pub struct LockEngine {
    resources: Arc<Mutex<HashMap<String, Resource>>>,
}

/// Sole auto-creation point for registry entries: any operation touching an
/// unknown name creates it, reads included. Entries are only destroyed by
/// explicit resource deletion.
fn vivify<'a>(resources: &'a mut HashMap<String, Resource>, name: &str) -> &'a mut Resource {
    resources
        .entry(name.to_string())
        .or_insert_with(|| Resource::new(name))
}

impl LockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit one lock request on `resource_name`. The returned receiver
    /// resolves to `Granted` (possibly before this call returns, when the
    /// resource is free) or `Closed(reason)`; the caller awaits it instead
    /// of being called back.
    pub fn acquire(
        &self,
        resource_name: &str,
        request: &AcquireRequest,
    ) -> Result<PendingLock, LatchError> {
        request.validate()?;
        let (tx, rx) = oneshot::channel();
        let lock = Lock::new(
            resource_name,
            &request.title,
            request.wait,
            request.lifetime,
            tx,
        );
        let uid = lock.uid().to_string();
        {
            let mut resources = self.resources.lock();
            vivify(&mut resources, resource_name).add_lock(lock);
        }
        info!(
            resource = %resource_name,
            uid = %uid,
            wait = request.wait,
            lifetime = request.lifetime,
            "lock requested"
        );
        Ok(PendingLock { uid, outcome: rx })
    }

    /// Release an active lock. Only succeeds for a matching, non-expired
    /// active uid; the first non-expired waiter is promoted in its place.
    pub fn release(&self, resource_name: &str, uid: &str) -> bool {
        let released = {
            let mut resources = self.resources.lock();
            vivify(&mut resources, resource_name).release(uid)
        };
        if released {
            info!(resource = %resource_name, uid = %uid, "lock released");
        }
        released
    }

    /// Non-mutating lookup; absent, closed, and expired uids are all
    /// not-found.
    pub fn get(&self, resource_name: &str, uid: &str) -> Option<LockSnapshot> {
        let mut resources = self.resources.lock();
        vivify(&mut resources, resource_name).get(uid)
    }

    /// Delete one lock by uid, active or waiting.
    pub fn delete_lock(&self, resource_name: &str, uid: &str) -> bool {
        let deleted = {
            let mut resources = self.resources.lock();
            vivify(&mut resources, resource_name).delete_lock(uid, CloseReason::DeletedByClient)
        };
        if deleted {
            info!(resource = %resource_name, uid = %uid, "lock deleted");
        }
        deleted
    }

    /// Names of every registry entry, vivified-but-empty ones included.
    pub fn resource_names(&self) -> Vec<String> {
        let resources = self.resources.lock();
        let mut names: Vec<String> = resources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Ordered snapshots of one resource: active lock first, then waiters
    /// in FIFO order. A resource holding no locks is not-found.
    pub fn resource_snapshot(&self, resource_name: &str) -> Option<Vec<LockSnapshot>> {
        let mut resources = self.resources.lock();
        let resource = vivify(&mut resources, resource_name);
        if resource.is_empty() {
            None
        } else {
            Some(resource.snapshots())
        }
    }

    /// Remove one resource entirely, closing every lock it held with
    /// `DeletedByAdmin`. Returns whether it held any lock.
    pub fn delete_resource(&self, resource_name: &str) -> bool {
        let had_any = {
            let mut resources = self.resources.lock();
            match resources.remove(resource_name) {
                Some(mut resource) => resource.delete_all_locks(CloseReason::DeletedByAdmin),
                None => false,
            }
        };
        if had_any {
            info!(resource = %resource_name, "resource deleted");
        }
        had_any
    }

    /// Close every lock on every resource with `DeletedByAdmin` and empty
    /// the registry.
    pub fn delete_all(&self) {
        let mut resources = self.resources.lock();
        for (_, mut resource) in resources.drain() {
            resource.delete_all_locks(CloseReason::DeletedByAdmin);
        }
        info!("all resources deleted");
    }

    /// One expiry pass over every resource; invoked by the sweeper.
    pub fn sweep(&self) {
        let mut resources = self.resources.lock();
        for resource in resources.values_mut() {
            resource.sweep_expired();
        }
        debug!(resources = resources.len(), "expiry sweep completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(wait: i64, lifetime: i64) -> AcquireRequest {
        AcquireRequest::new("a title", wait, lifetime)
    }

    #[test]
    fn test_acquire_validation() {
        let engine = LockEngine::new();
        assert!(matches!(
            engine.acquire("res1", &AcquireRequest::new("", 5, 60)),
            Err(LatchError::InvalidParams(_))
        ));
        assert!(matches!(
            engine.acquire("res1", &AcquireRequest::new("t", -1, 60)),
            Err(LatchError::InvalidParams(_))
        ));
        assert!(matches!(
            engine.acquire("res1", &AcquireRequest::new("t", 5, -1)),
            Err(LatchError::InvalidParams(_))
        ));
        // A rejected request leaves no lock behind
        assert!(engine.resource_snapshot("res1").is_none());
    }

    #[test]
    fn test_acquire_free_resource_grants_immediately() {
        let engine = LockEngine::new();
        let mut pending = engine.acquire("res1", &request(5, 60)).unwrap();
        assert!(matches!(
            pending.outcome.try_recv(),
            Ok(LockOutcome::Granted)
        ));
        let snapshot = engine.get("res1", &pending.uid).unwrap();
        assert!(snapshot.active);
    }

    #[test]
    fn test_end_to_end_fifo_scenario() {
        let engine = LockEngine::new();
        let mut first = engine.acquire("R", &request(5, 60)).unwrap();
        assert!(matches!(first.outcome.try_recv(), Ok(LockOutcome::Granted)));

        let mut second = engine.acquire("R", &request(5, 60)).unwrap();
        assert!(second.outcome.try_recv().is_err());

        assert!(engine.release("R", &first.uid));
        assert!(matches!(
            second.outcome.try_recv(),
            Ok(LockOutcome::Granted)
        ));

        assert!(engine.release("R", &second.uid));
        assert!(engine.resource_snapshot("R").is_none());
    }

    #[test]
    fn test_release_is_idempotent_from_the_caller_view() {
        let engine = LockEngine::new();
        let pending = engine.acquire("res1", &request(5, 60)).unwrap();
        assert!(!engine.release("res1", "no-such-uid"));
        assert!(engine.release("res1", &pending.uid));
        assert!(!engine.release("res1", &pending.uid));
    }

    #[test]
    fn test_wait_timeout_closes_without_grant() {
        let engine = LockEngine::new();
        let _holder = engine.acquire("res1", &request(5, 60)).unwrap();
        let mut waiter = engine.acquire("res1", &request(0, 60)).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        engine.sweep();

        assert!(matches!(
            waiter.outcome.try_recv(),
            Ok(LockOutcome::Closed(CloseReason::Expired))
        ));
        assert!(engine.get("res1", &waiter.uid).is_none());
    }

    #[test]
    fn test_lease_expiry_promotes_successor() {
        let engine = LockEngine::new();
        let holder = engine.acquire("res1", &request(5, 0)).unwrap();
        let mut waiter = engine.acquire("res1", &request(60, 60)).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        engine.sweep();

        assert!(engine.get("res1", &holder.uid).is_none());
        assert!(matches!(
            waiter.outcome.try_recv(),
            Ok(LockOutcome::Granted)
        ));
        let snapshots = engine.resource_snapshot("res1").unwrap();
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].active);
    }

    #[test]
    fn test_resource_snapshot_ordering() {
        let engine = LockEngine::new();
        let holder = engine.acquire("res1", &request(5, 60)).unwrap();
        let first = engine.acquire("res1", &request(60, 60)).unwrap();
        let second = engine.acquire("res1", &request(60, 60)).unwrap();

        let snapshots = engine.resource_snapshot("res1").unwrap();
        let uids: Vec<&str> = snapshots.iter().map(|s| s.uid.as_str()).collect();
        assert_eq!(uids, vec![&holder.uid, &first.uid, &second.uid]);
        assert!(snapshots[0].active);
        assert!(!snapshots[1].active);
        assert!(!snapshots[2].active);
    }

    #[test]
    fn test_vivify_on_read_registers_the_name() {
        let engine = LockEngine::new();
        assert!(engine.get("ghost", "whatever").is_none());
        assert_eq!(engine.resource_names(), vec!["ghost".to_string()]);
        // Invisible through the snapshot surface
        assert!(engine.resource_snapshot("ghost").is_none());
    }

    #[test]
    fn test_delete_resource() {
        let engine = LockEngine::new();
        let mut holder = engine.acquire("res1", &request(5, 60)).unwrap();
        assert!(matches!(
            holder.outcome.try_recv(),
            Ok(LockOutcome::Granted)
        ));

        assert!(engine.delete_resource("res1"));
        assert!(engine.get("res1", &holder.uid).is_none());
        // Entry is gone until something touches the name again
        assert!(!engine.resource_names().contains(&"res1".to_string()));
        assert!(!engine.delete_resource("res1"));
    }

    #[test]
    fn test_delete_all_closes_everything_as_admin() {
        let engine = LockEngine::new();
        let _holder_a = engine.acquire("a", &request(5, 60)).unwrap();
        let mut waiter_a = engine.acquire("a", &request(60, 60)).unwrap();
        let mut holder_b = engine.acquire("b", &request(5, 60)).unwrap();
        assert!(matches!(
            holder_b.outcome.try_recv(),
            Ok(LockOutcome::Granted)
        ));

        engine.delete_all();

        assert!(matches!(
            waiter_a.outcome.try_recv(),
            Ok(LockOutcome::Closed(CloseReason::DeletedByAdmin))
        ));
        // holder_b was already granted; nothing further is resolved
        assert!(holder_b.outcome.try_recv().is_err());
        assert!(engine.resource_names().is_empty());
    }

    #[test]
    fn test_expired_waiter_skipped_on_release() {
        let engine = LockEngine::new();
        let holder = engine.acquire("res1", &request(5, 60)).unwrap();
        let impatient = engine.acquire("res1", &request(0, 60)).unwrap();
        let mut patient = engine.acquire("res1", &request(60, 60)).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(engine.release("res1", &holder.uid));

        assert!(matches!(
            patient.outcome.try_recv(),
            Ok(LockOutcome::Granted)
        ));
        assert!(engine.get("res1", &impatient.uid).is_none());
    }

    #[test]
    fn test_concurrent_acquire_release_single_holder() {
        use std::thread;

        let engine = LockEngine::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    let pending = engine.acquire("shared", &request(60, 60)).unwrap();
                    engine.delete_lock("shared", &pending.uid);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Every lock was deleted; the invariant held throughout (a torn
        // promote would have left a stale active entry behind)
        assert!(engine.resource_snapshot("shared").is_none());
    }
}
