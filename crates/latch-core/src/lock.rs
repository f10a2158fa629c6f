//! Lock state machine
//!
//! A `Lock` is one admission request/lease for a resource. It is born
//! `Waiting`, becomes `Active` when promoted, and is `Closed` exactly once
//! (released, deleted, or expired). Expiry is evaluated lazily against
//! wall-clock deadlines; there are no per-lock timers.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

/// Why a lock left the `Waiting` or `Active` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// Wait budget or lease lifetime ran out
    Expired,
    /// The holder released an active lock
    ReleasedByHolder,
    /// The client deleted the lock by uid
    DeletedByClient,
    /// An admin deleted the resource (or all resources)
    DeletedByAdmin,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Expired => "expired",
            CloseReason::ReleasedByHolder => "released",
            CloseReason::DeletedByClient => "deleted",
            CloseReason::DeletedByAdmin => "deleted_by_admin",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal outcome delivered to the requester through the one-shot
/// notification channel.
///
/// Exactly one outcome is ever sent per lock: `Granted` when the lock is
/// promoted to active, or `Closed` when it dies while still waiting. A lock
/// that closes after having been granted resolves nothing further; its
/// channel was detached at promotion time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockOutcome {
    Granted,
    Closed(CloseReason),
}

/// Lock lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Waiting,
    Active,
    Closed,
}

/// Wire-facing snapshot of a lock, taken under the engine lock and rendered
/// by the transport layer.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSnapshot {
    pub uid: String,
    pub title: String,
    pub wait: i64,
    pub lifetime: i64,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_since: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_since: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_expires: Option<DateTime<Utc>>,
}

/// `now + seconds`, saturating at the far end of the calendar so an
/// enormous budget means "never expires" instead of an overflow panic.
fn deadline_after(now: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    Duration::try_seconds(seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// One admission request/lease for a resource.
#[derive(Debug)]
pub struct Lock {
    uid: String,
    resource_name: String,
    title: String,
    wait: i64,
    lifetime: i64,
    state: LockState,
    wait_since: Option<DateTime<Utc>>,
    wait_expires: Option<DateTime<Utc>>,
    active_since: Option<DateTime<Utc>>,
    active_expires: Option<DateTime<Utc>>,
    notifier: Option<oneshot::Sender<LockOutcome>>,
}

impl Lock {
    /// Create a new `Waiting` lock with `wait_expires = now + wait`.
    ///
    /// Parameter validation (non-empty title, non-negative budgets) happens
    /// in the engine before construction.
    pub fn new(
        resource_name: &str,
        title: &str,
        wait: i64,
        lifetime: i64,
        notifier: oneshot::Sender<LockOutcome>,
    ) -> Self {
        let now = Utc::now();
        Self {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            resource_name: resource_name.to_string(),
            title: title.to_string(),
            wait,
            lifetime,
            state: LockState::Waiting,
            wait_since: Some(now),
            wait_expires: Some(deadline_after(now, wait)),
            active_since: None,
            active_expires: None,
            notifier: Some(notifier),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == LockState::Active
    }

    /// Promote the lock to `Active`: the wait deadline is cleared and the
    /// lease starts now. Resolves the notification channel with `Granted`
    /// and detaches it; subsequent calls are no-ops.
    pub fn mark_active(&mut self) {
        if self.state != LockState::Waiting {
            return;
        }
        let now = Utc::now();
        self.wait_since = None;
        self.wait_expires = None;
        self.state = LockState::Active;
        self.active_since = Some(now);
        self.active_expires = Some(deadline_after(now, self.lifetime));
        if let Some(notifier) = self.notifier.take() {
            // The receiver may already be gone (caller hung up); delivery
            // is best-effort and never blocks.
            let _ = notifier.send(LockOutcome::Granted);
        }
    }

    /// Close the lock. Resolves the notification channel with
    /// `Closed(reason)` if it is still attached (a prior `mark_active`
    /// detached it), then clears every deadline. No-op when already closed.
    pub fn close(&mut self, reason: CloseReason) {
        if self.state == LockState::Closed {
            return;
        }
        self.state = LockState::Closed;
        self.wait_since = None;
        self.wait_expires = None;
        self.active_since = None;
        self.active_expires = None;
        if let Some(notifier) = self.notifier.take() {
            let _ = notifier.send(LockOutcome::Closed(reason));
        }
    }

    /// Lazily evaluated expiry predicate: `now > active_expires` while
    /// active, `now > wait_expires` while waiting.
    pub fn is_expired(&self) -> bool {
        let now = Utc::now();
        match self.state {
            LockState::Active => self.active_expires.is_some_and(|t| now > t),
            LockState::Waiting => self.wait_expires.is_some_and(|t| now > t),
            // Closed locks are discarded immediately; treat a straggler as
            // expired so it can never be promoted.
            LockState::Closed => true,
        }
    }

    pub fn snapshot(&self) -> LockSnapshot {
        LockSnapshot {
            uid: self.uid.clone(),
            title: self.title.clone(),
            wait: self.wait,
            lifetime: self.lifetime,
            active: self.state == LockState::Active,
            wait_since: self.wait_since,
            wait_expires: self.wait_expires,
            active_since: self.active_since,
            active_expires: self.active_expires,
        }
    }
}
