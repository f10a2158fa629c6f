//! Latch Core - Lock coordination engine
//!
//! This crate provides the in-memory coordination engine behind the Latch
//! daemon:
//! - `Lock`: one admission request/lease with its two deadline classes
//! - `Resource`: per-name active slot plus FIFO waiting queue
//! - `LockEngine`: the registry and its single exclusion domain
//! - `Sweeper`: periodic lazy-expiry pass
//!
//! The engine performs no I/O; callers receive lock outcomes through
//! one-shot channels and the HTTP transport lives in `latch-server`.

pub mod lock;
pub mod registry;
pub mod resource;
pub mod sweeper;

// Re-exports for convenience
pub use lock::{CloseReason, LockOutcome, LockSnapshot, LockState};
pub use registry::{AcquireRequest, LockEngine, PendingLock};
pub use sweeper::Sweeper;
