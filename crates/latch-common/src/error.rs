//! Error types and error codes for Latch
//!
//! This module defines:
//! - `LatchError`: Application-specific error enum
//! - `ErrorCode`: Structured error codes for API responses

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum LatchError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const PARAMETER_INVALID: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "parameter invalid",
};

pub const ACCESS_DENIED: ErrorCode<'static> = ErrorCode {
    code: 10001,
    message: "access denied",
};

pub const LOCK_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20000,
    message: "lock not found",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20001,
    message: "no resource (with locks) found",
};

pub const WAIT_TIMEOUT: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "wait timeout on lock acquisition",
};

pub const LOCK_DELETED: ErrorCode<'static> = ErrorCode {
    code: 20003,
    message: "lock deleted before acquisition",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};
