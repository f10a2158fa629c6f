//! Latch Server - HTTP transport for the lock coordination engine
//!
//! Maps the engine surface onto a RESTful API:
//! - lock acquisition resolves to 201/408/409 through the engine's
//!   one-shot outcome channel
//! - lock and resource documents are rendered as HAL
//! - the `/resources` admin surface is gated by a userpass policy

pub mod api;
pub mod auth;
pub mod config;
pub mod hal;
pub mod response;
