//! Admin request gating
//!
//! Resource listing and resource deletion are admin operations, gated by
//! HTTP Basic authentication against a colon-delimited `user:password`
//! file. Two sentinel values replace the file path: `yes` allows every
//! admin request without credentials, `no` refuses them all.

use actix_web::{HttpRequest, HttpResponse, http::StatusCode, http::header};
use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::warn;

use latch_common::error::ACCESS_DENIED;

use crate::response::error_response;

const BASIC_PREFIX: &str = "Basic ";

/// Outcome of an admin credential check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminAccess {
    Granted,
    /// Credentials required but missing or wrong (401 + challenge)
    Unauthorized,
    /// Admin requests are disabled outright (403)
    Forbidden,
}

/// Admin gating policy, from the `--admin-userpass-file` option.
#[derive(Clone, Debug)]
pub enum AdminPolicy {
    AllowAll,
    DenyAll,
    Credentials(Vec<(String, String)>),
}

impl AdminPolicy {
    /// Parse the option value: `yes`, `no`, or a userpass file path.
    pub fn from_option(value: &str) -> anyhow::Result<Self> {
        match value {
            "yes" => Ok(AdminPolicy::AllowAll),
            "no" => Ok(AdminPolicy::DenyAll),
            path => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read admin userpass file '{}'", path))?;
                Ok(AdminPolicy::Credentials(parse_userpass(&content)))
            }
        }
    }

    /// Check an `Authorization` header value against the policy.
    pub fn authorize(&self, authorization: Option<&str>) -> AdminAccess {
        let pairs = match self {
            AdminPolicy::AllowAll => return AdminAccess::Granted,
            AdminPolicy::DenyAll => return AdminAccess::Forbidden,
            AdminPolicy::Credentials(pairs) => pairs,
        };
        let Some(encoded) = authorization
            .map(str::trim)
            .and_then(|value| value.strip_prefix(BASIC_PREFIX))
        else {
            return AdminAccess::Unauthorized;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return AdminAccess::Unauthorized;
        };
        let Ok(text) = String::from_utf8(decoded) else {
            return AdminAccess::Unauthorized;
        };
        let Some((user, password)) = text.split_once(':') else {
            return AdminAccess::Unauthorized;
        };
        if pairs
            .iter()
            .any(|(known_user, known_password)| known_user == user && known_password == password)
        {
            AdminAccess::Granted
        } else {
            AdminAccess::Unauthorized
        }
    }
}

/// Parse colon-delimited `user:password` lines; blank and malformed lines
/// are skipped.
fn parse_userpass(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((user, password)) => pairs.push((user.to_string(), password.to_string())),
            None => warn!(line = %line, "skipping malformed userpass line"),
        }
    }
    pairs
}

/// Gate one admin request; `Err` carries the ready-to-send refusal.
pub fn check_admin(req: &HttpRequest, policy: &AdminPolicy) -> Result<(), HttpResponse> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    match policy.authorize(authorization) {
        AdminAccess::Granted => Ok(()),
        AdminAccess::Forbidden => Err(error_response(
            StatusCode::FORBIDDEN,
            &ACCESS_DENIED,
            "admin requests are disabled",
            req.path(),
        )),
        AdminAccess::Unauthorized => Err(HttpResponse::Unauthorized()
            .insert_header((header::WWW_AUTHENTICATE, "Basic realm=\"latch\""))
            .json(crate::response::ErrorBody::new(
                StatusCode::UNAUTHORIZED,
                ACCESS_DENIED.code,
                "admin credentials required",
                req.path(),
            ))),
    }
}

/// Early-return from a handler unless the request passes the admin check.
#[macro_export]
macro_rules! admin_secured {
    ($req:expr, $policy:expr) => {
        if let Err(response) = $crate::auth::check_admin(&$req, &$policy) {
            return response;
        }
    };
}
