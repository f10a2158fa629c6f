//! Lock acquisition and lifecycle endpoints

use actix_web::{
    HttpRequest, HttpResponse, delete, get,
    http::{StatusCode, header},
    post, web,
};
use tracing::error;

use latch_common::error::{LOCK_DELETED, LOCK_NOT_FOUND, PARAMETER_INVALID, SERVER_ERROR, WAIT_TIMEOUT};
use latch_core::{AcquireRequest, CloseReason, LockEngine, LockOutcome};

use crate::hal::{HAL_CONTENT_TYPE, HalResource, Link};
use crate::response::{error_response, not_found};

/// Base `scheme://host` of the incoming request, as chosen by the client.
/// Rebuilt per request so Location headers stay correct behind proxies.
fn base_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

fn lock_href(resource_name: &str, uid: &str) -> String {
    format!("/locks/{}/{}", resource_name, uid)
}

/// POST /locks/{resource}
///
/// Admits one lock request and awaits its outcome: 201 with a Location
/// header once the lock is active, 408 when the wait budget lapses first,
/// 409 when the lock is deleted while still queued.
#[post("/locks/{resource}")]
pub(crate) async fn acquire_lock(
    req: HttpRequest,
    engine: web::Data<LockEngine>,
    path: web::Path<String>,
    body: web::Bytes,
) -> HttpResponse {
    let resource_name = path.into_inner();
    if body.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &PARAMETER_INVALID,
            "empty body",
            req.path(),
        );
    }
    let request: AcquireRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &PARAMETER_INVALID,
                "invalid json body",
                req.path(),
            );
        }
    };
    let pending = match engine.acquire(&resource_name, &request) {
        Ok(pending) => pending,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &PARAMETER_INVALID,
                &err.to_string(),
                req.path(),
            );
        }
    };

    let location = format!(
        "{}{}",
        base_url(&req),
        lock_href(&resource_name, &pending.uid)
    );
    match pending.outcome.await {
        Ok(LockOutcome::Granted) => HttpResponse::Created()
            .insert_header((header::LOCATION, location))
            .finish(),
        Ok(LockOutcome::Closed(CloseReason::Expired)) => error_response(
            StatusCode::REQUEST_TIMEOUT,
            &WAIT_TIMEOUT,
            WAIT_TIMEOUT.message,
            req.path(),
        ),
        Ok(LockOutcome::Closed(_)) => error_response(
            StatusCode::CONFLICT,
            &LOCK_DELETED,
            LOCK_DELETED.message,
            req.path(),
        ),
        Err(_) => {
            // The engine dropped the notifier without resolving it; that
            // breaks the notification contract and must not be masked.
            error!(resource = %resource_name, uid = %pending.uid, "lock outcome channel dropped");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &SERVER_ERROR,
                SERVER_ERROR.message,
                req.path(),
            )
        }
    }
}

/// GET /locks/{resource}/{uid}
#[get("/locks/{resource}/{uid}")]
pub(crate) async fn get_lock(
    req: HttpRequest,
    engine: web::Data<LockEngine>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (resource_name, uid) = path.into_inner();
    match engine.get(&resource_name, &uid) {
        Some(snapshot) => {
            let mut document =
                HalResource::with_properties(&lock_href(&resource_name, &uid), &snapshot);
            document.add_link(
                "resource",
                Link::new(&format!("/resources/{}", resource_name)),
            );
            HttpResponse::Ok()
                .content_type(HAL_CONTENT_TYPE)
                .body(document.to_value().to_string())
        }
        None => not_found(&LOCK_NOT_FOUND, req.path()),
    }
}

/// DELETE /locks/{resource}/{uid}
///
/// Deletes a lock, active or waiting.
#[delete("/locks/{resource}/{uid}")]
pub(crate) async fn delete_lock(
    req: HttpRequest,
    engine: web::Data<LockEngine>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (resource_name, uid) = path.into_inner();
    if engine.delete_lock(&resource_name, &uid) {
        HttpResponse::NoContent().finish()
    } else {
        not_found(&LOCK_NOT_FOUND, req.path())
    }
}

/// DELETE /active_locks/{resource}/{uid}
///
/// Releases the active lock; waiting locks are not releasable here.
#[delete("/active_locks/{resource}/{uid}")]
pub(crate) async fn release_lock(
    req: HttpRequest,
    engine: web::Data<LockEngine>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (resource_name, uid) = path.into_inner();
    if engine.release(&resource_name, &uid) {
        HttpResponse::NoContent().finish()
    } else {
        not_found(&LOCK_NOT_FOUND, req.path())
    }
}
