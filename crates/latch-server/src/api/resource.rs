//! Admin resource endpoints
//!
//! Every route here is gated by the admin userpass policy.

use actix_web::{HttpRequest, HttpResponse, delete, get, web};
use serde_json::json;
use tracing::info;

use latch_common::error::RESOURCE_NOT_FOUND;
use latch_core::LockEngine;

use crate::admin_secured;
use crate::auth::AdminPolicy;
use crate::hal::{HAL_CONTENT_TYPE, HalResource, Link};
use crate::response::not_found;

fn resource_href(resource_name: &str) -> String {
    format!("/resources/{}", resource_name)
}

/// GET /resources
#[get("/resources")]
pub(crate) async fn list_resources(
    req: HttpRequest,
    engine: web::Data<LockEngine>,
    policy: web::Data<AdminPolicy>,
) -> HttpResponse {
    admin_secured!(req, policy);
    let names = engine.resource_names();
    let mut document = HalResource::new("/resources");
    document.add_property("resources", json!(names));
    for name in &names {
        document.add_link_to_collection("resource", Link::with_title(&resource_href(name), name));
    }
    HttpResponse::Ok()
        .content_type(HAL_CONTENT_TYPE)
        .body(document.to_value().to_string())
}

/// GET /resources/{resource}
///
/// HAL document embedding every lock on the resource, active first, then
/// waiters in FIFO order. A resource holding no locks is 404.
#[get("/resources/{resource}")]
pub(crate) async fn get_resource(
    req: HttpRequest,
    engine: web::Data<LockEngine>,
    policy: web::Data<AdminPolicy>,
    path: web::Path<String>,
) -> HttpResponse {
    admin_secured!(req, policy);
    let resource_name = path.into_inner();
    match engine.resource_snapshot(&resource_name) {
        Some(snapshots) => {
            let mut document = HalResource::new(&resource_href(&resource_name));
            document.add_property("name", json!(resource_name));
            for snapshot in &snapshots {
                document.add_embedded(
                    "locks",
                    HalResource::with_properties(
                        &format!("/locks/{}/{}", resource_name, snapshot.uid),
                        snapshot,
                    ),
                );
            }
            HttpResponse::Ok()
                .content_type(HAL_CONTENT_TYPE)
                .body(document.to_value().to_string())
        }
        None => not_found(&RESOURCE_NOT_FOUND, req.path()),
    }
}

/// DELETE /resources/{resource}
#[delete("/resources/{resource}")]
pub(crate) async fn delete_resource(
    req: HttpRequest,
    engine: web::Data<LockEngine>,
    policy: web::Data<AdminPolicy>,
    path: web::Path<String>,
) -> HttpResponse {
    admin_secured!(req, policy);
    let resource_name = path.into_inner();
    if engine.delete_resource(&resource_name) {
        info!(resource = %resource_name, "resource deleted via admin API");
        HttpResponse::NoContent().finish()
    } else {
        not_found(&RESOURCE_NOT_FOUND, req.path())
    }
}

/// DELETE /resources
#[delete("/resources")]
pub(crate) async fn delete_all_resources(
    req: HttpRequest,
    engine: web::Data<LockEngine>,
    policy: web::Data<AdminPolicy>,
) -> HttpResponse {
    admin_secured!(req, policy);
    engine.delete_all();
    info!("all resources deleted via admin API");
    HttpResponse::NoContent().finish()
}
