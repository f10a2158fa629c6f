//! HTTP API surface
//!
//! - `/locks/{resource}` and `/locks/{resource}/{uid}` for acquisition and
//!   lock lifecycle
//! - `/active_locks/{resource}/{uid}` for holder release
//! - `/resources...` for the admin surface

pub mod lock;
pub mod resource;

use actix_web::{HttpResponse, Scope, get, web};

/// GET /
#[get("/")]
async fn hello() -> HttpResponse {
    HttpResponse::Ok().body("Welcome on latch, a RESTful distributed lock manager!")
}

pub fn routes() -> Scope {
    web::scope("")
        .service(hello)
        .service(lock::acquire_lock)
        .service(lock::get_lock)
        .service(lock::delete_lock)
        .service(lock::release_lock)
        .service(resource::list_resources)
        .service(resource::get_resource)
        .service(resource::delete_resource)
        .service(resource::delete_all_resources)
}
