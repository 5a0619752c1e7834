use actix_web::{HttpResponse, Responder};
use serde_json::json;

/// Liveness probe.
pub(crate) async fn process() -> impl Responder {
    HttpResponse::Ok().json(json!({ "Hello": "World" }))
}
