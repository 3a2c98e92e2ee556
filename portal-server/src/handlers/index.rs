use actix_web::HttpResponse;
use chrono::Utc;
use serde_derive::Serialize;

/// Healthcheck endpoint; the portal has no database, so this only
/// confirms the process is serving.
pub async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(Status {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
struct Status {
    status: &'static str,
    timestamp: String,
}
