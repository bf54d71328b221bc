//! Lightweight service health endpoint used for readiness checks and tests.

use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};

/// Basic response payload describing application health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[get("/health")]
pub fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
