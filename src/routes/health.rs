//! Health check endpoints
//!
//! - /health, /healthz - Liveness probe (is the service running?)
//! - /version - Build info for deployment verification

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::{json_response, BoxBody};

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub service: &'static str,
    pub version: &'static str,
}

/// Liveness probe: 200 whenever the process is serving
pub fn health_check() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            status: "online",
            service: "clinic-api",
            timestamp: chrono::Utc::now().to_rfc3339(),
        },
    )
}

/// Version info for deployment verification
pub fn version_info() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            service: "clinic-api",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}
