//! HTTP routes for the clinic API

pub mod appointments;
pub mod auth_routes;
pub mod health;
pub mod patients;

pub use appointments::handle_appointments_request;
pub use auth_routes::handle_auth_request;
pub use health::{health_check, version_info};
pub use patients::handle_patients_request;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::types::ClinicError;

pub(crate) type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest accepted request body, in bytes
pub(crate) const MAX_BODY_BYTES: usize = 10240;

/// Error body: short, generic, never another user's data or stack traces
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Success body for deletes and other message-only responses
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// Map a service error to its HTTP response.
///
/// Server-fault detail goes to the log; the client gets the generic line.
pub(crate) fn error_response(err: ClinicError) -> Response<BoxBody> {
    let status = err.status_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", err);
    }
    json_response(
        status,
        &ErrorResponse {
            message: err.public_message(),
        },
    )
}

pub(crate) fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub(crate) fn method_not_allowed() -> Response<BoxBody> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorResponse {
            message: "Method not allowed".into(),
        },
    )
}

pub(crate) async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, ClinicError> {
    decode_json_body(req.into_body()).await
}

/// Collect a body through a length limit, then decode it as JSON.
///
/// The limit is enforced frame by frame, so an oversized body is rejected as
/// soon as it crosses the cap instead of being buffered whole first.
async fn decode_json_body<T, B>(body: B) -> Result<T, ClinicError>
where
    T: for<'de> Deserialize<'de>,
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let collected = Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                ClinicError::Validation("Request body too large".into())
            } else {
                ClinicError::Http(format!("Failed to read body: {}", e))
            }
        })?;

    serde_json::from_slice(&collected.to_bytes())
        .map_err(|e| ClinicError::Validation(format!("Invalid JSON body: {}", e)))
}

/// True when `path` is the family root itself or a route nested under it.
///
/// A prefix match alone would also capture sibling paths that merely share
/// the root's spelling, e.g. `/api/patientsfoo`.
pub(crate) fn path_in_family(path: &str, root: &str) -> bool {
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_in_family_requires_exact_root_or_separator() {
        assert!(path_in_family("/api/patients", "/api/patients"));
        assert!(path_in_family("/api/patients/", "/api/patients"));
        assert!(path_in_family("/api/patients/abc123", "/api/patients"));

        assert!(!path_in_family("/api/patientsfoo", "/api/patients"));
        assert!(!path_in_family("/api/patient", "/api/patients"));
        assert!(!path_in_family("/api/appointments", "/api/patients"));
    }

    #[tokio::test]
    async fn test_json_body_within_limit_decodes() {
        let body = Full::new(Bytes::from_static(b"{\"name\":\"Jane\"}"));
        let value: serde_json::Value = decode_json_body(body).await.unwrap();
        assert_eq!(value["name"], "Jane");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected_without_decoding() {
        let big = format!("{{\"name\":\"{}\"}}", "x".repeat(MAX_BODY_BYTES * 4));
        let err = decode_json_body::<serde_json::Value, _>(Full::new(Bytes::from(big)))
            .await
            .unwrap_err();

        assert!(matches!(err, ClinicError::Validation(_)));
        assert_eq!(err.public_message(), "Request body too large");
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let body = Full::new(Bytes::from_static(b"{\"name\":"));
        let err = decode_json_body::<serde_json::Value, _>(body)
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
    }
}
