//! Request authentication gate
//!
//! Extracts and verifies the bearer token on protected routes, then hands the
//! authenticated doctor identity to the handler as an explicit value. Resource
//! services never read identity from request payloads.

use bson::oid::ObjectId;
use hyper::Request;
use tracing::debug;

use crate::auth::jwt::{extract_token_from_header, JwtValidator};
use crate::types::ClinicError;

/// Identity bound to a request after successful token verification.
///
/// Existence of the doctor record is not re-checked here; a stale identity
/// simply owns no records downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthedDoctor {
    pub id: ObjectId,
}

/// Authenticate a request from its Authorization header.
///
/// Terminal in one step: either the token is present, verifies, and carries a
/// well-formed doctor id, or the request is rejected with 401. A failing
/// cryptographic check is a normal rejection, never a server fault.
pub fn authenticate<B>(req: &Request<B>, jwt: &JwtValidator) -> Result<AuthedDoctor, ClinicError> {
    let auth_header = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_token_from_header(auth_header)
        .ok_or_else(|| ClinicError::Unauthenticated("Not authorized, no token".into()))?;

    let claims = jwt.verify(token).map_err(|e| {
        debug!("Token verification failed: {}", e);
        ClinicError::Unauthenticated("Not authorized, token failed".into())
    })?;

    let id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ClinicError::Unauthenticated("Not authorized, token failed".into()))?;

    Ok(AuthedDoctor { id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_jwt() -> JwtValidator {
        JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            86400,
        )
        .unwrap()
    }

    fn request_with_auth(value: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/api/patients");
        if let Some(v) = value {
            builder = builder.header(hyper::header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_missing_header_rejected() {
        let jwt = test_jwt();
        let req = request_with_auth(None);

        let err = authenticate(&req, &jwt).unwrap_err();
        assert!(matches!(err, ClinicError::Unauthenticated(_)));
        assert!(err.to_string().contains("no token"));
    }

    #[test]
    fn test_empty_bearer_rejected() {
        let jwt = test_jwt();
        let req = request_with_auth(Some("Bearer "));

        let err = authenticate(&req, &jwt).unwrap_err();
        assert!(err.to_string().contains("no token"));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let jwt = test_jwt();
        let req = request_with_auth(Some("Bearer not-a-real-token"));

        let err = authenticate(&req, &jwt).unwrap_err();
        assert!(matches!(err, ClinicError::Unauthenticated(_)));
        assert!(err.to_string().contains("token failed"));
    }

    #[test]
    fn test_valid_token_binds_identity() {
        let jwt = test_jwt();
        let doctor_id = ObjectId::new();
        let token = jwt.issue(&doctor_id.to_hex()).unwrap();
        let req = request_with_auth(Some(&format!("Bearer {}", token)));

        let authed = authenticate(&req, &jwt).unwrap();
        assert_eq!(authed.id, doctor_id);
    }

    #[test]
    fn test_token_with_malformed_subject_rejected() {
        let jwt = test_jwt();
        let token = jwt.issue("not-an-object-id").unwrap();
        let req = request_with_auth(Some(&format!("Bearer {}", token)));

        let err = authenticate(&req, &jwt).unwrap_err();
        assert!(err.to_string().contains("token failed"));
    }

    #[test]
    fn test_token_signed_with_other_key_rejected() {
        let jwt = test_jwt();
        let other = JwtValidator::new(
            "another-secret-that-is-at-least-32-characters".into(),
            86400,
        )
        .unwrap();
        let token = other.issue(&ObjectId::new().to_hex()).unwrap();
        let req = request_with_auth(Some(&format!("Bearer {}", token)));

        let err = authenticate(&req, &jwt).unwrap_err();
        assert!(err.to_string().contains("token failed"));
    }
}
