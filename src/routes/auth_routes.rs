//! HTTP routes for authentication
//!
//! - POST /api/auth/register - Create a doctor account
//! - POST /api/auth/login    - Authenticate and get a JWT token
//!
//! Login failures are reported with one generic message so the response never
//! reveals whether the email exists.

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password};
use crate::db::classify_insert_error;
use crate::db::schemas::{normalize_email, DoctorDoc};
use crate::routes::{
    cors_preflight, error_response, json_response, method_not_allowed, parse_json_body,
    path_in_family, BoxBody, ErrorResponse,
};
use crate::server::AppState;
use crate::types::ClinicError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Doctor identity returned to clients; never includes the password hash
#[derive(Debug, Serialize)]
pub struct DoctorResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl DoctorResponse {
    fn from_doc(doc: &DoctorDoc) -> Self {
        Self {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: doc.name.clone(),
            email: doc.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub doctor: DoctorResponse,
}

/// POST /api/auth/register
///
/// Flow:
/// 1. Validate required fields
/// 2. Check if the email is already registered
/// 3. Hash password with argon2 (the only place hashing happens)
/// 4. Store the doctor, treating a duplicate-key race as AlreadyExists
/// 5. Issue and return a JWT token
async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return error_response(ClinicError::Validation("Please provide all fields".into()));
    }

    if body.password.len() < 6 {
        return error_response(ClinicError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }

    let email = normalize_email(&body.email);

    // Pre-check for a friendlier error; the unique index still backs the race
    match state.doctors.find_one(doc! { "email": &email }).await {
        Ok(Some(_)) => {
            return error_response(ClinicError::AlreadyExists("Email already registered".into()))
        }
        Ok(None) => {}
        Err(e) => return error_response(e),
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => return error_response(e),
    };

    let mut doctor = DoctorDoc::new(body.name.trim().to_string(), &email, password_hash);
    let id = match state.doctors.insert_one(doctor.clone()).await {
        Ok(id) => id,
        Err(e) => return error_response(classify_insert_error(e, "Email already registered")),
    };
    doctor._id = Some(id);

    let token = match state.jwt.issue(&id.to_hex()) {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };

    info!(doctor_id = %id, "Doctor registered");

    json_response(
        StatusCode::CREATED,
        &AuthResponse {
            message: "Doctor registered successfully".into(),
            token,
            doctor: DoctorResponse::from_doc(&doctor),
        },
    )
}

/// POST /api/auth/login
///
/// Flow:
/// 1. Look up the doctor by normalized email
/// 2. Verify the password against the stored argon2 hash
/// 3. Issue and return a JWT token
///
/// Unknown email and wrong password produce the identical response.
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    if body.email.trim().is_empty() || body.password.is_empty() {
        return error_response(ClinicError::Validation(
            "Please provide email and password".into(),
        ));
    }

    let email = normalize_email(&body.email);

    let doctor = match state.doctors.find_one(doc! { "email": &email }).await {
        Ok(Some(d)) => d,
        Ok(None) => {
            warn!("Login failed - unknown email");
            return error_response(ClinicError::InvalidCredentials);
        }
        Err(e) => return error_response(e),
    };

    let password_valid = match verify_password(&body.password, &doctor.password_hash) {
        Ok(valid) => valid,
        Err(e) => return error_response(e),
    };

    if !password_valid {
        warn!("Login failed - invalid password");
        return error_response(ClinicError::InvalidCredentials);
    }

    let id = match doctor._id {
        Some(id) => id,
        None => return error_response(ClinicError::Internal("Doctor document missing id".into())),
    };

    let token = match state.jwt.issue(&id.to_hex()) {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };

    info!(doctor_id = %id, "Login successful");

    json_response(
        StatusCode::OK,
        &AuthResponse {
            message: "Login successful".into(),
            token,
            doctor: DoctorResponse::from_doc(&doctor),
        },
    )
}

/// Route /api/auth/* requests
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    if !path_in_family(path, "/api/auth") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let path = path.split('?').next().unwrap_or(path);

    let response = match (method, path) {
        (&Method::POST, "/api/auth/register") => handle_register(req, state).await,
        (&Method::POST, "/api/auth/login") => handle_login(req, state).await,

        (_, "/api/auth/register") | (_, "/api/auth/login") => method_not_allowed(),

        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                message: "Auth endpoint not found".into(),
            },
        ),
    };

    Some(response)
}
