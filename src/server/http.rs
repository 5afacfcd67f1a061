//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Requests are routed with
//! a plain (method, path) match; route families consume the request and the
//! auth gate runs inside the protected families.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::schemas::{
    AppointmentDoc, DoctorDoc, PatientDoc, APPOINTMENT_COLLECTION, DOCTOR_COLLECTION,
    PATIENT_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::routes::{
    self, cors_preflight, json_response, path_in_family, BoxBody, ErrorResponse, MessageResponse,
};
use crate::services::{AppointmentService, PatientService};
use crate::types::ClinicError;

/// Shared application state
///
/// The JWT validator holds the process-wide signing secret, read-only after
/// startup. Mongo collections share one pooled client connection.
pub struct AppState {
    pub args: Args,
    pub jwt: JwtValidator,
    pub doctors: MongoCollection<DoctorDoc>,
    pub patients_service: PatientService,
    pub appointments_service: AppointmentService,
}

impl AppState {
    /// Build application state: typed collections (indexes applied) and the
    /// services wired over them
    pub async fn new(args: Args, mongo: MongoClient) -> Result<Self, ClinicError> {
        let secret = args
            .jwt_secret
            .clone()
            .ok_or_else(|| ClinicError::Config("JWT_SECRET is required".into()))?;
        let jwt = JwtValidator::new(secret, args.jwt_expiry_seconds)?;

        let doctors = mongo.collection::<DoctorDoc>(DOCTOR_COLLECTION).await?;
        let patients = mongo.collection::<PatientDoc>(PATIENT_COLLECTION).await?;
        let appointments = mongo
            .collection::<AppointmentDoc>(APPOINTMENT_COLLECTION)
            .await?;

        let patients_service = PatientService::new(patients.clone(), appointments.clone());
        let appointments_service = AppointmentService::new(appointments, patients);

        Ok(Self {
            args,
            jwt,
            doctors,
            patients_service,
            appointments_service,
        })
    }
}

/// Run the HTTP server until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<(), ClinicError> {
    let addr = state.args.listen;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ClinicError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    info!("HTTP server listening on {}", addr);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, peer, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", peer, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    peer: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", peer, method, path);

    // Route families consume the request
    if path_in_family(&path, "/api/auth") {
        if let Some(response) = routes::handle_auth_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    if path_in_family(&path, "/api/patients") {
        if let Some(response) = routes::handle_patients_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    if path_in_family(&path, "/api/appointments") {
        if let Some(response) = routes::handle_appointments_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(),

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // Root banner, mirrors the health check
        (Method::GET, "/") => json_response(
            StatusCode::OK,
            &MessageResponse {
                message: "Clinic Management API is running".into(),
            },
        ),

        // CORS preflight
        (Method::OPTIONS, _) => cors_preflight(),

        // Not found
        _ => not_found_response(&path),
    };

    Ok(response)
}

/// Not found response
fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            message: format!("Not found: {}", path),
        },
    )
}
