//! HTTP routes for patient management
//!
//! GET    /api/patients        - List the caller's patients
//! POST   /api/patients        - Add a patient
//! PUT    /api/patients/:id    - Update a patient
//! DELETE /api/patients/:id    - Delete a patient
//!
//! All routes sit behind the auth gate; the service layer scopes every query
//! by the authenticated doctor.

use bson::oid::ObjectId;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{authenticate, AuthedDoctor};
use crate::db::schemas::PatientDoc;
use crate::routes::{
    cors_preflight, error_response, json_response, method_not_allowed, parse_json_body,
    path_in_family, BoxBody, MessageResponse,
};
use crate::server::AppState;
use crate::services::{NewPatient, PatientUpdate};
use crate::types::ClinicError;

/// Patient record as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub disease: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PatientResponse {
    pub(crate) fn from_doc(doc: &PatientDoc) -> Self {
        Self {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: doc.name.clone(),
            age: doc.age,
            disease: doc.disease.clone(),
            created_at: doc.metadata.created_at.map(to_rfc3339),
            updated_at: doc.metadata.updated_at.map(to_rfc3339),
        }
    }
}

pub(crate) fn to_rfc3339(dt: bson::DateTime) -> String {
    dt.to_chrono().to_rfc3339()
}

#[derive(Debug, Serialize)]
struct PatientListResponse {
    patients: Vec<PatientResponse>,
}

#[derive(Debug, Serialize)]
struct PatientEnvelope {
    message: String,
    patient: PatientResponse,
}

async fn handle_list(state: Arc<AppState>, caller: AuthedDoctor) -> Response<BoxBody> {
    match state.patients_service.list(caller).await {
        Ok(patients) => json_response(
            StatusCode::OK,
            &PatientListResponse {
                patients: patients.iter().map(PatientResponse::from_doc).collect(),
            },
        ),
        Err(e) => error_response(e),
    }
}

async fn handle_create(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    caller: AuthedDoctor,
) -> Response<BoxBody> {
    let input: NewPatient = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    match state.patients_service.create(caller, input).await {
        Ok(patient) => json_response(
            StatusCode::CREATED,
            &PatientEnvelope {
                message: "Patient added successfully".into(),
                patient: PatientResponse::from_doc(&patient),
            },
        ),
        Err(e) => error_response(e),
    }
}

async fn handle_update(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    caller: AuthedDoctor,
    id: ObjectId,
) -> Response<BoxBody> {
    let update: PatientUpdate = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    match state.patients_service.update(caller, id, update).await {
        Ok(patient) => json_response(
            StatusCode::OK,
            &PatientEnvelope {
                message: "Patient updated successfully".into(),
                patient: PatientResponse::from_doc(&patient),
            },
        ),
        Err(e) => error_response(e),
    }
}

async fn handle_delete(
    state: Arc<AppState>,
    caller: AuthedDoctor,
    id: ObjectId,
) -> Response<BoxBody> {
    match state.patients_service.delete(caller, id).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &MessageResponse {
                message: "Patient deleted successfully".into(),
            },
        ),
        Err(e) => error_response(e),
    }
}

/// Parse an id path segment.
///
/// A malformed id maps to the same NotFound as a missing record, so the
/// response shape leaks nothing about what ids exist.
pub(crate) fn parse_id_segment(segment: &str) -> Result<ObjectId, ClinicError> {
    ObjectId::parse_str(segment).map_err(|_| ClinicError::NotFound("Patient not found".into()))
}

/// Route /api/patients* requests
pub async fn handle_patients_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !path_in_family(&path, "/api/patients") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    // Every patient route requires an authenticated doctor
    let caller = match authenticate(&req, &state.jwt) {
        Ok(c) => c,
        Err(e) => return Some(error_response(e)),
    };

    let path = path.split('?').next().unwrap_or(&path);

    let response = match (method, path) {
        (Method::GET, "/api/patients") | (Method::GET, "/api/patients/") => {
            handle_list(state, caller).await
        }
        (Method::POST, "/api/patients") | (Method::POST, "/api/patients/") => {
            handle_create(req, state, caller).await
        }
        (method, p) => {
            let segment = p.strip_prefix("/api/patients/").unwrap_or("");
            if segment.is_empty() || segment.contains('/') {
                return Some(method_not_allowed());
            }
            let id = match parse_id_segment(segment) {
                Ok(id) => id,
                Err(e) => return Some(error_response(e)),
            };
            match method {
                Method::PUT => handle_update(req, state, caller, id).await,
                Method::DELETE => handle_delete(state, caller, id).await,
                _ => method_not_allowed(),
            }
        }
    };

    Some(response)
}
