//! HTTP routes for appointment management
//!
//! GET    /api/appointments        - List the caller's appointments
//! POST   /api/appointments        - Book an appointment
//! PUT    /api/appointments/:id    - Update an appointment (date, notes, status)
//! DELETE /api/appointments/:id    - Delete an appointment
//!
//! Listings expand the referenced patient to name/age/disease.

use bson::oid::ObjectId;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{authenticate, AuthedDoctor};
use crate::db::schemas::PatientDoc;
use crate::routes::patients::to_rfc3339;
use crate::routes::{
    cors_preflight, error_response, json_response, method_not_allowed, parse_json_body,
    path_in_family, BoxBody, MessageResponse,
};
use crate::server::AppState;
use crate::services::{AppointmentUpdate, AppointmentWithPatient, NewAppointment};
use crate::types::ClinicError;

/// Patient reference embedded in an appointment response
#[derive(Debug, Serialize)]
pub struct PatientRef {
    pub id: String,
    pub name: String,
    pub age: i64,
    pub disease: String,
}

impl PatientRef {
    fn from_doc(doc: &PatientDoc) -> Self {
        Self {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: doc.name.clone(),
            age: doc.age,
            disease: doc.disease.clone(),
        }
    }
}

/// Appointment record as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: String,
    pub patient: Option<PatientRef>,
    pub date: String,
    pub notes: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl AppointmentResponse {
    fn from_expanded(expanded: &AppointmentWithPatient) -> Self {
        let appt = &expanded.appointment;
        Self {
            id: appt._id.map(|id| id.to_hex()).unwrap_or_default(),
            patient: expanded.patient.as_ref().map(PatientRef::from_doc),
            date: to_rfc3339(appt.date),
            notes: appt.notes.clone(),
            status: appt.status.as_str().to_string(),
            created_at: appt.metadata.created_at.map(to_rfc3339),
            updated_at: appt.metadata.updated_at.map(to_rfc3339),
        }
    }
}

#[derive(Debug, Serialize)]
struct AppointmentListResponse {
    appointments: Vec<AppointmentResponse>,
}

#[derive(Debug, Serialize)]
struct AppointmentEnvelope {
    message: String,
    appointment: AppointmentResponse,
}

async fn handle_list(state: Arc<AppState>, caller: AuthedDoctor) -> Response<BoxBody> {
    match state.appointments_service.list(caller).await {
        Ok(appointments) => json_response(
            StatusCode::OK,
            &AppointmentListResponse {
                appointments: appointments
                    .iter()
                    .map(AppointmentResponse::from_expanded)
                    .collect(),
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
    let input: NewAppointment = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    match state.appointments_service.create(caller, input).await {
        Ok(expanded) => json_response(
            StatusCode::CREATED,
            &AppointmentEnvelope {
                message: "Appointment booked successfully".into(),
                appointment: AppointmentResponse::from_expanded(&expanded),
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
    let update: AppointmentUpdate = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    match state.appointments_service.update(caller, id, update).await {
        Ok(expanded) => json_response(
            StatusCode::OK,
            &AppointmentEnvelope {
                message: "Appointment updated successfully".into(),
                appointment: AppointmentResponse::from_expanded(&expanded),
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
    match state.appointments_service.delete(caller, id).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &MessageResponse {
                message: "Appointment deleted successfully".into(),
            },
        ),
        Err(e) => error_response(e),
    }
}

fn parse_id_segment(segment: &str) -> Result<ObjectId, ClinicError> {
    ObjectId::parse_str(segment).map_err(|_| ClinicError::NotFound("Appointment not found".into()))
}

/// Route /api/appointments* requests
pub async fn handle_appointments_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !path_in_family(&path, "/api/appointments") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    // Every appointment route requires an authenticated doctor
    let caller = match authenticate(&req, &state.jwt) {
        Ok(c) => c,
        Err(e) => return Some(error_response(e)),
    };

    let path = path.split('?').next().unwrap_or(&path);

    let response = match (method, path) {
        (Method::GET, "/api/appointments") | (Method::GET, "/api/appointments/") => {
            handle_list(state, caller).await
        }
        (Method::POST, "/api/appointments") | (Method::POST, "/api/appointments/") => {
            handle_create(req, state, caller).await
        }
        (method, p) => {
            let segment = p.strip_prefix("/api/appointments/").unwrap_or("");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{AppointmentDoc, AppointmentStatus, Metadata};
    use crate::services::appointments::parse_date;

    fn expanded_fixture() -> AppointmentWithPatient {
        let doctor = ObjectId::new();
        let patient_id = ObjectId::new();
        let patient = PatientDoc {
            _id: Some(patient_id),
            metadata: Metadata::new(),
            name: "John Doe".into(),
            age: 35,
            disease: "Hypertension".into(),
            doctor,
        };
        let appointment = AppointmentDoc {
            _id: Some(ObjectId::new()),
            metadata: Metadata::new(),
            patient: patient_id,
            doctor,
            date: parse_date("2026-02-27T10:00:00Z").unwrap(),
            notes: "bring previous labs".into(),
            status: AppointmentStatus::Scheduled,
        };
        AppointmentWithPatient {
            appointment,
            patient: Some(patient),
        }
    }

    #[test]
    fn test_appointment_response_expands_patient() {
        let expanded = expanded_fixture();
        let resp = AppointmentResponse::from_expanded(&expanded);

        let patient = resp.patient.as_ref().unwrap();
        assert_eq!(patient.name, "John Doe");
        assert_eq!(patient.age, 35);
        assert_eq!(resp.status, "scheduled");
        assert!(resp.date.starts_with("2026-02-27T10:00:00"));
    }

    #[test]
    fn test_appointment_response_tolerates_missing_patient() {
        let mut expanded = expanded_fixture();
        expanded.patient = None;

        let resp = AppointmentResponse::from_expanded(&expanded);
        assert!(resp.patient.is_none());

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("patient").unwrap().is_null());
    }

    #[test]
    fn test_malformed_id_maps_to_not_found() {
        let err = parse_id_segment("???").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
