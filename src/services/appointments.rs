//! Appointment service: ownership-scoped CRUD
//!
//! Creation cross-checks that the referenced patient belongs to the caller by
//! resolving it through the same ownership-scoped filter; a patient owned by
//! another doctor is indistinguishable from one that does not exist.

use bson::{doc, oid::ObjectId, Document};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

use crate::auth::AuthedDoctor;
use crate::db::schemas::{AppointmentDoc, AppointmentStatus, PatientDoc};
use crate::db::MongoCollection;
use crate::services::patients::owned_filter;
use crate::types::{ClinicError, Result};

/// Fields accepted when booking an appointment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update: only fields present in the payload are applied
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentUpdate {
    pub date: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

impl AppointmentUpdate {
    /// Build the `$set` fields for this update. Omitted fields are untouched.
    pub fn set_fields(&self) -> Result<Document> {
        let mut set = Document::new();
        if let Some(date) = &self.date {
            set.insert("date", parse_date(date)?);
        }
        if let Some(notes) = &self.notes {
            set.insert("notes", notes.trim());
        }
        if let Some(status) = &self.status {
            let status = AppointmentStatus::parse(status).ok_or_else(|| {
                ClinicError::Validation(
                    "Status must be one of: scheduled, completed, cancelled".into(),
                )
            })?;
            set.insert("status", status.as_str());
        }
        Ok(set)
    }
}

/// Parse an ISO-8601 date string into a BSON datetime
pub fn parse_date(s: &str) -> Result<bson::DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| bson::DateTime::from_chrono(dt.with_timezone(&chrono::Utc)))
        .map_err(|_| ClinicError::Validation(format!("Invalid date: {}", s)))
}

/// An appointment with its referenced patient resolved
#[derive(Debug, Clone)]
pub struct AppointmentWithPatient {
    pub appointment: AppointmentDoc,
    pub patient: Option<PatientDoc>,
}

/// Ownership-scoped appointment CRUD over the document store
#[derive(Clone)]
pub struct AppointmentService {
    appointments: MongoCollection<AppointmentDoc>,
    patients: MongoCollection<PatientDoc>,
}

impl AppointmentService {
    pub fn new(
        appointments: MongoCollection<AppointmentDoc>,
        patients: MongoCollection<PatientDoc>,
    ) -> Self {
        Self {
            appointments,
            patients,
        }
    }

    /// List the caller's appointments in scheduled-time order, each with its
    /// patient expanded
    pub async fn list(&self, caller: AuthedDoctor) -> Result<Vec<AppointmentWithPatient>> {
        let appointments = self
            .appointments
            .find_many(doc! { "doctor": caller.id }, doc! { "date": 1, "_id": 1 })
            .await?;

        let patients = self
            .patients
            .find_many(doc! { "doctor": caller.id }, doc! { "_id": 1 })
            .await?;
        let by_id: HashMap<ObjectId, PatientDoc> = patients
            .into_iter()
            .filter_map(|p| p._id.map(|id| (id, p)))
            .collect();

        Ok(appointments
            .into_iter()
            .map(|appointment| {
                let patient = by_id.get(&appointment.patient).cloned();
                AppointmentWithPatient {
                    appointment,
                    patient,
                }
            })
            .collect())
    }

    /// Book an appointment for one of the caller's own patients
    pub async fn create(
        &self,
        caller: AuthedDoctor,
        input: NewAppointment,
    ) -> Result<AppointmentWithPatient> {
        if input.patient_id.trim().is_empty() || input.date.trim().is_empty() {
            return Err(ClinicError::Validation(
                "Please provide patientId and date".into(),
            ));
        }

        let patient_id = ObjectId::parse_str(input.patient_id.trim())
            .map_err(|_| ClinicError::NotFound("Patient not found".into()))?;
        let date = parse_date(input.date.trim())?;

        // Cross-entity ownership check, scoped by the caller. A patient under
        // a different doctor resolves to the same NotFound as a missing one.
        let patient = self
            .patients
            .find_one(owned_filter(patient_id, caller.id))
            .await?
            .ok_or_else(|| ClinicError::NotFound("Patient not found".into()))?;

        let mut appointment = AppointmentDoc::new(
            patient_id,
            caller.id,
            date,
            input.notes.unwrap_or_default().trim().to_string(),
        );
        let id = self.appointments.insert_one(appointment.clone()).await?;
        appointment._id = Some(id);

        info!(appointment_id = %id, patient_id = %patient_id, doctor_id = %caller.id, "Appointment booked");
        Ok(AppointmentWithPatient {
            appointment,
            patient: Some(patient),
        })
    }

    /// Apply a partial update to an appointment the caller owns
    pub async fn update(
        &self,
        caller: AuthedDoctor,
        id: ObjectId,
        update: AppointmentUpdate,
    ) -> Result<AppointmentWithPatient> {
        let set_fields = update.set_fields()?;

        let appointment = if set_fields.is_empty() {
            self.appointments
                .find_one(owned_filter(id, caller.id))
                .await?
        } else {
            self.appointments
                .find_one_and_update(owned_filter(id, caller.id), set_fields)
                .await?
        }
        .ok_or_else(|| ClinicError::NotFound("Appointment not found".into()))?;

        let patient = self
            .patients
            .find_one(owned_filter(appointment.patient, caller.id))
            .await?;

        Ok(AppointmentWithPatient {
            appointment,
            patient,
        })
    }

    /// Delete an appointment the caller owns
    pub async fn delete(&self, caller: AuthedDoctor, id: ObjectId) -> Result<()> {
        self.appointments
            .find_one_and_delete(owned_filter(id, caller.id))
            .await?
            .ok_or_else(|| ClinicError::NotFound("Appointment not found".into()))?;

        info!(appointment_id = %id, doctor_id = %caller.id, "Appointment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_iso8601() {
        let dt = parse_date("2026-02-27T10:00:00Z").unwrap();
        let chrono_dt = dt.to_chrono();
        assert_eq!(chrono_dt.to_rfc3339(), "2026-02-27T10:00:00+00:00");

        // Offset form normalizes to UTC
        let dt = parse_date("2026-02-27T12:00:00+02:00").unwrap();
        assert_eq!(dt.to_chrono().to_rfc3339(), "2026-02-27T10:00:00+00:00");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("tomorrow").is_err());
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_partial_update_only_sets_present_fields() {
        let update = AppointmentUpdate {
            date: None,
            notes: None,
            status: Some("completed".into()),
        };
        let set = update.set_fields().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_str("status").unwrap(), "completed");
    }

    #[test]
    fn test_update_with_all_fields() {
        let update = AppointmentUpdate {
            date: Some("2026-03-01T09:30:00Z".into()),
            notes: Some(" follow-up ".into()),
            status: Some("cancelled".into()),
        };
        let set = update.set_fields().unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get_str("notes").unwrap(), "follow-up");
        assert_eq!(set.get_str("status").unwrap(), "cancelled");
        assert!(set.get_datetime("date").is_ok());
    }

    #[test]
    fn test_update_rejects_unknown_status() {
        let update = AppointmentUpdate {
            status: Some("done".into()),
            ..Default::default()
        };
        assert!(matches!(
            update.set_fields().unwrap_err(),
            ClinicError::Validation(_)
        ));
    }

    #[test]
    fn test_update_never_touches_owner_or_patient() {
        let update = AppointmentUpdate {
            date: Some("2026-03-01T09:30:00Z".into()),
            notes: Some("x".into()),
            status: Some("scheduled".into()),
        };
        let set = update.set_fields().unwrap();
        assert!(!set.contains_key("doctor"));
        assert!(!set.contains_key("patient"));
        assert!(!set.contains_key("_id"));
    }

    #[test]
    fn test_clearing_notes_is_a_real_update() {
        let update = AppointmentUpdate {
            notes: Some(String::new()),
            ..Default::default()
        };
        let set = update.set_fields().unwrap();
        assert_eq!(set.get_str("notes").unwrap(), "");
    }
}
