//! Appointment document schema
//!
//! Links a patient to a doctor at a scheduled time. The referenced patient
//! must belong to the referenced doctor at creation time; the `doctor` field
//! is the authorization boundary for all later reads and writes.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for appointments
pub const APPOINTMENT_COLLECTION: &str = "appointments";

/// Appointment lifecycle status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Parse a wire-format status string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Appointment document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AppointmentDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Referenced patient
    pub patient: ObjectId,

    /// Owning doctor
    pub doctor: ObjectId,

    /// Scheduled date and time
    pub date: DateTime,

    /// Free-text notes
    #[serde(default)]
    pub notes: String,

    /// Current status
    #[serde(default)]
    pub status: AppointmentStatus,
}

impl AppointmentDoc {
    /// Create a new scheduled appointment
    pub fn new(patient: ObjectId, doctor: ObjectId, date: DateTime, notes: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            patient,
            doctor,
            date,
            notes,
            status: AppointmentStatus::Scheduled,
        }
    }
}

impl IntoIndexes for AppointmentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "doctor": 1, "date": 1 },
                Some(
                    IndexOptions::builder()
                        .name("doctor_date_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "patient": 1 },
                Some(
                    IndexOptions::builder()
                        .name("patient_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for AppointmentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde_round_trip() {
        for (status, wire) in [
            (AppointmentStatus::Scheduled, "\"scheduled\""),
            (AppointmentStatus::Completed, "\"completed\""),
            (AppointmentStatus::Cancelled, "\"cancelled\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), wire);
            let parsed: AppointmentStatus = serde_json::from_str(wire).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            AppointmentStatus::parse("scheduled"),
            Some(AppointmentStatus::Scheduled)
        );
        assert_eq!(
            AppointmentStatus::parse("cancelled"),
            Some(AppointmentStatus::Cancelled)
        );
        assert_eq!(AppointmentStatus::parse("SCHEDULED"), None);
        assert_eq!(AppointmentStatus::parse("done"), None);
    }

    #[test]
    fn test_new_appointment_defaults() {
        let appt = AppointmentDoc::new(
            ObjectId::new(),
            ObjectId::new(),
            DateTime::now(),
            String::new(),
        );
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert!(appt.notes.is_empty());
    }
}
