//! Patient document schema
//!
//! Every patient carries a `doctor` reference set at creation time. That field
//! is the authorization boundary: all reads and writes are filtered by it.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for patients
pub const PATIENT_COLLECTION: &str = "patients";

/// Inclusive age bounds accepted for a patient
pub const AGE_MIN: i64 = 0;
pub const AGE_MAX: i64 = 150;

/// Patient document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PatientDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Patient's full name
    pub name: String,

    /// Patient's age (0-150)
    pub age: i64,

    /// Disease/condition text
    pub disease: String,

    /// Owning doctor, immutable after creation
    pub doctor: ObjectId,
}

impl PatientDoc {
    /// Create a new patient document owned by the given doctor
    pub fn new(name: String, age: i64, disease: String, doctor: ObjectId) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            name: name.trim().to_string(),
            age,
            disease: disease.trim().to_string(),
            doctor,
        }
    }
}

impl IntoIndexes for PatientDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "doctor": 1 },
            Some(
                IndexOptions::builder()
                    .name("doctor_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for PatientDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient_trims_text_fields() {
        let doctor = ObjectId::new();
        let doc = PatientDoc::new("  John Doe ".into(), 35, " Hypertension ".into(), doctor);
        assert_eq!(doc.name, "John Doe");
        assert_eq!(doc.disease, "Hypertension");
        assert_eq!(doc.doctor, doctor);
    }

    #[test]
    fn test_doctor_index_declared() {
        let indices = PatientDoc::into_indices();
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].0, doc! { "doctor": 1 });
    }
}
