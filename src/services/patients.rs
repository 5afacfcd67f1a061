//! Patient service: ownership-scoped CRUD
//!
//! Every query carries the authenticated doctor's id in its filter, so one
//! doctor can never observe or affect another's patients. "Absent" and "owned
//! by someone else" collapse into the same `NotFound`.

use bson::{doc, oid::ObjectId, Document};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthedDoctor;
use crate::db::schemas::{AppointmentDoc, PatientDoc, AGE_MAX, AGE_MIN};
use crate::db::MongoCollection;
use crate::types::{ClinicError, Result};

/// Fields accepted when creating a patient
#[derive(Debug, Deserialize)]
pub struct NewPatient {
    #[serde(default)]
    pub name: String,
    pub age: Option<i64>,
    #[serde(default)]
    pub disease: String,
}

/// Partial update: only fields present in the payload are applied
#[derive(Debug, Default, Deserialize)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub disease: Option<String>,
}

impl PatientUpdate {
    /// Build the `$set` fields for this update. Omitted fields are untouched.
    pub fn set_fields(&self) -> Result<Document> {
        let mut set = Document::new();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ClinicError::Validation("Name cannot be empty".into()));
            }
            set.insert("name", name.trim());
        }
        if let Some(age) = self.age {
            validate_age(age)?;
            set.insert("age", age);
        }
        if let Some(disease) = &self.disease {
            if disease.trim().is_empty() {
                return Err(ClinicError::Validation("Disease cannot be empty".into()));
            }
            set.insert("disease", disease.trim());
        }
        Ok(set)
    }
}

/// Filter matching one record only when it is owned by the caller
pub fn owned_filter(id: ObjectId, doctor: ObjectId) -> Document {
    doc! { "_id": id, "doctor": doctor }
}

fn validate_age(age: i64) -> Result<()> {
    if !(AGE_MIN..=AGE_MAX).contains(&age) {
        return Err(ClinicError::Validation(format!(
            "Age must be between {} and {}",
            AGE_MIN, AGE_MAX
        )));
    }
    Ok(())
}

/// Ownership-scoped patient CRUD over the document store
#[derive(Clone)]
pub struct PatientService {
    patients: MongoCollection<PatientDoc>,
    appointments: MongoCollection<AppointmentDoc>,
}

impl PatientService {
    pub fn new(
        patients: MongoCollection<PatientDoc>,
        appointments: MongoCollection<AppointmentDoc>,
    ) -> Self {
        Self {
            patients,
            appointments,
        }
    }

    /// List the caller's patients, most recently created first
    pub async fn list(&self, caller: AuthedDoctor) -> Result<Vec<PatientDoc>> {
        self.patients
            .find_many(
                doc! { "doctor": caller.id },
                doc! { "metadata.created_at": -1, "_id": -1 },
            )
            .await
    }

    /// Create a patient owned by the caller
    ///
    /// The owner field always comes from the authenticated identity, never
    /// from client input.
    pub async fn create(&self, caller: AuthedDoctor, input: NewPatient) -> Result<PatientDoc> {
        if input.name.trim().is_empty() || input.disease.trim().is_empty() || input.age.is_none() {
            return Err(ClinicError::Validation(
                "Please provide name, age, and disease".into(),
            ));
        }
        let age = input.age.unwrap_or_default();
        validate_age(age)?;

        let mut patient = PatientDoc::new(input.name, age, input.disease, caller.id);
        let id = self.patients.insert_one(patient.clone()).await?;
        patient._id = Some(id);

        info!(patient_id = %id, doctor_id = %caller.id, "Patient added");
        Ok(patient)
    }

    /// Apply a partial update to a patient the caller owns
    pub async fn update(
        &self,
        caller: AuthedDoctor,
        id: ObjectId,
        update: PatientUpdate,
    ) -> Result<PatientDoc> {
        let set_fields = update.set_fields()?;

        if set_fields.is_empty() {
            // No-op update still requires the record to exist and be owned
            return self
                .patients
                .find_one(owned_filter(id, caller.id))
                .await?
                .ok_or_else(|| ClinicError::NotFound("Patient not found".into()));
        }

        self.patients
            .find_one_and_update(owned_filter(id, caller.id), set_fields)
            .await?
            .ok_or_else(|| ClinicError::NotFound("Patient not found".into()))
    }

    /// Delete a patient the caller owns
    ///
    /// Appointments referencing the patient are deleted with it, so no
    /// dangling references survive.
    pub async fn delete(&self, caller: AuthedDoctor, id: ObjectId) -> Result<()> {
        let deleted = self
            .patients
            .find_one_and_delete(owned_filter(id, caller.id))
            .await?
            .ok_or_else(|| ClinicError::NotFound("Patient not found".into()))?;

        let removed = self
            .appointments
            .delete_many(doc! { "patient": id, "doctor": caller.id })
            .await?;
        if removed.deleted_count > 0 {
            info!(
                patient_id = %id,
                appointments = removed.deleted_count,
                "Cascade-deleted appointments with patient"
            );
        }

        info!(patient_id = %id, doctor_id = %caller.id, name = %deleted.name, "Patient deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_filter_always_carries_doctor() {
        let id = ObjectId::new();
        let doctor = ObjectId::new();
        let filter = owned_filter(id, doctor);
        assert_eq!(filter.get_object_id("_id").unwrap(), id);
        assert_eq!(filter.get_object_id("doctor").unwrap(), doctor);
    }

    #[test]
    fn test_age_bounds() {
        assert!(validate_age(0).is_ok());
        assert!(validate_age(150).is_ok());
        assert!(validate_age(-1).is_err());
        assert!(validate_age(151).is_err());
    }

    #[test]
    fn test_partial_update_only_sets_present_fields() {
        let update = PatientUpdate {
            name: None,
            age: Some(42),
            disease: None,
        };
        let set = update.set_fields().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_i64("age").unwrap(), 42);
        assert!(!set.contains_key("name"));
        assert!(!set.contains_key("disease"));
    }

    #[test]
    fn test_full_update_sets_all_fields_trimmed() {
        let update = PatientUpdate {
            name: Some("  Jane ".into()),
            age: Some(30),
            disease: Some(" Asthma ".into()),
        };
        let set = update.set_fields().unwrap();
        assert_eq!(set.get_str("name").unwrap(), "Jane");
        assert_eq!(set.get_str("disease").unwrap(), "Asthma");
        assert_eq!(set.get_i64("age").unwrap(), 30);
    }

    #[test]
    fn test_update_rejects_empty_strings_and_bad_age() {
        assert!(PatientUpdate {
            name: Some("   ".into()),
            ..Default::default()
        }
        .set_fields()
        .is_err());

        assert!(PatientUpdate {
            age: Some(200),
            ..Default::default()
        }
        .set_fields()
        .is_err());
    }

    #[test]
    fn test_update_never_touches_owner() {
        let update = PatientUpdate {
            name: Some("Jane".into()),
            age: Some(30),
            disease: Some("Asthma".into()),
        };
        let set = update.set_fields().unwrap();
        assert!(!set.contains_key("doctor"));
        assert!(!set.contains_key("_id"));
    }
}
