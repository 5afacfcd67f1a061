//! Doctor document schema
//!
//! Stores the doctor's identity and credential. The password is never stored
//! in plain text; only the Argon2 hash is persisted.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for doctors
pub const DOCTOR_COLLECTION: &str = "doctors";

/// Doctor document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DoctorDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Doctor's full name
    pub name: String,

    /// Doctor's email, stored lowercase and trimmed, unique across doctors
    pub email: String,

    /// Argon2 password hash
    pub password_hash: String,
}

impl DoctorDoc {
    /// Create a new doctor document
    ///
    /// The email is normalized here so uniqueness is case-insensitive.
    pub fn new(name: String, email: &str, password_hash: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            name,
            email: normalize_email(email),
            password_hash,
        }
    }
}

/// Lowercase and trim an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl IntoIndexes for DoctorDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for DoctorDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalization() {
        assert_eq!(normalize_email("  Dr.House@Example.COM "), "dr.house@example.com");
        assert_eq!(normalize_email("a@x.com"), "a@x.com");
    }

    #[test]
    fn test_new_doctor_normalizes_email() {
        let doc = DoctorDoc::new("House".into(), " A@X.com", "$argon2id$hash".into());
        assert_eq!(doc.email, "a@x.com");
        assert!(doc._id.is_none());
        assert!(doc.metadata.created_at.is_some());
    }

    #[test]
    fn test_unique_email_index_declared() {
        let indices = DoctorDoc::into_indices();
        assert_eq!(indices.len(), 1);
        let (keys, opts) = &indices[0];
        assert_eq!(keys, &doc! { "email": 1 });
        assert_eq!(opts.as_ref().unwrap().unique, Some(true));
    }
}
