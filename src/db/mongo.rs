//! MongoDB client and collection wrapper
//!
//! Typed collections apply their schema-declared indexes at startup, so
//! uniqueness constraints (doctor email) exist before the first insert.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    results::DeleteResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::db::schemas::Metadata;
use crate::types::ClinicError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, ClinicError> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ClinicError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ClinicError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, ClinicError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the raw MongoDB client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, ClinicError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), ClinicError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| ClinicError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, ClinicError> {
        let metadata = item.mut_metadata();
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self.inner.insert_one(item).await.map_err(|e| {
            if is_duplicate_key(&e) {
                ClinicError::AlreadyExists("Duplicate key".into())
            } else {
                ClinicError::Database(format!("Insert failed: {}", e))
            }
        })?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ClinicError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, ClinicError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| ClinicError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter, in the given sort order
    pub async fn find_many(&self, filter: Document, sort: Document) -> Result<Vec<T>, ClinicError> {
        use futures_util::TryStreamExt;

        let cursor = self
            .inner
            .find(filter)
            .sort(sort)
            .await
            .map_err(|e| ClinicError::Database(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| ClinicError::Database(format!("Cursor read failed: {}", e)))
    }

    /// Update one document and return the updated version
    ///
    /// The caller's `$set` is extended with a fresh `metadata.updated_at`.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        mut set_fields: Document,
    ) -> Result<Option<T>, ClinicError> {
        set_fields.insert("metadata.updated_at", DateTime::now());
        let update = UpdateModifications::Document(doc! { "$set": set_fields });

        self.inner
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| ClinicError::Database(format!("Update failed: {}", e)))
    }

    /// Delete one document, returning it if it existed
    pub async fn find_one_and_delete(&self, filter: Document) -> Result<Option<T>, ClinicError> {
        self.inner
            .find_one_and_delete(filter)
            .await
            .map_err(|e| ClinicError::Database(format!("Delete failed: {}", e)))
    }

    /// Delete all documents matching the filter
    pub async fn delete_many(&self, filter: Document) -> Result<DeleteResult, ClinicError> {
        self.inner
            .delete_many(filter)
            .await
            .map_err(|e| ClinicError::Database(format!("Delete failed: {}", e)))
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}

/// True when the driver reports a unique-index violation (server code 11000)
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == 11000,
        _ => false,
    }
}

/// Rewrite a duplicate-key insert failure with a caller-facing conflict
/// message, so concurrent registrations race safely. The write-error code is
/// inspected structurally at insert time; the string match only covers errors
/// that arrive already flattened.
pub fn classify_insert_error(err: ClinicError, conflict_message: &str) -> ClinicError {
    match err {
        ClinicError::AlreadyExists(_) => ClinicError::AlreadyExists(conflict_message.to_string()),
        ClinicError::Database(text)
            if text.contains("duplicate key") || text.contains("E11000") =>
        {
            ClinicError::AlreadyExists(conflict_message.to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_gets_conflict_message() {
        // Structurally detected at insert time
        let err = ClinicError::AlreadyExists("Duplicate key".into());
        let classified = classify_insert_error(err, "Email already registered");
        assert!(matches!(classified, ClinicError::AlreadyExists(_)));
        assert_eq!(classified.public_message(), "Email already registered");
    }

    #[test]
    fn test_flattened_duplicate_key_text_still_classified() {
        let err = ClinicError::Database(
            "Insert failed: E11000 duplicate key error collection: clinic.doctors".into(),
        );
        let classified = classify_insert_error(err, "Email already registered");
        assert!(matches!(classified, ClinicError::AlreadyExists(_)));
        assert_eq!(classified.public_message(), "Email already registered");
    }

    #[test]
    fn test_non_write_driver_errors_are_not_duplicates() {
        let err = mongodb::error::Error::custom("connection reset");
        assert!(!is_duplicate_key(&err));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = ClinicError::Database("Insert failed: connection reset".into());
        let classified = classify_insert_error(err, "Email already registered");
        assert!(matches!(classified, ClinicError::Database(_)));
    }

    // CRUD paths need a running MongoDB instance and are exercised by the
    // service-level tests against a local deployment.
}
