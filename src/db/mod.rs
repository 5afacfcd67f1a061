//! MongoDB persistence layer

pub mod mongo;
pub mod schemas;

pub use mongo::{classify_insert_error, IntoIndexes, MongoClient, MongoCollection, MutMetadata};
