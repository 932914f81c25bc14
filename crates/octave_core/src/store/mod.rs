//! Hosted document store boundary.
//!
//! # Responsibility
//! - Model the per-user document hierarchy as slash-separated paths.
//! - Provide replace/merge/delete writes, filtered queries and live
//!   subscriptions behind the `DocumentStore` trait.
//!
//! # Invariants
//! - Every committed write is observed by matching subscriptions in commit
//!   order, once per change of the delivered value.
//! - "Not found" on reads is a successful `None`; `StoreError` means the
//!   operation itself could not be performed.

use crate::db::DbError;
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document_store;
pub mod path;
pub mod query;
pub mod sqlite_store;
pub mod subscription;

pub use document_store::{DocumentCallback, DocumentStore, QueryCallback};
pub use path::{CollectionPath, DocumentPath};
pub use query::{Direction, DocumentQuery, FieldFilter, OrderBy};
pub use sqlite_store::SqliteDocumentStore;
pub use subscription::Subscription;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a Domain Store operation.
#[derive(Debug)]
pub enum StoreError {
    /// Transport failure from the underlying database.
    Db(DbError),
    /// Document body could not be encoded or decoded.
    Serialization(serde_json::Error),
    /// Input rejected before any write was attempted.
    Validation(ValidationError),
    /// Merge-update targeted a document that does not exist.
    NotFound(String),
    /// Caller is not allowed to touch another user's documents.
    PermissionDenied { user_id: String },
    /// Malformed document or collection reference.
    InvalidReference(String),
    /// Persisted data or request payload has an unexpected shape.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(path) => write!(f, "document not found: {path}"),
            Self::PermissionDenied { user_id } => {
                write!(f, "permission denied for documents of user `{user_id}`")
            }
            Self::InvalidReference(message) => write!(f, "invalid reference: {message}"),
            Self::InvalidData(message) => write!(f, "invalid document data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_)
            | Self::PermissionDenied { .. }
            | Self::InvalidReference(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
