//! Storage-agnostic document store contract.

use super::path::DocumentPath;
use super::query::DocumentQuery;
use super::subscription::Subscription;
use super::StoreResult;
use crate::model::EpochMs;
use serde_json::Value;

/// Receives the current document body, or `None` when it does not exist.
pub type DocumentCallback = Box<dyn Fn(Option<Value>) + Send + Sync>;

/// Receives the full ordered result set of a query.
pub type QueryCallback = Box<dyn Fn(Vec<Value>) + Send + Sync>;

/// Document database operations used by every Domain Store service.
///
/// Bodies are JSON objects. Writes are visible to the issuing caller on the
/// next read and to every matching live subscription.
pub trait DocumentStore: Send + Sync {
    /// Commit timestamp the store assigns to writes happening now.
    fn server_time_ms(&self) -> EpochMs;

    /// Allocates a fresh, never reused document id.
    fn new_document_id(&self) -> String;

    fn get(&self, path: &DocumentPath) -> StoreResult<Option<Value>>;

    /// Replaces the whole document, creating it when absent.
    fn set(&self, path: &DocumentPath, body: Value) -> StoreResult<()>;

    /// Shallow-merges `fields` into an existing document.
    ///
    /// Fails with `StoreError::NotFound` when the document is absent.
    fn update(&self, path: &DocumentPath, fields: Value) -> StoreResult<()>;

    /// Hard delete; deleting an absent document succeeds.
    fn delete(&self, path: &DocumentPath) -> StoreResult<()>;

    fn query(&self, query: &DocumentQuery) -> StoreResult<Vec<Value>>;

    /// Delivers the current value immediately, then after each change.
    fn watch_document(
        &self,
        path: &DocumentPath,
        callback: DocumentCallback,
    ) -> StoreResult<Subscription>;

    /// Delivers the current result set immediately, then after each change.
    fn watch_query(
        &self,
        query: &DocumentQuery,
        callback: QueryCallback,
    ) -> StoreResult<Subscription>;
}
