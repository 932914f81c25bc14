//! Document and collection references.
//!
//! Paths alternate collection and document segments, starting with a
//! collection: `users` is a collection, `users/u1` a document,
//! `users/u1/intentions` a collection again.

use super::{StoreError, StoreResult};
use std::fmt::{Display, Formatter};

/// Reference to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath(String);

/// Reference to a collection of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Top-level collection, e.g. `users`.
    pub fn root(name: &str) -> StoreResult<Self> {
        validate_segment(name)?;
        Ok(Self(name.to_string()))
    }

    pub fn doc(&self, id: &str) -> StoreResult<DocumentPath> {
        validate_segment(id)?;
        Ok(DocumentPath(format!("{}/{id}", self.0)))
    }

    /// Last path segment, e.g. `intentions`.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocumentPath {
    pub fn collection(&self, name: &str) -> StoreResult<CollectionPath> {
        validate_segment(name)?;
        Ok(CollectionPath(format!("{}/{name}", self.0)))
    }

    /// Shorthand for `self.collection(collection)?.doc(id)`.
    pub fn child(&self, collection: &str, id: &str) -> StoreResult<DocumentPath> {
        self.collection(collection)?.doc(id)
    }

    /// Collection that directly contains this document.
    pub fn parent(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(String::new()),
        }
    }

    /// Last path segment.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_segment(segment: &str) -> StoreResult<()> {
    if segment.trim().is_empty() {
        return Err(StoreError::InvalidReference(
            "path segment cannot be empty".to_string(),
        ));
    }
    if segment.contains('/') {
        return Err(StoreError::InvalidReference(format!(
            "path segment `{segment}` cannot contain `/`"
        )));
    }
    if segment == "." || segment == ".." {
        return Err(StoreError::InvalidReference(format!(
            "path segment `{segment}` is reserved"
        )));
    }
    Ok(())
}
