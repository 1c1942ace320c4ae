//! Core traits for marginalia's external collaborators.
//!
//! These traits define the interfaces that persistence, search and privacy
//! backends must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;
use crate::models::Annotation;
use crate::query::{SearchQuery, SearchResults};

// =============================================================================
// ANNOTATION STORE
// =============================================================================

/// Persistence for annotations.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Fetch an annotation by id. `Ok(None)` when it does not exist.
    async fn fetch(&self, id: &str) -> Result<Option<Annotation>>;

    /// Insert or overwrite an annotation.
    async fn save(&self, annotation: &Annotation) -> Result<()>;

    /// Permanently remove an annotation.
    async fn delete(&self, id: &str) -> Result<()>;
}

// =============================================================================
// SEARCH BACKEND
// =============================================================================

/// Executes compiled queries against the full-text index.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn execute(&self, query: &SearchQuery) -> Result<SearchResults>;
}

// =============================================================================
// INDEX PREPARATION
// =============================================================================

/// Augments an annotation for indexing just before it is persisted.
pub trait IndexPreparer: Send + Sync {
    fn prepare(&self, annotation: &mut Annotation);
}

// =============================================================================
// PRIVACY REGISTRY
// =============================================================================

/// Answers whether a user is flagged "not in public site areas".
#[async_trait]
pub trait NipsaRegistry: Send + Sync {
    async fn has_nipsa(&self, user_id: &str) -> Result<bool>;
}

/// Loads the complete set of flagged users from the backing store.
#[async_trait]
pub trait NipsaSource: Send + Sync {
    async fn load_flagged(&self) -> Result<HashSet<String>>;
}
