//! In-memory collaborators for deterministic testing and local use.
//!
//! Every mock records the calls made to it so tests can assert on the exact
//! interaction with the write pipeline.
//!
//! ## Usage
//!
//! ```rust
//! use marginalia_annotations::mock::{MemoryAnnotationStore, MemoryNipsaRegistry};
//!
//! let store = MemoryAnnotationStore::new();
//! let nipsa = MemoryNipsaRegistry::new().with_flagged("acct:spammer@example.com");
//!
//! assert!(store.is_empty());
//! assert!(nipsa.is_flagged("acct:spammer@example.com"));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use marginalia_core::{
    Annotation, AnnotationStore, Error, IndexPreparer, NipsaRegistry, Result,
};

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

type CallLog = Arc<Mutex<Vec<MockCall>>>;

fn log_call(log: &CallLog, operation: &str, input: &str) {
    log.lock().unwrap().push(MockCall {
        operation: operation.to_string(),
        input: input.to_string(),
    });
}

// =============================================================================
// ANNOTATION STORE
// =============================================================================

/// Annotation store keyed by id.
#[derive(Clone, Default)]
pub struct MemoryAnnotationStore {
    annotations: Arc<Mutex<HashMap<String, Annotation>>>,
    call_log: CallLog,
    fail_writes: bool,
}

impl MemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an annotation. Annotations without an id are ignored.
    pub fn with_annotation(self, annotation: Annotation) -> Self {
        if let Some(id) = annotation.id() {
            self.annotations
                .lock()
                .unwrap()
                .insert(id.to_string(), annotation.clone());
        }
        self
    }

    /// Make every `save` and `delete` fail with a store error.
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn get(&self, id: &str) -> Option<Annotation> {
        self.annotations.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.annotations.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }
}

#[async_trait]
impl AnnotationStore for MemoryAnnotationStore {
    async fn fetch(&self, id: &str) -> Result<Option<Annotation>> {
        log_call(&self.call_log, "fetch", id);
        Ok(self.get(id))
    }

    async fn save(&self, annotation: &Annotation) -> Result<()> {
        let id = annotation
            .id()
            .ok_or_else(|| Error::InvalidInput("annotation has no id".to_string()))?;
        log_call(&self.call_log, "save", id);
        if self.fail_writes {
            return Err(Error::Store(format!("write rejected for {id}")));
        }
        self.annotations
            .lock()
            .unwrap()
            .insert(id.to_string(), annotation.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        log_call(&self.call_log, "delete", id);
        if self.fail_writes {
            return Err(Error::Store(format!("delete rejected for {id}")));
        }
        self.annotations.lock().unwrap().remove(id);
        Ok(())
    }
}

// =============================================================================
// NIPSA REGISTRY
// =============================================================================

/// Flagged-user registry that answers from a mutable in-memory set.
#[derive(Clone, Default)]
pub struct MemoryNipsaRegistry {
    flagged: Arc<Mutex<HashSet<String>>>,
    call_log: CallLog,
}

impl MemoryNipsaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flagged(self, user_id: impl Into<String>) -> Self {
        self.flag(user_id);
        self
    }

    pub fn flag(&self, user_id: impl Into<String>) {
        self.flagged.lock().unwrap().insert(user_id.into());
    }

    pub fn unflag(&self, user_id: &str) {
        self.flagged.lock().unwrap().remove(user_id);
    }

    pub fn is_flagged(&self, user_id: &str) -> bool {
        self.flagged.lock().unwrap().contains(user_id)
    }

    /// Number of `has_nipsa` lookups made.
    pub fn lookup_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }
}

#[async_trait]
impl NipsaRegistry for MemoryNipsaRegistry {
    async fn has_nipsa(&self, user_id: &str) -> Result<bool> {
        log_call(&self.call_log, "has_nipsa", user_id);
        Ok(self.is_flagged(user_id))
    }
}

// =============================================================================
// INDEX PREPARER
// =============================================================================

/// Preparer that changes nothing and records which annotations it saw.
#[derive(Clone, Default)]
pub struct RecordingPreparer {
    call_log: CallLog,
}

impl RecordingPreparer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of prepared annotations, in call order.
    pub fn prepared_ids(&self) -> Vec<String> {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.input.clone())
            .collect()
    }
}

impl IndexPreparer for RecordingPreparer {
    fn prepare(&self, annotation: &mut Annotation) {
        log_call(&self.call_log, "prepare", annotation.id().unwrap_or_default());
    }
}
