//! Test helpers for write pipeline tests.
//!
//! Provides a service wired to in-memory collaborators plus log setup.

use std::sync::{Arc, Once};

use marginalia_annotations::mock::{MemoryAnnotationStore, MemoryNipsaRegistry, RecordingPreparer};
use marginalia_annotations::AnnotationWriteService;
use marginalia_core::{Annotation, AnnotationFields, Author};

static TRACING: Once = Once::new();

/// Route pipeline logs to the test writer, honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A write service and handles on its collaborators.
pub struct Harness {
    pub service: AnnotationWriteService,
    pub store: MemoryAnnotationStore,
    pub nipsa: MemoryNipsaRegistry,
    pub preparer: RecordingPreparer,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryAnnotationStore::new())
    }

    pub fn with_store(store: MemoryAnnotationStore) -> Self {
        init_tracing();
        let nipsa = MemoryNipsaRegistry::new();
        let preparer = RecordingPreparer::new();
        let service = AnnotationWriteService::new(
            Arc::new(store.clone()),
            Arc::new(nipsa.clone()),
            Arc::new(preparer.clone()),
        );
        Self {
            service,
            store,
            nipsa,
            preparer,
        }
    }
}

pub fn alice() -> Author {
    Author::new("acct:alice@example.com", "alice-client")
}

/// An already stored annotation with the given id and fields.
pub fn stored(id: &str, fields: AnnotationFields) -> Annotation {
    let mut annotation = Annotation::from_fields(fields);
    annotation.assign_identity(id, &alice(), chrono::Utc::now());
    annotation
}
