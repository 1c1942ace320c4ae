//! # marginalia-annotations
//!
//! The annotation write pipeline for the marginalia annotation store.
//!
//! This crate provides:
//! - `AnnotationWriteService`: create, update and delete under group
//!   authorization and NIPSA rules
//! - Anonymization of logically deleted annotations
//! - `NormalizedUriPreparer`, the default index-preparation step
//! - In-memory collaborators for tests and local use (`mock`)
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use marginalia_annotations::mock::{MemoryAnnotationStore, MemoryNipsaRegistry};
//! use marginalia_annotations::{AnnotationWriteService, NormalizedUriPreparer};
//! use marginalia_core::{AnnotationFields, Author, Principals};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let service = AnnotationWriteService::new(
//!     Arc::new(MemoryAnnotationStore::new()),
//!     Arc::new(MemoryNipsaRegistry::new()),
//!     Arc::new(NormalizedUriPreparer::default()),
//! );
//!
//! let author = Author::new("acct:alice@example.com", "client-key");
//! let principals = Principals::new().with_group("reading-club");
//! let fields = AnnotationFields::new().with_text("Nice").with_group("reading-club");
//!
//! let annotation = service.create(fields, &author, &principals).await.unwrap();
//! assert_eq!(annotation.user(), Some("acct:alice@example.com"));
//! # }
//! ```

pub mod anonymize;
pub mod mock;
pub mod prepare;
pub mod service;

pub use anonymize::anonymize_deleted;
pub use prepare::NormalizedUriPreparer;
pub use service::AnnotationWriteService;
