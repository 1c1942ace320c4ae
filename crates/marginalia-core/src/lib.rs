//! # marginalia-core
//!
//! Core types, traits, and business rules for the marginalia annotation store.
//!
//! This crate provides the data model, the search clause tree, URI
//! normalization, group authorization and NIPSA privacy filtering that the
//! other marginalia crates build on.

pub mod defaults;
pub mod error;
pub mod groups;
pub mod logging;
pub mod models;
pub mod nipsa;
pub mod query;
pub mod traits;
pub mod uri;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{AuthorizationError, Error, ErrorBody, Result};
pub use groups::{authorized_to_write, resolve_reply_group, set_group_if_reply};
pub use models::*;
pub use nipsa::{nipsa_filter, CachedNipsaRegistry, PrivacyFilter};
pub use query::{Clause, SearchQuery, SearchResults, SortClause};
pub use traits::*;
pub use uri::UriResolver;
pub use uuid_utils::{new_annotation_id, new_v7};
