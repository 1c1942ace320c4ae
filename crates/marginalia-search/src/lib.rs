//! # marginalia-search
//!
//! Search query compilation for the marginalia annotation store.
//!
//! This crate provides:
//! - `RequestParams`, the ordered multi-valued parameter map clients send
//! - `SearchQueryCompiler`, which turns parameters into a privacy-filtered
//!   [`SearchQuery`]
//! - Elasticsearch rendering of compiled queries and parsing of responses
//! - `SearchService`, which runs searches through a `SearchBackend`
//!
//! ## Example
//!
//! ```
//! use marginalia_search::{RequestParams, SearchQueryCompiler};
//!
//! let compiler = SearchQueryCompiler::default();
//! let params = RequestParams::from_query_string("any=rust&limit=5");
//! let query = compiler.compile(&params, Some("acct:me@example.com"), false);
//!
//! assert_eq!(query.size, 5);
//! assert_eq!(query.matches().len(), 1);
//! assert_eq!(query.filters().len(), 1);
//! ```

pub mod elastic;
pub mod flags;
pub mod params;
pub mod query;
pub mod service;

// Re-export core types
pub use marginalia_core::{Clause, SearchQuery, SearchResults, SortClause, UriResolver};

pub use flags::SearchFeatureFlags;
pub use params::RequestParams;
pub use query::SearchQueryCompiler;
pub use service::SearchService;
