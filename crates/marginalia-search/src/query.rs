//! Compiles client search parameters into a [`SearchQuery`].
//!
//! Every compiled query has the same outer shape:
//!
//! ```text
//! Filtered {
//!     filter: [ <uri filter>?, <nipsa filter> ],
//!     query:  MatchAll | BoolAny[ <any match>?, <field matches>... ],
//! }
//! ```
//!
//! The NIPSA filter is always present, so the wrapper is never omitted.
//! Malformed pagination parameters are not errors; they fall back to the
//! defaults.

use std::sync::Arc;
use tracing::debug;

use marginalia_core::defaults::{
    ANY_FIELDS, NORMALIZED_SOURCE_FIELD, SEARCH_LIMIT, SEARCH_OFFSET, SORT_FIELD, SORT_ORDER,
    URI_FIELD,
};
use marginalia_core::uri::normalize as normalize_uri;
use marginalia_core::{nipsa_filter, Clause, SearchQuery, SortClause, UriResolver};

use crate::params::RequestParams;

/// Parameters consumed by the compiler itself rather than matched on.
pub const RESERVED_PARAMS: [&str; 6] = ["offset", "limit", "sort", "order", "uri", "any"];

/// Stateless search query compiler.
#[derive(Debug, Clone)]
pub struct SearchQueryCompiler {
    resolver: Arc<UriResolver>,
    default_limit: u64,
}

impl Default for SearchQueryCompiler {
    fn default() -> Self {
        Self::new(Arc::new(UriResolver::default()))
    }
}

impl SearchQueryCompiler {
    pub fn new(resolver: Arc<UriResolver>) -> Self {
        Self {
            resolver,
            default_limit: SEARCH_LIMIT,
        }
    }

    /// Page size used when `limit` is absent or malformed.
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn resolver(&self) -> &UriResolver {
        &self.resolver
    }

    /// Compile `params` for `viewer`.
    ///
    /// `use_normalized_uri_filter` selects exact matching on the
    /// pre-normalized target source instead of analyzed `uri` matching.
    pub fn compile(
        &self,
        params: &RequestParams,
        viewer: Option<&str>,
        use_normalized_uri_filter: bool,
    ) -> SearchQuery {
        let offset = parse_count(params.get("offset"), SEARCH_OFFSET);
        let size = parse_count(params.get("limit"), self.default_limit);
        let sort = SortClause {
            field: params.get("sort").unwrap_or(SORT_FIELD).to_string(),
            order: params.get("order").unwrap_or(SORT_ORDER).to_string(),
            ignore_unmapped: true,
        };

        let mut filters = Vec::new();
        if let Some(uri) = params.get("uri") {
            filters.extend(self.uri_filter(uri, use_normalized_uri_filter));
        }

        let mut matches = Vec::new();
        let any = params.get_all("any");
        if !any.is_empty() {
            matches.push(Clause::match_multi(ANY_FIELDS, any));
        }
        matches.extend(
            params
                .iter()
                .filter(|(key, _)| !RESERVED_PARAMS.contains(key))
                .map(|(key, value)| Clause::match_field(key, value)),
        );

        filters.push(nipsa_filter(viewer));

        debug!(
            subsystem = "search",
            component = "query_compiler",
            filter_count = filters.len(),
            match_count = matches.len(),
            normalized = use_normalized_uri_filter,
            "Compiled search query"
        );

        let query = if matches.is_empty() {
            Clause::MatchAll
        } else {
            Clause::any(matches)
        };

        SearchQuery {
            offset,
            size,
            sort,
            query: Clause::filtered(filters, query),
        }
    }

    /// The listing query behind the annotations index: default page, newest
    /// first, privacy filtered for `viewer`.
    pub fn index_query(&self, viewer: Option<&str>, use_normalized_uri_filter: bool) -> SearchQuery {
        self.compile(&RequestParams::new(), viewer, use_normalized_uri_filter)
    }

    /// Filter restricting results to documents at any representation of `uri`.
    fn uri_filter(&self, uri: &str, normalized: bool) -> Option<Clause> {
        let expanded = self.resolver.expand(uri);
        if normalized {
            Clause::any_or_single(
                expanded
                    .iter()
                    .map(|u| Clause::term(NORMALIZED_SOURCE_FIELD, normalize_uri(u)))
                    .collect(),
            )
        } else {
            Clause::any_or_single(
                expanded
                    .into_iter()
                    .map(|u| Clause::match_field(URI_FIELD, u))
                    .collect(),
            )
            .map(Clause::query_filter)
        }
    }
}

/// Non-negative integer parameter, or `default` when absent or malformed.
fn parse_count(value: Option<&str>, default: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(default)
}
