//! Backend-agnostic search query model.
//!
//! A compiled search is a [`SearchQuery`]: pagination, one sort clause, and a
//! tree of [`Clause`] values. Backends translate the tree into their own
//! query language.
//!
//! # Example
//!
//! ```
//! use marginalia_core::{Clause, SearchQuery};
//!
//! let query = SearchQuery::new(Clause::filtered(
//!     vec![Clause::term("nipsa", false)],
//!     Clause::MatchAll,
//! ));
//!
//! assert_eq!(query.offset, 0);
//! assert_eq!(query.size, 20);
//! assert_eq!(query.filters().len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::defaults;
use crate::models::Annotation;

// =============================================================================
// CLAUSES
// =============================================================================

/// One node of a search query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Clause {
    /// Matches every document.
    MatchAll,

    /// Analyzed match of one field against one value.
    MatchField { field: String, value: String },

    /// Analyzed match of several values across several fields jointly.
    MatchMulti {
        fields: Vec<String>,
        values: Vec<String>,
    },

    /// Unanalyzed exact match.
    TermExact { field: String, value: JsonValue },

    /// Negation.
    Not { clause: Box<Clause> },

    /// At least one sub-clause holds.
    BoolAny { clauses: Vec<Clause> },

    /// Every sub-clause holds.
    BoolAll { clauses: Vec<Clause> },

    /// A scoring query used in filter position.
    QueryFilter { query: Box<Clause> },

    /// Restrict `query` to documents passing every filter.
    Filtered {
        filter: Vec<Clause>,
        query: Box<Clause>,
    },
}

impl Clause {
    pub fn match_field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Clause::MatchField {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn match_multi<F, V>(fields: F, values: V) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        Clause::MatchMulti {
            fields: fields.into_iter().map(Into::into).collect(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn term(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Clause::TermExact {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not(clause: Clause) -> Self {
        Clause::Not {
            clause: Box::new(clause),
        }
    }

    pub fn any(clauses: Vec<Clause>) -> Self {
        Clause::BoolAny { clauses }
    }

    pub fn all(clauses: Vec<Clause>) -> Self {
        Clause::BoolAll { clauses }
    }

    pub fn query_filter(query: Clause) -> Self {
        Clause::QueryFilter {
            query: Box::new(query),
        }
    }

    pub fn filtered(filter: Vec<Clause>, query: Clause) -> Self {
        Clause::Filtered {
            filter,
            query: Box::new(query),
        }
    }

    /// Disjunction that collapses a single clause to itself.
    ///
    /// Returns `None` for an empty list.
    pub fn any_or_single(mut clauses: Vec<Clause>) -> Option<Self> {
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Clause::any(clauses)),
        }
    }
}

// =============================================================================
// SORT
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    /// Order as given by the client; backends understand `asc` and `desc`.
    pub order: String,
    /// Documents lacking the field sort as if it were unmapped.
    pub ignore_unmapped: bool,
}

impl Default for SortClause {
    fn default() -> Self {
        Self {
            field: defaults::SORT_FIELD.to_string(),
            order: defaults::SORT_ORDER.to_string(),
            ignore_unmapped: true,
        }
    }
}

// =============================================================================
// SEARCH QUERY
// =============================================================================

/// A compiled, backend-agnostic search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub offset: u64,
    pub size: u64,
    pub sort: SortClause,
    pub query: Clause,
}

impl SearchQuery {
    /// Query with default pagination and sort.
    pub fn new(query: Clause) -> Self {
        Self {
            offset: defaults::SEARCH_OFFSET,
            size: defaults::SEARCH_LIMIT,
            sort: SortClause::default(),
            query,
        }
    }

    /// Top-level filter clauses, empty unless the query is filtered.
    pub fn filters(&self) -> &[Clause] {
        match &self.query {
            Clause::Filtered { filter, .. } => filter,
            _ => &[],
        }
    }

    /// The scoring part of the query, beneath any filter wrapper.
    pub fn base_query(&self) -> &Clause {
        match &self.query {
            Clause::Filtered { query, .. } => query,
            other => other,
        }
    }

    /// Match clauses of the base query.
    pub fn matches(&self) -> &[Clause] {
        match self.base_query() {
            Clause::BoolAny { clauses } => clauses,
            Clause::MatchAll => &[],
            other => std::slice::from_ref(other),
        }
    }
}

/// Search hits returned by a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub total: u64,
    pub rows: Vec<Annotation>,
}
