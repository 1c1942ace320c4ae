//! Centralized default constants for marginalia.
//!
//! Crates reference these constants instead of defining their own magic
//! values.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default search page offset.
pub const SEARCH_OFFSET: u64 = 0;

/// Default search page size.
pub const SEARCH_LIMIT: u64 = 20;

// =============================================================================
// SORTING
// =============================================================================

/// Default sort field for search results.
pub const SORT_FIELD: &str = "updated";

/// Default sort order for search results.
pub const SORT_ORDER: &str = "desc";

// =============================================================================
// SEARCH FIELDS
// =============================================================================

/// Fields searched jointly by the `any` parameter.
pub const ANY_FIELDS: [&str; 5] = ["quote", "tags", "text", "uri.parts", "user"];

/// Field matched fuzzily against each expanded URI.
pub const URI_FIELD: &str = "uri";

/// Field holding the normalized target source, written at index time.
pub const NORMALIZED_SOURCE_FIELD: &str = "target.source_normalized";

/// Field carrying the NIPSA flag in indexed annotations.
pub const NIPSA_FIELD: &str = "nipsa";

/// Field carrying the author id in indexed annotations.
pub const USER_FIELD: &str = "user";

// =============================================================================
// PRINCIPALS
// =============================================================================

/// Prefix of group membership principals (`group:<id>`).
pub const GROUP_PRINCIPAL_PREFIX: &str = "group:";
