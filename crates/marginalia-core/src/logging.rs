//! Structured logging field name constants for marginalia.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Rejected writes (authorization), automatic fallback applied |
//! | INFO  | Operation completions (search executed, snapshot refreshed) |
//! | DEBUG | Decision points (group resolved, annotation created, filter built) |
//! | TRACE | Per-item iteration (expanded URIs, match clauses) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "annotations", "search", "nipsa", "uri"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "write_service", "query_compiler", "nipsa_cache"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create", "update", "delete", "compile", "refresh"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Annotation id being operated on.
pub const ANNOTATION_ID: &str = "annotation_id";

/// Author or viewer user id.
pub const USER_ID: &str = "user_id";

/// Consumer (API key) identity.
pub const CONSUMER: &str = "consumer";

/// Group scope of a write.
pub const GROUP_ID: &str = "group_id";

/// URI being resolved or filtered on.
pub const URI: &str = "uri";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Number of results returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Total hit count reported by the backend.
pub const TOTAL: &str = "total";

/// Number of filter clauses in a compiled query.
pub const FILTER_COUNT: &str = "filter_count";

/// Number of match clauses in a compiled query.
pub const MATCH_COUNT: &str = "match_count";

/// Number of flagged users in a NIPSA snapshot.
pub const FLAGGED_COUNT: &str = "flagged_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
