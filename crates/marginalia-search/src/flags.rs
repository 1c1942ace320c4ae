//! Runtime configuration for annotation search.
//!
//! Flags are read from the environment so a deployment can switch URI
//! matching strategies without a rebuild:
//!
//! - `SEARCH_NORMALIZED_URIS` (default: false) filters documents by exact
//!   match on their pre-normalized target source instead of analyzed `uri`
//!   matching;
//! - `SEARCH_DEFAULT_LIMIT` (default: 20) is the page size used when the
//!   client sends no usable `limit`.

use std::env;

use marginalia_core::defaults;

/// Environment variable toggling normalized URI filtering.
pub const NORMALIZED_URIS_ENV: &str = "SEARCH_NORMALIZED_URIS";

/// Environment variable overriding the fallback page size.
pub const DEFAULT_LIMIT_ENV: &str = "SEARCH_DEFAULT_LIMIT";

/// Feature flags controlling search behavior.
///
/// # Example
/// ```
/// use marginalia_search::flags::SearchFeatureFlags;
///
/// let flags = SearchFeatureFlags::default();
/// assert!(!flags.normalized_uris);
/// assert_eq!(flags.default_limit, 20);
///
/// let flags = SearchFeatureFlags::default().with_normalized_uris(true);
/// assert!(flags.normalized_uris);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFeatureFlags {
    /// Filter by `target.source_normalized` term match.
    pub normalized_uris: bool,

    /// Page size when the request carries no valid `limit`.
    pub default_limit: u64,
}

impl Default for SearchFeatureFlags {
    fn default() -> Self {
        Self {
            normalized_uris: false,
            default_limit: defaults::SEARCH_LIMIT,
        }
    }
}

impl SearchFeatureFlags {
    /// Constructs flags from environment variables.
    ///
    /// Booleans accept "true", "1", "yes", "on" and "false", "0", "no", "off"
    /// (case-insensitive). Anything else, or a missing variable, keeps the
    /// default.
    pub fn from_env() -> Self {
        Self {
            normalized_uris: parse_bool_env(NORMALIZED_URIS_ENV, false),
            default_limit: parse_u64_env(DEFAULT_LIMIT_ENV, defaults::SEARCH_LIMIT),
        }
    }

    pub fn with_normalized_uris(mut self, enabled: bool) -> Self {
        self.normalized_uris = enabled;
        self
    }

    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }
}

/// Parses a boolean environment variable with a default fallback.
fn parse_bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|val| match val.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn parse_u64_env(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global, so tests must not run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_search_env() {
        env::remove_var(NORMALIZED_URIS_ENV);
        env::remove_var(DEFAULT_LIMIT_ENV);
    }

    #[test]
    fn test_default_flags() {
        let flags = SearchFeatureFlags::default();
        assert!(!flags.normalized_uris);
        assert_eq!(flags.default_limit, 20);
    }

    #[test]
    fn test_from_env_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_search_env();

        assert_eq!(SearchFeatureFlags::from_env(), SearchFeatureFlags::default());
    }

    #[test]
    fn test_from_env_normalized_uris() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_search_env();

        for val in ["true", "TRUE", "1", "yes", "On"] {
            env::set_var(NORMALIZED_URIS_ENV, val);
            assert!(
                SearchFeatureFlags::from_env().normalized_uris,
                "Expected '{}' to enable normalized URIs",
                val
            );
        }
        env::set_var(NORMALIZED_URIS_ENV, "off");
        assert!(!SearchFeatureFlags::from_env().normalized_uris);
        clear_search_env();
    }

    #[test]
    fn test_from_env_garbage_uses_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_search_env();

        env::set_var(NORMALIZED_URIS_ENV, "maybe");
        env::set_var(DEFAULT_LIMIT_ENV, "-5");
        let flags = SearchFeatureFlags::from_env();
        assert!(!flags.normalized_uris);
        assert_eq!(flags.default_limit, 20);
        clear_search_env();
    }

    #[test]
    fn test_from_env_default_limit() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_search_env();

        env::set_var(DEFAULT_LIMIT_ENV, " 50 ");
        assert_eq!(SearchFeatureFlags::from_env().default_limit, 50);
        clear_search_env();
    }

    #[test]
    fn test_builders() {
        let flags = SearchFeatureFlags::default()
            .with_normalized_uris(true)
            .with_default_limit(5);
        assert!(flags.normalized_uris);
        assert_eq!(flags.default_limit, 5);
    }
}
