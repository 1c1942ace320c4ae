//! URI normalization and expansion.
//!
//! Annotated documents are reachable under many URIs. [`normalize`] folds
//! the cosmetic differences of HTTP(S) URLs into one canonical string used
//! for exact lookups, and [`UriResolver::expand`] maps a URI to every
//! representation registered as equivalent to it (e.g. the PDF fingerprint
//! URN and the web URL of the same paper).
//!
//! ## Normalization rules
//!
//! | Part | Rule |
//! |------|------|
//! | scheme | `https` folded to `http` |
//! | host | lower-cased |
//! | port | default port dropped |
//! | path | trailing slash dropped, unreserved percent-escapes decoded, other escapes upper-cased |
//! | query | tracking parameters dropped, remaining pairs sorted by key |
//! | fragment | dropped |
//!
//! Anything that is not an HTTP(S) URL is returned trimmed but otherwise
//! unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::trace;
use url::{form_urlencoded, Url};

/// Query parameters stripped during normalization.
static BLACKLISTED_QUERY_PARAMS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Google Analytics campaigns
        r"^utm_(campaign|content|medium|source|term)$",
        // WebTrends Analytics
        r"^WT\..+$",
        // Amazon security access token
        r"(?i)^x-amz-security-token$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("blacklist pattern must compile"))
    .collect()
});

fn is_blacklisted(key: &str) -> bool {
    BLACKLISTED_QUERY_PARAMS.iter().any(|re| re.is_match(key))
}

/// Canonical form of `uri` for exact-match lookups.
pub fn normalize(uri: &str) -> String {
    let trimmed = uri.trim();
    let url = match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => return trimmed.to_string(),
    };
    let Some(host) = url.host_str() else {
        return trimmed.to_string();
    };

    let mut out = String::from("http://");

    if !url.username().is_empty() {
        out.push_str(url.username());
        if let Some(password) = url.password() {
            out.push(':');
            out.push_str(password);
        }
        out.push('@');
    }

    out.push_str(&host.to_lowercase());

    // Url::port() is None for the scheme's default port.
    if let Some(port) = url.port() {
        if port != 80 {
            out.push(':');
            out.push_str(&port.to_string());
        }
    }

    let path = normalize_percent_encoding(url.path());
    out.push_str(path.trim_end_matches('/'));

    let query = normalize_query(&url);
    if !query.is_empty() {
        out.push('?');
        out.push_str(&query);
    }

    out
}

fn normalize_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_blacklisted(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    // Stable: repeated keys keep their relative order.
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// Decode escapes of unreserved characters and upper-case the rest.
fn normalize_percent_encoding(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = String::with_capacity(path.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            let hex = &path[i + 1..i + 3];
            if let Ok(decoded) = u8::from_str_radix(hex, 16) {
                if is_unreserved(decoded) {
                    out.push(decoded as char);
                } else {
                    out.push('%');
                    out.push_str(&hex.to_uppercase());
                }
                i += 3;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Expands URIs to their registered equivalents.
///
/// Equivalence classes are registered up front and never change afterwards;
/// lookups are keyed by normalized form, so a query for any cosmetic variant
/// of a member finds the whole class.
///
/// # Example
///
/// ```
/// use marginalia_core::uri::UriResolver;
///
/// let resolver = UriResolver::new().with_equivalents([
///     "http://example.com/paper.pdf",
///     "urn:x-pdf:0123abcd",
/// ]);
///
/// assert_eq!(
///     resolver.expand("https://EXAMPLE.com/paper.pdf"),
///     vec![
///         "https://EXAMPLE.com/paper.pdf".to_string(),
///         "http://example.com/paper.pdf".to_string(),
///         "urn:x-pdf:0123abcd".to_string(),
///     ]
/// );
/// assert_eq!(resolver.expand("http://other.org"), vec!["http://other.org".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct UriResolver {
    classes: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl UriResolver {
    /// Resolver without equivalences; every URI expands to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register URIs that denote the same document.
    ///
    /// Classes that share a member with an earlier class are merged into it.
    pub fn with_equivalents<I, S>(mut self, uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let incoming: Vec<String> = uris.into_iter().map(Into::into).collect();
        if incoming.is_empty() {
            return self;
        }

        let mut overlapping: Vec<usize> = incoming
            .iter()
            .filter_map(|uri| self.index.get(&normalize(uri)).copied())
            .collect();
        overlapping.sort_unstable();
        overlapping.dedup();

        let mut merged = match overlapping.first() {
            Some(&first) => self.classes[first].clone(),
            None => Vec::new(),
        };
        for &idx in overlapping.iter().skip(1) {
            merged.extend(self.classes[idx].iter().cloned());
        }
        merged.extend(incoming);

        let mut seen = std::collections::HashSet::new();
        merged.retain(|uri| seen.insert(uri.clone()));

        // Drop the absorbed classes, back to front so indices stay valid.
        for &idx in overlapping.iter().rev() {
            self.classes.remove(idx);
        }
        self.classes.push(merged);
        self.rebuild_index();
        self
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .classes
            .iter()
            .enumerate()
            .flat_map(|(idx, class)| class.iter().map(move |uri| (normalize(uri), idx)))
            .collect();
    }

    /// Every registered representation of `uri`, starting with `uri` itself.
    pub fn expand(&self, uri: &str) -> Vec<String> {
        let mut expanded = vec![uri.to_string()];
        if let Some(&idx) = self.index.get(&normalize(uri)) {
            expanded.extend(
                self.classes[idx]
                    .iter()
                    .filter(|member| member.as_str() != uri)
                    .cloned(),
            );
        }
        trace!(uri, expanded = expanded.len(), "Expanded URI");
        expanded
    }

    /// Same as the free function [`normalize`].
    pub fn normalize(&self, uri: &str) -> String {
        normalize(uri)
    }
}
