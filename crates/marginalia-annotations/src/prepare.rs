//! Default index preparation.

use std::sync::Arc;

use marginalia_core::{Annotation, IndexPreparer, UriResolver};
use serde_json::Value as JsonValue;

/// Key under which each target carries its normalized source.
pub const SOURCE_NORMALIZED_KEY: &str = "source_normalized";

/// Stores the normalized form of every target source, so searches can
/// filter on `target.source_normalized` by exact term.
#[derive(Debug, Clone, Default)]
pub struct NormalizedUriPreparer {
    resolver: Arc<UriResolver>,
}

impl NormalizedUriPreparer {
    pub fn new(resolver: Arc<UriResolver>) -> Self {
        Self { resolver }
    }
}

impl IndexPreparer for NormalizedUriPreparer {
    fn prepare(&self, annotation: &mut Annotation) {
        for target in &mut annotation.target {
            match target.source.as_deref() {
                Some(source) => {
                    let normalized = self.resolver.normalize(source);
                    target
                        .extra
                        .insert(SOURCE_NORMALIZED_KEY.to_string(), JsonValue::String(normalized));
                }
                None => {
                    target.extra.remove(SOURCE_NORMALIZED_KEY);
                }
            }
        }
    }
}
