//! Search execution through a [`SearchBackend`].

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use marginalia_core::{Result, SearchBackend, SearchQuery, SearchResults, UriResolver};

use crate::flags::SearchFeatureFlags;
use crate::params::RequestParams;
use crate::query::SearchQueryCompiler;

/// Compiles client searches and runs them against the index.
pub struct SearchService {
    backend: Arc<dyn SearchBackend>,
    compiler: SearchQueryCompiler,
    flags: SearchFeatureFlags,
}

impl SearchService {
    /// Service with flags read from the environment.
    pub fn new(backend: Arc<dyn SearchBackend>, resolver: Arc<UriResolver>) -> Self {
        Self::with_flags(backend, resolver, SearchFeatureFlags::from_env())
    }

    pub fn with_flags(
        backend: Arc<dyn SearchBackend>,
        resolver: Arc<UriResolver>,
        flags: SearchFeatureFlags,
    ) -> Self {
        let compiler = SearchQueryCompiler::new(resolver).with_default_limit(flags.default_limit);
        Self {
            backend,
            compiler,
            flags,
        }
    }

    pub fn flags(&self) -> &SearchFeatureFlags {
        &self.flags
    }

    pub fn compiler(&self) -> &SearchQueryCompiler {
        &self.compiler
    }

    /// Search with client parameters, filtered for `viewer`.
    pub async fn search(&self, params: &RequestParams, viewer: Option<&str>) -> Result<SearchResults> {
        let query = self
            .compiler
            .compile(params, viewer, self.flags.normalized_uris);
        self.run("search", &query).await
    }

    /// The newest annotations visible to `viewer`.
    pub async fn index(&self, viewer: Option<&str>) -> Result<SearchResults> {
        let query = self
            .compiler
            .index_query(viewer, self.flags.normalized_uris);
        self.run("index", &query).await
    }

    async fn run(&self, op: &str, query: &SearchQuery) -> Result<SearchResults> {
        let start = Instant::now();
        match self.backend.execute(query).await {
            Ok(results) => {
                info!(
                    subsystem = "search",
                    component = "search_service",
                    op,
                    result_count = results.rows.len(),
                    total = results.total,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Search completed"
                );
                Ok(results)
            }
            Err(e) => {
                warn!(
                    subsystem = "search",
                    component = "search_service",
                    op,
                    error = %e,
                    "Search failed"
                );
                Err(e)
            }
        }
    }
}
