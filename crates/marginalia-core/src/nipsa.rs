//! "Not in public site areas" (NIPSA) privacy filtering.
//!
//! Annotations by flagged users carry `nipsa = true` in the index. Searches
//! hide them from everyone except their author, via the clause returned by
//! [`nipsa_filter`].
//!
//! ## Snapshot cache
//!
//! [`CachedNipsaRegistry`] keeps the flagged-user set in memory:
//!
//! - the snapshot is built lazily on first use, exactly once, even under
//!   concurrent first reads;
//! - a built snapshot is immutable and shared as `Arc<HashSet<_>>`;
//! - [`CachedNipsaRegistry::refresh`] rebuilds it and swaps it in whole;
//!   builds are serialized by an async mutex, so readers never see a
//!   partially loaded set.
//!
//! One process-wide instance can be installed with [`install_global`].

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::defaults::{NIPSA_FIELD, USER_FIELD};
use crate::error::Result;
use crate::query::Clause;
use crate::traits::{NipsaRegistry, NipsaSource};

/// Filter clause that hides NIPSA'd annotations from everyone but `viewer`.
///
/// Passes an annotation if it is not flagged, or if the viewer wrote it.
/// Suitable as one term of a conjunctive filter list.
pub fn nipsa_filter(viewer: Option<&str>) -> Clause {
    let mut should = vec![Clause::not(Clause::term(NIPSA_FIELD, true))];
    if let Some(viewer) = viewer {
        // Always show the logged-in user's own annotations.
        should.push(Clause::term(USER_FIELD, viewer));
    }
    Clause::any(should)
}

/// Privacy checks used by the write pipeline and the query compiler.
///
/// Every [`has_nipsa`](PrivacyFilter::has_nipsa) call goes to the registry;
/// caching, if any, is the registry's business.
#[derive(Clone)]
pub struct PrivacyFilter {
    registry: Arc<dyn NipsaRegistry>,
}

impl PrivacyFilter {
    pub fn new(registry: Arc<dyn NipsaRegistry>) -> Self {
        Self { registry }
    }

    pub async fn has_nipsa(&self, user_id: &str) -> Result<bool> {
        self.registry.has_nipsa(user_id).await
    }

    pub fn exclusion_clause(&self, viewer: Option<&str>) -> Clause {
        nipsa_filter(viewer)
    }
}

// =============================================================================
// SNAPSHOT CACHE
// =============================================================================

type Snapshot = Arc<HashSet<String>>;

/// Read-mostly in-memory NIPSA registry backed by a [`NipsaSource`].
pub struct CachedNipsaRegistry<S> {
    source: S,
    snapshot: RwLock<Option<Snapshot>>,
    build_lock: Mutex<()>,
}

impl<S: NipsaSource> CachedNipsaRegistry<S> {
    /// Create an empty cache. Nothing is loaded until first use.
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshot: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// True once a snapshot has been built.
    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Load from the source and publish. Callers hold `build_lock`.
    async fn build(&self) -> Result<Snapshot> {
        let snapshot: Snapshot = Arc::new(self.source.load_flagged().await?);
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(snapshot.clone());
        info!(
            subsystem = "nipsa",
            component = "nipsa_cache",
            flagged_count = snapshot.len(),
            "NIPSA snapshot built"
        );
        Ok(snapshot)
    }

    /// The current snapshot, building it on first use.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        let _guard = self.build_lock.lock().await;
        // Another caller may have built it while we waited.
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        self.build().await
    }

    /// Rebuild the snapshot from the source. Returns the flagged count.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = self.build_lock.lock().await;
        debug!(subsystem = "nipsa", op = "refresh", "Refreshing NIPSA snapshot");
        Ok(self.build().await?.len())
    }
}

#[async_trait]
impl<S: NipsaSource> NipsaRegistry for CachedNipsaRegistry<S> {
    async fn has_nipsa(&self, user_id: &str) -> Result<bool> {
        Ok(self.snapshot().await?.contains(user_id))
    }
}

#[async_trait]
impl<T: NipsaSource + ?Sized> NipsaSource for Arc<T> {
    async fn load_flagged(&self) -> Result<HashSet<String>> {
        (**self).load_flagged().await
    }
}

// =============================================================================
// PROCESS-WIDE INSTANCE
// =============================================================================

/// The process-wide cached registry type.
pub type GlobalNipsaRegistry = CachedNipsaRegistry<Arc<dyn NipsaSource>>;

static GLOBAL: OnceCell<Arc<GlobalNipsaRegistry>> = OnceCell::new();

/// Install the process-wide registry. Only the first call installs; later
/// calls return the already installed instance and drop `source`.
pub fn install_global(source: Arc<dyn NipsaSource>) -> Arc<GlobalNipsaRegistry> {
    GLOBAL
        .get_or_init(|| Arc::new(CachedNipsaRegistry::new(source)))
        .clone()
}

/// The process-wide registry, if installed.
pub fn global() -> Option<Arc<GlobalNipsaRegistry>> {
    GLOBAL.get().cloned()
}
