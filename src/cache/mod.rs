//! Post cache
//!
//! Keeps a rendered, sorted listing of every post in memory and rebuilds it
//! from the content store once it is older than the freshness window. At most
//! one rebuild runs at a time; callers arriving during a rebuild wait for it
//! and share its result.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::content::{sort_newest_first, ContentError, Post, PostLoader, Result};

/// Default freshness window
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Slugs served through dedicated pages rather than the listing
pub const DEFAULT_RESERVED_SLUGS: [&str; 2] = ["about", "index"];

/// A post that could not be loaded during a rebuild
#[derive(Debug)]
pub struct LoadFailure {
    pub slug: String,
    pub error: ContentError,
}

/// An immutable listing of all posts as of one rebuild
#[derive(Debug)]
pub struct Snapshot {
    posts: Vec<Post>,
    failures: Vec<LoadFailure>,
    built_at: Instant,
}

impl Snapshot {
    /// Posts, newest first
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Documents skipped during the rebuild that produced this snapshot
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.built_at) < ttl
    }
}

enum CacheState {
    Empty,
    Populated(Arc<Snapshot>),
}

/// Time-bounded cache of the full post listing
pub struct PostCache {
    loader: Arc<PostLoader>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    reserved_slugs: Vec<String>,
    state: RwLock<CacheState>,
    rebuilds: AtomicU64,
}

impl PostCache {
    /// Create an empty cache
    pub fn new(loader: Arc<PostLoader>, clock: Arc<dyn Clock>) -> Self {
        Self {
            loader,
            clock,
            ttl: DEFAULT_TTL,
            reserved_slugs: DEFAULT_RESERVED_SLUGS.map(String::from).to_vec(),
            state: RwLock::new(CacheState::Empty),
            rebuilds: AtomicU64::new(0),
        }
    }

    /// Set the freshness window
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Replace the set of slugs excluded from the listing
    pub fn with_reserved_slugs<I, S>(mut self, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_slugs = slugs.into_iter().map(Into::into).collect();
        self
    }

    /// The loader used for rebuilds
    pub fn loader(&self) -> &PostLoader {
        &self.loader
    }

    /// Number of rebuilds performed so far
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn is_populated(&self) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        matches!(*state, CacheState::Populated(_))
    }

    /// All posts, newest first, rebuilding the listing if it has gone stale
    ///
    /// Fails only when the store cannot be enumerated; documents that fail to
    /// load are recorded in [`Snapshot::failures`] and left out.
    pub fn list_all(&self) -> Result<Arc<Snapshot>> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have rebuilt while we waited for the write lock
        if let CacheState::Populated(snapshot) = &*state {
            if snapshot.is_fresh(self.clock.now(), self.ttl) {
                return Ok(Arc::clone(snapshot));
            }
        }

        let snapshot = Arc::new(self.rebuild()?);
        *state = CacheState::Populated(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// The current snapshot, if there is one and it is still fresh
    fn fresh_snapshot(&self) -> Option<Arc<Snapshot>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            CacheState::Populated(snapshot) if snapshot.is_fresh(self.clock.now(), self.ttl) => {
                Some(Arc::clone(snapshot))
            }
            _ => None,
        }
    }

    /// Load every listed post from the store into a new snapshot
    fn rebuild(&self) -> Result<Snapshot> {
        let store = self.loader.store();
        let entries = store.entries().map_err(|source| ContentError::Store {
            path: store.location().to_path_buf(),
            source,
        })?;
        self.rebuilds.fetch_add(1, Ordering::SeqCst);

        let (mut posts, failures) = entries
            .iter()
            .filter_map(|entry| entry.markdown_slug())
            .filter(|slug| !self.reserved_slugs.iter().any(|r| r.as_str() == *slug))
            .fold((Vec::new(), Vec::new()), |(mut posts, mut failures), slug| {
                tracing::debug!("Indexing {}", slug);
                match self.loader.load_by_slug(slug) {
                    Ok(post) => posts.push(post),
                    Err(error) => failures.push(LoadFailure {
                        slug: slug.to_string(),
                        error,
                    }),
                }
                (posts, failures)
            });

        for failure in &failures {
            tracing::warn!("Skipping post {}: {}", failure.slug, failure.error);
        }

        sort_newest_first(&mut posts);

        tracing::info!(
            "Indexed {} posts from {:?} ({} skipped)",
            posts.len(),
            store.location(),
            failures.len()
        );

        Ok(Snapshot {
            posts,
            failures,
            built_at: self.clock.now(),
        })
    }
}
