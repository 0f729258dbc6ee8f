// src/services/status_service.rs
//
// Status Service - Status Resolution and Flag Updates
//
// CRITICAL RULES:
// - Owns the status cache; every mutation goes through `&mut self`
// - Lookup order is always cache, then store, then creation
// - Never issues a store call for an empty key set
// - Persists only the statuses whose flag actually changed

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{Article, ArticleStatus, StatusFlag, StatusRow};
use crate::error::AppResult;
use crate::events::{EventBus, StatusesCreated, StatusesMarked};
use crate::infrastructure::ObjectCache;
use crate::repositories::StatusRepository;

pub struct StatusService {
    status_repo: Arc<dyn StatusRepository>,
    cache: ObjectCache<ArticleStatus>,
    event_bus: Arc<EventBus>,
}

impl StatusService {
    pub fn new(status_repo: Arc<dyn StatusRepository>, event_bus: Arc<EventBus>) -> Self {
        Self {
            status_repo,
            cache: ObjectCache::new(),
            event_bus,
        }
    }

    /// Cached status for an article. Never touches the store.
    pub fn lookup(&self, article_id: &str) -> Option<Arc<ArticleStatus>> {
        self.cache.lookup(article_id)
    }

    /// Whether the article's status has been resolved in this session
    pub fn contains(&self, article_id: &str) -> bool {
        self.cache.contains(article_id)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    // ========================================================================
    // RESOLUTION
    // ========================================================================

    /// Attach a status to every article.
    ///
    /// Statuses come from the cache, then the store, and are created (and
    /// persisted) for whatever is left. On return every article has a
    /// status, even if persisting new statuses failed; that failure is
    /// reported through the result.
    ///
    /// # Panics
    /// If an article is still missing its status after the create pass.
    pub fn resolve(&mut self, articles: &mut [Article]) -> AppResult<()> {
        // 1. Cache
        self.attach_cached_statuses(articles);
        let missing = article_ids_missing_statuses(articles);
        if missing.is_empty() {
            return Ok(());
        }

        // 2. Store
        self.fetch_and_cache_statuses(&missing);
        self.attach_cached_statuses(articles);
        let missing = article_ids_missing_statuses(articles);
        if missing.is_empty() {
            return Ok(());
        }

        // 3. Create
        let saved = self.create_and_save_statuses(&missing);
        self.attach_cached_statuses(articles);

        assert_no_missing_statuses(articles);
        saved
    }

    /// Same three tiers as `resolve`, for bare article ids.
    ///
    /// Returns one status per id, in no particular order.
    pub fn ensure_statuses(
        &mut self,
        article_ids: &HashSet<String>,
    ) -> AppResult<Vec<Arc<ArticleStatus>>> {
        let mut missing = self.article_ids_missing_cached_statuses(article_ids);

        if !missing.is_empty() {
            self.fetch_and_cache_statuses(&missing);
            missing = self.article_ids_missing_cached_statuses(&missing);
        }

        let saved = if missing.is_empty() {
            Ok(())
        } else {
            self.create_and_save_statuses(&missing)
        };

        let statuses: Vec<Arc<ArticleStatus>> = article_ids
            .iter()
            .filter_map(|id| self.cache.lookup(id))
            .collect();
        assert!(
            statuses.len() == article_ids.len(),
            "All article ids must have a status at this point ({} of {})",
            statuses.len(),
            article_ids.len()
        );

        saved.map(|_| statuses)
    }

    fn attach_cached_statuses(&self, articles: &mut [Article]) {
        for article in articles.iter_mut().filter(|a| a.status.is_none()) {
            if let Some(status) = self.cache.lookup(&article.article_id) {
                article.status = Some(status);
            }
        }
    }

    fn article_ids_missing_cached_statuses(&self, article_ids: &HashSet<String>) -> HashSet<String> {
        article_ids
            .iter()
            .filter(|id| !self.cache.contains(id))
            .cloned()
            .collect()
    }

    /// Fetch rows for `article_ids` and cache every row that decodes.
    ///
    /// A failed fetch counts as "nothing found": the ids fall through to
    /// creation, and the conflict-ignoring insert keeps the store intact.
    fn fetch_and_cache_statuses(&mut self, article_ids: &HashSet<String>) {
        let rows = match self.status_repo.fetch_rows_by_key(article_ids) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!(
                    "Status fetch for {} articles failed, treating as not found: {}",
                    article_ids.len(),
                    e
                );
                Vec::new()
            }
        };

        let statuses = decode_status_rows(&rows);
        log::debug!(
            "Store returned {} rows ({} usable) for {} articles",
            rows.len(),
            statuses.len(),
            article_ids.len()
        );

        self.cache.insert_missing(statuses);
    }

    /// Create, cache and save statuses for `article_ids`.
    ///
    /// The new statuses are cached before the store is touched, so they are
    /// attachable even when the insert fails. `StatusesCreated` lists only
    /// the rows the store actually took.
    fn create_and_save_statuses(&mut self, article_ids: &HashSet<String>) -> AppResult<()> {
        let now = Utc::now();
        let statuses: Vec<Arc<ArticleStatus>> = article_ids
            .iter()
            .map(|id| Arc::new(ArticleStatus::new(id.as_str(), now)))
            .collect();

        self.cache.insert_missing(statuses.iter().cloned());

        let rows: Vec<StatusRow> = statuses.iter().map(|s| s.to_row()).collect();
        let inserted = self.status_repo.insert_rows_ignore_conflict(&rows)?;

        log::info!(
            "Created {} article statuses ({} new rows in the store)",
            statuses.len(),
            inserted.len()
        );
        if !inserted.is_empty() {
            self.event_bus.emit(StatusesCreated::new(inserted));
        }

        Ok(())
    }

    // ========================================================================
    // FLAG UPDATES
    // ========================================================================

    /// Set `flag` to `value` on every status, persisting only real changes.
    ///
    /// Statuses already at `value` are left alone. The rest are updated in
    /// place and written with a single store call. Returns the ids that
    /// changed; an empty set means the store was not touched.
    ///
    /// Statuses are expected to come from this service (resolved first).
    pub fn mark(
        &mut self,
        statuses: &[Arc<ArticleStatus>],
        flag: &StatusFlag,
        value: bool,
    ) -> AppResult<HashSet<String>> {
        let mut article_ids_to_update = HashSet::new();

        for status in statuses {
            if status.flag(flag) == value {
                continue;
            }
            if !self.cache.contains(status.article_id()) {
                log::warn!("Marking status for {} which was never resolved", status.article_id());
            }

            status.set_flag(flag, value);
            article_ids_to_update.insert(status.article_id().to_string());
        }

        if article_ids_to_update.is_empty() {
            log::debug!("No statuses changed for {} = {}", flag, value);
            return Ok(article_ids_to_update);
        }

        self.status_repo
            .update_rows(value, flag, &article_ids_to_update)?;

        log::info!(
            "Set {} = {} on {} of {} statuses",
            flag,
            value,
            article_ids_to_update.len(),
            statuses.len()
        );
        self.event_bus.emit(StatusesMarked::new(
            flag.to_string(),
            value,
            article_ids_to_update.iter().cloned().collect(),
        ));

        Ok(article_ids_to_update)
    }

    /// Resolve the articles, then mark their statuses.
    pub fn mark_articles(
        &mut self,
        articles: &mut [Article],
        flag: &StatusFlag,
        value: bool,
    ) -> AppResult<HashSet<String>> {
        self.resolve(articles)?;

        let statuses: Vec<Arc<ArticleStatus>> =
            articles.iter().filter_map(|a| a.status.clone()).collect();
        self.mark(&statuses, flag, value)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Decode rows, dropping the ones that are malformed
fn decode_status_rows(rows: &[StatusRow]) -> Vec<Arc<ArticleStatus>> {
    rows.iter()
        .filter_map(|row| {
            let status = ArticleStatus::from_row(row);
            if status.is_none() {
                log::warn!(
                    "Dropping malformed status row for article {:?}",
                    row.article_id
                );
            }
            status
        })
        .map(Arc::new)
        .collect()
}

fn article_ids_missing_statuses(articles: &[Article]) -> HashSet<String> {
    articles
        .iter()
        .filter(|a| a.status.is_none())
        .map(|a| a.article_id.clone())
        .collect()
}

fn assert_no_missing_statuses(articles: &[Article]) {
    let missing = articles.iter().filter(|a| a.status.is_none()).count();
    assert!(
        missing == 0,
        "All articles must have a status at this point ({} missing)",
        missing
    );
}
