//! The session store aggregate.
//!
//! All mutations go through [`SessionStore::upsert_summary`] and
//! [`SessionStore::merge_details`], which keep these invariants:
//!
//! - a URL identifies at most one session;
//! - `date_discovered` is written once, on first insertion;
//! - `metadata.total_seances` equals the number of sessions after a save.

use crate::core::model::{Discussion, Metadata, Session, SessionSummary, StoreDocument};
use crate::error::{Error, Result};
use crate::storage::traits::StoreBackend;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// In-memory model of every known session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    source_url: String,
    last_update: Option<DateTime<Utc>>,
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    /// Create an empty store for sessions listed at `source_url`.
    #[must_use]
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            last_update: None,
            sessions: HashMap::new(),
        }
    }

    /// Load the store from `backend`, or start empty if nothing was saved.
    ///
    /// Duplicate URLs in a persisted document are collapsed, keeping the
    /// earliest discovery time.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted document cannot be read.
    pub fn load(backend: &dyn StoreBackend, source_url: impl Into<String>) -> Result<Self> {
        let mut store = Self::new(source_url);
        let Some(document) = backend.load()? else {
            info!(location = %backend.location(), "no existing store, starting empty");
            return Ok(store);
        };

        store.last_update = Some(document.metadata.last_update);
        for session in document.sessions {
            match store.sessions.get_mut(&session.url) {
                Some(existing) => {
                    debug!(url = %session.url, "collapsing duplicate stored session");
                    if session.date_discovered < existing.date_discovered {
                        existing.date_discovered = session.date_discovered;
                    }
                    if existing.discussions.is_empty() {
                        existing.discussions = session.discussions;
                    }
                }
                None => {
                    store.sessions.insert(session.url.clone(), session);
                }
            }
        }

        info!(
            location = %backend.location(),
            sessions = store.sessions.len(),
            "store loaded"
        );
        Ok(store)
    }

    /// Persist the store, recomputing metadata first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Persistence` (or a serialization error) if the backend
    /// cannot write; the previously persisted state is left intact.
    pub fn save(&mut self, backend: &dyn StoreBackend, now: DateTime<Utc>) -> Result<()> {
        let document = self.to_document(now);
        backend.save(&document)?;
        self.last_update = Some(now);
        Ok(())
    }

    /// Snapshot of the store in persisted form.
    ///
    /// Sessions are ordered newest first, undated last, ties by URL.
    #[must_use]
    pub fn to_document(&self, now: DateTime<Utc>) -> StoreDocument {
        let mut sessions: Vec<Session> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.url.cmp(&b.url)));

        StoreDocument {
            metadata: Metadata {
                url_source: self.source_url.clone(),
                last_update: now,
                total_seances: sessions.len(),
            },
            sessions,
        }
    }

    /// Record a discovered summary.
    ///
    /// Returns `true` if the URL was unknown and a placeholder session was
    /// inserted with `date_discovered = now`. A known URL is left untouched.
    pub fn upsert_summary(&mut self, summary: &SessionSummary, now: DateTime<Utc>) -> bool {
        if self.sessions.contains_key(&summary.url) {
            debug!(url = %summary.url, "session already known");
            return false;
        }
        self.sessions
            .insert(summary.url.clone(), Session::from_summary(summary, now));
        debug!(url = %summary.url, date = ?summary.date, "session added");
        true
    }

    /// Attach or replace the discussions of a stored session.
    ///
    /// Returns `true` if the stored discussions changed.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotFound` if `url` is not stored; the store is
    /// not modified.
    pub fn merge_details(&mut self, url: &str, discussions: Vec<Discussion>) -> Result<bool> {
        let session = self
            .sessions
            .get_mut(url)
            .ok_or_else(|| Error::SessionNotFound(url.to_string()))?;

        if session.discussions == discussions {
            return Ok(false);
        }
        session.discussions = discussions;
        Ok(true)
    }

    /// Look up a session.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&Session> {
        self.sessions.get(url)
    }

    /// Whether a session with this URL is stored.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.sessions.contains_key(url)
    }

    /// All stored sessions in persisted order.
    #[must_use]
    pub fn sessions(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.url.cmp(&b.url)));
        sessions
    }

    /// URLs of every stored session.
    #[must_use]
    pub fn known_urls(&self) -> HashSet<String> {
        self.sessions.keys().cloned().collect()
    }

    /// Oldest and newest session dates.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.sessions.values().filter_map(|s| s.date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Oldest session date.
    #[must_use]
    pub fn oldest_date(&self) -> Option<NaiveDate> {
        self.date_range().map(|(oldest, _)| oldest)
    }

    /// URLs of sessions whose detail page has not been extracted, newest first.
    #[must_use]
    pub fn pending_extraction(&self) -> Vec<String> {
        self.sessions()
            .into_iter()
            .filter(|s| s.needs_extraction())
            .map(|s| s.url.clone())
            .collect()
    }

    /// Time of the last save, if any.
    #[must_use]
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Listing URL recorded in metadata.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
