//! Phase orchestration: discover, extract, download.
//!
//! The store is saved after discovery, after every session whose details
//! changed, and at the end of the download pass. A save failure aborts the
//! run; per-page, per-session and per-file failures are counted in the
//! report instead.

use crate::config::Config;
use crate::core::alias::assign_aliases;
use crate::core::discovery::{DiscoveryParams, StopReason, discover};
use crate::core::download::{DownloadManager, DownloadTally};
use crate::error::{Error, Result};
use crate::source::{DetailSource, Fetcher, ListingSource};
use crate::storage::{FileSink, SessionStore, StoreBackend};
use chrono::Utc;
use tracing::{error, info, warn};

/// Outcome of the discovery phase.
#[derive(Debug)]
pub struct DiscoveryReport {
    /// Sessions added to the store.
    pub new_sessions: usize,
    /// Listing pages read.
    pub pages_visited: usize,
    /// Whether the known-entry short-circuit was active.
    pub used_optimization: bool,
    /// Why discovery ended.
    pub stop: StopReason,
    /// The listing fetch failure that ended discovery, if any.
    pub error: Option<Error>,
}

impl DiscoveryReport {
    /// Discovery failed before reading a single page.
    #[must_use]
    pub fn failed_at_start(&self) -> bool {
        self.error.is_some() && self.pages_visited == 0
    }
}

/// Outcome of the extraction phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Sessions whose details were fetched and stored.
    pub extracted: usize,
    /// Sessions whose detail page could not be fetched or parsed.
    pub errors: usize,
    /// Sessions already extracted in an earlier run.
    pub skipped: usize,
}

/// Per-phase outcome of a run. Phases that did not run are `None`.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Discovery phase.
    pub discovery: Option<DiscoveryReport>,
    /// Extraction phase.
    pub extraction: Option<ExtractionReport>,
    /// Download phase.
    pub download: Option<DownloadTally>,
}

impl RunReport {
    /// Whether a phase-ending error prevented any work.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.discovery
            .as_ref()
            .is_some_and(DiscoveryReport::failed_at_start)
    }

    /// The error that made the run fail, if any.
    #[must_use]
    pub fn into_failure(self) -> Option<Error> {
        if !self.is_failure() {
            return None;
        }
        self.discovery.and_then(|d| d.error)
    }
}

/// Which phases a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phases {
    /// Discover, extract, then download.
    All,
    /// Discovery only.
    Discover,
    /// Extraction only.
    Extract,
    /// Download only.
    Download,
}

impl Phases {
    fn discover(self) -> bool {
        matches!(self, Self::All | Self::Discover)
    }

    fn extract(self) -> bool {
        matches!(self, Self::All | Self::Extract)
    }

    fn download(self) -> bool {
        matches!(self, Self::All | Self::Download)
    }
}

/// Collaborators of a run.
pub struct Pipeline<'a> {
    config: &'a Config,
    listing: &'a dyn ListingSource,
    details: &'a dyn DetailSource,
    fetcher: &'a dyn Fetcher,
    backend: &'a dyn StoreBackend,
    sink: &'a dyn FileSink,
}

impl<'a> Pipeline<'a> {
    /// Assemble a pipeline.
    #[must_use]
    pub fn new(
        config: &'a Config,
        listing: &'a dyn ListingSource,
        details: &'a dyn DetailSource,
        fetcher: &'a dyn Fetcher,
        backend: &'a dyn StoreBackend,
        sink: &'a dyn FileSink,
    ) -> Self {
        Self {
            config,
            listing,
            details,
            fetcher,
            backend,
            sink,
        }
    }

    /// Run the selected phases in order.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be saved.
    pub fn run(&self, store: &mut SessionStore, phases: Phases, force_full_relist: bool) -> Result<RunReport> {
        let mut report = RunReport::default();

        if phases.discover() {
            let discovery = self.discover(store, force_full_relist)?;
            if discovery.failed_at_start() {
                warn!("discovery could not read the listing, continuing with stored sessions");
            }
            report.discovery = Some(discovery);
        }
        if phases.extract() {
            report.extraction = Some(self.extract(store)?);
        }
        if phases.download() {
            report.download = Some(self.download(store)?);
        }

        Ok(report)
    }

    /// Discover new sessions and record them as placeholders.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be saved.
    pub fn discover(&self, store: &mut SessionStore, force_full_relist: bool) -> Result<DiscoveryReport> {
        let known = store.known_urls();
        let settings = &self.config.discovery;
        let params = DiscoveryParams {
            max_pages: settings.max_pages,
            stop_date: settings.stop_date,
            known_urls: &known,
            oldest_known: store.oldest_date(),
            optimization_threshold_days: settings.optimization_threshold_days,
            force_full_relist,
        };

        let outcome = discover(self.listing, params);

        let now = Utc::now();
        let mut new_sessions = 0;
        for summary in &outcome.new_summaries {
            if store.upsert_summary(summary, now) {
                new_sessions += 1;
            }
        }

        store.save(self.backend, now)?;
        info!(new_sessions, total = store.len(), "discovery checkpoint saved");

        Ok(DiscoveryReport {
            new_sessions,
            pages_visited: outcome.pages_visited,
            used_optimization: outcome.used_optimization,
            stop: outcome.stop,
            error: outcome.error,
        })
    }

    /// Fetch the detail page of every session still pending extraction.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be saved.
    pub fn extract(&self, store: &mut SessionStore) -> Result<ExtractionReport> {
        let pending = store.pending_extraction();
        let mut report = ExtractionReport {
            skipped: store.len() - pending.len(),
            ..ExtractionReport::default()
        };
        info!(pending = pending.len(), "starting extraction");

        for url in pending {
            let date = store.get(&url).and_then(|s| s.date);
            let drafts = match self.details.fetch_detail(&url) {
                Ok(drafts) => drafts,
                Err(e) if e.is_transport() => {
                    warn!(url = %url, error = %e, "detail page unreachable");
                    report.errors += 1;
                    continue;
                }
                Err(e) => {
                    error!(url = %url, error = %e, "detail extraction failed");
                    report.errors += 1;
                    continue;
                }
            };

            let discussions = assign_aliases(date, drafts);
            let files: usize = discussions.iter().map(|d| d.files.len()).sum();
            match store.merge_details(&url, discussions) {
                Ok(changed) => {
                    report.extracted += 1;
                    info!(url = %url, files, "session extracted");
                    if changed {
                        store.save(self.backend, Utc::now())?;
                    }
                }
                Err(e) => {
                    error!(url = %url, error = %e, "could not merge session details");
                    report.errors += 1;
                }
            }
        }

        Ok(report)
    }

    /// Download every eligible file of every stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be saved.
    pub fn download(&self, store: &mut SessionStore) -> Result<DownloadTally> {
        let manager = DownloadManager::new(self.fetcher, self.sink, &self.config.download);
        let tally = manager.download_all(store.sessions());
        info!(
            downloaded = tally.downloaded,
            existing = tally.existing,
            ignored = tally.ignored,
            errors = tally.errors,
            "download pass finished"
        );

        store.save(self.backend, Utc::now())?;
        Ok(tally)
    }
}
