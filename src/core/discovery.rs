//! Incremental discovery of listing entries.
//!
//! Pages are fetched in order, newest first. Each fetched page is fed to a
//! [`PageStepper`], which collects unseen entries and decides whether to
//! continue with the next page:
//!
//! - an empty page, or a page without a "next" link, ends the listing;
//! - an entry dated strictly before the stop date ends discovery;
//! - reaching `max_pages` ends discovery;
//! - with the optimization active, the first already-known entry ends
//!   discovery.
//!
//! The optimization is a heuristic. It assumes the listing is ordered
//! newest first and that older entries are never added behind newer ones.
//! A relist (`force_full_relist`) ignores it.

use crate::core::model::SessionSummary;
use crate::error::Error;
use crate::source::{ListingPage, ListingSource};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, error, info};

/// Inputs of a discovery pass.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryParams<'a> {
    /// Maximum number of pages to fetch.
    pub max_pages: usize,

    /// Entries dated strictly before this end discovery.
    pub stop_date: Option<NaiveDate>,

    /// URLs already in the store.
    pub known_urls: &'a HashSet<String>,

    /// Oldest session date in the store.
    pub oldest_known: Option<NaiveDate>,

    /// Largest gap, in days, between `oldest_known` and `stop_date` for
    /// which the known-entry short-circuit is allowed.
    pub optimization_threshold_days: i64,

    /// Ignore the known-entry short-circuit.
    pub force_full_relist: bool,
}

impl DiscoveryParams<'_> {
    /// Whether discovery may stop at the first already-known entry.
    #[must_use]
    pub fn optimization_applies(&self) -> bool {
        if self.force_full_relist || self.known_urls.is_empty() {
            return false;
        }
        match (self.stop_date, self.oldest_known) {
            (Some(stop), Some(oldest)) => {
                (oldest - stop).num_days() <= self.optimization_threshold_days
            }
            _ => false,
        }
    }
}

/// Decision taken after a page has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// Fetch the next page.
    Continue,
    /// The listing has no more entries.
    StopEndOfListing,
    /// An entry older than the stop date was reached.
    StopDateReached,
    /// `max_pages` pages have been visited.
    StopPageLimit,
    /// An already-known entry was reached with the optimization active.
    StopOptimization,
}

/// Why a discovery pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The listing has no more entries.
    EndOfListing,
    /// An entry older than the stop date was reached.
    StopDate,
    /// `max_pages` pages have been visited.
    PageLimit,
    /// An already-known entry was reached with the optimization active.
    KnownSession,
    /// A listing page could not be fetched.
    FetchFailed,
}

impl PageStep {
    /// The stop reason, or `None` for [`PageStep::Continue`].
    #[must_use]
    pub fn stop_reason(self) -> Option<StopReason> {
        match self {
            Self::Continue => None,
            Self::StopEndOfListing => Some(StopReason::EndOfListing),
            Self::StopDateReached => Some(StopReason::StopDate),
            Self::StopPageLimit => Some(StopReason::PageLimit),
            Self::StopOptimization => Some(StopReason::KnownSession),
        }
    }
}

/// Per-page state machine of a discovery pass.
#[derive(Debug)]
pub struct PageStepper<'a> {
    params: DiscoveryParams<'a>,
    optimize: bool,
    pages_visited: usize,
    seen: HashSet<String>,
    fresh: Vec<SessionSummary>,
}

impl<'a> PageStepper<'a> {
    /// Create a stepper for one discovery pass.
    #[must_use]
    pub fn new(params: DiscoveryParams<'a>) -> Self {
        Self {
            optimize: params.optimization_applies(),
            params,
            pages_visited: 0,
            seen: HashSet::new(),
            fresh: Vec::new(),
        }
    }

    /// Whether the known-entry short-circuit is active.
    #[must_use]
    pub fn optimizing(&self) -> bool {
        self.optimize
    }

    /// Number of pages fed so far.
    #[must_use]
    pub fn pages_visited(&self) -> usize {
        self.pages_visited
    }

    /// Entries collected so far.
    #[must_use]
    pub fn fresh(&self) -> &[SessionSummary] {
        &self.fresh
    }

    /// Process one fetched page and decide what to do next.
    pub fn step(&mut self, page: &ListingPage) -> PageStep {
        self.pages_visited += 1;

        if page.summaries.is_empty() {
            return PageStep::StopEndOfListing;
        }

        for summary in &page.summaries {
            if let (Some(stop), Some(date)) = (self.params.stop_date, summary.date) {
                if date < stop {
                    debug!(url = %summary.url, %date, %stop, "stop date reached");
                    return PageStep::StopDateReached;
                }
            }

            if self.params.known_urls.contains(&summary.url) {
                if self.optimize {
                    debug!(url = %summary.url, "known session reached");
                    return PageStep::StopOptimization;
                }
                continue;
            }

            // The listing may shift between two page fetches
            if self.seen.insert(summary.url.clone()) {
                self.fresh.push(summary.clone());
            }
        }

        if !page.has_next {
            return PageStep::StopEndOfListing;
        }
        if self.pages_visited >= self.params.max_pages {
            return PageStep::StopPageLimit;
        }
        PageStep::Continue
    }

    /// Consume the stepper into the pass outcome.
    #[must_use]
    pub fn finish(self, stop: StopReason, error: Option<Error>) -> DiscoveryOutcome {
        DiscoveryOutcome {
            new_summaries: self.fresh,
            pages_visited: self.pages_visited,
            used_optimization: self.optimize,
            stop,
            error,
        }
    }
}

/// Result of a discovery pass.
#[derive(Debug)]
pub struct DiscoveryOutcome {
    /// Entries not in the store, in listing order.
    pub new_summaries: Vec<SessionSummary>,

    /// Pages successfully fetched and processed.
    pub pages_visited: usize,

    /// Whether the known-entry short-circuit was active.
    pub used_optimization: bool,

    /// Why the pass ended.
    pub stop: StopReason,

    /// The fetch failure that ended the pass, if any.
    pub error: Option<Error>,
}

/// Walk the listing and collect entries not yet in the store.
///
/// A page that cannot be fetched ends the pass; entries already collected
/// are kept. Request pacing is the fetcher's job.
pub fn discover(source: &dyn ListingSource, params: DiscoveryParams<'_>) -> DiscoveryOutcome {
    let mut stepper = PageStepper::new(params);
    info!(
        max_pages = params.max_pages,
        stop_date = ?params.stop_date,
        known = params.known_urls.len(),
        optimized = stepper.optimizing(),
        "starting discovery"
    );

    if params.max_pages == 0 {
        return stepper.finish(StopReason::PageLimit, None);
    }

    let mut index = 0;
    loop {
        let page = match source.fetch_page(index) {
            Ok(page) => page,
            Err(e) => {
                error!(page = index, error = %e, "failed to fetch listing page");
                return stepper.finish(StopReason::FetchFailed, Some(e));
            }
        };

        let before = stepper.fresh().len();
        let step = stepper.step(&page);
        info!(
            page = index,
            entries = page.summaries.len(),
            new = stepper.fresh().len() - before,
            "listing page processed"
        );

        if let Some(reason) = step.stop_reason() {
            info!(
                ?reason,
                pages = stepper.pages_visited(),
                new = stepper.fresh().len(),
                "discovery finished"
            );
            return stepper.finish(reason, None);
        }
        index += 1;
    }
}
