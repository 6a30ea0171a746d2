//! Collaborator seams between the archive core and the outside world.

use crate::core::model::{DiscussionDraft, SessionSummary};
use crate::error::Result;

/// Raw document transport.
pub trait Fetcher {
    /// Fetch a URL as text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Timeout`, `Error::Http` or `Error::Network`.
    fn fetch_text(&self, url: &str) -> Result<String>;

    /// Fetch a URL as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Timeout`, `Error::Http` or `Error::Network`.
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// One listing page, entries ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Session entries in page order.
    pub summaries: Vec<SessionSummary>,

    /// Whether the page links to a following page.
    pub has_next: bool,
}

/// Paginated listing of sessions.
pub trait ListingSource {
    /// Fetch and parse the listing page at `index` (0 is the newest page).
    ///
    /// # Errors
    ///
    /// Returns a transport error if the page cannot be fetched.
    fn fetch_page(&self, index: usize) -> Result<ListingPage>;
}

/// Session detail pages.
pub trait DetailSource {
    /// Fetch and parse the discussions of the session at `url`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the page cannot be fetched, or
    /// `Error::Parse` if it has no recognizable discussions.
    fn fetch_detail(&self, url: &str) -> Result<Vec<DiscussionDraft>>;
}
