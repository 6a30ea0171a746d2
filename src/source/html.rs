//! HTML parsing of listing and detail pages.

use crate::config::SourceConfig;
use crate::core::model::{DiscussionDraft, FileDraft, SessionSummary};
use crate::error::{Error, Result};
use crate::source::traits::{DetailSource, Fetcher, ListingPage, ListingSource};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Listing link text: "Séance du Conseil d'Etat du 18 juin 2025".
const SESSION_LINK_PATTERN: &str =
    r"(?i)Séance du Conseil d['’]\s*[EÉ]tat du\s+(\d{1,2}(?:er)?\s+\p{L}+\s+\d{4})";

/// Pagination links on listing pages.
const PAGINATION_LINKS: &str = r#"nav[aria-label="Pagination"] a.vd-pagination__link"#;

/// One discussion block on a detail page.
const DISCUSSION_SECTION: &str = "#main .col-md-12.pl-0.pr-0";

/// Discussion heading inside a section.
const DISCUSSION_TITLE: &str = "h2.heading";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("invalid selector {css:?}: {e:?}")))
}

/// Element text with whitespace collapsed.
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parser for the listing and detail pages of one site.
#[derive(Debug, Clone)]
pub struct SiteParser {
    base: Url,
    file_link_prefix: String,
}

impl SiteParser {
    /// Create a parser resolving relative links against `base`.
    #[must_use]
    pub fn new(base: Url, file_link_prefix: impl Into<String>) -> Self {
        Self {
            base,
            file_link_prefix: file_link_prefix.into(),
        }
    }

    fn resolve(&self, href: &str) -> Option<String> {
        self.base.join(href.trim()).ok().map(String::from)
    }

    /// Extract session entries and the pagination hint from a listing page.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` only if an internal pattern fails to compile.
    pub fn parse_listing(&self, html: &str) -> Result<ListingPage> {
        let document = Html::parse_document(html);
        let links = selector("a[href]")?;
        let pattern = Regex::new(SESSION_LINK_PATTERN).map_err(|e| Error::Parse(e.to_string()))?;

        let mut summaries = Vec::new();
        for link in document.select(&links) {
            let text = element_text(&link);
            let Some(caps) = pattern.captures(&text) else {
                continue;
            };
            let Some(url) = link.value().attr("href").and_then(|h| self.resolve(h)) else {
                continue;
            };
            summaries.push(SessionSummary::new(url, text.clone(), &caps[1]));
        }

        let pagination = selector(PAGINATION_LINKS)?;
        let rel_next = selector(r#"a[rel="next"]"#)?;
        let has_next = document.select(&pagination).any(|link| {
            let text = element_text(&link).to_lowercase();
            text.contains("suivante") || text.contains("next")
        }) || document.select(&rel_next).next().is_some();

        debug!(entries = summaries.len(), has_next, "listing parsed");
        Ok(ListingPage {
            summaries,
            has_next,
        })
    }

    /// Extract discussions and their attachment links from a detail page.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the page contains no titled discussion section.
    pub fn parse_detail(&self, html: &str) -> Result<Vec<DiscussionDraft>> {
        let document = Html::parse_document(html);
        let sections = selector(DISCUSSION_SECTION)?;
        let heading = selector(DISCUSSION_TITLE)?;
        let links = selector("a[href]")?;

        let mut discussions = Vec::new();
        for section in document.select(&sections) {
            let Some(title) = section.select(&heading).next() else {
                debug!("skipping section without heading");
                continue;
            };

            let files = section
                .select(&links)
                .filter_map(|link| {
                    let url = self.resolve(link.value().attr("href")?)?;
                    url.starts_with(&self.file_link_prefix).then(|| FileDraft {
                        url,
                        name: element_text(&link),
                    })
                })
                .collect();

            discussions.push(DiscussionDraft {
                title: element_text(&title),
                files,
            });
        }

        if discussions.is_empty() {
            return Err(Error::Parse("no discussion section found".to_string()));
        }
        Ok(discussions)
    }
}

/// Listing and detail access for one site, over any [`Fetcher`].
pub struct SiteClient<'a> {
    fetcher: &'a dyn Fetcher,
    parser: SiteParser,
    listing_url: Url,
    page_query: String,
}

impl<'a> SiteClient<'a> {
    /// Create a client for the site described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the listing URL is invalid.
    pub fn new(fetcher: &'a dyn Fetcher, config: &SourceConfig) -> Result<Self> {
        let listing_url = Url::parse(&config.listing_url)
            .map_err(|e| Error::Config(format!("invalid listing_url: {e}")))?;
        Ok(Self {
            fetcher,
            parser: SiteParser::new(listing_url.clone(), config.file_link_prefix.clone()),
            listing_url,
            page_query: config.page_query.clone(),
        })
    }

    /// URL of listing page `index`; site page numbers are 1-based.
    #[must_use]
    pub fn page_url(&self, index: usize) -> String {
        if index == 0 {
            return self.listing_url.to_string();
        }
        let query = self.page_query.replace("{page}", &(index + 1).to_string());
        let separator = if self.listing_url.query().is_some() { '&' } else { '?' };
        format!("{}{separator}{query}", self.listing_url)
    }
}

impl ListingSource for SiteClient<'_> {
    fn fetch_page(&self, index: usize) -> Result<ListingPage> {
        let html = self.fetcher.fetch_text(&self.page_url(index))?;
        self.parser.parse_listing(&html)
    }
}

impl DetailSource for SiteClient<'_> {
    fn fetch_detail(&self, url: &str) -> Result<Vec<DiscussionDraft>> {
        let html = self.fetcher.fetch_text(url)?;
        self.parser.parse_detail(&html)
    }
}
