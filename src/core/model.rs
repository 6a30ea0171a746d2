//! Session types and their persisted JSON layout.
//!
//! Field names on disk follow the archive's established French layout
//! (`seances`, `titre`, `fichiers`, ...); Rust-side names are English.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One listing entry as seen during discovery, before any detail extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Detail page URL (session identity).
    pub url: String,

    /// Link title as shown on the listing.
    pub title: String,

    /// Date as written on the listing.
    pub raw_date: String,

    /// Normalized date, `None` when `raw_date` could not be parsed.
    pub date: Option<NaiveDate>,
}

impl SessionSummary {
    /// Build a summary, normalizing `raw_date`.
    ///
    /// A date that fails to normalize is left unset; the raw text is kept.
    #[must_use]
    pub fn new(url: impl Into<String>, title: impl Into<String>, raw_date: impl Into<String>) -> Self {
        let raw_date = raw_date.into();
        let date = match crate::core::date::parse_french_date(&raw_date) {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::warn!(raw_date = %raw_date, error = %e, "keeping unparsed listing date");
                None
            }
        };
        Self {
            url: url.into(),
            title: title.into(),
            raw_date,
            date,
        }
    }
}

/// A stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Detail page URL (unique key).
    pub url: String,

    /// Normalized date; persisted as `""` when unknown.
    #[serde(with = "optional_date")]
    pub date: Option<NaiveDate>,

    /// Date exactly as written on the listing.
    #[serde(rename = "date_originale")]
    pub date_original: String,

    /// When the session was first seen. Never changes after insertion.
    #[serde(rename = "date_decouverte", with = "timestamp")]
    pub date_discovered: DateTime<Utc>,

    /// Listing title.
    #[serde(rename = "titre")]
    pub title: String,

    /// Discussions, empty until the detail page has been extracted.
    #[serde(default)]
    pub discussions: Vec<Discussion>,
}

impl Session {
    /// Placeholder session for a newly discovered summary.
    #[must_use]
    pub fn from_summary(summary: &SessionSummary, discovered: DateTime<Utc>) -> Self {
        Self {
            url: summary.url.clone(),
            date: summary.date,
            date_original: summary.raw_date.clone(),
            date_discovered: discovered,
            title: summary.title.clone(),
            discussions: Vec::new(),
        }
    }

    /// Whether the detail page still needs to be extracted.
    #[must_use]
    pub fn needs_extraction(&self) -> bool {
        self.discussions.is_empty()
    }

    /// All files across all discussions, in page order.
    pub fn files(&self) -> impl Iterator<Item = &FileRef> {
        self.discussions.iter().flat_map(|d| d.files.iter())
    }
}

/// A titled sub-item of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    /// Section heading.
    #[serde(rename = "titre")]
    pub title: String,

    /// Attachments in page order.
    #[serde(rename = "fichiers", default)]
    pub files: Vec<FileRef>,
}

/// A downloadable attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Download URL.
    pub url: String,

    /// Label shown on the detail page.
    #[serde(rename = "nom")]
    pub name: String,

    /// Local file name.
    pub alias: String,
}

/// A discussion as parsed from a detail page, before aliases are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionDraft {
    /// Section heading.
    pub title: String,

    /// Attachment links in page order.
    pub files: Vec<FileDraft>,
}

/// A file link as parsed from a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDraft {
    /// Absolute download URL.
    pub url: String,

    /// Link label.
    pub name: String,
}

/// Derived store metadata, recomputed on every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Listing the sessions were discovered from.
    pub url_source: String,

    /// Time of the last save.
    #[serde(rename = "derniere_mise_a_jour", with = "timestamp")]
    pub last_update: DateTime<Utc>,

    /// Number of stored sessions.
    pub total_seances: usize,
}

/// Persisted form of the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Derived metadata.
    #[serde(rename = "metadonnees")]
    pub metadata: Metadata,

    /// Sessions, newest first.
    #[serde(rename = "seances")]
    pub sessions: Vec<Session>,
}

/// `Option<NaiveDate>` as `"YYYY-MM-DD"` or `""`.
mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// `DateTime<Utc>` written as RFC 3339.
///
/// Naive ISO timestamps (no offset) from older stores are read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
