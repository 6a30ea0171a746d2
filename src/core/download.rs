//! File selection and download.
//!
//! Every file ends in exactly one terminal status:
//! `Ignored` (name not selected), `Existing` (alias already present),
//! `Downloaded`, or `Error` (invalid reference, transport or write failure).
//! Failures are counted per file and never stop the pass.

use crate::config::DownloadConfig;
use crate::core::alias::matches_patterns;
use crate::core::model::{FileRef, Session};
use crate::source::Fetcher;
use crate::storage::FileSink;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Terminal status of one file in a download pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Not selected by the file patterns.
    Ignored,
    /// Already present locally.
    Existing,
    /// Fetched and written.
    Downloaded,
    /// Invalid reference, fetch failure or write failure.
    Error,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ignored => "ignored",
            Self::Existing => "existing",
            Self::Downloaded => "downloaded",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Running totals of a download pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadTally {
    /// Files fetched and written.
    pub downloaded: usize,
    /// Files not selected by the patterns.
    pub ignored: usize,
    /// Files already present.
    pub existing: usize,
    /// Files that failed.
    pub errors: usize,
}

impl DownloadTally {
    /// Count one file.
    pub fn record(&mut self, status: FileStatus) {
        match status {
            FileStatus::Ignored => self.ignored += 1,
            FileStatus::Existing => self.existing += 1,
            FileStatus::Downloaded => self.downloaded += 1,
            FileStatus::Error => self.errors += 1,
        }
    }

    /// Add another tally into this one.
    pub fn merge(&mut self, other: Self) {
        self.downloaded += other.downloaded;
        self.ignored += other.ignored;
        self.existing += other.existing;
        self.errors += other.errors;
    }

    /// Number of files counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded + self.ignored + self.existing + self.errors
    }
}

/// Decides, fetches and writes attachment files.
pub struct DownloadManager<'a> {
    fetcher: &'a dyn Fetcher,
    sink: &'a dyn FileSink,
    config: &'a DownloadConfig,
}

impl<'a> DownloadManager<'a> {
    /// Create a manager writing into `sink`.
    #[must_use]
    pub fn new(fetcher: &'a dyn Fetcher, sink: &'a dyn FileSink, config: &'a DownloadConfig) -> Self {
        Self {
            fetcher,
            sink,
            config,
        }
    }

    /// Status decidable without the network, or `None` if the file must be fetched.
    #[must_use]
    pub fn precheck(&self, file: &FileRef) -> Option<FileStatus> {
        if file.url.is_empty() || file.name.is_empty() || file.alias.is_empty() {
            return Some(FileStatus::Error);
        }
        if !matches_patterns(&file.name, &self.config.file_patterns) {
            return Some(FileStatus::Ignored);
        }
        if self.config.skip_existing && self.sink.exists(&file.alias) {
            return Some(FileStatus::Existing);
        }
        None
    }

    /// Process one file to its terminal status.
    pub fn process(&self, file: &FileRef) -> FileStatus {
        if let Some(status) = self.precheck(file) {
            match status {
                FileStatus::Error => error!(name = %file.name, url = %file.url, "invalid file reference"),
                _ => debug!(name = %file.name, alias = %file.alias, %status, "file skipped"),
            }
            return status;
        }

        let result = self
            .fetcher
            .fetch_bytes(&file.url)
            .and_then(|bytes| self.sink.write(&file.alias, &bytes));

        match result {
            Ok(()) => {
                info!(name = %file.name, alias = %file.alias, "file downloaded");
                FileStatus::Downloaded
            }
            Err(e) if e.is_transport() => {
                warn!(name = %file.name, url = %file.url, error = %e, "download failed");
                FileStatus::Error
            }
            Err(e) => {
                error!(name = %file.name, alias = %file.alias, error = %e, "could not write file");
                FileStatus::Error
            }
        }
    }

    /// Process every file of one session.
    pub fn download_session(&self, session: &Session) -> DownloadTally {
        let mut tally = DownloadTally::default();
        for file in session.files() {
            tally.record(self.process(file));
        }
        tally
    }

    /// Process every file of every session.
    pub fn download_all<'s>(&self, sessions: impl IntoIterator<Item = &'s Session>) -> DownloadTally {
        let mut tally = DownloadTally::default();
        for session in sessions {
            tally.merge(self.download_session(session));
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Discussion;
    use crate::error::{Error, Result};
    use crate::storage::MemorySink;
    use chrono::{NaiveDate, Utc};
    use std::cell::RefCell;

    /// Serves `%PDF` for every URL except those listed as failing.
    #[derive(Default)]
    struct FakeFetcher {
        failing: Vec<String>,
        requested: RefCell<Vec<String>>,
    }

    impl Fetcher for FakeFetcher {
        fn fetch_text(&self, url: &str) -> Result<String> {
            Err(Error::Network(format!("unexpected text fetch: {url}")))
        }

        fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
            self.requested.borrow_mut().push(url.to_string());
            if self.failing.iter().any(|u| u == url) {
                return Err(Error::Timeout(url.to_string()));
            }
            Ok(format!("%PDF {url}").into_bytes())
        }
    }

    fn file(id: u32, name: &str) -> FileRef {
        FileRef {
            url: format!("https://sieldocs.vd.ch/getContent?ID={id}"),
            name: name.to_string(),
            alias: format!("20250618_{id}.pdf"),
        }
    }

    fn config(patterns: &[&str], skip_existing: bool) -> DownloadConfig {
        DownloadConfig {
            file_patterns: patterns.iter().map(ToString::to_string).collect(),
            skip_existing,
        }
    }

    fn session(files: Vec<FileRef>) -> Session {
        Session {
            url: "https://www.vd.ch/seances/a".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 18),
            date_original: "18 juin 2025".to_string(),
            date_discovered: Utc::now(),
            title: "Séance".to_string(),
            discussions: vec![Discussion {
                title: "Postulats".to_string(),
                files,
            }],
        }
    }

    #[test]
    fn pattern_filter_classifies_ignored() {
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::new();
        let cfg = config(&["_POS_"], true);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);

        assert_eq!(manager.process(&file(1, "25_POS_17.pdf")), FileStatus::Downloaded);
        assert_eq!(manager.process(&file(2, "25_RAP_3.pdf")), FileStatus::Ignored);
        assert_eq!(fetcher.requested.borrow().len(), 1);
    }

    #[test]
    fn empty_patterns_accept_all() {
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::new();
        let cfg = config(&[], true);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);

        assert_eq!(manager.process(&file(1, "25_POS_17.pdf")), FileStatus::Downloaded);
        assert_eq!(manager.process(&file(2, "25_RAP_3.pdf")), FileStatus::Downloaded);
    }

    #[test]
    fn existing_file_is_not_fetched() {
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::new();
        sink.insert("20250618_1.pdf", b"old");
        let cfg = config(&["_POS_"], true);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);

        assert_eq!(manager.process(&file(1, "25_POS_17.pdf")), FileStatus::Existing);
        assert!(fetcher.requested.borrow().is_empty());
        assert_eq!(sink.get("20250618_1.pdf").unwrap(), b"old");
    }

    #[test]
    fn existing_file_refetched_without_skip() {
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::new();
        sink.insert("20250618_1.pdf", b"old");
        let cfg = config(&["_POS_"], false);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);

        assert_eq!(manager.process(&file(1, "25_POS_17.pdf")), FileStatus::Downloaded);
        assert_ne!(sink.get("20250618_1.pdf").unwrap(), b"old");
    }

    #[test]
    fn ignored_wins_over_existing() {
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::new();
        sink.insert("20250618_2.pdf", b"old");
        let cfg = config(&["_POS_"], true);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);

        assert_eq!(manager.process(&file(2, "25_RAP_3.pdf")), FileStatus::Ignored);
    }

    #[test]
    fn fetch_failure_is_recorded_not_fatal() {
        let fetcher = FakeFetcher {
            failing: vec!["https://sieldocs.vd.ch/getContent?ID=1".to_string()],
            ..Default::default()
        };
        let sink = MemorySink::new();
        let cfg = config(&["_POS_"], true);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);

        let tally = manager.download_session(&session(vec![
            file(1, "25_POS_1.pdf"),
            file(2, "25_POS_2.pdf"),
            file(3, "25_RAP_3.pdf"),
        ]));

        assert_eq!(
            tally,
            DownloadTally {
                downloaded: 1,
                ignored: 1,
                existing: 0,
                errors: 1,
            }
        );
        assert!(!sink.exists("20250618_1.pdf"));
        assert!(sink.exists("20250618_2.pdf"));
    }

    #[test]
    fn write_failure_is_error() {
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::failing();
        let cfg = config(&[], true);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);

        assert_eq!(manager.process(&file(1, "a.pdf")), FileStatus::Error);
    }

    #[test]
    fn invalid_reference_is_error_without_fetch() {
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::new();
        let cfg = config(&[], true);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);

        let mut broken = file(1, "25_POS_1.pdf");
        broken.alias.clear();
        assert_eq!(manager.process(&broken), FileStatus::Error);
        assert!(fetcher.requested.borrow().is_empty());
    }

    #[test]
    fn files_without_numeric_ids_are_all_downloaded() {
        use crate::core::alias::assign_aliases;
        use crate::core::model::{DiscussionDraft, FileDraft};

        let prefix = "https://sieldocs.vd.ch/ecm/app18/service/siel/getContent?ID=";
        let drafts = vec![DiscussionDraft {
            title: "Postulats".to_string(),
            files: vec![
                FileDraft {
                    url: format!("{prefix}abc"),
                    name: "25_POS_17.pdf".to_string(),
                },
                FileDraft {
                    url: format!("{prefix}def"),
                    name: "25_POS_18.pdf".to_string(),
                },
            ],
        }];
        let mut archived = session(Vec::new());
        archived.discussions = assign_aliases(archived.date, drafts);

        let fetcher = FakeFetcher::default();
        let sink = MemorySink::new();
        let cfg = config(&["_POS_"], true);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);

        let statuses: Vec<_> = archived.files().map(|f| manager.process(f)).collect();
        assert_eq!(statuses, [FileStatus::Downloaded, FileStatus::Downloaded]);
        assert_eq!(sink.len(), 2);
        assert_ne!(
            sink.get("20250618_1_1.pdf").unwrap(),
            sink.get("20250618_1_2.pdf").unwrap()
        );
    }

    #[test]
    fn second_pass_finds_files_existing() {
        let fetcher = FakeFetcher::default();
        let sink = MemorySink::new();
        let cfg = config(&["_POS_"], true);
        let manager = DownloadManager::new(&fetcher, &sink, &cfg);
        let sessions = vec![session(vec![file(1, "25_POS_1.pdf"), file(2, "25_POS_2.pdf")])];

        let first = manager.download_all(&sessions);
        let second = manager.download_all(&sessions);

        assert_eq!(first.downloaded, 2);
        assert_eq!(second.existing, 2);
        assert_eq!(second.downloaded, 0);
        assert_eq!(second.total(), 2);
    }
}
