//! `seance-archive status` command implementation.

use crate::config::Config;
use crate::core::model::Session;
use crate::error::Result;
use crate::storage::{FileBackend, SessionStore};
use chrono::{DateTime, Local, Utc};

/// Default number of sessions to show.
const DEFAULT_LIMIT: usize = 10;

/// Maximum length for title preview.
const TITLE_PREVIEW_LEN: usize = 60;

/// Run the status command.
///
/// Summarizes the store and lists the newest sessions. Does not touch the
/// network and creates no files or directories.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn run(config: &Config, limit: Option<usize>) -> Result<()> {
    let backend = FileBackend::open(config.storage.store_path());
    let store = SessionStore::load(&backend, config.source.listing_url.clone())?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT);

    if store.is_empty() {
        println!("No sessions found.");
        println!("\nStore: {}", backend.path().display());
        return Ok(());
    }

    let sessions = store.sessions();
    let files: usize = sessions.iter().map(|s| s.files().count()).sum();

    println!("Store:              {}", backend.path().display());
    println!("Source:             {}", store.source_url());
    println!("Sessions:           {}", store.len());
    println!("Files referenced:   {files}");
    println!("Pending extraction: {}", store.pending_extraction().len());
    if let Some((oldest, newest)) = store.date_range() {
        println!("Date range:         {oldest} to {newest}");
    }
    if let Some(updated) = store.last_update() {
        println!("Last update:        {}", format_local_time(updated));
    }

    println!();
    println!("{:<12} {:>6} {:<10} Title", "Date", "Files", "Discovered");
    println!("{}", "─".repeat(90));

    for session in sessions.iter().take(limit) {
        println!(
            "{:<12} {:>6} {:<10} {}",
            format_date(session),
            session.files().count(),
            session.date_discovered.format("%Y-%m-%d"),
            format_title_preview(&session.title)
        );
    }

    println!("{}", "─".repeat(90));
    println!("Showing {} of {} session(s)", limit.min(store.len()), store.len());

    Ok(())
}

/// Format UTC time as local time for display.
fn format_local_time(utc: DateTime<Utc>) -> String {
    let local: DateTime<Local> = utc.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}

/// ISO date, or the raw listing text when it could not be parsed.
fn format_date(session: &Session) -> String {
    session
        .date
        .map_or_else(|| format!("? {}", session.date_original), |d| d.to_string())
}

/// Truncate long titles on a character boundary.
fn format_title_preview(title: &str) -> String {
    if title.chars().count() > TITLE_PREVIEW_LEN {
        let head: String = title.chars().take(TITLE_PREVIEW_LEN).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session(date: Option<NaiveDate>, raw: &str) -> Session {
        Session {
            url: "https://www.vd.ch/seances/a".to_string(),
            date,
            date_original: raw.to_string(),
            date_discovered: Utc::now(),
            title: "Séance".to_string(),
            discussions: Vec::new(),
        }
    }

    #[test]
    fn format_date_uses_iso_when_parsed() {
        let s = session(NaiveDate::from_ymd_opt(2025, 6, 18), "18 juin 2025");
        assert_eq!(format_date(&s), "2025-06-18");
    }

    #[test]
    fn format_date_falls_back_to_raw() {
        let s = session(None, "18 jiun 2025");
        assert_eq!(format_date(&s), "? 18 jiun 2025");
    }

    #[test]
    fn format_title_preview_truncates_long_titles() {
        let long = "é".repeat(100);
        let preview = format_title_preview(&long);
        assert_eq!(preview.chars().count(), TITLE_PREVIEW_LEN + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn format_title_preview_keeps_short_titles() {
        assert_eq!(format_title_preview("Séance du 18 juin"), "Séance du 18 juin");
    }

    #[test]
    fn status_on_empty_store_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.output_dir = dir.path().to_path_buf();
        assert!(run(&config, None).is_ok());
    }

    #[test]
    fn status_does_not_create_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("archive");
        let mut config = Config::default();
        config.storage.output_dir.clone_from(&missing);

        assert!(run(&config, None).is_ok());
        assert!(!missing.exists());
    }
}
