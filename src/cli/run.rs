//! `seance-archive run|discover|extract|download` command implementation.

use crate::config::Config;
use crate::core::discovery::StopReason;
use crate::core::download::DownloadTally;
use crate::core::pipeline::{DiscoveryReport, ExtractionReport, Phases, Pipeline, RunReport};
use crate::error::Result;
use crate::source::{HttpFetcher, SiteClient};
use crate::storage::{FileBackend, LocalDir, SessionStore};

/// Run the selected phases against the live site.
///
/// Prints a per-phase report.
///
/// # Errors
///
/// Returns an error if the store cannot be loaded or saved, or if discovery
/// could not read the first listing page.
pub fn run(config: &Config, phases: Phases, relist: bool) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.http)?;
    let site = SiteClient::new(&fetcher, &config.source)?;
    let backend = FileBackend::new(config.storage.store_path())?;
    let sink = LocalDir::new(config.storage.output_dir.clone())?;

    let mut store = SessionStore::load(&backend, config.source.listing_url.clone())?;
    let pipeline = Pipeline::new(config, &site, &site, &fetcher, &backend, &sink);
    let report = pipeline.run(&mut store, phases, relist)?;

    print_report(&report);
    println!("\nStore: {} ({} sessions)", backend.path().display(), store.len());

    match report.into_failure() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn print_report(report: &RunReport) {
    if let Some(discovery) = &report.discovery {
        println!("{}", format_discovery(discovery));
    }
    if let Some(extraction) = &report.extraction {
        println!("{}", format_extraction(extraction));
    }
    if let Some(download) = &report.download {
        println!("{}", format_download(download));
    }
}

/// One-line summary of the discovery phase.
fn format_discovery(report: &DiscoveryReport) -> String {
    let mut line = format!(
        "Discovery:  {} new session(s), {} page(s) visited, {}",
        report.new_sessions,
        report.pages_visited,
        describe_stop(report.stop)
    );
    if report.used_optimization {
        line.push_str(" (incremental)");
    }
    if let Some(e) = &report.error {
        line.push_str(&format!("\n            error: {e}"));
    }
    line
}

fn format_extraction(report: &ExtractionReport) -> String {
    format!(
        "Extraction: {} extracted, {} error(s), {} already done",
        report.extracted, report.errors, report.skipped
    )
}

fn format_download(tally: &DownloadTally) -> String {
    format!(
        "Download:   {} downloaded, {} existing, {} ignored, {} error(s)",
        tally.downloaded, tally.existing, tally.ignored, tally.errors
    )
}

fn describe_stop(reason: StopReason) -> &'static str {
    match reason {
        StopReason::EndOfListing => "end of listing",
        StopReason::StopDate => "stop date reached",
        StopReason::PageLimit => "page limit reached",
        StopReason::KnownSession => "known session reached",
        StopReason::FetchFailed => "listing fetch failed",
    }
}
