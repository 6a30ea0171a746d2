//! CLI command implementations.

pub mod run;
pub mod status;

use crate::config::Config;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Configuration values given on the command line.
///
/// These take precedence over the environment and the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Directory for the store and downloaded files.
    pub output_dir: Option<PathBuf>,

    /// Maximum number of listing pages.
    pub max_pages: Option<usize>,

    /// Stop date for discovery.
    pub stop_date: Option<NaiveDate>,

    /// Discover without a stop date.
    pub no_stop_date: bool,

    /// Download every file regardless of name patterns.
    pub all_files: bool,
}

impl Overrides {
    /// Apply the overrides to a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.storage.output_dir.clone_from(dir);
        }
        if let Some(max) = self.max_pages {
            config.discovery.max_pages = max;
        }
        if self.no_stop_date {
            config.discovery.stop_date = None;
        } else if self.stop_date.is_some() {
            config.discovery.stop_date = self.stop_date;
        }
        if self.all_files {
            config.download.file_patterns.clear();
        }
    }
}
