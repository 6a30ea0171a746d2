//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Command-line flags (applied by the caller)
//! 2. Environment variables (`SEANCE_ARCHIVE_*`)
//! 3. Config file (`~/.seance-archive/config.toml`)
//! 4. Defaults
//!
//! Once loaded, a `Config` is passed by reference into each component and
//! never mutated during a run.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Listing site configuration.
    pub source: SourceConfig,

    /// Discovery configuration.
    pub discovery: DiscoveryConfig,

    /// Download configuration.
    pub download: DownloadConfig,

    /// HTTP client configuration.
    pub http: HttpConfig,

    /// Storage configuration.
    pub storage: StorageConfig,
}

/// Listing site configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL of the first listing page.
    pub listing_url: String,

    /// Query appended for pages after the first. `{page}` is the 1-based site page number.
    pub page_query: String,

    /// Prefix identifying attachment links on detail pages.
    pub file_link_prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://www.vd.ch/actualites/decisions-du-conseil-detat".to_string(),
            page_query: "tx_vdsafarinet_safarinet%5Bcontroller%5D=Meeting\
                         &tx_vdsafarinet_safarinet%5Bpage%5D={page}"
                .to_string(),
            file_link_prefix: "https://sieldocs.vd.ch/ecm/app18/service/siel/getContent?ID="
                .to_string(),
        }
    }
}

/// Discovery configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Maximum number of listing pages fetched per run.
    pub max_pages: usize,

    /// Sessions dated strictly before this are not discovered.
    pub stop_date: Option<NaiveDate>,

    /// Maximum gap between the oldest stored session and `stop_date` for
    /// which discovery may stop at the first already-known session.
    pub optimization_threshold_days: i64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            stop_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            optimization_threshold_days: 30,
        }
    }
}

/// Download configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Substrings selecting which files to download (empty accepts all).
    pub file_patterns: Vec<String>,

    /// Skip files whose alias already exists in the output directory.
    pub skip_existing: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            file_patterns: vec!["_POS_".to_string()],
            skip_existing: true,
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Minimum delay between two consecutive requests, in milliseconds.
    pub request_delay_ms: u64,
}

impl HttpConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Inter-request delay as a `Duration`.
    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("seance-archive/", env!("CARGO_PKG_VERSION")).to_string(),
            request_delay_ms: 1000,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the store and downloaded files.
    pub output_dir: PathBuf,

    /// Store file name inside `output_dir`.
    pub filename: String,
}

impl StorageConfig {
    /// Full path of the JSON store.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            filename: "storage.json".to_string(),
        }
    }
}

/// Get the default home directory for the archiver's own files.
fn default_home() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(".seance-archive"),
        |h| h.join(".seance-archive"),
    )
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// An explicit `path` replaces the default config file lookup.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map_or_else(get_config_path, Path::to_path_buf);

    let mut config = if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        parse_config(&contents)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);
    validate(&config)?;

    Ok(config)
}

/// Parse configuration from TOML text.
///
/// # Errors
///
/// Returns an error if the text is not a valid configuration.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
}

/// Get the path to the config file.
fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("SEANCE_ARCHIVE_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("SEANCE_ARCHIVE_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    default_home().join("config.toml")
}

/// Apply environment variable overrides to config.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(dir) = env::var("SEANCE_ARCHIVE_OUTPUT_DIR") {
        config.storage.output_dir = PathBuf::from(dir);
    }

    if let Ok(url) = env::var("SEANCE_ARCHIVE_LISTING_URL") {
        config.source.listing_url = url;
    }

    if let Ok(val) = env::var("SEANCE_ARCHIVE_MAX_PAGES") {
        if let Ok(max) = val.parse() {
            config.discovery.max_pages = max;
        }
    }

    if let Ok(val) = env::var("SEANCE_ARCHIVE_STOP_DATE") {
        if val.trim().is_empty() || val.eq_ignore_ascii_case("none") {
            config.discovery.stop_date = None;
        } else if let Ok(date) = NaiveDate::parse_from_str(val.trim(), "%Y-%m-%d") {
            config.discovery.stop_date = Some(date);
        }
    }

    if let Ok(val) = env::var("SEANCE_ARCHIVE_REQUEST_DELAY_MS") {
        if let Ok(ms) = val.parse() {
            config.http.request_delay_ms = ms;
        }
    }

    // Comma-separated; an empty value accepts every file
    if let Ok(val) = env::var("SEANCE_ARCHIVE_FILE_PATTERNS") {
        config.download.file_patterns = val
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .collect();
    }
}

/// Reject configurations that cannot drive a run.
fn validate(config: &Config) -> Result<()> {
    url::Url::parse(&config.source.listing_url)
        .map_err(|e| Error::Config(format!("invalid listing_url: {e}")))?;

    if !config.source.page_query.contains("{page}") {
        return Err(Error::Config(
            "page_query must contain a {page} placeholder".to_string(),
        ));
    }

    if config.storage.filename.trim().is_empty() {
        return Err(Error::Config("storage filename is empty".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.discovery.max_pages, 100);
        assert_eq!(
            config.discovery.stop_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(config.download.file_patterns, vec!["_POS_".to_string()]);
        assert!(config.download.skip_existing);
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert_eq!(config.http.request_delay(), Duration::from_millis(1000));
        assert_eq!(
            config.storage.store_path(),
            PathBuf::from("output").join("storage.json")
        );
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
            [discovery]
            max_pages = 5
            stop_date = "2023-06-01"
            optimization_threshold_days = 90

            [download]
            file_patterns = []
            skip_existing = false

            [http]
            request_delay_ms = 0
        "#;

        let config = parse_config(toml).unwrap();
        assert_eq!(config.discovery.max_pages, 5);
        assert_eq!(
            config.discovery.stop_date,
            NaiveDate::from_ymd_opt(2023, 6, 1)
        );
        assert_eq!(config.discovery.optimization_threshold_days, 90);
        assert!(config.download.file_patterns.is_empty());
        assert!(!config.download.skip_existing);
        assert_eq!(config.http.request_delay(), Duration::ZERO);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let toml = r#"
            [storage]
            output_dir = "/tmp/archive"
        "#;

        let config = parse_config(toml).unwrap();
        assert_eq!(config.storage.output_dir, PathBuf::from("/tmp/archive"));
        assert_eq!(config.storage.filename, "storage.json"); // Default
        assert_eq!(config.discovery.max_pages, 100); // Default
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let result = parse_config("[discovery\nmax_pages = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_page_query_without_placeholder() {
        let mut config = Config::default();
        config.source.page_query = "page=2".to_string();
        assert!(matches!(validate(&config), Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_listing_url() {
        let mut config = Config::default();
        config.source.listing_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(Error::Config(_))));
    }

    #[test]
    fn load_config_from_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[discovery]\nmax_pages = 3\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.discovery.max_pages, 3);
    }
}
