//! Blocking HTTP fetcher with timeout and request pacing.

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::source::traits::Fetcher;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Enforces a minimum delay between consecutive requests.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    /// Create a pacer allowing one request per `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// How long to wait before a request issued at `now`.
    fn wait_time(&self, last: Option<Instant>, now: Instant) -> Duration {
        last.map_or(Duration::ZERO, |prev| {
            self.interval.saturating_sub(now.duration_since(prev))
        })
    }

    /// Block until the next request may be sent, then record it.
    pub fn wait(&self) {
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let wait = self.wait_time(*last, Instant::now());
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis(), "pacing request");
            std::thread::sleep(wait);
        }
        *last = Some(Instant::now());
    }
}

/// HTTP fetcher shared by listing, detail and download requests.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    timeout: Duration,
    pacer: Pacer,
}

impl HttpFetcher {
    /// Build a fetcher from HTTP configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout: config.timeout(),
            pacer: Pacer::new(config.request_delay()),
        })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        self.pacer.wait();
        debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Map a transport failure onto the error taxonomy.
    fn classify(&self, url: &str, e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(format!(
                "{url} (exceeded {} seconds)",
                self.timeout.as_secs()
            ))
        } else if let Some(status) = e.status() {
            Error::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else if e.is_connect() {
            Error::Network(format!("connection failed for {url}: {e}"))
        } else {
            Error::Network(format!("request to {url} failed: {e}"))
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        self.get(url)?.text().map_err(|e| self.classify(url, &e))
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self.get(url)?.bytes().map_err(|e| self.classify(url, &e))?;
        Ok(bytes.to_vec())
    }
}
