// src/fetch/mod.rs
pub mod cache;
pub mod sources;

pub use cache::SourceCache;
pub use sources::{file_name, SourceId, DEFAULT_BASE_URL};

use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::{fs, time::sleep};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::table::Series;

/// Where the three CSV files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLocation {
    /// A folder URL; file names are joined onto it.
    Http(Url),
    /// A local mirror holding the same file names.
    Dir(PathBuf),
}

impl FeedLocation {
    /// `http://` and `https://` strings are URLs, anything else is a directory.
    pub fn parse(s: &str) -> Result<Self> {
        if s.starts_with("http://") || s.starts_with("https://") {
            // a base without trailing slash would lose its last segment on join
            let base = if s.ends_with('/') {
                s.to_string()
            } else {
                format!("{}/", s)
            };
            let url = Url::parse(&base).map_err(|e| Error::SourceFetch {
                source_name: s.to_string(),
                message: e.to_string(),
            })?;
            Ok(FeedLocation::Http(url))
        } else {
            Ok(FeedLocation::Dir(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for FeedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedLocation::Http(url) => write!(f, "{}", url),
            FeedLocation::Dir(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Downloads raw CSV text, retrying transient HTTP failures.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    location: FeedLocation,
    max_attempts: usize,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(location: FeedLocation) -> Self {
        Self {
            client: Client::new(),
            location,
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_retries(mut self, max_attempts: usize, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    pub fn location(&self) -> &FeedLocation {
        &self.location
    }

    /// Fetch the body of one series file.
    pub async fn fetch_text(&self, series: Series) -> Result<String> {
        let name = file_name(series);
        match &self.location {
            FeedLocation::Dir(dir) => {
                let path = dir.join(name);
                debug!(path = %path.display(), "reading local feed");
                fs::read_to_string(&path)
                    .await
                    .map_err(|e| Error::SourceFetch {
                        source_name: path.display().to_string(),
                        message: e.to_string(),
                    })
            }
            FeedLocation::Http(base) => {
                let url = base.join(name).map_err(|e| Error::SourceFetch {
                    source_name: name.to_string(),
                    message: e.to_string(),
                })?;
                self.fetch_url(&url).await
            }
        }
    }

    async fn fetch_url(&self, url: &Url) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(%url, attempt, "GET");

            let outcome = match self.client.get(url.as_str()).send().await {
                Ok(resp) => match resp.error_for_status() {
                    Ok(resp) => resp.text().await.map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                },
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(body) => return Ok(body),
                Err(message) if attempt < self.max_attempts => {
                    warn!(%url, attempt, %message, "fetch failed, retrying");
                    sleep(self.retry_delay).await;
                }
                Err(message) => {
                    return Err(Error::SourceFetch {
                        source_name: url.to_string(),
                        message,
                    })
                }
            }
        }
    }
}
