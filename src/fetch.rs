// 🌐 Page Fetching
// One blocking GET per page with a bounded timeout. No retries: a transient
// failure needs a manual re-run.

use crate::error::IngestError;
use anyhow::Context;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Anything that can hand back raw markup for a URL.
///
/// Pipelines take `&dyn PageSource` so tests can serve pages from memory.
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<String, IngestError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpFetcher { client })
    }
}

impl PageSource for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, IngestError> {
        let fetch_err = |e: reqwest::Error| IngestError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        debug!(url, "GET");
        let response = self.client.get(url).send().map_err(fetch_err)?;
        let response = response.error_for_status().map_err(fetch_err)?;
        response.text().map_err(fetch_err)
    }
}

/// In-memory pages keyed by URL; unknown URLs fail like a 404
#[derive(Debug, Default, Clone)]
pub struct StaticPages {
    pages: HashMap<String, String>,
}

impl StaticPages {
    pub fn new() -> Self {
        StaticPages::default()
    }

    pub fn with_page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), markup.to_string());
        self
    }
}

impl PageSource for StaticPages {
    fn fetch(&self, url: &str) -> Result<String, IngestError> {
        self.pages.get(url).cloned().ok_or_else(|| IngestError::Fetch {
            url: url.to_string(),
            reason: "404 Not Found".to_string(),
        })
    }
}
