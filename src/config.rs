// ⚙️ Settings
// Defaults target the Mercyhurst men's ice hockey pages; any field can be
// overridden from a JSON file and then from CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Site root used to absolutize relative roster links
    pub base_url: String,
    pub stats_path: String,
    pub roster_path: String,
    /// Phrase identifying the skater stats table
    pub stats_phrase: String,

    pub bio_csv: PathBuf,
    pub stats_csv: PathBuf,
    pub database: PathBuf,

    pub stats_timeout_secs: u64,
    pub roster_timeout_secs: u64,
    /// Pause between successful player-page fetches
    pub crawl_delay_ms: u64,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: "https://hurstathletics.com".to_string(),
            stats_path: "/sports/mens-ice-hockey/stats/2025-26".to_string(),
            roster_path: "/sports/mens-ice-hockey/roster".to_string(),
            stats_phrase: "Individual, Overall, Skaters".to_string(),
            bio_csv: PathBuf::from("bio.csv"),
            stats_csv: PathBuf::from("stats.csv"),
            database: PathBuf::from("hockey.db"),
            stats_timeout_secs: 20,
            roster_timeout_secs: 15,
            crawl_delay_ms: 300,
            user_agent: concat!("roster-ingest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse settings JSON")
    }

    /// Settings file when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Settings::from_file(p),
            None => Ok(Settings::default()),
        }
    }

    pub fn stats_url(&self) -> String {
        format!("{}{}", self.base_url, self.stats_path)
    }

    pub fn roster_url(&self) -> String {
        format!("{}{}", self.base_url, self.roster_path)
    }

    pub fn stats_timeout(&self) -> Duration {
        Duration::from_secs(self.stats_timeout_secs)
    }

    pub fn roster_timeout(&self) -> Duration {
        Duration::from_secs(self.roster_timeout_secs)
    }

    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }
}
