// 🏒 Roster Crawler
// Roster page → player links → one bio row per player page, appended to the
// bio CSV. Known (first, last) pairs are skipped so re-runs add nothing new.

use crate::extract::clean_cell;
use crate::fetch::PageSource;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

static NAME_STRICT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<span class="sidearm-roster-player-name [^>]*>.*?<span>([^<]+)</span>\s*<span>([^<]+)</span>"#)
        .expect("strict name pattern")
});
static NAME_LOOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)sidearm-roster-player-name [^>]*>.*?<span>([^<]+)</span>.*?<span>([^<]+)</span>")
        .expect("loose name pattern")
});
static JERSEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span class="sidearm-roster-player-jersey-number">\s*(\d+)"#).expect("jersey pattern")
});
static DT_DD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<dt>([^<:]+):</dt>\s*<dd>(.*?)</dd>").expect("dt/dd pattern")
});

// ============================================================================
// ROSTER ENTRY
// ============================================================================

/// Text-valued bio row as scraped; field order is the bio CSV column order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterEntry {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub jersey_number: String,
    pub weight: String,
    pub height: String,
    pub class_year: String,
    pub home_town: String,
    pub highschool: String,
}

impl RosterEntry {
    /// Trimmed (first, last) pair, None when both are blank
    pub fn key(&self) -> Option<(String, String)> {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        if first.is_empty() && last.is_empty() {
            None
        } else {
            Some((first.to_string(), last.to_string()))
        }
    }
}

// ============================================================================
// PAGE PARSING
// ============================================================================

/// Extract one player's bio from a Sidearm player page
pub fn parse_player_page(content: &str) -> RosterEntry {
    let mut entry = RosterEntry::default();

    let name = NAME_STRICT_RE
        .captures(content)
        .or_else(|| NAME_LOOSE_RE.captures(content));
    if let Some(caps) = name {
        entry.first_name = caps[1].trim().to_string();
        entry.last_name = caps[2].trim().to_string();
    }

    if let Some(caps) = JERSEY_RE.captures(content) {
        entry.jersey_number = caps[1].to_string();
    }

    for caps in DT_DD_RE.captures_iter(content) {
        let key = caps[1].trim().to_lowercase();
        let value = clean_cell(&caps[2]);

        let slot = if key.starts_with("position") {
            &mut entry.position
        } else if key.starts_with("height") {
            &mut entry.height
        } else if key.starts_with("weight") {
            &mut entry.weight
        } else if key.starts_with("class") {
            &mut entry.class_year
        } else if key.starts_with("hometown") {
            &mut entry.home_town
        } else if key.starts_with("high school") || key.starts_with("highschool") {
            &mut entry.highschool
        } else {
            continue;
        };
        *slot = value;
    }

    entry
}

/// Player page URLs linked from a roster page, absolute, sorted, unique
pub fn find_player_links(roster_html: &str, base_url: &str, roster_path: &str) -> Vec<String> {
    let path = regex::escape(roster_path.trim_end_matches('/'));
    let relative = Regex::new(&format!(r#"href="({}/[^"]+)""#, path));
    let absolute = Regex::new(&format!(r#"href="(https?://[^"]*{}/[^"]+)""#, path));

    let mut links = BTreeSet::new();
    if let Ok(re) = relative {
        for caps in re.captures_iter(roster_html) {
            links.insert(format!("{}{}", base_url.trim_end_matches('/'), &caps[1]));
        }
    }
    if let Ok(re) = absolute {
        for caps in re.captures_iter(roster_html) {
            links.insert(caps[1].to_string());
        }
    }

    links.into_iter().collect()
}

// ============================================================================
// BIO CSV
// ============================================================================

/// Name pairs already present in the bio CSV
pub fn read_existing_keys(csv_path: &Path) -> Result<HashSet<(String, String)>> {
    let mut seen = HashSet::new();
    if !csv_path.exists() {
        return Ok(seen);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open bio CSV: {}", csv_path.display()))?;

    for result in rdr.deserialize() {
        let entry: RosterEntry = result.context("Failed to read bio row")?;
        if let Some(key) = entry.key() {
            seen.insert(key);
        }
    }

    Ok(seen)
}

/// Append one row; the header is written only into a new or empty file
pub fn append_entry(csv_path: &Path, entry: &RosterEntry) -> Result<()> {
    let needs_header = fs::metadata(csv_path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)
        .with_context(|| format!("Failed to open bio CSV for append: {}", csv_path.display()))?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    wtr.serialize(entry).context("Failed to append bio row")?;
    wtr.flush()?;

    Ok(())
}

// ============================================================================
// CRAWL
// ============================================================================

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub csv_path: PathBuf,
    pub base_url: String,
    pub roster_path: String,
    /// Write new players; false only reports them
    pub append: bool,
    /// Stop after this many links
    pub limit: Option<usize>,
    pub delay: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub links: usize,
    pub already_known: usize,
    pub new_players: usize,
    pub skipped_existing: usize,
    pub skipped_unnamed: usize,
    pub failed: usize,
}

pub fn crawl(source: &dyn PageSource, roster_url: &str, opts: &CrawlOptions) -> Result<CrawlSummary> {
    info!(url = roster_url, "fetching roster");
    let html = source.fetch(roster_url)?;
    let links = find_player_links(&html, &opts.base_url, &opts.roster_path);
    info!("found {} player links", links.len());

    let mut seen = read_existing_keys(&opts.csv_path)?;
    info!("already have {} players in {}", seen.len(), opts.csv_path.display());

    let mut summary = CrawlSummary {
        links: links.len(),
        already_known: seen.len(),
        ..Default::default()
    };

    let take = opts.limit.unwrap_or(links.len());
    for link in links.iter().take(take) {
        info!(url = %link, "fetching player");
        let entry = match source.fetch(link) {
            Ok(page) => parse_player_page(&page),
            Err(e) => {
                warn!(url = %link, error = %e, "player page failed, skipping");
                summary.failed += 1;
                continue;
            }
        };

        let key = match entry.key() {
            Some(key) => key,
            None => {
                info!(url = %link, "skipped: no name parsed");
                summary.skipped_unnamed += 1;
                continue;
            }
        };

        if seen.contains(&key) {
            info!("skipped (exists): {} {}", key.0, key.1);
            summary.skipped_existing += 1;
            continue;
        }

        if opts.append {
            if let Err(e) = append_entry(&opts.csv_path, &entry) {
                warn!(url = %link, error = %e, "append failed, skipping");
                summary.failed += 1;
                continue;
            }
            info!("appended: {} {}", key.0, key.1);
        } else {
            info!(?entry, "would append");
        }

        seen.insert(key);
        summary.new_players += 1;

        if !opts.delay.is_zero() {
            std::thread::sleep(opts.delay);
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticPages;
    use tempfile::tempdir;

    const BASE: &str = "https://hurstathletics.com";
    const ROSTER_PATH: &str = "/sports/mens-ice-hockey/roster";

    fn player_page(first: &str, last: &str, jersey: u32) -> String {
        format!(
            r#"<div><span class="sidearm-roster-player-jersey-number"> {jersey} </span>
            <span class="sidearm-roster-player-name h1"><span>{first}</span> <span>{last}</span></span>
            <dl><dt>Position:</dt> <dd>Forward</dd></dl>
            <dl><dt>Height:</dt><dd>6-1</dd></dl>
            <dl><dt>Weight:</dt><dd>185</dd></dl>
            <dl><dt>Class:</dt><dd>Jr.</dd></dl>
            <dl><dt>Hometown:</dt><dd>Erie,
                Pa.</dd></dl>
            <dl><dt>High School:</dt><dd><a href="/x">Cathedral Prep</a></dd></dl>
            <dl><dt>Major:</dt><dd>Biology</dd></dl></div>"#
        )
    }

    fn roster_page() -> String {
        format!(
            r#"<a href="{p}/dominik-bartecko/101">DB</a>
               <a href="{p}/jo-smith/102">JS</a>
               <a href="{p}/dominik-bartecko/101">again</a>
               <a href="https://hurstathletics.com{p}/coaches/9">coach</a>
               <a href="/sports/womens-ice-hockey/roster/x/1">other</a>"#,
            p = ROSTER_PATH
        )
    }

    fn pages() -> StaticPages {
        StaticPages::new()
            .with_page(&format!("{BASE}{ROSTER_PATH}"), &roster_page())
            .with_page(
                &format!("{BASE}{ROSTER_PATH}/dominik-bartecko/101"),
                &player_page("Dominik", "Bartecko", 7),
            )
            .with_page(
                &format!("{BASE}{ROSTER_PATH}/jo-smith/102"),
                &player_page("Jo", "Smith", 12),
            )
            .with_page(&format!("{BASE}{ROSTER_PATH}/coaches/9"), "<p>Head Coach</p>")
    }

    fn options(csv_path: PathBuf) -> CrawlOptions {
        CrawlOptions {
            csv_path,
            base_url: BASE.to_string(),
            roster_path: ROSTER_PATH.to_string(),
            append: true,
            limit: None,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_parse_player_page() {
        let entry = parse_player_page(&player_page("Dominik", "Bartecko", 7));

        assert_eq!(entry.first_name, "Dominik");
        assert_eq!(entry.last_name, "Bartecko");
        assert_eq!(entry.jersey_number, "7");
        assert_eq!(entry.position, "Forward");
        assert_eq!(entry.height, "6-1");
        assert_eq!(entry.weight, "185");
        assert_eq!(entry.class_year, "Jr.");
        assert_eq!(entry.home_town, "Erie, Pa.");
        assert_eq!(entry.highschool, "Cathedral Prep");
    }

    #[test]
    fn test_loose_name_pattern() {
        let html = r#"<h1 class="sidearm-roster-player-name x"><span>Al</span><br/><em>-</em><span>Jones</span></h1>"#;

        let entry = parse_player_page(html);

        assert_eq!(entry.key(), Some(("Al".to_string(), "Jones".to_string())));
    }

    #[test]
    fn test_page_without_name_has_no_key() {
        assert_eq!(parse_player_page("<p>Head Coach</p>").key(), None);
    }

    #[test]
    fn test_find_player_links_unique_sorted_absolute() {
        let links = find_player_links(&roster_page(), BASE, ROSTER_PATH);

        assert_eq!(
            links,
            vec![
                format!("{BASE}{ROSTER_PATH}/coaches/9"),
                format!("{BASE}{ROSTER_PATH}/dominik-bartecko/101"),
                format!("{BASE}{ROSTER_PATH}/jo-smith/102"),
            ]
        );
    }

    #[test]
    fn test_second_crawl_appends_nothing() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("bio.csv");
        let source = pages();
        let opts = options(csv_path.clone());
        let roster_url = format!("{BASE}{ROSTER_PATH}");

        let first = crawl(&source, &roster_url, &opts).unwrap();
        let second = crawl(&source, &roster_url, &opts).unwrap();

        assert_eq!(first.new_players, 2);
        assert_eq!(first.skipped_unnamed, 1);
        assert_eq!(second.new_players, 0);
        assert_eq!(second.skipped_existing, 2);
        assert_eq!(second.already_known, 2);

        let content = fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], crate::records::BIO_FIELDS.join(","));
    }

    #[test]
    fn test_failed_player_page_is_skipped() {
        let dir = tempdir().unwrap();
        let source = StaticPages::new().with_page(
            &format!("{BASE}{ROSTER_PATH}"),
            &format!(r#"<a href="{ROSTER_PATH}/gone/1">x</a>"#),
        );

        let summary = crawl(&source, &format!("{BASE}{ROSTER_PATH}"), &options(dir.path().join("bio.csv"))).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.new_players, 0);
    }

    #[test]
    fn test_roster_fetch_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let result = crawl(&StaticPages::new(), "https://nowhere/roster", &options(dir.path().join("bio.csv")));

        assert!(result.is_err());
    }

    #[test]
    fn test_dry_run_and_limit() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("bio.csv");
        let mut opts = options(csv_path.clone());
        opts.append = false;
        opts.limit = Some(2);

        let summary = crawl(&pages(), &format!("{BASE}{ROSTER_PATH}"), &opts).unwrap();

        // coaches page sorts first and has no name
        assert_eq!(summary.skipped_unnamed, 1);
        assert_eq!(summary.new_players, 1);
        assert!(!csv_path.exists());
    }
}
