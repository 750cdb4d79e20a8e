// Roster Ingest - Core Library
// Scrapes roster and stats pages into CSV, seeds them into SQLite.

pub mod coerce;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod headers;
pub mod locator;
pub mod materialize;
pub mod pipeline;
pub mod players;
pub mod records;
pub mod roster;

// Re-export commonly used types
pub use config::Settings;
pub use db::{
    Table, SeedSource, SeedReport, SeedOutcome, SeedRun,
    setup_database, seed_bios, seed_stats, seed_bios_from_csv, seed_stats_from_csv,
    count_rows, get_all_bios, get_all_stats, get_seed_runs,
};
pub use error::IngestError;
pub use extract::{DataRow, HeaderRow, extract_body_rows, extract_cells, extract_header};
pub use fetch::{HttpFetcher, PageSource, StaticPages};
pub use headers::{HeaderMode, normalize, normalize_raw};
pub use locator::{MatchStrategy, RawTable, locate_table, locate_table_with_strategy};
pub use materialize::{fit_row, read_existing_headers, write_rows};
pub use pipeline::{PopulateOptions, PopulateSummary, StatsInput, populate_stats};
pub use players::{normalize_player_column, normalize_player_field};
pub use records::{BioRecord, StatRecord, BIO_FIELDS, load_bios, load_stats};
pub use roster::{
    CrawlOptions, CrawlSummary, RosterEntry,
    append_entry, crawl, find_player_links, parse_player_page, read_existing_keys,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
