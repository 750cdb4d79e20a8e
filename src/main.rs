use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use roster_ingest::{
    append_entry, count_rows, crawl, normalize_player_column, parse_player_page,
    populate_stats, seed_bios_from_csv, seed_stats_from_csv, setup_database,
    CrawlOptions, HeaderMode, HttpFetcher, IngestError, PopulateOptions, SeedOutcome,
    Settings, StatsInput, Table,
};

/// Scrape roster and stats pages into CSV and seed them into SQLite
#[derive(Parser, Debug)]
#[command(name = "roster-ingest", version)]
struct Cli {
    /// JSON settings file overriding the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the stats table and overwrite the stats CSV with its rows
    PopulateStats {
        /// Saved stats HTML file to parse instead of fetching
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Stats page URL
        #[arg(long)]
        url: Option<String>,
        /// Phrase identifying the target table
        #[arg(long)]
        phrase: Option<String>,
        /// Output CSV path
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Canonicalize headers (#, Player, GP, ..., BLK) when none exist yet
        #[arg(long)]
        raw: bool,
        /// Keep at most this many data rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Crawl the roster and append new player bios to the bio CSV
    CrawlRoster {
        #[arg(long)]
        roster_url: Option<String>,
        /// Write parsed players (otherwise only report them)
        #[arg(long)]
        append: bool,
        /// Limit number of players to fetch (0 = all)
        #[arg(long, default_value_t = 0)]
        limit: usize,
        /// Bio CSV path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Parse one saved player page and optionally append it to the bio CSV
    ParseRoster {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        append: bool,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Clean the Player column of a stats CSV in place
    NormalizePlayers {
        path: Option<PathBuf>,
    },
    /// One-time seeding of the database from the CSV files
    Seed {
        #[arg(value_enum, default_value_t = SeedTarget::All)]
        target: SeedTarget,
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        bio: Option<PathBuf>,
        #[arg(long)]
        stats: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SeedTarget {
    Bio,
    Stats,
    All,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("❌ {:#}", err);
        let code = err
            .downcast_ref::<IngestError>()
            .map_or(1, IngestError::exit_code);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::PopulateStats { input, url, phrase, out, raw, limit } => {
            let input = match input {
                Some(path) => StatsInput::File(path),
                None => StatsInput::Url(url.unwrap_or_else(|| settings.stats_url())),
            };
            let opts = PopulateOptions {
                input,
                phrase: phrase.unwrap_or_else(|| settings.stats_phrase.clone()),
                out: out.unwrap_or_else(|| settings.stats_csv.clone()),
                mode: if raw { HeaderMode::Raw } else { HeaderMode::Sanitized },
                limit,
            };
            run_populate_stats(&settings, &opts)
        }
        Command::CrawlRoster { roster_url, append, limit, out } => {
            let roster_url = roster_url.unwrap_or_else(|| settings.roster_url());
            let opts = CrawlOptions {
                csv_path: out.unwrap_or_else(|| settings.bio_csv.clone()),
                base_url: settings.base_url.clone(),
                roster_path: settings.roster_path.clone(),
                append,
                limit: if limit > 0 { Some(limit) } else { None },
                delay: settings.crawl_delay(),
            };
            run_crawl(&settings, &roster_url, &opts)
        }
        Command::ParseRoster { input, append, out } => {
            run_parse_roster(&input, append, &out.unwrap_or_else(|| settings.bio_csv.clone()))
        }
        Command::NormalizePlayers { path } => {
            let path = path.unwrap_or_else(|| settings.stats_csv.clone());
            let changed = normalize_player_column(&path)?;
            println!("✓ Normalized Player column in {} ({} rows changed)", path.display(), changed);
            Ok(())
        }
        Command::Seed { target, db, bio, stats } => {
            let db_path = db.unwrap_or_else(|| settings.database.clone());
            let bio_path = bio.unwrap_or_else(|| settings.bio_csv.clone());
            let stats_path = stats.unwrap_or_else(|| settings.stats_csv.clone());
            run_seed(target, &db_path, &bio_path, &stats_path)
        }
    }
}

fn run_populate_stats(settings: &Settings, opts: &PopulateOptions) -> Result<()> {
    let fetcher = HttpFetcher::new(settings.stats_timeout(), &settings.user_agent)?;

    let summary = populate_stats(&fetcher, opts)?;
    if summary.reused_header {
        println!("✓ Reused existing header from {}", opts.out.display());
    }
    println!(
        "✓ Wrote {} rows to {} with {} columns.",
        summary.rows_written,
        opts.out.display(),
        summary.columns
    );

    Ok(())
}

fn run_crawl(settings: &Settings, roster_url: &str, opts: &CrawlOptions) -> Result<()> {
    let fetcher = HttpFetcher::new(settings.roster_timeout(), &settings.user_agent)?;

    let summary = crawl(&fetcher, roster_url, opts)?;
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Player links: {}", summary.links);
    println!("✓ Added {} new players", summary.new_players);
    println!("✓ Skipped existing: {}", summary.skipped_existing);
    if summary.skipped_unnamed > 0 || summary.failed > 0 {
        println!(
            "⚠️  Unnamed pages: {}, failed pages: {}",
            summary.skipped_unnamed, summary.failed
        );
    }

    Ok(())
}

fn run_parse_roster(input: &Path, append: bool, csv_path: &Path) -> Result<()> {
    let content = fs::read_to_string(input).map_err(|e| IngestError::Input {
        path: input.display().to_string(),
        reason: e.to_string(),
    })?;

    let entry = parse_player_page(&content);
    println!("Parsed: {:?}", entry);

    if append {
        append_entry(csv_path, &entry)?;
        println!("✓ Appended to {}", csv_path.display());
    }

    Ok(())
}

fn run_seed(target: SeedTarget, db_path: &Path, bio_path: &Path, stats_path: &Path) -> Result<()> {
    println!("🗄️  Seeding {}", db_path.display());

    let conn = Connection::open(db_path)?;
    setup_database(&conn)?;

    if matches!(target, SeedTarget::Bio | SeedTarget::All) {
        report("bio", seed_bios_from_csv(&conn, bio_path)?);
    }
    if matches!(target, SeedTarget::Stats | SeedTarget::All) {
        report("stats", seed_stats_from_csv(&conn, stats_path)?);
    }

    println!(
        "✓ Database contains {} bios, {} stat lines",
        count_rows(&conn, Table::Bio)?,
        count_rows(&conn, Table::Stats)?
    );

    Ok(())
}

fn report(table: &str, outcome: SeedOutcome) {
    match outcome {
        SeedOutcome::Skipped { existing } => {
            println!("✓ {}: already has {} rows, seeding skipped", table, existing);
        }
        SeedOutcome::Seeded(report) => {
            println!("✓ {}: inserted {}", table, report.inserted);
            if report.rejected() > 0 {
                println!(
                    "⚠️  {}: rejected {} (duplicates {}, missing name {}, no bio {})",
                    table,
                    report.rejected(),
                    report.duplicates,
                    report.missing_identity,
                    report.orphaned.len()
                );
            }
        }
    }
}
