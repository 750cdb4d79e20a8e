use crate::records::{load_bios, load_stats, BioRecord, StatRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Bio,
    Stats,
}

impl Table {
    pub fn name(&self) -> &str {
        match self {
            Table::Bio => "bio",
            Table::Stats => "stats",
        }
    }
}

/// Where a seeding batch came from (recorded in the seed log)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSource {
    pub path: String,
    pub sha256: String,
}

impl SeedSource {
    pub fn new(path: &str, sha256: &str) -> Self {
        SeedSource {
            path: path.to_string(),
            sha256: sha256.to_string(),
        }
    }

    /// Fingerprint a source file with SHA-256
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read seed source: {}", path.display()))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);

        Ok(SeedSource {
            path: path.display().to_string(),
            sha256: format!("{:x}", hasher.finalize()),
        })
    }
}

/// Counts from one seeding pass that actually ran
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub missing_identity: usize,
    /// Stats identities with no bio row
    pub orphaned: Vec<(String, String)>,
}

impl SeedReport {
    pub fn rejected(&self) -> usize {
        self.duplicates + self.missing_identity + self.orphaned.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Table already had rows; nothing was touched
    Skipped { existing: i64 },
    Seeded(SeedReport),
}

/// One row of the seed log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRun {
    pub run_id: String,
    pub table_name: String,
    pub source_path: String,
    pub source_sha256: String,
    pub inserted: i64,
    pub rejected: i64,
    pub details: serde_json::Value,
    pub seeded_at: DateTime<Utc>,
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bio (
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            position TEXT,
            jersey_number INTEGER,
            weight INTEGER,
            height TEXT,
            class_year TEXT,
            home_town TEXT,
            highschool TEXT,
            PRIMARY KEY (first_name, last_name)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS stats (
            jersey_number INTEGER,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            \"G\" INTEGER,
            \"GP\" INTEGER,
            \"A\" INTEGER,
            \"PTS\" INTEGER,
            \"SH\" INTEGER,
            \"SH_PCT\" REAL,
            \"Plus_Minus\" INTEGER,
            \"PPG\" INTEGER,
            \"SHG\" INTEGER,
            \"FG\" INTEGER,
            \"GWG\" INTEGER,
            \"GTG\" INTEGER,
            \"OTG\" INTEGER,
            \"HTG\" INTEGER,
            \"UAG\" INTEGER,
            \"PN_PIM\" TEXT,
            \"MIN\" INTEGER,
            \"MAJ\" INTEGER,
            \"OTH\" INTEGER,
            \"BLK\" INTEGER,
            PRIMARY KEY (first_name, last_name),
            FOREIGN KEY (first_name, last_name) REFERENCES bio (first_name, last_name)
        )",
        [],
    )?;

    // Audit trail of seeding passes
    conn.execute(
        "CREATE TABLE IF NOT EXISTS seed_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            table_name TEXT NOT NULL,
            source_path TEXT NOT NULL,
            source_sha256 TEXT NOT NULL,
            inserted INTEGER NOT NULL,
            rejected INTEGER NOT NULL,
            details TEXT NOT NULL,
            seeded_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

pub fn count_rows(conn: &Connection, table: Table) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.name());
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;

    Ok(count)
}

fn bio_exists(conn: &Connection, first_name: &str, last_name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM bio WHERE first_name = ?1 AND last_name = ?2",
            params![first_name, last_name],
            |row| row.get(0),
        )
        .optional()?;

    Ok(found.is_some())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ============================================================================
// SEEDING
// ============================================================================

/// One-time bio seeding: skipped entirely when the table has rows
pub fn seed_bios(conn: &Connection, records: &[BioRecord], source: &SeedSource) -> Result<SeedOutcome> {
    let existing = count_rows(conn, Table::Bio)?;
    if existing > 0 {
        info!(existing, "bio table already populated, skipping seed");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let mut report = SeedReport::default();
    let tx = conn.unchecked_transaction()?;

    for bio in records {
        let Some((first_name, last_name)) = bio.identity() else {
            warn!(?bio, "bio row without full name, rejected");
            report.missing_identity += 1;
            continue;
        };

        let result = tx.execute(
            "INSERT INTO bio (
                first_name, last_name, position, jersey_number, weight,
                height, class_year, home_town, highschool
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                first_name,
                last_name,
                bio.position,
                bio.jersey_number,
                bio.weight,
                bio.height,
                bio.class_year,
                bio.home_town,
                bio.highschool,
            ],
        );

        match result {
            Ok(_) => report.inserted += 1,
            Err(e) if is_constraint_violation(&e) => {
                warn!(first_name, last_name, "duplicate bio identity, skipped");
                report.duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit()?;
    record_seed_run(conn, Table::Bio, source, &report)?;

    Ok(SeedOutcome::Seeded(report))
}

/// One-time stats seeding. Rows whose identity has no bio are rejected
/// here rather than left to the foreign key.
pub fn seed_stats(conn: &Connection, records: &[StatRecord], source: &SeedSource) -> Result<SeedOutcome> {
    let existing = count_rows(conn, Table::Stats)?;
    if existing > 0 {
        info!(existing, "stats table already populated, skipping seed");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let mut report = SeedReport::default();
    let tx = conn.unchecked_transaction()?;

    for stat in records {
        let Some((first_name, last_name)) = stat.identity() else {
            warn!(jersey = ?stat.jersey_number, "stats row without full name, rejected");
            report.missing_identity += 1;
            continue;
        };

        if !bio_exists(&tx, first_name, last_name)? {
            warn!(first_name, last_name, "stats row references no bio, rejected");
            report
                .orphaned
                .push((first_name.to_string(), last_name.to_string()));
            continue;
        }

        let result = tx.execute(
            "INSERT INTO stats (
                jersey_number, first_name, last_name,
                \"G\", \"GP\", \"A\", \"PTS\", \"SH\", \"SH_PCT\", \"Plus_Minus\",
                \"PPG\", \"SHG\", \"FG\", \"GWG\", \"GTG\", \"OTG\", \"HTG\", \"UAG\",
                \"PN_PIM\", \"MIN\", \"MAJ\", \"OTH\", \"BLK\"
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
            params![
                stat.jersey_number,
                first_name,
                last_name,
                stat.g,
                stat.gp,
                stat.a,
                stat.pts,
                stat.sh,
                stat.sh_pct,
                stat.plus_minus,
                stat.ppg,
                stat.shg,
                stat.fg,
                stat.gwg,
                stat.gtg,
                stat.otg,
                stat.htg,
                stat.uag,
                stat.pn_pim,
                stat.min,
                stat.maj,
                stat.oth,
                stat.blk,
            ],
        );

        match result {
            Ok(_) => report.inserted += 1,
            Err(e) if is_constraint_violation(&e) => {
                warn!(first_name, last_name, "duplicate stats identity, skipped");
                report.duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit()?;
    record_seed_run(conn, Table::Stats, source, &report)?;

    Ok(SeedOutcome::Seeded(report))
}

/// Load `bio.csv` and seed it
pub fn seed_bios_from_csv(conn: &Connection, csv_path: &Path) -> Result<SeedOutcome> {
    let records = load_bios(csv_path)?;
    let source = SeedSource::from_file(csv_path)?;
    seed_bios(conn, &records, &source)
}

/// Load `stats.csv` and seed it
pub fn seed_stats_from_csv(conn: &Connection, csv_path: &Path) -> Result<SeedOutcome> {
    let records = load_stats(csv_path)?;
    let source = SeedSource::from_file(csv_path)?;
    seed_stats(conn, &records, &source)
}

// ============================================================================
// SEED LOG
// ============================================================================

fn record_seed_run(conn: &Connection, table: Table, source: &SeedSource, report: &SeedReport) -> Result<()> {
    let details = serde_json::json!({
        "duplicates": report.duplicates,
        "missing_identity": report.missing_identity,
        "orphaned": report.orphaned,
    });

    conn.execute(
        "INSERT INTO seed_runs (
            run_id, table_name, source_path, source_sha256, inserted, rejected, details, seeded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            uuid::Uuid::new_v4().to_string(),
            table.name(),
            source.path,
            source.sha256,
            report.inserted as i64,
            report.rejected() as i64,
            serde_json::to_string(&details)?,
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(())
}

pub fn get_seed_runs(conn: &Connection) -> Result<Vec<SeedRun>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, table_name, source_path, source_sha256, inserted, rejected, details, seeded_at
         FROM seed_runs
         ORDER BY id",
    )?;

    let runs = stmt
        .query_map([], |row| {
            let details_json: String = row.get(6)?;
            let seeded_at_str: String = row.get(7)?;

            Ok(SeedRun {
                run_id: row.get(0)?,
                table_name: row.get(1)?,
                source_path: row.get(2)?,
                source_sha256: row.get(3)?,
                inserted: row.get(4)?,
                rejected: row.get(5)?,
                details: serde_json::from_str(&details_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                seeded_at: DateTime::parse_from_rfc3339(&seeded_at_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(runs)
}

// ============================================================================
// READERS
// ============================================================================

pub fn get_all_bios(conn: &Connection) -> Result<Vec<BioRecord>> {
    let mut stmt = conn.prepare(
        "SELECT first_name, last_name, position, jersey_number, weight,
                height, class_year, home_town, highschool
         FROM bio
         ORDER BY last_name, first_name",
    )?;

    let bios = stmt
        .query_map([], |row| {
            Ok(BioRecord {
                first_name: row.get(0)?,
                last_name: row.get(1)?,
                position: row.get(2)?,
                jersey_number: row.get(3)?,
                weight: row.get(4)?,
                height: row.get(5)?,
                class_year: row.get(6)?,
                home_town: row.get(7)?,
                highschool: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(bios)
}

pub fn get_all_stats(conn: &Connection) -> Result<Vec<StatRecord>> {
    let mut stmt = conn.prepare(
        "SELECT jersey_number, first_name, last_name,
                \"G\", \"GP\", \"A\", \"PTS\", \"SH\", \"SH_PCT\", \"Plus_Minus\",
                \"PPG\", \"SHG\", \"FG\", \"GWG\", \"GTG\", \"OTG\", \"HTG\", \"UAG\",
                \"PN_PIM\", \"MIN\", \"MAJ\", \"OTH\", \"BLK\"
         FROM stats
         ORDER BY last_name, first_name",
    )?;

    let stats = stmt
        .query_map([], |row| {
            Ok(StatRecord {
                jersey_number: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                g: row.get(3)?,
                gp: row.get(4)?,
                a: row.get(5)?,
                pts: row.get(6)?,
                sh: row.get(7)?,
                sh_pct: row.get(8)?,
                plus_minus: row.get(9)?,
                ppg: row.get(10)?,
                shg: row.get(11)?,
                fg: row.get(12)?,
                gwg: row.get(13)?,
                gtg: row.get(14)?,
                otg: row.get(15)?,
                htg: row.get(16)?,
                uag: row.get(17)?,
                pn_pim: row.get(18)?,
                min: row.get(19)?,
                maj: row.get(20)?,
                oth: row.get(21)?,
                blk: row.get(22)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(stats)
}
