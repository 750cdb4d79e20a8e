// 📇 Typed Records + Record Loader
// Bio and stats CSV files → typed records, every field routed through the
// permissive coercers so bad cells become None instead of failed rows.

use crate::coerce::de;
use crate::players::normalize_player_field;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Columns of the bio CSV, in file order
pub const BIO_FIELDS: [&str; 9] = [
    "first_name",
    "last_name",
    "position",
    "jersey_number",
    "weight",
    "height",
    "class_year",
    "home_town",
    "highschool",
];

// ============================================================================
// BIO RECORD
// ============================================================================

/// One player's biography; (first_name, last_name) is the identity key
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BioRecord {
    #[serde(default, deserialize_with = "de::text")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "de::int")]
    pub jersey_number: Option<i64>,
    #[serde(default, deserialize_with = "de::int")]
    pub weight: Option<i64>,
    #[serde(default, deserialize_with = "de::text")]
    pub height: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub class_year: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub home_town: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub highschool: Option<String>,
}

impl BioRecord {
    /// Composite key, None unless both names are present
    pub fn identity(&self) -> Option<(&str, &str)> {
        Some((self.first_name.as_deref()?, self.last_name.as_deref()?))
    }
}

// ============================================================================
// STAT RECORD
// ============================================================================

/// One player's season line, keyed by the referenced bio identity
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatRecord {
    pub jersey_number: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(rename = "G")]
    pub g: Option<i64>,
    #[serde(rename = "GP")]
    pub gp: Option<i64>,
    #[serde(rename = "A")]
    pub a: Option<i64>,
    #[serde(rename = "PTS")]
    pub pts: Option<i64>,
    #[serde(rename = "SH")]
    pub sh: Option<i64>,
    #[serde(rename = "SH_PCT")]
    pub sh_pct: Option<f64>,
    #[serde(rename = "Plus_Minus")]
    pub plus_minus: Option<i64>,
    #[serde(rename = "PPG")]
    pub ppg: Option<i64>,
    #[serde(rename = "SHG")]
    pub shg: Option<i64>,
    #[serde(rename = "FG")]
    pub fg: Option<i64>,
    #[serde(rename = "GWG")]
    pub gwg: Option<i64>,
    #[serde(rename = "GTG")]
    pub gtg: Option<i64>,
    #[serde(rename = "OTG")]
    pub otg: Option<i64>,
    #[serde(rename = "HTG")]
    pub htg: Option<i64>,
    #[serde(rename = "UAG")]
    pub uag: Option<i64>,
    /// Penalties-minutes pair such as "2-4", kept as text
    #[serde(rename = "PN_PIM")]
    pub pn_pim: Option<String>,
    #[serde(rename = "MIN")]
    pub min: Option<i64>,
    #[serde(rename = "MAJ")]
    pub maj: Option<i64>,
    #[serde(rename = "OTH")]
    pub oth: Option<i64>,
    #[serde(rename = "BLK")]
    pub blk: Option<i64>,
}

impl StatRecord {
    pub fn identity(&self) -> Option<(&str, &str)> {
        Some((self.first_name.as_deref()?, self.last_name.as_deref()?))
    }
}

/// Wire shape of a stats CSV row after header canonicalization
#[derive(Debug, Deserialize)]
struct StatRow {
    #[serde(default, deserialize_with = "de::int")]
    jersey_number: Option<i64>,
    #[serde(default, deserialize_with = "de::text")]
    first_name: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    last_name: Option<String>,
    #[serde(rename = "Player", default, deserialize_with = "de::text")]
    player: Option<String>,
    #[serde(rename = "G", default, deserialize_with = "de::int")]
    g: Option<i64>,
    #[serde(rename = "GP", default, deserialize_with = "de::int")]
    gp: Option<i64>,
    #[serde(rename = "A", default, deserialize_with = "de::int")]
    a: Option<i64>,
    #[serde(rename = "PTS", default, deserialize_with = "de::int")]
    pts: Option<i64>,
    #[serde(rename = "SH", default, deserialize_with = "de::int")]
    sh: Option<i64>,
    #[serde(rename = "SH_PCT", default, deserialize_with = "de::float")]
    sh_pct: Option<f64>,
    #[serde(rename = "Plus_Minus", default, deserialize_with = "de::int")]
    plus_minus: Option<i64>,
    #[serde(rename = "PPG", default, deserialize_with = "de::int")]
    ppg: Option<i64>,
    #[serde(rename = "SHG", default, deserialize_with = "de::int")]
    shg: Option<i64>,
    #[serde(rename = "FG", default, deserialize_with = "de::int")]
    fg: Option<i64>,
    #[serde(rename = "GWG", default, deserialize_with = "de::int")]
    gwg: Option<i64>,
    #[serde(rename = "GTG", default, deserialize_with = "de::int")]
    gtg: Option<i64>,
    #[serde(rename = "OTG", default, deserialize_with = "de::int")]
    otg: Option<i64>,
    #[serde(rename = "HTG", default, deserialize_with = "de::int")]
    htg: Option<i64>,
    #[serde(rename = "UAG", default, deserialize_with = "de::int")]
    uag: Option<i64>,
    #[serde(rename = "PN_PIM", default, deserialize_with = "de::text")]
    pn_pim: Option<String>,
    #[serde(rename = "MIN", default, deserialize_with = "de::int")]
    min: Option<i64>,
    #[serde(rename = "MAJ", default, deserialize_with = "de::int")]
    maj: Option<i64>,
    #[serde(rename = "OTH", default, deserialize_with = "de::int")]
    oth: Option<i64>,
    #[serde(rename = "BLK", default, deserialize_with = "de::int")]
    blk: Option<i64>,
}

impl From<StatRow> for StatRecord {
    fn from(row: StatRow) -> Self {
        let (first_name, last_name) = match (row.first_name, row.last_name) {
            (None, None) => row
                .player
                .as_deref()
                .map(split_player_name)
                .unwrap_or((None, None)),
            names => names,
        };

        StatRecord {
            jersey_number: row.jersey_number,
            first_name,
            last_name,
            g: row.g,
            gp: row.gp,
            a: row.a,
            pts: row.pts,
            sh: row.sh,
            sh_pct: row.sh_pct,
            plus_minus: row.plus_minus,
            ppg: row.ppg,
            shg: row.shg,
            fg: row.fg,
            gwg: row.gwg,
            gtg: row.gtg,
            otg: row.otg,
            htg: row.htg,
            uag: row.uag,
            pn_pim: row.pn_pim,
            min: row.min,
            maj: row.maj,
            oth: row.oth,
            blk: row.blk,
        }
    }
}

/// "Last, First" (or "First Last") → (first, last)
pub fn split_player_name(player: &str) -> (Option<String>, Option<String>) {
    let cleaned = normalize_player_field(player);
    let non_empty = |s: &str| {
        let s = s.trim();
        if s.is_empty() { None } else { Some(s.to_string()) }
    };

    match cleaned.split_once(',') {
        Some((last, first)) => (non_empty(first), non_empty(last)),
        None => match cleaned.trim().rsplit_once(' ') {
            Some((first, last)) => (non_empty(first), non_empty(last)),
            None => (None, non_empty(&cleaned)),
        },
    }
}

/// Stats header label → record field key
///
/// Hyphens become underscores (`PN-PIM` → `PN_PIM`); the site's symbolic
/// labels map onto their field names.
pub fn canonical_stat_key(label: &str) -> String {
    let label = label.trim();
    match label {
        "#" => "jersey_number".to_string(),
        "+/-" => "Plus_Minus".to_string(),
        _ if label.eq_ignore_ascii_case("SH%") => "SH_PCT".to_string(),
        _ => label.replace('-', "_"),
    }
}

/// Rename every key that appears again later so the last column wins.
/// Renamed keys match no record field and are ignored on load.
fn shadow_repeated_keys(keys: Vec<String>) -> Vec<String> {
    keys.iter()
        .enumerate()
        .map(|(i, key)| {
            if keys[i + 1..].contains(key) {
                format!("{}~{}", key, i)
            } else {
                key.clone()
            }
        })
        .collect()
}

// ============================================================================
// LOADERS
// ============================================================================

pub fn load_bios(csv_path: &Path) -> Result<Vec<BioRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open bio CSV: {}", csv_path.display()))?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: BioRecord = result.context("Failed to deserialize bio row")?;
        records.push(record);
    }

    Ok(records)
}

pub fn load_stats(csv_path: &Path) -> Result<Vec<StatRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open stats CSV: {}", csv_path.display()))?;

    let keys: Vec<String> = rdr
        .headers()
        .context("Failed to read stats CSV header")?
        .iter()
        .map(canonical_stat_key)
        .collect();
    rdr.set_headers(shadow_repeated_keys(keys).into_iter().collect());

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let row: StatRow = result.context("Failed to deserialize stats row")?;
        records.push(StatRecord::from(row));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::write_rows;
    use tempfile::tempdir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_bios_coerces_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bio.csv");
        std::fs::write(
            &path,
            "first_name,last_name,position,jersey_number,weight,height,class_year,home_town,highschool\n\
             Dominik,Bartecko,F,7,185,6-1,Jr.,\"Bratislava, Slovakia\",\n\
             Jo,Smith,D,,heavy,,,,\n",
        )
        .unwrap();

        let bios = load_bios(&path).unwrap();

        assert_eq!(bios.len(), 2);
        assert_eq!(bios[0].identity(), Some(("Dominik", "Bartecko")));
        assert_eq!(bios[0].jersey_number, Some(7));
        assert_eq!(bios[0].weight, Some(185));
        assert_eq!(bios[0].home_town.as_deref(), Some("Bratislava, Slovakia"));
        assert_eq!(bios[0].highschool, None);
        assert_eq!(bios[1].jersey_number, None);
        assert_eq!(bios[1].weight, None);
    }

    #[test]
    fn test_pn_pim_stays_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        std::fs::write(&path, "first_name,last_name,PN-PIM,G\nJo,Smith,2-4,3\n").unwrap();

        let stats = load_stats(&path).unwrap();

        assert_eq!(stats[0].pn_pim.as_deref(), Some("2-4"));
        assert_eq!(stats[0].g, Some(3));
    }

    #[test]
    fn test_missing_columns_are_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        std::fs::write(&path, "first_name,last_name,G\nJo,Smith,1\nAl,Jones\n").unwrap();

        let stats = load_stats(&path).unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].blk, None);
        assert_eq!(stats[1].g, None);
        assert_eq!(stats[1].identity(), Some(("Al", "Jones")));
    }

    #[test]
    fn test_materialized_raw_stats_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let headers = row(&[
            "#", "Player", "GP", "G", "A", "PTS", "SH", "SH%", "+/-", "PN-PIM", "BLK",
        ]);
        let rows = vec![
            row(&["7", "Bartecko, Dominik", "24", "10", "12", "22", "80", ".125", "5", "2-4", "9"]),
            row(&["12", "Smith, Jo", "20", "-", "3"]),
        ];

        write_rows(&path, &headers, &rows).unwrap();
        let stats = load_stats(&path).unwrap();

        assert_eq!(stats.len(), 2);
        let first = &stats[0];
        assert_eq!(first.jersey_number, Some(7));
        assert_eq!(first.identity(), Some(("Dominik", "Bartecko")));
        assert_eq!(first.gp, Some(24));
        assert_eq!(first.g, Some(10));
        assert_eq!(first.a, Some(12));
        assert_eq!(first.pts, Some(22));
        assert_eq!(first.sh, Some(80));
        assert_eq!(first.sh_pct, Some(0.125));
        assert_eq!(first.plus_minus, Some(5));
        assert_eq!(first.pn_pim.as_deref(), Some("2-4"));
        assert_eq!(first.blk, Some(9));

        let second = &stats[1];
        assert_eq!(second.g, None);
        assert_eq!(second.a, Some(3));
        assert_eq!(second.blk, None);
    }

    #[test]
    fn test_repeated_label_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let headers = crate::headers::normalize_raw(row(&["Rk", "Name", "G", "g"]));
        write_rows(&path, &headers, &[row(&["7", "Smith, Jo", "20", "3", "4", "1"])]).unwrap();

        let stats = load_stats(&path).unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].gp, Some(20));
        assert_eq!(stats[0].g, Some(3));
        assert_eq!(stats[0].blk, Some(1));
    }

    #[test]
    fn test_repeated_label_in_existing_file_keeps_last() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        std::fs::write(&path, "first_name,last_name,G,A,G\nJo,Smith,1,2,5\n").unwrap();

        let stats = load_stats(&path).unwrap();

        assert_eq!(stats[0].g, Some(5));
        assert_eq!(stats[0].a, Some(2));
    }

    #[test]
    fn test_canonical_stat_keys() {
        assert_eq!(canonical_stat_key("PN-PIM"), "PN_PIM");
        assert_eq!(canonical_stat_key(" +/- "), "Plus_Minus");
        assert_eq!(canonical_stat_key("SH%"), "SH_PCT");
        assert_eq!(canonical_stat_key("#"), "jersey_number");
        assert_eq!(canonical_stat_key("GWG"), "GWG");
    }

    #[test]
    fn test_split_player_name() {
        assert_eq!(
            split_player_name("bartecko, dominik bartecko, dominik"),
            (Some("Dominik".to_string()), Some("Bartecko".to_string()))
        );
        assert_eq!(
            split_player_name("Jo Smith"),
            (Some("Jo".to_string()), Some("Smith".to_string()))
        );
        assert_eq!(split_player_name("Team"), (None, Some("Team".to_string())));
    }
}
