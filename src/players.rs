// 🧹 Player Name Normalizer
// Stats tables render the player cell as "last, first" and often repeat it
// ("bartecko, dominik bartecko, dominik"). Clean it to "Bartecko, Dominik".

use crate::materialize::read_all_rows;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Column holding the player name in a stats CSV
pub const PLAYER_COLUMN: usize = 1;

/// Uppercase the first letter, lowercase the rest
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Capitalize each hyphen-separated piece ("smith-jones" → "Smith-Jones")
fn title_case_compound(name: &str) -> String {
    name.split('-').map(capitalize).collect::<Vec<_>>().join("-")
}

fn title_case_words(s: &str) -> String {
    s.split_whitespace()
        .map(title_case_compound)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_player_field(raw: &str) -> String {
    let mut s = raw.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s = &s[1..s.len() - 1];
    }

    match s.split_once(',') {
        Some((last, rest)) => {
            let last = title_case_words(last);
            let first = rest
                .split_whitespace()
                .next()
                .map(title_case_compound)
                .unwrap_or_default();

            if first.is_empty() {
                last
            } else {
                format!("{}, {}", last, first)
            }
        }
        None => s
            .split_whitespace()
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Rewrite the Player column of a stats CSV in place, header untouched
pub fn normalize_player_column(path: &Path) -> Result<usize> {
    let mut rows = read_all_rows(path)?;
    if rows.is_empty() {
        info!(path = %path.display(), "empty file, nothing to normalize");
        return Ok(0);
    }

    let mut changed = 0;
    for row in rows.iter_mut().skip(1) {
        if let Some(cell) = row.get_mut(PLAYER_COLUMN) {
            let normalized = normalize_player_field(cell);
            if *cell != normalized {
                *cell = normalized;
                changed += 1;
            }
        }
    }

    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to rewrite CSV file: {}", path.display()))?;
    for row in &rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_duplicated_name_collapsed() {
        assert_eq!(
            normalize_player_field("bartecko, dominik bartecko, dominik"),
            "Bartecko, Dominik"
        );
    }

    #[test]
    fn test_quotes_and_hyphenated_names() {
        assert_eq!(
            normalize_player_field("\"smith-JONES, mary-kate\""),
            "Smith-Jones, Mary-Kate"
        );
    }

    #[test]
    fn test_last_name_only() {
        assert_eq!(normalize_player_field("van der berg,"), "Van Der Berg");
    }

    #[test]
    fn test_without_comma_title_cases_words() {
        assert_eq!(normalize_player_field("  TEAM   totals "), "Team Totals");
    }

    #[test]
    fn test_column_rewritten_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        std::fs::write(
            &path,
            "#,Player,GP\n7,\"bartecko, dominik bartecko, dominik\",24\n9,\"Smith, Jo\",20\n",
        )
        .unwrap();

        let changed = normalize_player_column(&path).unwrap();
        let rows = read_all_rows(&path).unwrap();

        assert_eq!(changed, 1);
        assert_eq!(rows[0], vec!["#", "Player", "GP"]);
        assert_eq!(rows[1][1], "Bartecko, Dominik");
        assert_eq!(rows[2][1], "Smith, Jo");
    }
}
