// 🏷️ Header Normalizer
// Source tables change column presence and order between releases. Raw mode
// pins a stable minimum schema (#, Player, GP, ..., BLK) so downstream
// readers can rely on fixed anchor columns.

use crate::extract::{clean_cell, HeaderRow};

pub const RANK_LABEL: &str = "#";
pub const PLAYER_LABEL: &str = "Player";
pub const GAMES_LABEL: &str = "GP";
pub const BLOCKS_LABEL: &str = "BLK";

/// First-column labels that mean "rank/number" and become `#`
const RANK_SYNONYMS: &[&str] = &["rk", "no", "no.", "num", "number"];

/// Index-1 labels that mean "player name" and become `Player`
const PLAYER_SYNONYMS: &[&str] = &["", "name", "player"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// Canonical anchors inserted, labels uppercased
    Raw,
    /// Labels cleaned only, no structural change
    Sanitized,
}

pub fn normalize(headers: HeaderRow, mode: HeaderMode) -> HeaderRow {
    match mode {
        HeaderMode::Raw => normalize_raw(headers),
        HeaderMode::Sanitized => sanitize(headers),
    }
}

/// Strip nested tags and collapse whitespace per label
pub fn sanitize(headers: HeaderRow) -> HeaderRow {
    make_unique(headers.iter().map(|h| clean_cell(h)).collect())
}

/// Raw-mode canonicalization. Idempotent.
pub fn normalize_raw(headers: HeaderRow) -> HeaderRow {
    let mut headers: HeaderRow = headers.iter().map(|h| h.trim().to_string()).collect();

    // 1. rank marker
    let has_rank = headers.first().map_or(false, |h| h.starts_with(RANK_LABEL));
    if !has_rank {
        if headers.first().map_or(false, |h| is_one_of(h, RANK_SYNONYMS)) {
            headers[0] = RANK_LABEL.to_string();
        } else {
            headers.insert(0, RANK_LABEL.to_string());
        }
    }

    // 2. player label
    if headers.len() < 2 {
        headers.insert(1, PLAYER_LABEL.to_string());
    } else if is_one_of(&headers[1], PLAYER_SYNONYMS) {
        headers[1] = PLAYER_LABEL.to_string();
    }

    // 3. games played right after Player
    if !headers.iter().any(|h| h.eq_ignore_ascii_case(GAMES_LABEL)) {
        let at = headers
            .iter()
            .position(|h| h == PLAYER_LABEL)
            .map_or(1, |idx| idx + 1);
        headers.insert(at, GAMES_LABEL.to_string());
    }

    // 4. blocks last
    if !headers.iter().any(|h| h.eq_ignore_ascii_case(BLOCKS_LABEL)) {
        headers.push(BLOCKS_LABEL.to_string());
    }

    // 5. uppercase, then suffix repeats; a suffixed `Player` is uppercased too
    let headers: HeaderRow = headers.into_iter().map(uppercase_label).collect();
    make_unique(headers).into_iter().map(uppercase_label).collect()
}

fn uppercase_label(label: String) -> String {
    if label == PLAYER_LABEL {
        label
    } else {
        label.to_uppercase()
    }
}

/// First occurrence keeps its label; later case-insensitive repeats become
/// `LABEL_2`, `LABEL_3`, ... so the width never changes.
fn make_unique(headers: HeaderRow) -> HeaderRow {
    let mut unique: HeaderRow = Vec::with_capacity(headers.len());

    for label in headers {
        if !is_taken(&unique, &label) {
            unique.push(label);
            continue;
        }

        let mut n = 2;
        let mut candidate = format!("{}_{}", label, n);
        while is_taken(&unique, &candidate) {
            n += 1;
            candidate = format!("{}_{}", label, n);
        }
        unique.push(candidate);
    }

    unique
}

fn is_taken(labels: &[String], label: &str) -> bool {
    labels.iter().any(|h| h.eq_ignore_ascii_case(label))
}

fn is_one_of(label: &str, synonyms: &[&str]) -> bool {
    synonyms.iter().any(|s| label.eq_ignore_ascii_case(s))
}
