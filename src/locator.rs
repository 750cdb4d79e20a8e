// 🔎 HTML Table Locator
// Finds the <table> block a locating phrase refers to. Three strategies,
// tried in order: phrase inside a table, first table after the phrase,
// first table after a window holding every word of the phrase.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Width of the fuzzy-match window, in bytes of the lower-cased document
pub const FUZZY_WINDOW: usize = 1000;

static TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<table[\s\S]*?</table>").expect("table pattern"));
static WORD_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("word split pattern"));

// ============================================================================
// RAW TABLE
// ============================================================================

/// Markup span of one `<table>...</table>` block, tags included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable(String);

impl RawTable {
    pub fn new(markup: impl Into<String>) -> Self {
        RawTable(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which strategy located the table (reported in progress logs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    InsideTable,
    AfterPhrase,
    Fuzzy,
}

// ============================================================================
// LOCATOR
// ============================================================================

/// Locate the table for `phrase`, or None when no strategy succeeds.
///
/// Matching is case-insensitive for ASCII letters only; non-ASCII letters
/// must match the page's casing exactly.
pub fn locate_table(markup: &str, phrase: &str) -> Option<RawTable> {
    locate_table_with_strategy(markup, phrase).map(|(table, _)| table)
}

pub fn locate_table_with_strategy(markup: &str, phrase: &str) -> Option<(RawTable, MatchStrategy)> {
    // ASCII lowering keeps byte offsets aligned with `markup`
    let lower = markup.to_ascii_lowercase();
    let needle = phrase.to_ascii_lowercase();

    // An empty phrase is contained in every table, so the first one wins
    for m in TABLE_RE.find_iter(markup) {
        if lower[m.start()..m.end()].contains(&needle) {
            debug!(strategy = "inside_table", offset = m.start(), "table located");
            return Some((RawTable::new(m.as_str()), MatchStrategy::InsideTable));
        }
    }

    if let Some(idx) = lower.find(&needle) {
        if let Some(table) = first_table_from(markup, idx) {
            debug!(strategy = "after_phrase", offset = idx, "table located");
            return Some((table, MatchStrategy::AfterPhrase));
        }
    }

    let words = phrase_words(phrase);
    let start = fuzzy_window_start(&lower, &words, FUZZY_WINDOW)?;
    let table = first_table_from(markup, start)?;
    debug!(strategy = "fuzzy", offset = start, words = words.len(), "table located");
    Some((table, MatchStrategy::Fuzzy))
}

/// Lower-cased alphanumeric words of the phrase
pub fn phrase_words(phrase: &str) -> Vec<String> {
    WORD_SPLIT_RE
        .split(phrase)
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

/// First window start whose `window` bytes contain every word.
///
/// Equivalent to sliding the window one position at a time, but jumps
/// straight to the next start that could possibly satisfy every word.
fn fuzzy_window_start(lower: &str, words: &[String], window: usize) -> Option<usize> {
    if words.is_empty() {
        return None;
    }

    let mut start = 0;
    loop {
        // Furthest end among the next occurrence of each word
        let mut furthest_end = 0;
        for word in words {
            let pos = lower.get(start..)?.find(word.as_str())? + start;
            furthest_end = furthest_end.max(pos + word.len());
        }

        let earliest_fit = furthest_end.saturating_sub(window);
        if earliest_fit <= start {
            return Some(start);
        }

        start = earliest_fit;
        while !lower.is_char_boundary(start) {
            start += 1;
        }
    }
}

fn first_table_from(markup: &str, from: usize) -> Option<RawTable> {
    let m = TABLE_RE.find_at(markup, from)?;
    Some(RawTable::new(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "Individual, Overall, Skaters";

    fn table(id: &str) -> String {
        format!("<table id=\"{}\"><tr><td>{}</td></tr></table>", id, id)
    }

    #[test]
    fn test_phrase_inside_table_wins() {
        let html = format!(
            "{}<TABLE><caption>individual, overall, skaters</caption><tr><td>x</td></tr></TABLE>",
            table("first")
        );

        let (found, strategy) = locate_table_with_strategy(&html, PHRASE).unwrap();

        assert!(found.as_str().contains("caption"));
        assert_eq!(strategy, MatchStrategy::InsideTable);
    }

    #[test]
    fn test_first_table_after_phrase() {
        let html = format!(
            "{}<h2>Individual, Overall, Skaters</h2>{}{}",
            table("before"),
            table("target"),
            table("later")
        );

        let (found, strategy) = locate_table_with_strategy(&html, PHRASE).unwrap();

        assert!(found.as_str().contains("target"));
        assert_eq!(strategy, MatchStrategy::AfterPhrase);
    }

    #[test]
    fn test_fuzzy_match_across_sentences() {
        let html = format!(
            "{}{}<p>Individual stats below.</p><p>Overall numbers for all Skaters.</p>{}",
            table("before"),
            " ".repeat(1200),
            table("target")
        );

        let (found, strategy) = locate_table_with_strategy(&html, PHRASE).unwrap();

        assert!(found.as_str().contains("target"));
        assert_eq!(strategy, MatchStrategy::Fuzzy);
    }

    #[test]
    fn test_fuzzy_words_too_far_apart() {
        let filler = "x".repeat(1500);
        let html = format!(
            "<p>Individual</p>{}<p>Overall Skaters</p>",
            filler
        ) + &table("target");

        // Words span more than the window: only the later pair fits, and
        // "individual" does not occur after it.
        assert!(locate_table(&html, PHRASE).is_none());
    }

    #[test]
    fn test_fuzzy_window_picks_later_cluster() {
        let filler = "x".repeat(1500);
        let html = format!(
            "<p>Individual</p>{}{}<p>Skaters overall individual</p>{}",
            table("early"),
            filler,
            table("target")
        );

        let found = locate_table(&html, PHRASE).unwrap();

        assert!(found.as_str().contains("target"));
    }

    #[test]
    fn test_no_match_is_none() {
        let html = table("only");

        assert!(locate_table(&html, PHRASE).is_none());
        assert!(locate_table("", PHRASE).is_none());
    }

    #[test]
    fn test_empty_phrase_returns_first_table() {
        let html = format!("<p>intro</p>{}{}", table("first"), table("second"));

        let (found, strategy) = locate_table_with_strategy(&html, "").unwrap();

        assert!(found.as_str().contains("first"));
        assert_eq!(strategy, MatchStrategy::InsideTable);
        assert!(locate_table("<p>no tables</p>", "").is_none());
    }

    #[test]
    fn test_phrase_words_split_on_punctuation() {
        assert_eq!(phrase_words(PHRASE), vec!["individual", "overall", "skaters"]);
        assert!(phrase_words(", ;").is_empty());
    }
}
