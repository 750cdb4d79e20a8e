// ✂️ Row/Header Extractor
// Best-effort text pass over a located table: regex spans for rows and
// cells, nested tags stripped, whitespace collapsed. Not a DOM parser.

use crate::locator::RawTable;
use once_cell::sync::Lazy;
use regex::Regex;

pub type HeaderRow = Vec<String>;
pub type DataRow = Vec<String>;

static THEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<thead[\s\S]*?>([\s\S]*?)</thead>").expect("thead pattern"));
static TBODY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<tbody[\s\S]*?>([\s\S]*?)</tbody>").expect("tbody pattern"));
static TR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<tr[^>]*>[\s\S]*?</tr>").expect("tr pattern"));
static CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<t[dh][^>]*>([\s\S]*?)</t[dh]>").expect("cell pattern"));
static COLGROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)scope\s*=\s*"colgroup""#).expect("colgroup pattern"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

// ============================================================================
// TEXT PRIMITIVES
// ============================================================================

/// Drop every `<...>` tag
pub fn strip_tags(s: &str) -> String {
    TAG_RE.replace_all(s, "").into_owned()
}

/// Runs of whitespace (newlines included) → one space, then trim
pub fn collapse_ws(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ").replace("&amp;", "&")
}

/// Visible text of one cell's inner markup
pub fn clean_cell(inner: &str) -> String {
    collapse_ws(&decode_entities(&strip_tags(inner)))
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Cleaned `<th>`/`<td>` texts of one `<tr>` span
pub fn extract_cells(tr: &str) -> DataRow {
    CELL_RE
        .captures_iter(tr)
        .map(|caps| clean_cell(caps.get(1).map_or("", |m| m.as_str())))
        .collect()
}

fn row_spans(block: &str) -> Vec<&str> {
    TR_RE.find_iter(block).map(|m| m.as_str()).collect()
}

/// Inner markup of the first `region` match, or the whole table
fn region<'a>(re: &Regex, table: &'a str) -> &'a str {
    re.captures(table)
        .and_then(|caps| caps.get(1))
        .map_or(table, |m| m.as_str())
}

/// Header row: `<thead>` first; a leading colgroup row defers to the next
pub fn extract_header(table: &RawTable) -> Option<HeaderRow> {
    let block = region(&THEAD_RE, table.as_str());
    let rows = row_spans(block);

    let header_tr = match rows.as_slice() {
        [] => return None,
        [first, second, ..] if COLGROUP_RE.is_match(first) => *second,
        [first, ..] => *first,
    };

    Some(extract_cells(header_tr))
}

/// Body rows from `<tbody>` (or the whole table), all-empty rows dropped
pub fn extract_body_rows(table: &RawTable) -> Vec<DataRow> {
    let block = region(&TBODY_RE, table.as_str());

    row_spans(block)
        .into_iter()
        .map(extract_cells)
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .collect()
}
