// 🔄 Stats Pipeline
// markup → located table → header + rows → normalized header → stats CSV

use crate::error::IngestError;
use crate::extract::{extract_body_rows, extract_header};
use crate::fetch::PageSource;
use crate::headers::{normalize, HeaderMode};
use crate::locator::{locate_table_with_strategy, MatchStrategy};
use crate::materialize::{read_existing_headers, write_rows};
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsInput {
    Url(String),
    /// Saved page, for sites that need a browser to render
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct PopulateOptions {
    pub input: StatsInput,
    pub phrase: String,
    pub out: PathBuf,
    pub mode: HeaderMode,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateSummary {
    pub rows_written: usize,
    pub columns: usize,
    pub strategy: MatchStrategy,
    /// Header came from the existing output file
    pub reused_header: bool,
}

fn load_markup(source: &dyn PageSource, input: &StatsInput) -> Result<String, IngestError> {
    match input {
        StatsInput::Url(url) => source.fetch(url),
        StatsInput::File(path) => fs::read_to_string(path).map_err(|e| IngestError::Input {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Fetch or read the stats page and overwrite the stats CSV with its table.
///
/// Structural failures surface as [`IngestError`] inside the returned error
/// so the CLI can map them to exit codes.
pub fn populate_stats(source: &dyn PageSource, opts: &PopulateOptions) -> Result<PopulateSummary> {
    let markup = load_markup(source, &opts.input)?;

    let (table, strategy) = locate_table_with_strategy(&markup, &opts.phrase).ok_or_else(|| {
        IngestError::TableNotFound {
            phrase: opts.phrase.clone(),
        }
    })?;
    info!(?strategy, "located stats table");

    // A header already in the destination wins over the extracted one
    let (headers, reused_header) = match read_existing_headers(&opts.out)? {
        Some(existing) => (existing, true),
        None => {
            let extracted = extract_header(&table).ok_or(IngestError::HeaderNotFound)?;
            (normalize(extracted, opts.mode), false)
        }
    };

    let mut rows = extract_body_rows(&table);
    if rows.is_empty() {
        return Err(IngestError::NoDataRows.into());
    }
    if let Some(limit) = opts.limit {
        rows.truncate(limit);
    }

    let rows_written = write_rows(&opts.out, &headers, &rows)?;

    Ok(PopulateSummary {
        rows_written,
        columns: headers.len(),
        strategy,
        reused_header,
    })
}
