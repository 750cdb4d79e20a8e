// 📝 CSV Row Materializer
// Header + rows → delimited file. Every output row has exactly the header's
// width: long rows are truncated, short rows padded with empty cells.

use crate::extract::{DataRow, HeaderRow};
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

/// Truncate or right-pad a row to `width` cells
pub fn fit_row(row: &[String], width: usize) -> DataRow {
    let mut fitted: DataRow = row.iter().take(width).cloned().collect();
    fitted.resize(width, String::new());
    fitted
}

/// Overwrite `path` with the header line followed by every row
pub fn write_rows(path: &Path, headers: &[String], rows: &[DataRow]) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    wtr.write_record(headers)
        .context("Failed to write CSV header")?;

    for row in rows {
        wtr.write_record(fit_row(row, headers.len()))
            .context("Failed to write CSV row")?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

/// First line of an existing CSV file, None when missing or empty
pub fn read_existing_headers(path: &Path) -> Result<Option<HeaderRow>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    match rdr.records().next() {
        Some(record) => {
            let record = record.context("Failed to read CSV header")?;
            let headers: HeaderRow = record.iter().map(|s| s.to_string()).collect();
            if headers.iter().all(|h| h.is_empty()) {
                Ok(None)
            } else {
                Ok(Some(headers))
            }
        }
        None => Ok(None),
    }
}

/// Every row of a CSV file, header included, without width checks
pub fn read_all_rows(path: &Path) -> Result<Vec<DataRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.context("Failed to read CSV row")?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(cells: &[&str]) -> DataRow {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_row_pads_and_truncates() {
        assert_eq!(fit_row(&row(&["a"]), 3), row(&["a", "", ""]));
        assert_eq!(fit_row(&row(&["a", "b", "c", "d"]), 2), row(&["a", "b"]));
        assert_eq!(fit_row(&row(&[]), 0), row(&[]));
    }

    #[test]
    fn test_every_written_row_matches_header_width() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let headers = row(&["#", "Player", "GP", "BLK"]);
        let rows = vec![
            row(&["7"]),
            row(&["9", "Smith, Jo", "20", "3", "extra", "more"]),
            row(&[]),
        ];

        let written = write_rows(&path, &headers, &rows).unwrap();
        let back = read_all_rows(&path).unwrap();

        assert_eq!(written, 3);
        assert_eq!(back.len(), 4);
        for r in &back {
            assert_eq!(r.len(), headers.len());
        }
        assert_eq!(back[1], row(&["7", "", "", ""]));
        assert_eq!(back[2], row(&["9", "Smith, Jo", "20", "3"]));
    }

    #[test]
    fn test_existing_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");

        assert_eq!(read_existing_headers(&path).unwrap(), None);

        std::fs::write(&path, "").unwrap();
        assert_eq!(read_existing_headers(&path).unwrap(), None);

        std::fs::write(&path, "#,Player,GP\n1,A,2\n").unwrap();
        assert_eq!(
            read_existing_headers(&path).unwrap(),
            Some(row(&["#", "Player", "GP"]))
        );
    }
}
