//! Tabular input parsing for catalog uploads.
//!
//! CSV goes through the `csv` crate; `.xlsx`/`.xls` workbooks through
//! `calamine`, reading the first worksheet. Both share the header check and
//! the row assembly below.

use std::io::Cursor;
use std::path::Path;

use calamine::{Reader, open_workbook_auto_from_rs};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{CatalogRow, Column};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Fail on the first required column the header row does not name.
fn check_headers(headers: &[String]) -> CatalogResult<()> {
    match Column::REQUIRED
        .iter()
        .find(|column| !headers.iter().any(|h| column.matches(h)))
    {
        Some(column) => Err(CatalogError::MissingHeaderColumn {
            column: column.name().to_string(),
        }),
        None => Ok(()),
    }
}

/// Pair cells with headers. `None` when every cell is blank.
fn assemble_row<S: AsRef<str>>(headers: &[String], cells: &[S]) -> Option<CatalogRow> {
    if cells.iter().all(|cell| cell.as_ref().trim().is_empty()) {
        return None;
    }
    Some(
        headers
            .iter()
            .zip(cells)
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.as_str(), cell.as_ref().trim()))
            .collect(),
    )
}

/// Parse CSV bytes into rows keyed by header name.
///
/// The header must name every required column (directly or by alias).
/// Lines whose cells are all blank are skipped; short lines read as blank cells.
pub fn parse_csv(bytes: &[u8]) -> CatalogResult<Vec<CatalogRow>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    check_headers(&headers)?;

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| CatalogError::Parse(format!("data row {}: {}", line + 1, e)))?;
        let cells: Vec<&str> = record.iter().collect();
        rows.extend(assemble_row(&headers, &cells));
    }

    Ok(rows)
}

/// Parse the first worksheet of an `.xlsx` or `.xls` workbook.
///
/// The first used row is the header. Numbers and dates are read as their
/// display text, so `2024` stays `2024` rather than `2024.0`.
pub fn parse_workbook(bytes: &[u8]) -> CatalogResult<Vec<CatalogRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| CatalogError::Parse(format!("unreadable workbook: {}", e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CatalogError::Parse("workbook has no worksheets".to_string()))?
        .map_err(|e| CatalogError::Parse(format!("first worksheet: {}", e)))?;

    let mut sheet_rows = range
        .rows()
        .map(|cells| cells.iter().map(ToString::to_string).collect::<Vec<_>>());

    let headers: Vec<String> = sheet_rows
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    check_headers(&headers)?;

    Ok(sheet_rows
        .filter_map(|cells| assemble_row(&headers, &cells))
        .collect())
}

/// Parse an uploaded file, choosing the reader from its extension.
pub fn parse_upload(file_name: &str, bytes: &[u8]) -> CatalogResult<Vec<CatalogRow>> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => parse_csv(bytes),
        Some("xlsx") | Some("xls") => parse_workbook(bytes),
        _ => Err(CatalogError::UnsupportedFormat(format!(
            "{}: expected a .csv, .xlsx or .xls file",
            file_name
        ))),
    }
}
