use crate::error::AppError;
use crate::types::{RawRow, REQUIRED_COLUMNS};
use csv::{ReaderBuilder, StringRecord};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub malformed_rows: usize,
    pub latin1_fallback: bool,
}

/// Read a production CSV into raw rows.
///
/// File-level failures (missing, unreadable, empty, wrong columns) are fatal.
/// Individual records with CSV syntax problems or a wrong field count are
/// skipped and counted in the report.
pub fn load_raw(path: &Path) -> Result<(Vec<RawRow>, LoadReport), AppError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => AppError::PermissionDenied(path.to_path_buf()),
        _ => AppError::Unreadable { path: path.to_path_buf(), source: e },
    })?;

    let (text, latin1_fallback) = decode_text(bytes);
    if text.trim().is_empty() {
        return Err(AppError::EmptyFile(path.to_path_buf()));
    }
    if latin1_fallback {
        debug!(path = %path.display(), "input is not UTF-8, decoded as Latin-1");
    }

    let (rows, mut report) = parse_rows(&text)?;
    report.latin1_fallback = latin1_fallback;
    info!(
        path = %path.display(),
        rows = report.rows_read,
        malformed = report.malformed_rows,
        "loaded production data"
    );
    Ok((rows, report))
}

/// Parse CSV text with a header line into raw rows.
pub fn parse_rows(text: &str) -> Result<(Vec<RawRow>, LoadReport), AppError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|_| AppError::MissingColumns(REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()))?
        .clone();
    let headers = normalize_headers(&headers);
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&c| !headers.iter().any(|h| h == c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    let mut malformed_rows = 0usize;
    for result in rdr.records() {
        let record = match result {
            Ok(r) if r.len() == headers.len() => r,
            Ok(r) => {
                debug!(line = ?r.position().map(|p| p.line()), "skipping row with wrong field count");
                malformed_rows += 1;
                continue;
            }
            Err(e) => {
                debug!(error = %e, "skipping unparseable row");
                malformed_rows += 1;
                continue;
            }
        };
        match record.deserialize::<RawRow>(Some(&headers)) {
            Ok(row) => rows.push(row),
            Err(_) => malformed_rows += 1,
        }
    }

    let report = LoadReport { rows_read: rows.len(), malformed_rows, latin1_fallback: false };
    Ok((rows, report))
}

fn decode_text(bytes: Vec<u8>) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(s) => (s, false),
        // Latin-1 maps every byte straight to the code point of the same value.
        Err(e) => (e.into_bytes().iter().map(|&b| b as char).collect(), true),
    }
}

fn normalize_headers(headers: &StringRecord) -> StringRecord {
    // Spreadsheet exports often prefix the first header with a BOM.
    headers
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect()
}
