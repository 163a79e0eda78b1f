use crate::error::AppError;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Write rows as CSV. `headers` is emitted on its own when `rows` is empty so
/// the file still documents its columns.
pub fn write_csv<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| AppError::output(path, e))?;
    if rows.is_empty() {
        wtr.write_record(headers).map_err(|e| AppError::output(path, e))?;
    }
    for r in rows {
        wtr.serialize(r).map_err(|e| AppError::output(path, e))?;
    }
    wtr.flush().map_err(|e| AppError::output(path, e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let s = serde_json::to_string_pretty(value).map_err(|e| AppError::output(path, e))?;
    std::fs::write(path, s).map_err(|e| AppError::output(path, e))?;
    Ok(())
}

/// Markdown-style table of all `rows`.
pub fn render_table<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)\n".to_string();
    }
    let table_str = Table::new(rows.to_vec()).with(Style::markdown()).to_string();
    format!("{}\n", table_str)
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice = &rows[..rows.len().min(max_rows)];
    println!("{}", render_table(slice));
}
