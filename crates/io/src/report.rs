//! Report emitter: picks the writer by output file extension.

use std::path::Path;

use ledgercheck_recon::ReportRow;

use crate::error::{IoError, Result};

/// Write `rows` to `path` as .xlsx (sheet `sheet_name`) or .csv.
pub fn write_report(path: &Path, sheet_name: &str, rows: &[ReportRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(IoError::Report {
                path: path.to_path_buf(),
                message: format!("directory {} does not exist", parent.display()),
            });
        }
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" => crate::xlsx::write_report(path, sheet_name, rows)?,
        "csv" => crate::csv::write_report(path, rows)?,
        other => {
            return Err(IoError::Report {
                path: path.to_path_buf(),
                message: format!("unsupported report format '.{other}' (expected .xlsx or .csv)"),
            })
        }
    }

    log::info!("report {}: {} row(s)", path.display(), rows.len());
    Ok(())
}
