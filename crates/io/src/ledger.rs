//! Ledger loading: spreadsheet or CSV file → raw rows → normalized ledger.

use std::path::Path;

use ledgercheck_recon::config::LedgerConfig;
use ledgercheck_recon::{normalize_ledger, Ledger, LedgerRow};

use crate::error::{IoError, Result};
use crate::Table;

/// Spreadsheet formats calamine can open.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Read raw ledger rows. The first row is the header; later rows become
/// column → cell text maps with missing cells absent. Fails when the header
/// lacks `filename_column`.
pub fn read_ledger_rows(
    path: &Path,
    sheet: Option<&str>,
    filename_column: &str,
) -> Result<Vec<LedgerRow>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let table = if extension == "csv" {
        crate::csv::read_table(path)?
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        if !path.exists() {
            return Err(IoError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }
        crate::xlsx::read_table(path, sheet)?
    } else {
        return Err(IoError::Ledger {
            path: path.to_path_buf(),
            message: format!("unsupported ledger format '.{extension}' (expected .xlsx, .xls, .ods or .csv)"),
        });
    };

    let rows = rows_from_table(path, table, filename_column)?;
    log::info!("ledger {}: {} data row(s)", path.display(), rows.len());
    Ok(rows)
}

/// Read and normalize the ledger described by `config`, with `path`
/// already resolved.
pub fn load_ledger(path: &Path, config: &LedgerConfig) -> Result<Ledger> {
    let rows = read_ledger_rows(path, config.sheet.as_deref(), &config.filename_column)?;
    let ledger = normalize_ledger(&rows, &config.filename_column, config.empty_filename)?;
    log::info!(
        "ledger {}: {} record(s) after merge, {} row(s) skipped",
        path.display(),
        ledger.len(),
        ledger.skipped_rows.len()
    );
    Ok(ledger)
}

fn rows_from_table(path: &Path, table: Table, filename_column: &str) -> Result<Vec<LedgerRow>> {
    let mut lines = table.into_iter();
    let header = header_names(lines.next().unwrap_or_default());

    if !header.iter().flatten().any(|name| name == filename_column) {
        return Err(IoError::MissingColumn {
            path: path.to_path_buf(),
            column: filename_column.to_string(),
        });
    }

    let rows = lines
        .map(|cells| {
            cells
                .into_iter()
                .enumerate()
                .filter_map(|(col, cell)| {
                    let name = header.get(col).cloned().flatten()?;
                    Some((name, cell?))
                })
                .collect::<LedgerRow>()
        })
        .collect();
    Ok(rows)
}

/// Column names from the header row. Unnamed columns are `None` and their
/// cells are ignored; a repeated name gets a `.1`, `.2`, … suffix.
fn header_names(cells: Vec<Option<String>>) -> Vec<Option<String>> {
    let mut seen: Vec<String> = Vec::new();
    cells
        .into_iter()
        .map(|cell| {
            let base = cell.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())?;
            let mut name = base.clone();
            let mut n = 0;
            while seen.contains(&name) {
                n += 1;
                name = format!("{base}.{n}");
            }
            seen.push(name.clone());
            Some(name)
        })
        .collect()
}
