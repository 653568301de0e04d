// Excel ledger import and report export

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use ledgercheck_recon::model::{report_columns, STANDARD_COLUMNS};
use ledgercheck_recon::ReportRow;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};

use crate::error::{IoError, Result};
use crate::Table;

/// Column width (characters) for passthrough columns.
const PASSTHROUGH_WIDTH: f64 = 30.0;

/// Read one worksheet (xlsx, xlsm, xls, xlsb, ods) into rows of cells.
///
/// `sheet` selects a worksheet by name; the first sheet is used when unset.
/// Cells are rendered to text with [`render_cell`].
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let ledger_err = |message: String| IoError::Ledger {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ledger_err(format!("failed to open workbook: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| {
                ledger_err(format!(
                    "no sheet named '{name}' (available: {})",
                    sheet_names.join(", ")
                ))
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ledger_err("workbook contains no sheets".into()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ledger_err(format!("failed to read sheet '{sheet_name}': {e}")))?;

    // Data may not begin at A1; pad so column positions match the sheet
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut table: Table = Vec::with_capacity(range.height() + start_row as usize);
    for _ in 0..start_row {
        table.push(Vec::new());
    }
    for row in range.rows() {
        let mut cells: Vec<Option<String>> = vec![None; start_col as usize];
        cells.extend(row.iter().map(render_cell));
        table.push(cells);
    }

    log::debug!(
        "{}: sheet '{}' {} row(s)",
        path.display(),
        sheet_name,
        table.len()
    );
    Ok(table)
}

/// Render a cell the way a reader of the sheet sees it.
///
/// Integral floats drop the fraction (`7`, not `7.0`), booleans print as
/// `TRUE`/`FALSE`, date serials as `YYYY-MM-DD` with ` HH:MM:SS` when a time
/// part exists. Empty cells and empty strings are missing.
pub fn render_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(n) => Some(format_float(*n)),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(format!("#{e:?}")),
        Data::DateTime(dt) => Some(format_serial(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Convert an Excel 1900-system date serial to text.
fn format_serial(serial: f64) -> String {
    // Serials below 60 predate Excel's phantom 1900-02-29
    let epoch = if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    let Some(epoch) = epoch.and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return format_float(serial);
    };

    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    let Some(datetime) = epoch
        .checked_add_signed(Duration::days(days as i64))
        .and_then(|d| d.checked_add_signed(Duration::seconds(seconds)))
    else {
        return format_float(serial);
    };

    if seconds == 0 {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Write report rows to a single-sheet workbook.
///
/// Header row is bold, frozen, and carries an autofilter. Multi-line cells
/// wrap. `Title Match %` is written as a number.
pub fn write_report(path: &Path, sheet_name: &str, rows: &[ReportRow]) -> Result<()> {
    let report_err = |e: XlsxError| IoError::Report {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let columns = report_columns(rows);
    let header_format = Format::new().set_bold();
    let wrap_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);
    let top_format = Format::new().set_align(FormatAlign::Top);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(report_err)?;

    for (col, name) in columns.iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, name, &header_format)
            .map_err(report_err)?;
        let width = match STANDARD_COLUMNS.iter().position(|c| c == name) {
            Some(0) => 28.0,
            Some(1) | Some(2) => 14.0,
            Some(_) => 24.0,
            None => PASSTHROUGH_WIDTH,
        };
        worksheet.set_column_width(col, width).map_err(report_err)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, name) in columns.iter().enumerate() {
            let col = col as u16;
            if name == "Title Match %" {
                if let Some(score) = row.title_match {
                    worksheet
                        .write_number_with_format(r, col, score, &top_format)
                        .map_err(report_err)?;
                }
                continue;
            }
            let Some(text) = row.cell(name) else { continue };
            let format = if text.contains('\n') { &wrap_format } else { &top_format };
            worksheet
                .write_string_with_format(r, col, &text, format)
                .map_err(report_err)?;
        }
    }

    worksheet.set_freeze_panes(1, 0).map_err(report_err)?;
    let last_col = columns.len().saturating_sub(1) as u16;
    worksheet
        .autofilter(0, 0, rows.len() as u32, last_col)
        .map_err(report_err)?;

    workbook.save(path).map_err(report_err)?;
    Ok(())
}
