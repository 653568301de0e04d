// CSV ledger import and report export

use std::io::Read;
use std::path::Path;

use ledgercheck_recon::model::report_columns;
use ledgercheck_recon::ReportRow;

use crate::error::{IoError, Result};
use crate::Table;

/// Read a ledger CSV into rows of cells. Empty fields are missing cells.
pub fn read_table(path: &Path) -> Result<Table> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    parse_table(&content, delimiter).map_err(|message| IoError::Ledger {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_table(content: &str, delimiter: u8) -> std::result::Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut table = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        table.push(
            record
                .iter()
                .map(|field| Some(field.to_string()).filter(|f| !f.is_empty()))
                .collect(),
        );
    }
    Ok(table)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (comma, semicolon, tab, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b',', b';', b'\t', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // A single-column ledger never splits; the default handles it
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read a text file as UTF-8, falling back to Windows-1252 (common for
/// Excel-exported CSVs and older source files). A leading BOM is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String> {
    let read_err = |source| IoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Write report rows as CSV: standard columns first, then passthrough fields.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let report_err = |e: csv::Error| IoError::Report {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let columns = report_columns(rows);
    let mut writer = csv::Writer::from_path(path).map_err(report_err)?;
    writer.write_record(&columns).map_err(report_err)?;
    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|c| row.cell(c).unwrap_or_default())
            .collect();
        writer.write_record(&record).map_err(report_err)?;
    }
    writer.flush().map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
