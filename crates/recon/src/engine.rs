use std::collections::HashSet;

use crate::config::{FieldMapping, ReconConfig};
use crate::model::{
    normalize_filename, ErrorTag, ExtractedRecord, FieldMap, Ledger, ReconMeta, ReconResult,
    ReconSummary, ReportRow, STANDARD_COLUMNS,
};
use crate::similarity::similarity;

/// Reconcile extracted records against the normalized ledger.
///
/// Emits one row per extracted record, in input order, then one
/// "file not found" row per ledger record nobody matched, in ledger order.
pub fn run(config: &ReconConfig, ledger: &Ledger, extracted: &[ExtractedRecord]) -> ReconResult {
    let mut rows = Vec::with_capacity(extracted.len() + ledger.len());
    let mut seen: HashSet<String> = HashSet::new();

    for record in extracted {
        seen.insert(normalize_filename(&record.filename));
        rows.push(reconcile_record(record, ledger, &config.field_mapping));
    }

    for entry in ledger.records() {
        if !seen.contains(&entry.filename) {
            rows.push(ReportRow {
                filename: entry.filename.clone(),
                file_type: String::new(),
                title_match: None,
                error: ErrorTag::FileNotFound,
                excel_remarks: String::new(),
                file_remarks: String::new(),
                extra: FieldMap::new(),
            });
        }
    }

    let mut summary = compute_summary(&rows);
    summary.skipped_ledger_rows = ledger.skipped_rows.len();

    log::info!(
        "reconciled {} extracted record(s) against {} ledger record(s): {} row(s)",
        extracted.len(),
        ledger.len(),
        rows.len()
    );

    ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        rows,
    }
}

/// Compare one extracted record with its ledger entry, if any.
pub fn reconcile_record(
    record: &ExtractedRecord,
    ledger: &Ledger,
    mapping: &FieldMapping,
) -> ReportRow {
    let filename = record.filename.trim().to_string();
    let extra = passthrough(&record.fields);

    let Some(entry) = ledger.get(&filename) else {
        log::debug!("{filename}: no ledger entry");
        return ReportRow {
            filename,
            file_type: record.file_type.clone(),
            title_match: Some(0.0),
            error: ErrorTag::FilenameMissingInLedger,
            excel_remarks: String::new(),
            file_remarks: String::new(),
            extra,
        };
    };

    let title_match = similarity(&filename, &entry.filename);

    let mut file_remarks = Vec::new();
    let mut excel_remarks = Vec::new();
    for (column, field) in mapping.iter() {
        let expected = entry.value(column);
        let actual = record.fields.get(field).map(str::trim).unwrap_or("");

        match (expected.is_empty(), actual.is_empty()) {
            (false, true) => file_remarks.push(format!("{field}: missing")),
            (true, false) => excel_remarks.push(format!("{field}: missing")),
            (false, false) if expected != actual => file_remarks.push(format!("{field}: mismatch")),
            _ => {}
        }
    }

    let error = classify(!excel_remarks.is_empty(), !file_remarks.is_empty());
    log::debug!("{filename}: {:?} (title match {title_match})", error);

    ReportRow {
        filename,
        file_type: record.file_type.clone(),
        title_match: Some(title_match),
        error,
        excel_remarks: excel_remarks.join("; "),
        file_remarks: file_remarks.join("; "),
        extra,
    }
}

fn classify(has_ledger_remarks: bool, has_file_remarks: bool) -> ErrorTag {
    match (has_ledger_remarks, has_file_remarks) {
        (false, false) => ErrorTag::Clean,
        (false, true) => ErrorTag::Mismatch,
        (true, false) => ErrorTag::Missing,
        (true, true) => ErrorTag::MissingAndMismatch,
    }
}

/// Extracted fields minus anything named like a standard report column.
fn passthrough(fields: &FieldMap) -> FieldMap {
    fields
        .iter()
        .filter(|(key, _)| !STANDARD_COLUMNS.contains(key))
        .collect()
}

/// Count rows per outcome.
pub fn compute_summary(rows: &[ReportRow]) -> ReconSummary {
    let mut summary = ReconSummary {
        total_rows: rows.len(),
        ..Default::default()
    };

    for row in rows {
        match row.error {
            ErrorTag::Clean => {
                summary.matched += 1;
                summary.clean += 1;
            }
            ErrorTag::Mismatch => {
                summary.matched += 1;
                summary.mismatch_only += 1;
            }
            ErrorTag::Missing => {
                summary.matched += 1;
                summary.missing_only += 1;
            }
            ErrorTag::MissingAndMismatch => {
                summary.matched += 1;
                summary.missing_and_mismatch += 1;
            }
            ErrorTag::FilenameMissingInLedger => summary.filename_missing_in_ledger += 1,
            ErrorTag::FileNotFound => summary.file_not_found += 1,
        }
    }

    summary
}
