use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::EmptyFilenamePolicy;
use crate::error::ReconError;
use crate::model::{normalize_filename, Ledger, LedgerRecord, LedgerRow};

/// Collapse ledger rows that share a filename into one record per filename.
///
/// Rows group by trimmed, lower-cased `filename_column`. Within a group every
/// column collects its trimmed non-empty values; the set is sorted and joined
/// with `\n`, so the merge does not depend on row order and re-merging a
/// merged ledger changes nothing. Records keep the order in which their
/// filename first appears. Rows with no values at all are ignored.
pub fn normalize_ledger(
    rows: &[LedgerRow],
    filename_column: &str,
    policy: EmptyFilenamePolicy,
) -> Result<Ledger, ReconError> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, BTreeMap<String, BTreeSet<String>>> = HashMap::new();
    let mut skipped = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let row_number = i + 1;
        if row.values().all(|v| v.trim().is_empty()) {
            continue;
        }
        let key = normalize_filename(row.get(filename_column).map(String::as_str).unwrap_or(""));

        if key.is_empty() {
            match policy {
                EmptyFilenamePolicy::Skip => {
                    log::warn!("ledger row {row_number}: no {filename_column}, skipped");
                    skipped.push(row_number);
                    continue;
                }
                EmptyFilenamePolicy::Reject => {
                    return Err(ReconError::EmptyFilename { row: row_number });
                }
                EmptyFilenamePolicy::Group => {
                    log::warn!("ledger row {row_number}: no {filename_column}, grouped under \"\"");
                }
            }
        }

        let columns = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            BTreeMap::new()
        });
        for (column, value) in row {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            columns
                .entry(column.clone())
                .or_default()
                .insert(value.to_string());
        }
    }

    let records = order
        .into_iter()
        .map(|filename| {
            let columns = groups.remove(&filename).unwrap_or_default();
            if columns.values().any(|v| v.len() > 1) {
                log::debug!("ledger: merged duplicate rows for '{filename}'");
            }
            let mut fields: BTreeMap<String, String> = columns
                .into_iter()
                .map(|(column, values)| {
                    let joined = values.into_iter().collect::<Vec<_>>().join("\n");
                    (column, joined)
                })
                .collect();
            fields.insert(filename_column.to_string(), filename.clone());
            LedgerRecord { filename, fields }
        })
        .collect();

    Ok(Ledger::from_records(records, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> LedgerRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn as_rows(ledger: &Ledger) -> Vec<LedgerRow> {
        ledger.records().iter().map(|r| r.fields.clone()).collect()
    }

    #[test]
    fn merges_duplicate_filenames() {
        let rows = vec![
            row(&[("Filename", "Report.py"), ("Excel_ID", "7"), ("Excel_Author", "ann")]),
            row(&[("Filename", " report.py "), ("Excel_ID", "7"), ("Excel_Author", "bob")]),
            row(&[("Filename", "other.py"), ("Excel_ID", "9")]),
        ];
        let ledger = normalize_ledger(&rows, "Filename", EmptyFilenamePolicy::Skip).unwrap();
        assert_eq!(ledger.len(), 2);

        let report = ledger.get("report.py").unwrap();
        assert_eq!(report.filename, "report.py");
        assert_eq!(report.value("Filename"), "report.py");
        assert_eq!(report.value("Excel_ID"), "7");
        assert_eq!(report.value("Excel_Author"), "ann\nbob");

        // First-appearance order
        assert_eq!(ledger.records()[0].filename, "report.py");
        assert_eq!(ledger.records()[1].filename, "other.py");
    }

    #[test]
    fn merge_is_commutative() {
        let a = row(&[("Filename", "x.py"), ("Excel_Author", "zed"), ("Excel_ID", "1")]);
        let b = row(&[("Filename", "X.py"), ("Excel_Author", "amy"), ("Excel_Objective", "o")]);
        let c = row(&[("Filename", "x.py"), ("Excel_Author", "mia")]);

        let forward = normalize_ledger(&[a.clone(), b.clone(), c.clone()], "Filename", EmptyFilenamePolicy::Skip).unwrap();
        let reverse = normalize_ledger(&[c, b, a], "Filename", EmptyFilenamePolicy::Skip).unwrap();
        assert_eq!(forward.records(), reverse.records());
        assert_eq!(forward.get("x.py").unwrap().value("Excel_Author"), "amy\nmia\nzed");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let rows = vec![
            row(&[("Filename", "A.py"), ("Excel_ID", "2"), ("Notes", "b")]),
            row(&[("Filename", "a.py"), ("Excel_ID", "1"), ("Notes", "a")]),
            row(&[("Filename", "b.java"), ("Excel_ID", "3")]),
        ];
        let once = normalize_ledger(&rows, "Filename", EmptyFilenamePolicy::Skip).unwrap();
        let twice = normalize_ledger(&as_rows(&once), "Filename", EmptyFilenamePolicy::Skip).unwrap();
        assert_eq!(once.records(), twice.records());
    }

    #[test]
    fn blank_values_are_not_collected() {
        let rows = vec![
            row(&[("Filename", "a.py"), ("Excel_ID", "  ")]),
            row(&[("Filename", "a.py"), ("Excel_ID", "4")]),
        ];
        let ledger = normalize_ledger(&rows, "Filename", EmptyFilenamePolicy::Skip).unwrap();
        assert_eq!(ledger.get("a.py").unwrap().value("Excel_ID"), "4");
    }

    #[test]
    fn empty_filename_skip() {
        let rows = vec![
            row(&[("Filename", "a.py")]),
            row(&[("Excel_ID", "1")]),
            row(&[("Filename", "   "), ("Excel_ID", "2")]),
        ];
        let ledger = normalize_ledger(&rows, "Filename", EmptyFilenamePolicy::Skip).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.skipped_rows, vec![2, 3]);
    }

    #[test]
    fn empty_filename_group() {
        let rows = vec![
            row(&[("Excel_ID", "1")]),
            row(&[("Filename", ""), ("Excel_ID", "2")]),
        ];
        let ledger = normalize_ledger(&rows, "Filename", EmptyFilenamePolicy::Group).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.records()[0].filename, "");
        assert_eq!(ledger.records()[0].value("Excel_ID"), "1\n2");
    }

    #[test]
    fn empty_filename_reject() {
        let rows = vec![row(&[("Filename", "a.py")]), row(&[("Excel_ID", "1")])];
        let err = normalize_ledger(&rows, "Filename", EmptyFilenamePolicy::Reject).unwrap_err();
        assert!(matches!(err, ReconError::EmptyFilename { row: 2 }));
    }

    #[test]
    fn blank_rows_are_ignored_but_counted() {
        let rows = vec![
            row(&[("Filename", "a.py")]),
            LedgerRow::new(),
            row(&[("Filename", " "), ("Excel_ID", "")]),
            row(&[("Excel_ID", "3")]),
        ];
        let ledger = normalize_ledger(&rows, "Filename", EmptyFilenamePolicy::Reject);
        assert!(matches!(ledger, Err(ReconError::EmptyFilename { row: 4 })));
    }
}
