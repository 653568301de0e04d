use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::AliasTable;
use crate::model::FieldMap;

/// Diagnostic emitted when a document has fewer than two tables.
pub const MISSING_TEMPLATE: &str = "Template or test cases not found";

/// Field that carries cross-reference diagnostics in the header view.
pub const ISSUES_FIELD: &str = "Word Template Issues";

/// Case-insensitive substring marking the metadata field that lists case IDs.
const DECLARED_IDS_KEY: &str = "another id";

/// One table of a document: rows of cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocTable {
    pub rows: Vec<Vec<String>>,
}

impl DocTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// `(key, value)` from the first two cells of each row with at least two
    /// cells and a non-empty key.
    fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows
            .iter()
            .filter(|row| row.len() >= 2)
            .map(|row| (row[0].trim(), row[1].trim()))
            .filter(|(key, _)| !key.is_empty())
    }
}

/// Metadata, cases, and cross-reference diagnostics of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaseExtraction {
    /// Table 0; a repeated key keeps the last value.
    pub metadata: FieldMap,
    /// One entry per table after the first; repeated keys join with `\n`.
    pub cases: Vec<FieldMap>,
    pub issues: Vec<String>,
}

/// Split a document's tables into metadata and cases, and check the case IDs
/// declared in metadata against the ones found.
pub fn extract_cases(tables: &[DocTable]) -> CaseExtraction {
    if tables.len() < 2 {
        return CaseExtraction {
            metadata: FieldMap::new(),
            cases: Vec::new(),
            issues: vec![MISSING_TEMPLATE.to_string()],
        };
    }

    let mut metadata = FieldMap::new();
    for (key, value) in tables[0].pairs() {
        metadata.insert(key, value);
    }

    let mut declared: BTreeSet<String> = BTreeSet::new();
    for (key, value) in metadata.iter() {
        if key.to_lowercase().contains(DECLARED_IDS_KEY) {
            declared.extend(
                value
                    .replace(';', ",")
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
            );
        }
    }

    let mut cases = Vec::with_capacity(tables.len() - 1);
    let mut found: BTreeSet<String> = BTreeSet::new();
    for table in &tables[1..] {
        let mut case = FieldMap::new();
        for (key, value) in table.pairs() {
            case.append(key, value);
        }
        if let Some(id) = case_id(&case) {
            found.insert(id.to_string());
        }
        cases.push(case);
    }

    let mut issues = Vec::new();
    let undeclared_missing: Vec<&str> = declared.difference(&found).map(String::as_str).collect();
    if !undeclared_missing.is_empty() {
        issues.push(format!(
            "IDs in template but not in cases: {}",
            undeclared_missing.join(", ")
        ));
    }
    let unlisted: Vec<&str> = found.difference(&declared).map(String::as_str).collect();
    if !unlisted.is_empty() {
        issues.push(format!("Case IDs not listed in template: {}", unlisted.join(", ")));
    }

    CaseExtraction {
        metadata,
        cases,
        issues,
    }
}

fn case_id(case: &FieldMap) -> Option<&str> {
    case.get("Case ID")
        .filter(|v| !v.is_empty())
        .or_else(|| case.get("case id"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Flatten an extraction into one header mapping.
///
/// Metadata comes first. Case fields are appended in case order: a key seen
/// in metadata or an earlier case gets the new value after a newline. Keys go
/// through `aliases`. Diagnostics become one `Word Template Issues` field.
pub fn header_view(extraction: &CaseExtraction, aliases: &AliasTable) -> FieldMap {
    let mut header = FieldMap::new();
    for (key, value) in extraction.metadata.iter() {
        header.insert(aliases.canonical(key), value);
    }

    let mut from_cases = FieldMap::new();
    for case in &extraction.cases {
        for (key, value) in case.iter() {
            from_cases.append(aliases.canonical(key), value);
        }
    }
    for (key, value) in from_cases.iter() {
        header.append(key, value);
    }

    if !extraction.issues.is_empty() {
        header.insert(ISSUES_FIELD, extraction.issues.join("; "));
    }
    header
}
