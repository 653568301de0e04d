use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Field map
// ---------------------------------------------------------------------------

/// Insertion-ordered field name → value mapping.
///
/// Extracted headers are small (a handful of keys), so lookups are linear.
/// Order matters: it decides the passthrough column order of the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert or overwrite. An overwritten key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append `value` to an existing entry after a newline, or insert it.
    pub fn append(&mut self, key: impl Into<String>, value: &str) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => self.entries.push((key, value.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One raw ledger row: column name → cell text. Missing cells are absent.
pub type LedgerRow = BTreeMap<String, String>;

/// Consolidated ledger entry for one normalized filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRecord {
    /// Trimmed, lower-cased filename. Also stored under the filename column.
    pub filename: String,
    pub fields: BTreeMap<String, String>,
}

impl LedgerRecord {
    /// Trimmed value of `column`, or "" when the column is absent.
    pub fn value(&self, column: &str) -> &str {
        self.fields.get(column).map(|v| v.trim()).unwrap_or("")
    }
}

/// The normalized ledger: records in first-appearance order plus a
/// filename index built once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<LedgerRecord>,
    index: HashMap<String, usize>,
    /// 1-based data-row numbers dropped under the `skip` policy.
    pub skipped_rows: Vec<usize>,
}

impl Ledger {
    pub fn from_records(records: Vec<LedgerRecord>, skipped_rows: Vec<usize>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.filename.clone(), i))
            .collect();
        Self {
            records,
            index,
            skipped_rows,
        }
    }

    /// Look up by filename; the key is trimmed and lower-cased first.
    pub fn get(&self, filename: &str) -> Option<&LedgerRecord> {
        self.index
            .get(&normalize_filename(filename))
            .map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Matching key for filenames: trimmed and lower-cased.
pub fn normalize_filename(name: &str) -> String {
    name.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// The three artifact header formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    /// Leading block of `#` comments (Python-style sources).
    CommentHeader,
    /// A string-literal header constant (Java-style sources).
    LiteralHeader,
    /// Metadata and case tables inside a `.docx` document.
    DocumentTable,
}

impl ArtifactFormat {
    /// Report label used when a source does not set its own `file_type`.
    pub fn default_file_type(&self) -> &'static str {
        match self {
            Self::CommentHeader => "Python",
            Self::LiteralHeader => "Java",
            Self::DocumentTable => "Word",
        }
    }
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommentHeader => write!(f, "comment_header"),
            Self::LiteralHeader => write!(f, "literal_header"),
            Self::DocumentTable => write!(f, "document_table"),
        }
    }
}

impl std::str::FromStr for ArtifactFormat {
    type Err = crate::error::ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment_header" => Ok(Self::CommentHeader),
            "literal_header" => Ok(Self::LiteralHeader),
            "document_table" => Ok(Self::DocumentTable),
            other => Err(crate::error::ReconError::UnknownFormat(format!("format '{other}'"))),
        }
    }
}

/// Fields pulled out of one artifact file.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedRecord {
    /// File name as found on disk (not normalized).
    pub filename: String,
    pub format: ArtifactFormat,
    /// Report label, e.g. "Python".
    pub file_type: String,
    pub fields: FieldMap,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Classified outcome of one report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTag {
    /// Matched and every mapped field agrees.
    Clean,
    /// Only file-side remarks.
    Mismatch,
    /// Only ledger-side remarks.
    Missing,
    /// Remarks on both sides.
    MissingAndMismatch,
    /// Extracted file has no ledger entry.
    FilenameMissingInLedger,
    /// Ledger entry has no extracted file.
    FileNotFound,
}

impl ErrorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "",
            Self::Mismatch => "mismatch error",
            Self::Missing => "missing errors",
            Self::MissingAndMismatch => "missing\nmismatch",
            Self::FilenameMissingInLedger => "filename missing in excel",
            Self::FileNotFound => "file not found",
        }
    }
}

impl std::fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Standard report columns, in output order. Passthrough fields follow.
pub const STANDARD_COLUMNS: [&str; 6] = [
    "Filename",
    "FileType",
    "Title Match %",
    "Error",
    "Excel Remarks",
    "File Remarks",
];

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub filename: String,
    /// Empty for residual "file not found" rows.
    pub file_type: String,
    /// `None` for residual rows (the cell stays blank).
    pub title_match: Option<f64>,
    pub error: ErrorTag,
    pub excel_remarks: String,
    pub file_remarks: String,
    /// Extracted fields not already used as a standard column.
    pub extra: FieldMap,
}

impl ReportRow {
    /// Cell text for a column name, standard or passthrough.
    pub fn cell(&self, column: &str) -> Option<String> {
        match column {
            "Filename" => Some(self.filename.clone()),
            "FileType" => Some(self.file_type.clone()).filter(|s| !s.is_empty()),
            "Title Match %" => self.title_match.map(format_score),
            "Error" => Some(self.error.as_str().to_string()).filter(|s| !s.is_empty()),
            "Excel Remarks" => Some(self.excel_remarks.clone()).filter(|s| !s.is_empty()),
            "File Remarks" => Some(self.file_remarks.clone()).filter(|s| !s.is_empty()),
            other => self.extra.get(other).map(str::to_string),
        }
    }
}

/// Render a similarity score the way the report shows it (`87.5`, `100`, `0`).
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{score}")
    }
}

/// Column order of a report: standard columns, then the union of passthrough
/// keys in first-appearance order.
pub fn report_columns(rows: &[ReportRow]) -> Vec<String> {
    let mut columns: Vec<String> = STANDARD_COLUMNS.iter().map(|c| c.to_string()).collect();
    for row in rows {
        for key in row.extra.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub total_rows: usize,
    pub matched: usize,
    pub clean: usize,
    pub mismatch_only: usize,
    pub missing_only: usize,
    pub missing_and_mismatch: usize,
    pub filename_missing_in_ledger: usize,
    pub file_not_found: usize,
    pub skipped_ledger_rows: usize,
}

impl ReconSummary {
    /// True when any row carries an error tag.
    pub fn has_discrepancies(&self) -> bool {
        self.total_rows > self.clean
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub rows: Vec<ReportRow>,
}
