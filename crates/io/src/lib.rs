//! `ledgercheck-io`: everything that touches the filesystem (ledger
//! spreadsheets, artifact files, report output).

pub mod csv;
pub mod docx;
pub mod error;
pub mod extractor;
pub mod ledger;
pub mod report;
pub mod scan;
pub mod xlsx;

pub use error::{IoError, Result};
pub use extractor::{extractor_for, format_for_path, Extractor};
pub use ledger::{load_ledger, read_ledger_rows};
pub use report::write_report;
pub use scan::{extract_sources, list_source_files, EXTRACTION_ERROR_FIELD};

/// A worksheet read as rows of cell text; `None` marks an empty cell.
pub type Table = Vec<Vec<Option<String>>>;
