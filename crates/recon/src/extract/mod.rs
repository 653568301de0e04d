//! Header parsers, one per artifact format.
//!
//! Each parser works on content already in memory (text, or the table model
//! of a document) and never fails: a missing or malformed header yields an
//! empty or partial mapping. File access lives in `ledgercheck-io`.

pub mod comment_header;
pub mod document_table;
pub mod literal_header;

pub use document_table::{CaseExtraction, DocTable};
