//! Error type for file-backed operations.

use std::path::PathBuf;

use ledgercheck_recon::ReconError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    /// A file or directory could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be created or written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger exists but is not a usable table.
    #[error("ledger {}: {message}", path.display())]
    Ledger { path: PathBuf, message: String },

    /// The ledger header row lacks a required column.
    #[error("ledger {}: missing column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// A .docx artifact is not a readable document.
    #[error("document {}: {message}", path.display())]
    Document { path: PathBuf, message: String },

    /// The report could not be produced.
    #[error("report {}: {message}", path.display())]
    Report { path: PathBuf, message: String },

    #[error(transparent)]
    Recon(#[from] ReconError),
}

impl IoError {
    /// Path of the file involved, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Read { path, .. }
            | Self::Write { path, .. }
            | Self::Ledger { path, .. }
            | Self::MissingColumn { path, .. }
            | Self::Document { path, .. }
            | Self::Report { path, .. } => Some(path),
            Self::Recon(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IoError>;
