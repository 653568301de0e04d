//! `ledgercheck-recon`: header extraction and ledger reconciliation engine.
//!
//! Pure engine crate: receives ledger rows and artifact contents already in
//! memory, returns classified report rows. No CLI or IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod similarity;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{ExtractedRecord, FieldMap, Ledger, LedgerRow, ReconResult, ReportRow};
pub use normalize::normalize_ledger;
pub use similarity::similarity;
