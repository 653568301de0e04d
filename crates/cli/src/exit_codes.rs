//! CLI Exit Code Registry
//!
//! Single source of truth for `lcheck` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (report written; discrepancies are data)     |
//! | 1    | General error                                        |
//! | 2    | Usage error (bad args, missing config file)          |
//! | 3    | Invalid configuration                                |
//! | 4    | Ledger unreadable or malformed                       |
//! | 5    | Artifact unreadable                                  |
//! | 6    | Report could not be written                          |
//! | 7    | Discrepancies found with `--strict`                  |

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable config path.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (3-7)
// =============================================================================

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Ledger file missing, unreadable, malformed, or rejected by the
/// empty-filename policy.
pub const EXIT_LEDGER: u8 = 4;

/// An artifact file could not be read (without `--keep-going`).
pub const EXIT_ARTIFACT: u8 = 5;

/// The report file could not be written.
pub const EXIT_REPORT: u8 = 6;

/// The report was written but carries discrepancies, and `--strict` was given.
pub const EXIT_DISCREPANCIES: u8 = 7;
