use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty column name, bad extension, etc.).
    ConfigValidation(String),
    /// A ledger row had no filename and the policy is `reject`.
    /// `row` is 1-based and counts data rows only (header excluded).
    EmptyFilename { row: usize },
    /// No extractor is registered for the given format or extension.
    UnknownFormat(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::EmptyFilename { row } => {
                write!(f, "ledger row {row}: filename is empty (empty_filename = \"reject\")")
            }
            Self::UnknownFormat(what) => write!(f, "no extractor for {what}"),
        }
    }
}

impl std::error::Error for ReconError {}
