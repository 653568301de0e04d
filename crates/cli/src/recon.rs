//! `lcheck run` and `lcheck validate`: config loading and the full
//! extract → reconcile → report pipeline.

use std::path::{Path, PathBuf};

use ledgercheck_io::IoError;
use ledgercheck_recon::{ReconConfig, ReconError};

use crate::exit_codes::{
    EXIT_ARTIFACT, EXIT_DISCREPANCIES, EXIT_INVALID_CONFIG, EXIT_LEDGER, EXIT_REPORT,
};
use crate::CliError;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "ledgercheck.toml";

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub ledger: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub keep_going: bool,
    pub strict: bool,
}

/// A parsed config plus the directory its relative paths resolve against.
pub struct LoadedConfig {
    pub config: ReconConfig,
    pub base_dir: PathBuf,
    /// File it came from; `None` for built-in defaults.
    pub path: Option<PathBuf>,
}

/// `--config` if given, else `./ledgercheck.toml` if present, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, CliError> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    };

    let Some(path) = path else {
        log::info!("no {DEFAULT_CONFIG_FILE} found, using built-in defaults");
        return Ok(LoadedConfig {
            config: ReconConfig::default(),
            base_dir: PathBuf::from("."),
            path: None,
        });
    };

    let text = std::fs::read_to_string(&path).map_err(|e| {
        CliError::usage(format!("cannot read config {}: {e}", path.display()))
    })?;
    let config = ReconConfig::from_toml(&text).map_err(|e| config_err(&path, e))?;

    let base_dir = base_dir_of(&path);
    log::info!("config {} ('{}')", path.display(), config.name);

    Ok(LoadedConfig {
        config,
        base_dir,
        path: Some(path),
    })
}

/// Directory of a config file; a bare file name resolves to the working
/// directory.
fn base_dir_of(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn config_err(path: &Path, e: ReconError) -> CliError {
    CliError::new(EXIT_INVALID_CONFIG, format!("{}: {e}", path.display()))
}

/// Map a pipeline failure to its exit code; ledger policy errors get a hint.
fn io_err(code: u8, e: IoError) -> CliError {
    let hint = match &e {
        IoError::MissingColumn { .. } => Some("set ledger.filename_column in the config"),
        IoError::Recon(ReconError::EmptyFilename { .. }) => {
            Some("set ledger.empty_filename = \"skip\" or \"group\" to accept such rows")
        }
        IoError::Read { .. } | IoError::Document { .. } if code == EXIT_ARTIFACT => {
            Some("--keep-going records unreadable files in the report instead")
        }
        _ => None,
    };
    let err = CliError::new(code, e.to_string());
    match hint {
        Some(h) => err.with_hint(h),
        None => err,
    }
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let LoadedConfig {
        mut config,
        base_dir,
        ..
    } = load_config(args.config.as_deref())?;
    config.keep_going |= args.keep_going;

    let ledger_path = args
        .ledger
        .unwrap_or_else(|| base_dir.join(&config.ledger.file));
    let output_path = args
        .output
        .unwrap_or_else(|| base_dir.join(&config.output.file));

    let ledger = ledgercheck_io::load_ledger(&ledger_path, &config.ledger)
        .map_err(|e| io_err(EXIT_LEDGER, e))?;
    let records = ledgercheck_io::extract_sources(&config, &base_dir)
        .map_err(|e| io_err(EXIT_ARTIFACT, e))?;

    let result = ledgercheck_recon::run(&config, &ledger, &records);

    ledgercheck_io::write_report(&output_path, &config.output.sheet, &result.rows)
        .map_err(|e| io_err(EXIT_REPORT, e))?;

    let done = format!("comparison complete. Output saved to: {}", output_path.display());
    if args.json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::new(crate::exit_codes::EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        eprintln!("{done}");
    } else {
        println!("{done}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{} rows: {} clean, {} mismatch, {} missing, {} missing+mismatch, {} not in ledger, {} file not found",
        s.total_rows,
        s.clean,
        s.mismatch_only,
        s.missing_only,
        s.missing_and_mismatch,
        s.filename_missing_in_ledger,
        s.file_not_found,
    );
    if s.skipped_ledger_rows > 0 {
        eprintln!(
            "{} ledger row(s) without {} skipped",
            s.skipped_ledger_rows, config.ledger.filename_column
        );
    }

    if args.strict && s.has_discrepancies() {
        return Err(CliError::new(EXIT_DISCREPANCIES, "discrepancies found (--strict)"));
    }
    Ok(())
}

pub fn cmd_validate(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let loaded = load_config(config_path.as_deref())?;
    let config = &loaded.config;
    let origin = loaded
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".into());

    eprintln!(
        "valid: '{}' ({}) with {} source(s), {} mapped field(s)",
        config.name,
        origin,
        config.sources.len(),
        config.field_mapping.iter().count(),
    );
    Ok(())
}
