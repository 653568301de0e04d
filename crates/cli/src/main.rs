// ledgercheck CLI - reconcile artifact header metadata against a ledger

mod exit_codes;
mod extract;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use ledgercheck_recon::model::ArtifactFormat;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "lcheck")]
#[command(about = "Check artifact header metadata against a spreadsheet ledger")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG also works.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every artifact, reconcile against the ledger, write the report
    #[command(after_help = "\
Examples:
  lcheck run
  lcheck run --config audit/ledgercheck.toml
  lcheck run --ledger input_data.csv --output report.csv
  lcheck run --json --strict")]
    Run {
        /// Config file (default: ./ledgercheck.toml if present, else built-in defaults)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Ledger file, overriding ledger.file
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Report file (.xlsx or .csv), overriding output.file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the full result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Record unreadable artifacts in the report instead of aborting
        #[arg(long)]
        keep_going: bool,

        /// Exit with code 7 when any row carries an error tag
        #[arg(long)]
        strict: bool,
    },

    /// Parse and validate a config file without running
    #[command(after_help = "\
Examples:
  lcheck validate
  lcheck validate audit/ledgercheck.toml")]
    Validate {
        /// Config file (default: ./ledgercheck.toml if present, else built-in defaults)
        config: Option<PathBuf>,
    },

    /// Print the header fields of one artifact file as JSON
    #[command(after_help = "\
Examples:
  lcheck extract scripts/python/report.py
  lcheck extract scripts/word/login.docx
  lcheck extract legacy.txt --format comment_header")]
    Extract {
        /// Artifact file
        file: PathBuf,

        /// comment_header, literal_header or document_table (default: by extension)
        #[arg(long, short = 'f', value_parser = parse_format)]
        format: Option<ArtifactFormat>,

        /// Config file supplying markers and alias tables
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn parse_format(s: &str) -> Result<ArtifactFormat, String> {
    s.parse::<ArtifactFormat>().map_err(|e| e.to_string())
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_COMMIT_HASH"),
        ")",
        "\nengine:  ledgercheck-recon ",
        env!("CARGO_PKG_VERSION"),
    )
}

/// Log records from the library crates go to stderr through the subscriber's
/// `log` bridge.
fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            ledger,
            output,
            json,
            keep_going,
            strict,
        } => recon::cmd_run(recon::RunArgs {
            config,
            ledger,
            output,
            json,
            keep_going,
            strict,
        }),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Extract {
            file,
            format,
            config,
        } => extract::cmd_extract(file, format, config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
