//! `lcheck extract`: run one extractor on one file and print JSON.

use std::path::PathBuf;

use ledgercheck_io::extractor::DocumentTableExtractor;
use ledgercheck_io::{extractor_for, format_for_path};
use ledgercheck_recon::extract::document_table::header_view;
use ledgercheck_recon::model::ArtifactFormat;
use serde_json::json;

use crate::exit_codes::{EXIT_ARTIFACT, EXIT_ERROR};
use crate::recon::load_config;
use crate::CliError;

pub fn cmd_extract(
    file: PathBuf,
    format: Option<ArtifactFormat>,
    config_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?.config;

    let format = match format {
        Some(f) => f,
        None => format_for_path(&file, &config).map_err(|e| {
            CliError::usage(e.to_string()).with_hint("pass --format comment_header|literal_header|document_table")
        })?,
    };

    let artifact_err = |e: ledgercheck_io::IoError| CliError::new(EXIT_ARTIFACT, e.to_string());

    let value = match format {
        ArtifactFormat::DocumentTable => {
            let extractor = DocumentTableExtractor {
                aliases: config.aliases.document_table.clone(),
            };
            let extraction = extractor.cases(&file).map_err(artifact_err)?;
            json!({
                "file": file.display().to_string(),
                "format": format,
                "fields": header_view(&extraction, &extractor.aliases),
                "metadata": extraction.metadata,
                "cases": extraction.cases,
                "issues": extraction.issues,
            })
        }
        _ => {
            let fields = extractor_for(format, &config)
                .extract(&file)
                .map_err(artifact_err)?;
            json!({
                "file": file.display().to_string(),
                "format": format,
                "fields": fields,
            })
        }
    };

    let json_str = serde_json::to_string_pretty(&value)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
    println!("{json_str}");
    Ok(())
}
