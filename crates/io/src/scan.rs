//! Artifact discovery and extraction across the configured sources.

use std::path::{Path, PathBuf};

use ledgercheck_recon::config::SourceConfig;
use ledgercheck_recon::{ExtractedRecord, FieldMap, ReconConfig};

use crate::error::{IoError, Result};
use crate::extractor::extractor_for;

/// Field holding the failure message of a file that could not be extracted
/// under `keep_going`.
pub const EXTRACTION_ERROR_FIELD: &str = "Extraction Error";

/// Files directly inside `dir` whose name ends with `extension`
/// (case-insensitive), sorted by file name. A missing directory yields no
/// files and a warning.
pub fn list_source_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        log::warn!("source directory {} not found, skipped", dir.display());
        return Ok(Vec::new());
    }

    let read_err = |source| IoError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let extension = extension.to_lowercase();

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase().ends_with(&extension))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Extract every artifact of every source, in source order.
///
/// Source directories resolve against `base`. With `config.keep_going` a
/// file that fails to extract becomes a record carrying only
/// [`EXTRACTION_ERROR_FIELD`]; otherwise the first failure aborts.
pub fn extract_sources(config: &ReconConfig, base: &Path) -> Result<Vec<ExtractedRecord>> {
    let mut records = Vec::new();
    for source in &config.sources {
        let dir = base.join(&source.dir);
        let files = list_source_files(&dir, &source.extension)?;
        log::info!(
            "source '{}': {} {} file(s) in {}",
            source.name,
            files.len(),
            source.extension,
            dir.display()
        );
        for path in files {
            records.push(extract_file(&path, source, config)?);
        }
    }
    Ok(records)
}

fn extract_file(path: &Path, source: &SourceConfig, config: &ReconConfig) -> Result<ExtractedRecord> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let fields = match extractor_for(source.format, config).extract(path) {
        Ok(fields) => fields,
        Err(e) if config.keep_going => {
            log::warn!("{}: {e} (keep_going: recorded in report)", path.display());
            let mut fields = FieldMap::new();
            fields.insert(EXTRACTION_ERROR_FIELD, e.to_string());
            fields
        }
        Err(e) => return Err(e),
    };
    log::debug!("{}: {} field(s)", path.display(), fields.len());

    Ok(ExtractedRecord {
        filename,
        format: source.format,
        file_type: source.file_type_label().to_string(),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let py = dir.path().join("scripts/python");
        std::fs::create_dir_all(&py).unwrap();
        std::fs::write(py.join("b.py"), "# ID: 2\n").unwrap();
        std::fs::write(py.join("a.py"), "# ID: 1\n").unwrap();
        std::fs::write(py.join("notes.txt"), "# ID: 3\n").unwrap();
        std::fs::create_dir(py.join("sub.py")).unwrap();
        let word = dir.path().join("scripts/word");
        std::fs::create_dir_all(&word).unwrap();
        std::fs::write(word.join("broken.docx"), "not a zip").unwrap();
        dir
    }

    #[test]
    fn test_list_sorted_and_filtered() {
        let dir = setup();
        let files = list_source_files(&dir.path().join("scripts/python"), ".py").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.py", "b.py"]);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_source_files(&dir.path().join("absent"), ".py").unwrap().is_empty());
    }

    #[test]
    fn test_first_failure_aborts() {
        let dir = setup();
        let err = extract_sources(&ReconConfig::default(), dir.path()).unwrap_err();
        assert!(matches!(err, IoError::Document { .. }));
    }

    #[test]
    fn test_keep_going_records_failure() {
        let dir = setup();
        let config = ReconConfig {
            keep_going: true,
            ..ReconConfig::default()
        };
        let records = extract_sources(&config, dir.path()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.py", "b.py", "broken.docx"]);

        assert_eq!(records[0].file_type, "Python");
        assert_eq!(records[0].fields.get("ID"), Some("1"));
        let broken = &records[2];
        assert_eq!(broken.file_type, "Word");
        assert_eq!(broken.fields.len(), 1);
        assert!(broken.fields.get(EXTRACTION_ERROR_FIELD).unwrap().contains("not a .docx archive"));
    }
}
