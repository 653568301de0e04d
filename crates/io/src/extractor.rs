//! File-backed extractors: one per artifact format, all producing a field map.

use std::path::Path;

use ledgercheck_recon::config::{AliasTable, LiteralHeaderConfig};
use ledgercheck_recon::extract::{comment_header, document_table, literal_header, CaseExtraction};
use ledgercheck_recon::model::ArtifactFormat;
use ledgercheck_recon::{FieldMap, ReconConfig, ReconError};

use crate::csv::read_file_as_utf8;
use crate::error::Result;

/// Read one artifact file and return its header fields.
///
/// A file without a recognizable header yields an empty map; only IO and
/// container faults are errors.
pub trait Extractor {
    fn format(&self) -> ArtifactFormat;
    fn extract(&self, path: &Path) -> Result<FieldMap>;
}

/// Leading comment block (`# Key: value`).
pub struct CommentHeaderExtractor {
    pub marker: String,
}

impl Extractor for CommentHeaderExtractor {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::CommentHeader
    }

    fn extract(&self, path: &Path) -> Result<FieldMap> {
        let text = read_file_as_utf8(path)?;
        Ok(comment_header::parse(&text, &self.marker))
    }
}

/// String-literal header constant.
pub struct LiteralHeaderExtractor {
    pub config: LiteralHeaderConfig,
    pub aliases: AliasTable,
}

impl Extractor for LiteralHeaderExtractor {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::LiteralHeader
    }

    fn extract(&self, path: &Path) -> Result<FieldMap> {
        let text = read_file_as_utf8(path)?;
        Ok(literal_header::parse(&text, &self.config, &self.aliases))
    }
}

/// Metadata and case tables of a .docx document.
pub struct DocumentTableExtractor {
    pub aliases: AliasTable,
}

impl DocumentTableExtractor {
    /// Metadata, cases, and diagnostics, before flattening.
    pub fn cases(&self, path: &Path) -> Result<CaseExtraction> {
        let tables = crate::docx::read_tables(path)?;
        Ok(document_table::extract_cases(&tables))
    }
}

impl Extractor for DocumentTableExtractor {
    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::DocumentTable
    }

    fn extract(&self, path: &Path) -> Result<FieldMap> {
        let extraction = self.cases(path)?;
        for issue in &extraction.issues {
            log::debug!("{}: {issue}", path.display());
        }
        Ok(document_table::header_view(&extraction, &self.aliases))
    }
}

/// The extractor for `format`, configured from `config`.
pub fn extractor_for(format: ArtifactFormat, config: &ReconConfig) -> Box<dyn Extractor> {
    match format {
        ArtifactFormat::CommentHeader => Box::new(CommentHeaderExtractor {
            marker: config.comment_header.marker.clone(),
        }),
        ArtifactFormat::LiteralHeader => Box::new(LiteralHeaderExtractor {
            config: config.literal_header.clone(),
            aliases: config.aliases.literal_header.clone(),
        }),
        ArtifactFormat::DocumentTable => Box::new(DocumentTableExtractor {
            aliases: config.aliases.document_table.clone(),
        }),
    }
}

/// Format of a file, chosen by matching its extension against the configured
/// sources (case-insensitive).
pub fn format_for_path(path: &Path, config: &ReconConfig) -> std::result::Result<ArtifactFormat, ReconError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    config
        .sources
        .iter()
        .find(|s| name.ends_with(&s.extension.to_lowercase()))
        .map(|s| s.format)
        .ok_or_else(|| ReconError::UnknownFormat(format!("file '{}'", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_for_path() {
        let config = ReconConfig::default();
        assert_eq!(
            format_for_path(Path::new("a/Report.PY"), &config).unwrap(),
            ArtifactFormat::CommentHeader
        );
        assert_eq!(
            format_for_path(Path::new("Nightly.java"), &config).unwrap(),
            ArtifactFormat::LiteralHeader
        );
        assert_eq!(
            format_for_path(Path::new("plan.docx"), &config).unwrap(),
            ArtifactFormat::DocumentTable
        );
        assert!(matches!(
            format_for_path(Path::new("notes.txt"), &config),
            Err(ReconError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_comment_header_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.py");
        std::fs::write(&path, "# ID: 42\n# more text\nimport os\n").unwrap();

        let extractor = extractor_for(ArtifactFormat::CommentHeader, &ReconConfig::default());
        assert_eq!(extractor.format(), ArtifactFormat::CommentHeader);
        let fields = extractor.extract(&path).unwrap();
        assert_eq!(fields.get("ID"), Some("42\nmore text"));
    }

    #[test]
    fn test_literal_header_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Nightly.java");
        std::fs::write(
            &path,
            "class Nightly {\n  public static String Header =\n    \"Id: 5\\n\" +\n    \"Author: ann\\n\" +\n    \"\";\n}\n",
        )
        .unwrap();

        let fields = extractor_for(ArtifactFormat::LiteralHeader, &ReconConfig::default())
            .extract(&path)
            .unwrap();
        assert_eq!(fields.get("ID"), Some("5"));
        assert_eq!(fields.get("Author"), Some("ann"));
    }

    #[test]
    fn test_unreadable_file_is_error() {
        let extractor = extractor_for(ArtifactFormat::CommentHeader, &ReconConfig::default());
        assert!(extractor.extract(Path::new("/nonexistent/x.py")).is_err());
    }

    #[test]
    fn test_document_file() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Description</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>login flow</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
</w:body></w:document>"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.docx");
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();

        let extractor = DocumentTableExtractor {
            aliases: AliasTable::default(),
        };
        let cases = extractor.cases(&path).unwrap();
        assert_eq!(cases.issues, vec![document_table::MISSING_TEMPLATE.to_string()]);

        let fields = extractor.extract(&path).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields.get(document_table::ISSUES_FIELD),
            Some(document_table::MISSING_TEMPLATE)
        );
    }
}
