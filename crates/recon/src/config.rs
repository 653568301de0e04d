use std::collections::HashSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::ReconError;
use crate::model::ArtifactFormat;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything a run needs besides the data itself. Every key has a default,
/// so an empty TOML document is a complete configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub name: String,
    /// Turn per-file extraction failures into report rows instead of aborting.
    pub keep_going: bool,
    pub ledger: LedgerConfig,
    pub output: OutputConfig,
    pub sources: Vec<SourceConfig>,
    pub comment_header: CommentHeaderConfig,
    pub literal_header: LiteralHeaderConfig,
    pub field_mapping: FieldMapping,
    pub aliases: AliasConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: "ledgercheck".into(),
            keep_going: false,
            ledger: LedgerConfig::default(),
            output: OutputConfig::default(),
            sources: default_sources(),
            comment_header: CommentHeaderConfig::default(),
            literal_header: LiteralHeaderConfig::default(),
            field_mapping: FieldMapping::default(),
            aliases: AliasConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub file: String,
    /// Worksheet name; first sheet when unset.
    pub sheet: Option<String>,
    pub filename_column: String,
    pub empty_filename: EmptyFilenamePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            file: "input_data.xlsx".into(),
            sheet: None,
            filename_column: "Filename".into(),
            empty_filename: EmptyFilenamePolicy::default(),
        }
    }
}

/// What to do with ledger rows whose filename cell is missing or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyFilenamePolicy {
    /// Drop the row and log a warning.
    #[default]
    Skip,
    /// Merge all such rows into a single record keyed by "".
    Group,
    /// Fail the run.
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub file: String,
    pub sheet: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: "output_comparison.xlsx".into(),
            sheet: "Sheet1".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// One artifact directory. Sources are processed in the order listed.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub name: String,
    pub dir: String,
    pub extension: String,
    pub format: ArtifactFormat,
    #[serde(default)]
    pub file_type: Option<String>,
}

impl SourceConfig {
    fn new(name: &str, dir: &str, extension: &str, format: ArtifactFormat) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            extension: extension.into(),
            format,
            file_type: None,
        }
    }

    /// Report label: the configured `file_type`, else the format default.
    pub fn file_type_label(&self) -> &str {
        self.file_type
            .as_deref()
            .unwrap_or_else(|| self.format.default_file_type())
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("python", "scripts/python", ".py", ArtifactFormat::CommentHeader),
        SourceConfig::new("java", "scripts/java", ".java", ArtifactFormat::LiteralHeader),
        SourceConfig::new("word", "scripts/word", ".docx", ArtifactFormat::DocumentTable),
    ]
}

// ---------------------------------------------------------------------------
// Format settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommentHeaderConfig {
    pub marker: String,
}

impl Default for CommentHeaderConfig {
    fn default() -> Self {
        Self { marker: "#".into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiteralHeaderConfig {
    /// Phrase identifying the declaration line of the header constant.
    pub marker: String,
    /// Sequence closing the literal.
    pub terminator: String,
}

impl Default for LiteralHeaderConfig {
    fn default() -> Self {
        Self {
            marker: "public static String Header".into(),
            terminator: "\";".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping tables
// ---------------------------------------------------------------------------

/// Ledger column → canonical field, in the order written in the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping(Vec<(String, String)>);

impl FieldMapping {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// `(ledger_column, canonical_field)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(l, c)| (l.as_str(), c.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self(pairs(&[
            ("Excel_ID", "ID"),
            ("Excel_Objective", "Objective"),
            ("Excel_Author", "Author"),
        ]))
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_pairs(deserializer).map(Self)
    }
}

/// Raw header key → canonical field. Lookup ignores case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable(Vec<(String, String)>);

impl AliasTable {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// Canonical name for `raw`, or `raw` itself when the table has no entry.
    pub fn canonical<'a>(&'a self, raw: &'a str) -> &'a str {
        let wanted = raw.to_lowercase();
        self.0
            .iter()
            .find(|(k, _)| k.to_lowercase() == wanted)
            .map(|(_, v)| v.as_str())
            .unwrap_or(raw)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self(pairs(&[
            ("id", "ID"),
            ("description", "Objective"),
            ("title", "Filename"),
            ("author", "Author"),
        ]))
    }
}

impl<'de> Deserialize<'de> for AliasTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_pairs(deserializer).map(Self)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    pub literal_header: AliasTable,
    pub document_table: AliasTable,
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Deserialize a string → string table keeping document order.
fn deserialize_pairs<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<(String, String)>, D::Error> {
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a table of string values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::new();
            while let Some((k, v)) = map.next_entry::<String, String>()? {
                out.push((k, v));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(PairsVisitor)
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.ledger.filename_column.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "ledger.filename_column must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            let label = if source.name.is_empty() {
                format!("sources[{i}]")
            } else {
                format!("source '{}'", source.name)
            };
            if source.dir.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{label}: dir must not be empty")));
            }
            if !source.extension.starts_with('.') || source.extension.len() < 2 {
                return Err(ReconError::ConfigValidation(format!(
                    "{label}: extension must look like \".ext\", got \"{}\"",
                    source.extension
                )));
            }
            if !seen.insert((source.dir.as_str(), source.extension.as_str())) {
                return Err(ReconError::ConfigValidation(format!(
                    "{label}: duplicate source {}/*{}",
                    source.dir, source.extension
                )));
            }
        }

        if self.comment_header.marker.is_empty() {
            return Err(ReconError::ConfigValidation(
                "comment_header.marker must not be empty".into(),
            ));
        }
        if self.literal_header.marker.is_empty() || self.literal_header.terminator.is_empty() {
            return Err(ReconError::ConfigValidation(
                "literal_header.marker and literal_header.terminator must not be empty".into(),
            ));
        }

        if self.field_mapping.is_empty() {
            return Err(ReconError::ConfigValidation(
                "field_mapping must map at least one ledger column".into(),
            ));
        }
        for (column, field) in self.field_mapping.iter() {
            if column.trim().is_empty() || field.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "field_mapping: empty name in \"{column}\" = \"{field}\""
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "Header audit"
keep_going = true

[ledger]
file = "ledger.csv"
sheet = "Scripts"
filename_column = "File"
empty_filename = "reject"

[output]
file = "out.csv"

[[sources]]
name = "py"
dir = "src/py"
extension = ".py"
format = "comment_header"

[[sources]]
name = "docs"
dir = "docs"
extension = ".docx"
format = "document_table"
file_type = "Document"

[literal_header]
marker = "static final String HEADER"

[field_mapping]
Ledger_Owner = "Owner"
Ledger_ID = "ID"

[aliases.document_table]
Owner = "Owner"
"#;

    #[test]
    fn empty_document_is_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.ledger.file, "input_data.xlsx");
        assert_eq!(config.ledger.filename_column, "Filename");
        assert_eq!(config.ledger.empty_filename, EmptyFilenamePolicy::Skip);
        assert_eq!(config.output.file, "output_comparison.xlsx");
        assert!(!config.keep_going);

        let formats: Vec<_> = config.sources.iter().map(|s| s.format).collect();
        assert_eq!(
            formats,
            vec![
                ArtifactFormat::CommentHeader,
                ArtifactFormat::LiteralHeader,
                ArtifactFormat::DocumentTable
            ]
        );
        assert_eq!(config.sources[1].file_type_label(), "Java");

        let mapping: Vec<_> = config.field_mapping.iter().collect();
        assert_eq!(
            mapping,
            vec![("Excel_ID", "ID"), ("Excel_Objective", "Objective"), ("Excel_Author", "Author")]
        );
        assert_eq!(config.literal_header.terminator, "\";");
    }

    #[test]
    fn parse_full_config() {
        let config = ReconConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name, "Header audit");
        assert!(config.keep_going);
        assert_eq!(config.ledger.sheet.as_deref(), Some("Scripts"));
        assert_eq!(config.ledger.empty_filename, EmptyFilenamePolicy::Reject);
        assert_eq!(config.output.sheet, "Sheet1");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].file_type_label(), "Document");
        assert_eq!(config.sources[0].file_type_label(), "Python");

        // Unset keys in a partially written table keep their defaults
        assert_eq!(config.literal_header.marker, "static final String HEADER");
        assert_eq!(config.literal_header.terminator, "\";");
        assert_eq!(config.comment_header.marker, "#");
    }

    #[test]
    fn field_mapping_keeps_document_order() {
        let config = ReconConfig::from_toml(FULL).unwrap();
        let mapping: Vec<_> = config.field_mapping.iter().collect();
        assert_eq!(mapping, vec![("Ledger_Owner", "Owner"), ("Ledger_ID", "ID")]);
    }

    #[test]
    fn alias_lookup_ignores_case() {
        let table = AliasTable::default();
        assert_eq!(table.canonical("ID"), "ID");
        assert_eq!(table.canonical("Description"), "Objective");
        assert_eq!(table.canonical("TITLE"), "Filename");
        assert_eq!(table.canonical("Reviewer"), "Reviewer");
    }

    #[test]
    fn configured_alias_table_replaces_default() {
        let config = ReconConfig::from_toml(FULL).unwrap();
        assert_eq!(config.aliases.document_table.canonical("owner"), "Owner");
        assert_eq!(config.aliases.document_table.canonical("description"), "description");
        // Untouched table keeps the default
        assert_eq!(config.aliases.literal_header.canonical("author"), "Author");
    }

    #[test]
    fn reject_bad_extension() {
        let input = r#"
[[sources]]
dir = "scripts"
extension = "py"
format = "comment_header"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("extension"));
    }

    #[test]
    fn reject_duplicate_source() {
        let input = r#"
[[sources]]
dir = "scripts"
extension = ".py"
format = "comment_header"

[[sources]]
dir = "scripts"
extension = ".py"
format = "literal_header"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate source"));
    }

    #[test]
    fn reject_unknown_format() {
        let input = r#"
[[sources]]
dir = "scripts"
extension = ".rb"
format = "yaml_front_matter"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_field_mapping() {
        let err = ReconConfig::from_toml("[field_mapping]\n").unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn reject_invalid_policy() {
        let input = "[ledger]\nempty_filename = \"ignore\"\n";
        assert!(ReconConfig::from_toml(input).is_err());
    }
}
