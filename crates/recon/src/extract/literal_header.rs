use crate::config::{AliasTable, LiteralHeaderConfig};
use crate::model::FieldMap;

/// Parse a header held in a single string constant, e.g.
///
/// ```text
/// public static String Header =
///     "ID: 42\n" +
///     "Author: ann\n" +
///     "";
/// ```
///
/// Fragments are the lines after the first line containing `config.marker`.
/// The first line containing `config.terminator` closes the constant and is
/// not read, so the conventional layout ends with an empty `"";` line.
/// Inside the literal, lines are separated by the two-character escape `\n`,
/// not real line breaks.
///
/// Keys go through `aliases` (case-insensitive). No marker or no terminator
/// gives an empty mapping.
pub fn parse(text: &str, config: &LiteralHeaderConfig, aliases: &AliasTable) -> FieldMap {
    let mut lines = text.lines();
    if !lines.by_ref().any(|line| line.contains(&config.marker)) {
        return FieldMap::new();
    }

    let mut body = String::new();
    let mut terminated = false;
    for fragment in lines {
        if fragment.contains(&config.terminator) {
            terminated = true;
            break;
        }
        body.push_str(&clean_fragment(fragment));
    }

    if !terminated {
        log::debug!("literal header: no terminator {:?} after marker", config.terminator);
        return FieldMap::new();
    }

    let mut fields = FieldMap::new();
    for line in body.split("\\n") {
        let line = line.trim_end_matches("\\r");
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            fields.insert(aliases.canonical(key), value.trim());
        }
    }
    fields
}

/// Drop `+` concatenation operators and quote delimiters from one source line.
fn clean_fragment(fragment: &str) -> String {
    fragment
        .trim()
        .trim_start_matches('+')
        .trim_end_matches('+')
        .trim()
        .replace('"', "")
}
