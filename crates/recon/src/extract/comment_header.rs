use crate::model::FieldMap;

/// Parse the comment block at the top of a source file.
///
/// The block runs from the first line to the first line that does not start
/// with `marker` (leading whitespace allowed); a blank line ends it too.
/// `Key: value` lines set a field and make it the active key; lines without a
/// colon continue the active key's value on a new line, so a bare marker line
/// adds an empty line. Text before the first key is dropped. Keys are used
/// verbatim; an empty key is stored as `""` and leaves no key active.
pub fn parse(text: &str, marker: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    let mut active: Option<String> = None;

    for line in text.lines() {
        let line = line.trim_start();
        if !line.starts_with(marker) {
            break;
        }
        let content = line.trim_start_matches(marker).trim();

        match content.split_once(':') {
            Some((key, value)) => {
                let key = key.trim();
                fields.insert(key, value.trim());
                active = Some(key.to_string()).filter(|k| !k.is_empty());
            }
            None => {
                if let Some(ref key) = active {
                    fields.append(key.as_str(), content);
                }
            }
        }
    }

    fields
}
