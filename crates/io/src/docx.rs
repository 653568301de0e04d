// .docx table reader
//
// A .docx file is a ZIP archive; the body lives in word/document.xml. Only
// top-level tables are collected. Cell text is the text of the cell's own
// paragraphs joined with '\n'. A cell spanning N grid columns appears N times
// in its row so rows line up with the table grid.

use std::io::Read;
use std::path::Path;

use ledgercheck_recon::extract::DocTable;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{IoError, Result};

const DOCUMENT_PART: &str = "word/document.xml";

/// Read every top-level table of a .docx file.
pub fn read_tables(path: &Path) -> Result<Vec<DocTable>> {
    let file = std::fs::File::open(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| IoError::Document {
        path: path.to_path_buf(),
        message: format!("not a .docx archive: {e}"),
    })?;

    let xml = {
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| IoError::Document {
            path: path.to_path_buf(),
            message: format!("{DOCUMENT_PART}: {e}"),
        })?;
        let mut content = String::new();
        part.read_to_string(&mut content).map_err(|e| IoError::Document {
            path: path.to_path_buf(),
            message: format!("{DOCUMENT_PART}: {e}"),
        })?;
        content
    };

    let tables = parse_document_xml(&xml).map_err(|message| IoError::Document {
        path: path.to_path_buf(),
        message,
    })?;
    log::debug!("{}: {} table(s)", path.display(), tables.len());
    Ok(tables)
}

/// Collect the top-level tables of a WordprocessingML body.
pub fn parse_document_xml(xml: &str) -> std::result::Result<Vec<DocTable>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false); // whitespace inside w:t is content
    let mut buf = Vec::new();

    let mut tables = Vec::new();
    let mut state = TableState::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => state.open(e),
            Ok(Event::Empty(ref e)) => state.empty(e),
            Ok(Event::End(ref e)) => {
                if let Some(table) = state.close(e.local_name().as_ref()) {
                    tables.push(table);
                }
            }
            Ok(Event::Text(ref e)) if state.in_text => {
                state.para.push_str(&unescape_xml(&String::from_utf8_lossy(e.as_ref())));
            }
            Ok(Event::GeneralRef(ref e)) if state.in_text => {
                let name = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&name) {
                    Some(c) => state.para.push(c),
                    None => {
                        state.para.push('&');
                        state.para.push_str(&name);
                        state.para.push(';');
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed XML at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(tables)
}

#[derive(Default)]
struct TableState {
    /// Table nesting level; 1 = top-level table.
    depth: usize,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    in_cell: bool,
    span: usize,
    paragraphs: Vec<String>,
    in_para: bool,
    para: String,
    in_text: bool,
}

impl TableState {
    fn top(&self) -> bool {
        self.depth == 1
    }

    fn open(&mut self, e: &BytesStart) {
        match e.local_name().as_ref() {
            b"tbl" => {
                self.depth += 1;
                if self.top() {
                    self.rows.clear();
                }
            }
            b"tr" if self.top() => self.row.clear(),
            b"tc" if self.top() => {
                self.in_cell = true;
                self.span = 1;
                self.paragraphs.clear();
            }
            b"p" if self.top() && self.in_cell => {
                self.in_para = true;
                self.para.clear();
            }
            b"t" if self.top() && self.in_para => self.in_text = true,
            _ => {}
        }
    }

    fn empty(&mut self, e: &BytesStart) {
        if !self.top() || !self.in_cell {
            return;
        }
        match e.local_name().as_ref() {
            b"gridSpan" => {
                if let Some(n) = attr_value(e, b"val").and_then(|v| v.parse::<usize>().ok()) {
                    self.span = n.max(1);
                }
            }
            b"p" => self.paragraphs.push(String::new()),
            b"tab" if self.in_para => self.para.push('\t'),
            b"br" | b"cr" if self.in_para => self.para.push('\n'),
            _ => {}
        }
    }

    /// Handle a closing tag; returns a finished top-level table.
    fn close(&mut self, local_name: &[u8]) -> Option<DocTable> {
        match local_name {
            b"tbl" => {
                let finished = self.top().then(|| DocTable::new(std::mem::take(&mut self.rows)));
                self.depth = self.depth.saturating_sub(1);
                return finished;
            }
            b"tr" if self.top() => self.rows.push(std::mem::take(&mut self.row)),
            b"tc" if self.top() => {
                let text = self.paragraphs.join("\n");
                for _ in 0..self.span {
                    self.row.push(text.clone());
                }
                self.in_cell = false;
            }
            b"p" if self.top() && self.in_para => {
                self.paragraphs.push(std::mem::take(&mut self.para));
                self.in_para = false;
            }
            b"t" if self.top() => self.in_text = false,
            _ => {}
        }
        None
    }
}

fn attr_value(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(a.value.as_ref()).into_owned())
}

/// Resolve a predefined entity or character reference name (without `&`/`;`).
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Unescape predefined XML entities left inside a text event.
fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{inner}</w:body></w:document>"#
        )
    }

    fn cell(text: &str) -> String {
        format!("<w:tc><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:tc>")
    }

    fn row(cells: &[&str]) -> String {
        let cells: String = cells.iter().map(|c| cell(c)).collect();
        format!("<w:tr>{cells}</w:tr>")
    }

    fn table(rows: &[&[&str]]) -> String {
        let rows: String = rows.iter().map(|r| row(r)).collect();
        format!("<w:tbl><w:tblPr/>{rows}</w:tbl>")
    }

    #[test]
    fn test_two_tables() {
        let xml = body(&format!(
            "<w:p><w:r><w:t>Intro</w:t></w:r></w:p>{}{}",
            table(&[&["ID", "7"], &["Author", "ann"]]),
            table(&[&["Case ID", "C1"]])
        ));
        let tables = parse_document_xml(&xml).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows, vec![vec!["ID", "7"], vec!["Author", "ann"]]);
        assert_eq!(tables[1].rows, vec![vec!["Case ID", "C1"]]);
    }

    #[test]
    fn test_paragraphs_runs_and_breaks() {
        let xml = body(
            "<w:tbl><w:tr>\
             <w:tc><w:p><w:r><w:t>Obj</w:t></w:r><w:r><w:t xml:space=\"preserve\">ective</w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t>line one</w:t></w:r></w:p><w:p><w:r><w:t>line</w:t><w:tab/><w:t>two</w:t><w:br/><w:t>three</w:t></w:r></w:p></w:tc>\
             </w:tr></w:tbl>",
        );
        let tables = parse_document_xml(&xml).unwrap();
        assert_eq!(tables[0].rows[0][0], "Objective");
        assert_eq!(tables[0].rows[0][1], "line one\nline\ttwo\nthree");
    }

    #[test]
    fn test_entities() {
        let xml = body(&table(&[&["R&amp;D", "a &lt; b &#38; c &#x41;"]]));
        let tables = parse_document_xml(&xml).unwrap();
        assert_eq!(tables[0].rows[0], vec!["R&D", "a < b & c A"]);
    }

    #[test]
    fn test_nested_table_is_not_collected() {
        let nested = table(&[&["inner", "x"]]);
        let xml = body(&format!(
            "<w:tbl><w:tr>{}<w:tc><w:p><w:r><w:t>outer</w:t></w:r></w:p>{nested}</w:tc></w:tr></w:tbl>",
            cell("Key")
        ));
        let tables = parse_document_xml(&xml).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows, vec![vec!["Key", "outer"]]);
    }

    #[test]
    fn test_grid_span_repeats_cell() {
        let xml = body(
            "<w:tbl><w:tr><w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr>\
             <w:p><w:r><w:t>Heading</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        let tables = parse_document_xml(&xml).unwrap();
        assert_eq!(tables[0].rows[0], vec!["Heading", "Heading"]);
    }

    #[test]
    fn test_empty_paragraph_counts() {
        let xml = body("<w:tbl><w:tr><w:tc><w:p/><w:p><w:r><w:t>x</w:t></w:r></w:p></w:tc></w:tr></w:tbl>");
        let tables = parse_document_xml(&xml).unwrap();
        assert_eq!(tables[0].rows[0], vec!["\nx"]);
    }

    #[test]
    fn test_no_tables() {
        let xml = body("<w:p><w:r><w:t>just text</w:t></w:r></w:p>");
        assert!(parse_document_xml(&xml).unwrap().is_empty());
    }

    #[test]
    fn test_read_tables_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.docx");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(body(&table(&[&["ID", "1"]])).as_bytes()).unwrap();
        zip.finish().unwrap();

        let tables = read_tables(&path).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0], vec!["ID", "1"]);
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, "plain text").unwrap();
        let err = read_tables(&path).unwrap_err();
        assert!(matches!(err, IoError::Document { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = read_tables(Path::new("/nonexistent/dir/none.docx")).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }
}
