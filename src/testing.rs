//! Testing utilities for docview
//!
//! This module provides a recording [`MockFetcher`] and builders for small
//! in-memory XLSX and DOCX packages, so tests never touch the network.
//!
//! Only available when compiled with `cfg(test)`.

use crate::preview::{FetchError, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;
use tokio::sync::Notify;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Canned answer for one source
#[derive(Debug, Clone)]
enum MockResponse {
    Bytes(Vec<u8>),
    Status(u16),
}

/// Fetcher that serves predetermined responses and records every call
///
/// Unknown sources answer with status 404. The size limit is ignored, so the
/// pane's own check on fetched bytes is what rejects oversized payloads.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `source`
    #[must_use]
    pub fn with_bytes(mut self, source: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.responses.insert(source.into(), MockResponse::Bytes(bytes));
        self
    }

    /// Answer `source` with a non-success status
    #[must_use]
    pub fn with_status(mut self, source: impl Into<String>, status: u16) -> Self {
        self.responses.insert(source.into(), MockResponse::Status(status));
        self
    }

    /// Sources fetched so far, in call order
    ///
    /// # Panics
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, source: &str, _max_size: u64) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(source.to_string());
        match self.responses.get(source) {
            Some(MockResponse::Bytes(bytes)) => Ok(bytes.clone()),
            Some(MockResponse::Status(status)) => Err(FetchError::Status(*status)),
            None => Err(FetchError::Status(404)),
        }
    }
}

/// Fetcher whose fetches stay pending until [`release`](Self::release)
#[derive(Debug, Default)]
pub struct GatedFetcher {
    bytes: Vec<u8>,
    started: Notify,
    gate: Notify,
}

impl GatedFetcher {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Self::default()
        }
    }

    /// Resolve once a fetch has started and is waiting on the gate
    pub async fn started(&self) {
        self.started.notified().await;
    }

    /// Let one waiting (or the next) fetch finish
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, _source: &str, _max_size: u64) -> Result<Vec<u8>, FetchError> {
        self.started.notify_one();
        self.gate.notified().await;
        Ok(self.bytes.clone())
    }
}

/// Build a ZIP archive from `(name, content)` pairs
///
/// # Panics
/// Panics if writing to the in-memory archive fails.
#[must_use]
pub fn zip_fixture(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("Failed to write zip entry");
    }
    writer.finish().expect("Failed to finish zip").into_inner()
}

/// Build a minimal DOCX whose body holds `body_xml`
#[must_use]
pub fn docx_fixture(body_xml: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}</w:body></w:document>"#
    );
    zip_fixture(&[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
        ),
        ("word/document.xml", document.as_str()),
    ])
}

/// Build a minimal XLSX with one worksheet per `(name, rows)` entry
///
/// Every cell is written as an inline string.
#[must_use]
pub fn xlsx_fixture(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
    let mut workbook_sheets = String::new();
    let mut rels = String::new();
    let mut overrides = String::new();
    let mut worksheets = Vec::new();

    for (i, (name, rows)) in sheets.iter().enumerate() {
        let n = i + 1;
        workbook_sheets.push_str(&format!(
            r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));

        let mut data = String::new();
        for (r, row) in rows.iter().enumerate() {
            data.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                data.push_str(&format!(
                    r#"<c r="{}{}" t="inlineStr"><is><t>{value}</t></is></c>"#,
                    column_name(c),
                    r + 1
                ));
            }
            data.push_str("</row>");
        }
        worksheets.push((
            format!("xl/worksheets/sheet{n}.xml"),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
            ),
        ));
    }

    let content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
    );
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{workbook_sheets}</sheets></workbook>"#
    );
    let workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
    );
    let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    let mut parts: Vec<(&str, &str)> = vec![
        ("[Content_Types].xml", content_types.as_str()),
        ("_rels/.rels", root_rels),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_str()),
    ];
    for (name, content) in &worksheets {
        parts.push((name.as_str(), content.as_str()));
    }
    zip_fixture(&parts)
}

/// Spreadsheet column letters for a zero-based index (0 -> A, 26 -> AA)
fn column_name(index: usize) -> String {
    let mut name = String::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
    }

    #[test]
    fn test_zip_fixture_roundtrip() {
        let bytes = zip_fixture(&[("a.txt", "hello")]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive.by_name("a.txt").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello");
    }

    #[tokio::test]
    async fn test_mock_fetcher_records_calls() {
        let mock = MockFetcher::new()
            .with_bytes("a", b"1".to_vec())
            .with_status("b", 500);

        assert_eq!(mock.fetch("a", 1).await.unwrap(), b"1");
        assert!(matches!(mock.fetch("b", 1).await, Err(FetchError::Status(500))));
        assert!(matches!(mock.fetch("c", 1).await, Err(FetchError::Status(404))));
        assert_eq!(mock.calls(), vec!["a", "b", "c"]);
    }
}
