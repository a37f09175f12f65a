//! Word-processor documents (docx) into a styled [`Document`]
//!
//! Only the main story (`word/document.xml`) is read. Paragraph styles are
//! reduced to title, headings and list items; character styles to bold,
//! italic and underline. Tables keep their row and cell structure.

use super::error::DocumentError;
use super::surface::RenderSurface;
use super::types::{Block, Document, Paragraph, ParagraphStyle, Table, TableCell, TableRow};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

const MAIN_PART: &str = "word/document.xml";

/// Convert document bytes and mount the result on `surface`
///
/// The surface is left untouched on failure.
///
/// # Errors
///
/// Returns [`DocumentError`] if the bytes are not a ZIP package, the main
/// document part is missing, larger than `max_part_size` once decompressed,
/// or its XML is malformed.
pub fn render_into(
    bytes: &[u8],
    max_part_size: u64,
    surface: &mut RenderSurface,
) -> Result<(), DocumentError> {
    let document = convert(bytes, max_part_size)?;
    debug!(blocks = document.blocks.len(), "converted document");
    surface.mount_document(document);
    Ok(())
}

/// Convert document bytes without mounting them
///
/// # Errors
///
/// See [`render_into`].
pub fn convert(bytes: &[u8], max_part_size: u64) -> Result<Document, DocumentError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut part = archive.by_name(MAIN_PART).map_err(|e| match e {
        ZipError::FileNotFound => DocumentError::MissingPart(MAIN_PART.to_string()),
        other => DocumentError::Archive(other),
    })?;

    let too_large = || DocumentError::PartTooLarge {
        part: MAIN_PART.to_string(),
        max: max_part_size,
    };
    if part.size() > max_part_size {
        return Err(too_large());
    }

    // The declared size is not trusted; stop reading one byte past the limit
    let mut raw = Vec::new();
    (&mut part)
        .take(max_part_size.saturating_add(1))
        .read_to_end(&mut raw)?;
    if raw.len() as u64 > max_part_size {
        return Err(too_large());
    }

    let xml = String::from_utf8(raw).map_err(|e| DocumentError::Xml(e.to_string()))?;
    parse_document_xml(&xml)
}

/// Walk the WordprocessingML body
///
/// # Errors
///
/// Returns [`DocumentError::Xml`] on malformed XML.
pub fn parse_document_xml(xml: &str) -> Result<Document, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut builder = Builder::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) if builder.skips(&e) => {
                reader.read_to_end(e.name())?;
            }
            Event::Start(e) => builder.start(&e, false),
            Event::Empty(e) => builder.start(&e, true),
            Event::End(e) => builder.end(e.local_name().as_ref()),
            Event::Text(t) if builder.in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| DocumentError::Xml(e.to_string()))?;
                builder.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.finish())
}

#[derive(Debug, Default, Clone, Copy)]
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
}

/// An open paragraph and the run currently writing into it
#[derive(Debug, Default)]
struct ParagraphFrame {
    paragraph: Paragraph,
    run: Option<RunStyle>,
    /// A nested paragraph was folded in; the next text starts on a new line
    after_nested: bool,
}

#[derive(Debug, Default)]
struct TableFrame {
    rows: Vec<TableRow>,
    row: Option<TableRow>,
    cell: Option<TableCell>,
    /// Paragraphs open around the table, restored when it closes
    outer: Vec<ParagraphFrame>,
}

#[derive(Debug, Default)]
struct Builder {
    blocks: Vec<Block>,
    tables: Vec<TableFrame>,
    /// Innermost last; more than one means text-box content inside a paragraph
    paragraphs: Vec<ParagraphFrame>,
    /// One entry per open `mc:AlternateContent`: whether a choice was read
    alternates: Vec<bool>,
    in_paragraph_props: bool,
    in_run_props: bool,
    in_text: bool,
}

impl Builder {
    /// `mc:Fallback` repeats its `mc:Choice` in an older markup
    fn skips(&self, e: &BytesStart<'_>) -> bool {
        e.local_name().as_ref() == b"Fallback" && self.alternates.last() == Some(&true)
    }

    fn start(&mut self, e: &BytesStart<'_>, empty: bool) {
        match e.local_name().as_ref() {
            b"p" => {
                self.paragraphs.push(ParagraphFrame::default());
                if empty {
                    self.end(b"p");
                }
            }
            b"pPr" if !empty => self.in_paragraph_props = true,
            b"pStyle" if self.in_paragraph_props => {
                if let (Some(frame), Some(id)) = (self.paragraphs.last_mut(), val(e)) {
                    frame.paragraph.style = style_from_id(&id);
                }
            }
            b"numPr" if self.in_paragraph_props => {
                if let Some(frame) = self.paragraphs.last_mut()
                    && frame.paragraph.style == ParagraphStyle::Normal
                {
                    frame.paragraph.style = ParagraphStyle::ListItem;
                }
            }
            b"r" if !empty => {
                if let Some(frame) = self.paragraphs.last_mut() {
                    frame.run = Some(RunStyle::default());
                }
            }
            b"rPr" if !empty => self.in_run_props = true,
            b"b" | b"i" | b"u" if self.in_run_props => {
                let on = toggle_on(e);
                if let Some(run) = self.paragraphs.last_mut().and_then(|f| f.run.as_mut()) {
                    match e.local_name().as_ref() {
                        b"b" => run.bold = on,
                        b"i" => run.italic = on,
                        _ => run.underline = on,
                    }
                }
            }
            b"t" if !empty => self.in_text = true,
            b"tab" if self.in_run() => self.text("\t"),
            b"br" | b"cr" if self.in_run() => self.text("\n"),
            b"tbl" if !empty => {
                let outer = std::mem::take(&mut self.paragraphs);
                self.tables.push(TableFrame {
                    outer,
                    ..TableFrame::default()
                });
            }
            b"tr" if !empty => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.row = Some(TableRow::default());
                }
            }
            b"tc" => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.cell = Some(TableCell::default());
                }
                if empty {
                    self.end(b"tc");
                }
            }
            b"AlternateContent" if !empty => self.alternates.push(false),
            b"Choice" => {
                if let Some(taken) = self.alternates.last_mut() {
                    *taken = true;
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"p" => self.close_paragraph(),
            b"pPr" => self.in_paragraph_props = false,
            b"r" => {
                if let Some(frame) = self.paragraphs.last_mut() {
                    frame.run = None;
                }
            }
            b"rPr" => self.in_run_props = false,
            b"t" => self.in_text = false,
            b"tbl" => self.close_table(),
            b"tr" => {
                if let Some(frame) = self.tables.last_mut()
                    && let Some(row) = frame.row.take()
                {
                    frame.rows.push(row);
                }
            }
            b"tc" => {
                if let Some(frame) = self.tables.last_mut()
                    && let Some(cell) = frame.cell.take()
                {
                    frame.row.get_or_insert_with(TableRow::default).cells.push(cell);
                }
            }
            b"AlternateContent" => {
                self.alternates.pop();
            }
            _ => {}
        }
    }

    fn in_run(&self) -> bool {
        self.paragraphs.last().is_some_and(|f| f.run.is_some())
    }

    fn text(&mut self, text: &str) {
        let Some(frame) = self.paragraphs.last_mut() else {
            return;
        };
        let style = frame.run.unwrap_or_default();
        if frame.after_nested && !text.is_empty() {
            frame.paragraph.push_text("\n", style.bold, style.italic, style.underline);
            frame.after_nested = false;
        }
        frame
            .paragraph
            .push_text(text, style.bold, style.italic, style.underline);
    }

    /// Finish the innermost paragraph
    ///
    /// A paragraph nested in another one (text boxes, shapes) is folded into
    /// its parent on its own line, keeping document order.
    fn close_paragraph(&mut self) {
        let Some(done) = self.paragraphs.pop() else {
            return;
        };
        let Some(parent) = self.paragraphs.last_mut() else {
            self.push_block(Block::Paragraph(done.paragraph));
            return;
        };

        if done.paragraph.runs.is_empty() {
            return;
        }
        if !parent.paragraph.runs.is_empty() {
            parent.paragraph.push_text("\n", false, false, false);
        }
        for run in done.paragraph.runs {
            parent
                .paragraph
                .push_text(&run.text, run.bold, run.italic, run.underline);
        }
        parent.after_nested = true;
    }

    fn close_table(&mut self) {
        if self.tables.is_empty() {
            return;
        }
        // Paragraphs left open inside the table belong to its current cell
        while !self.paragraphs.is_empty() {
            self.close_paragraph();
        }
        let Some(mut frame) = self.tables.pop() else {
            return;
        };
        if let Some(cell) = frame.cell.take() {
            frame.row.get_or_insert_with(TableRow::default).cells.push(cell);
        }
        if let Some(row) = frame.row.take() {
            frame.rows.push(row);
        }
        self.paragraphs = frame.outer;
        self.push_block(Block::Table(Table { rows: frame.rows }));
    }

    /// Route a finished block into the innermost open table cell, if any
    fn push_block(&mut self, block: Block) {
        if let Some(frame) = self.tables.last_mut()
            && let Some(cell) = frame.cell.as_mut()
        {
            cell.blocks.push(block);
            return;
        }
        self.blocks.push(block);
    }

    fn finish(mut self) -> Document {
        // Unterminated elements still carry whatever content was completed
        while !self.tables.is_empty() {
            self.close_table();
        }
        while !self.paragraphs.is_empty() {
            self.close_paragraph();
        }
        Document {
            blocks: self.blocks,
        }
    }
}

/// Value of a `w:val` attribute, namespace prefix ignored
fn val(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"val")
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Toggle properties are on unless `w:val` says otherwise
fn toggle_on(e: &BytesStart<'_>) -> bool {
    !matches!(
        val(e).as_deref(),
        Some("0" | "false" | "off" | "none")
    )
}

fn style_from_id(id: &str) -> ParagraphStyle {
    let lower = id.to_ascii_lowercase();
    if lower == "title" {
        return ParagraphStyle::Title;
    }
    if let Some(level) = lower.strip_prefix("heading")
        && let Ok(level) = level.trim().parse::<u8>()
        && (1..=9).contains(&level)
    {
        return ParagraphStyle::Heading(level);
    }
    if lower.starts_with("list") {
        return ParagraphStyle::ListItem;
    }
    ParagraphStyle::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::docx_fixture;

    const LIMIT: u64 = 1024 * 1024;

    const BODY: &str = r#"
        <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Quarterly report</w:t></w:r></w:p>
        <w:p>
          <w:r><w:t xml:space="preserve">Revenue is </w:t></w:r>
          <w:r><w:rPr><w:b/></w:rPr><w:t>up</w:t></w:r>
          <w:r><w:rPr><w:i/><w:b w:val="0"/></w:rPr><w:t xml:space="preserve"> again &amp; again</w:t></w:r>
        </w:p>
        <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/></w:numPr></w:pPr><w:r><w:t>first point</w:t></w:r></w:p>
        <w:tbl>
          <w:tr><w:tc><w:p><w:r><w:t>k</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>v</w:t></w:r></w:p></w:tc></w:tr>
          <w:tr><w:tc><w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>
        </w:tbl>
        <w:p/>
    "#;

    #[test]
    fn test_render_into_mounts_document() {
        let bytes = docx_fixture(BODY);
        let mut surface = RenderSurface::new();

        render_into(&bytes, LIMIT, &mut surface).unwrap();

        let doc = surface.document().expect("document mounted");
        assert_eq!(doc.blocks.len(), 5);
    }

    #[test]
    fn test_heading_and_run_styles() {
        let doc = convert(&docx_fixture(BODY), LIMIT).unwrap();
        let paragraphs: Vec<&Paragraph> = doc.paragraphs().collect();

        assert_eq!(paragraphs[0].style, ParagraphStyle::Heading(1));
        assert_eq!(paragraphs[0].text(), "Quarterly report");

        let runs = &paragraphs[1].runs;
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "Revenue is ");
        assert!(!runs[0].bold);
        assert!(runs[1].bold);
        assert_eq!(runs[2].text, " again & again");
        assert!(runs[2].italic);
        assert!(!runs[2].bold);

        assert_eq!(paragraphs[2].style, ParagraphStyle::ListItem);
    }

    #[test]
    fn test_table_structure() {
        let doc = convert(&docx_fixture(BODY), LIMIT).unwrap();
        let table = doc
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Table(t) => Some(t),
                Block::Paragraph(_) => None,
            })
            .expect("table present");

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells[0].text(), "k");
        assert_eq!(table.rows[0].cells[1].text(), "v");
        assert_eq!(table.rows[1].cells[0].text(), "a\tb");
        assert_eq!(table.rows[1].cells[1].text(), "");
    }

    #[test]
    fn test_nested_table_stays_in_cell() {
        let xml = r#"<w:document xmlns:w="w"><w:body><w:tbl><w:tr><w:tc>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
            <w:p/>
        </w:tc></w:tr></w:tbl></w:body></w:document>"#;

        let doc = parse_document_xml(xml).unwrap();
        assert_eq!(doc.blocks.len(), 1);
        let Block::Table(outer) = &doc.blocks[0] else {
            panic!("Expected outer table");
        };
        let cell = &outer.rows[0].cells[0];
        assert!(matches!(cell.blocks[0], Block::Table(_)));
        assert_eq!(cell.text(), "| inner | ");
    }

    #[test]
    fn test_text_box_folds_into_enclosing_paragraph() {
        let xml = r#"<w:document xmlns:w="w" xmlns:v="v"><w:body>
            <w:p>
              <w:r><w:t>before</w:t></w:r>
              <w:r><w:pict><v:shape><v:textbox><w:txbxContent>
                <w:p><w:r><w:rPr><w:b/></w:rPr><w:t>box</w:t></w:r></w:p>
                <w:p><w:r><w:t>second line</w:t></w:r></w:p>
              </w:txbxContent></v:textbox></v:shape></w:pict></w:r>
              <w:r><w:t>after</w:t></w:r>
            </w:p>
            <w:p><w:r><w:t>next</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let doc = parse_document_xml(xml).unwrap();
        let paragraphs: Vec<&Paragraph> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text(), "before\nbox\nsecond line\nafter");
        assert!(paragraphs[0].runs.iter().any(|r| r.text == "box" && r.bold));
        assert_eq!(paragraphs[1].text(), "next");
    }

    #[test]
    fn test_alternate_content_read_once() {
        let xml = r#"<w:document xmlns:w="w" xmlns:mc="mc"><w:body>
            <w:p>
              <w:r><w:t xml:space="preserve">see </w:t></w:r>
              <w:r><mc:AlternateContent>
                <mc:Choice Requires="wps"><w:drawing><w:txbxContent>
                  <w:p><w:r><w:t>caption</w:t></w:r></w:p>
                </w:txbxContent></w:drawing></mc:Choice>
                <mc:Fallback><w:pict><w:txbxContent>
                  <w:p><w:r><w:t>caption</w:t></w:r></w:p>
                </w:txbxContent></w:pict></mc:Fallback>
              </mc:AlternateContent></w:r>
            </w:p>
        </w:body></w:document>"#;

        let doc = parse_document_xml(xml).unwrap();
        let text = doc.paragraphs().map(Paragraph::text).collect::<Vec<_>>().join("|");
        assert_eq!(text, "see \ncaption");
    }

    #[test]
    fn test_fallback_read_without_choice() {
        let xml = r#"<w:document xmlns:w="w" xmlns:mc="mc"><w:body>
            <mc:AlternateContent><mc:Fallback>
              <w:p><w:r><w:t>only fallback</w:t></w:r></w:p>
            </mc:Fallback></mc:AlternateContent>
        </w:body></w:document>"#;

        let doc = parse_document_xml(xml).unwrap();
        assert_eq!(doc.paragraphs().next().map(Paragraph::text).as_deref(), Some("only fallback"));
    }

    #[test]
    fn test_table_inside_paragraph_keeps_surrounding_text() {
        let xml = r#"<w:document xmlns:w="w"><w:body>
            <w:p><w:r><w:t>lead</w:t></w:r><w:r><w:txbxContent>
              <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
            </w:txbxContent></w:r><w:r><w:t>tail</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let doc = parse_document_xml(xml).unwrap();
        assert_eq!(doc.blocks.len(), 2);
        let Block::Table(table) = &doc.blocks[0] else {
            panic!("Expected table first");
        };
        assert_eq!(table.rows[0].cells[0].text(), "cell");
        let Block::Paragraph(p) = &doc.blocks[1] else {
            panic!("Expected paragraph");
        };
        assert_eq!(p.text(), "leadtail");
    }

    #[test]
    fn test_oversized_part_rejected() {
        let filler = "<w:p><w:r><w:t>aaaaaaaaaaaaaaaa</w:t></w:r></w:p>".repeat(4096);
        let bytes = docx_fixture(&filler);

        let err = convert(&bytes, 64 * 1024).unwrap_err();
        assert!(matches!(err, DocumentError::PartTooLarge { max: 65536, .. }));
        assert!(convert(&bytes, LIMIT).is_ok());
    }

    #[test]
    fn test_not_a_zip() {
        let err = convert(b"\xd0\xcf\x11\xe0 legacy binary", LIMIT).unwrap_err();
        assert!(matches!(err, DocumentError::Archive(_)));
    }

    #[test]
    fn test_missing_main_part() {
        let bytes = crate::testing::zip_fixture(&[("word/other.xml", "<x/>")]);
        let err = convert(&bytes, LIMIT).unwrap_err();
        assert!(matches!(err, DocumentError::MissingPart(_)));
    }

    #[test]
    fn test_surface_untouched_on_failure() {
        let mut surface = RenderSurface::new();
        assert!(render_into(b"nope", LIMIT, &mut surface).is_err());
        assert!(surface.is_empty());
    }

    #[test]
    fn test_style_ids() {
        assert_eq!(style_from_id("Title"), ParagraphStyle::Title);
        assert_eq!(style_from_id("Heading3"), ParagraphStyle::Heading(3));
        assert_eq!(style_from_id("heading 2"), ParagraphStyle::Heading(2));
        assert_eq!(style_from_id("ListBullet"), ParagraphStyle::ListItem);
        assert_eq!(style_from_id("BodyText"), ParagraphStyle::Normal);
    }
}
