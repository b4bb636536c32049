// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX writer — a small WordprocessingML object graph (paragraphs, runs,
// breaks, tabs, inline pictures) serialised into an OOXML package.

use std::io::{Cursor, Write};

use doc2any_core::error::{Doc2AnyError, Result};
use tracing::{debug, instrument, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::pdf::{PX_TO_MM, split_paragraphs};
use crate::html::{self, HtmlVisitor, escape};
use crate::image::ImageProcessor;

/// English Metric Units per millimetre.
const EMU_PER_MM: f32 = 36_000.0;
/// A4 with one-inch margins.
const CONTENT_WIDTH_MM: f32 = 159.2;
const CONTENT_HEIGHT_MM: f32 = 246.2;

#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(String),
    Break,
    Tab,
    /// Inline picture referencing a media entry by index.
    Picture { media: usize, cx: u64, cy: u64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    pub content: Option<RunContent>,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<&'static str>,
    /// Half-points.
    pub size: Option<u32>,
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(RunContent::Text(text.into())),
            ..Self::default()
        }
    }

    fn of(content: RunContent) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: &'static str) -> Self {
        self.color = Some(color);
        self
    }

    pub fn size(mut self, half_points: u32) -> Self {
        self.size = Some(half_points);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocParagraph {
    pub runs: Vec<Run>,
    /// `Heading1`..`Heading6`.
    pub heading: Option<u8>,
    pub centred: bool,
    /// Twentieths of a point.
    pub spacing_after: Option<u32>,
}

impl DocParagraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    pub fn centred(mut self) -> Self {
        self.centred = true;
        self
    }

    pub fn heading(mut self, level: u8) -> Self {
        self.heading = Some(level.clamp(1, 6));
        self
    }

    pub fn spacing_after(mut self, twips: u32) -> Self {
        self.spacing_after = Some(twips);
        self
    }
}

#[derive(Debug, Clone)]
struct Media {
    extension: &'static str,
    bytes: Vec<u8>,
}

/// Document under construction.
#[derive(Debug, Default)]
pub struct DocxDocument {
    paragraphs: Vec<DocParagraph>,
    media: Vec<Media>,
}

impl DocxDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Centred title and provenance lines followed by an empty paragraph.
    pub fn with_provenance(original_name: &str, attribution: bool) -> Self {
        let mut doc = Self::new();
        doc.push(
            DocParagraph::new(vec![Run::text("Converted Document").bold().size(32)])
                .heading(1)
                .centred(),
        );
        doc.push(
            DocParagraph::new(vec![
                Run::text(format!("Original: {original_name}"))
                    .italic()
                    .color("666666")
                    .size(20),
            ])
            .centred(),
        );
        if attribution {
            doc.push(
                DocParagraph::new(vec![Run::text("Converted by Doc2Any").color("666666").size(18)])
                    .centred(),
            );
        }
        doc.push(DocParagraph::default());
        doc
    }

    pub fn push(&mut self, paragraph: DocParagraph) {
        self.paragraphs.push(paragraph);
    }

    pub fn paragraphs(&self) -> &[DocParagraph] {
        &self.paragraphs
    }

    /// Register picture bytes and return a run showing them at `w_mm` × `h_mm`.
    /// Formats Word cannot embed directly are re-encoded as PNG.
    pub fn add_picture(&mut self, mime: &str, bytes: Vec<u8>, w_mm: f32, h_mm: f32) -> Result<Run> {
        let (extension, bytes) = match mime {
            "image/png" => ("png", bytes),
            "image/jpeg" => ("jpeg", bytes),
            "image/gif" => ("gif", bytes),
            _ => ("png", ImageProcessor::from_bytes(&bytes)?.to_png_bytes()?),
        };
        self.media.push(Media { extension, bytes });
        Ok(Run::of(RunContent::Picture {
            media: self.media.len() - 1,
            cx: (w_mm * EMU_PER_MM).round() as u64,
            cy: (h_mm * EMU_PER_MM).round() as u64,
        }))
    }

    // -- Serialisation --------------------------------------------------------

    /// Write the OOXML package.
    #[instrument(skip(self), fields(paragraphs = self.paragraphs.len(), media = self.media.len()))]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut put = |name: &str, bytes: &[u8]| -> Result<()> {
            writer
                .start_file(name, options)
                .map_err(|err| Doc2AnyError::Archive(format!("{name}: {err}")))?;
            writer.write_all(bytes)?;
            Ok(())
        };

        put("[Content_Types].xml", self.content_types().as_bytes())?;
        put("_rels/.rels", ROOT_RELS.as_bytes())?;
        put("docProps/core.xml", CORE_PROPS.as_bytes())?;
        put("word/document.xml", self.document_xml().as_bytes())?;
        put("word/styles.xml", STYLES.as_bytes())?;
        put("word/_rels/document.xml.rels", self.document_rels().as_bytes())?;
        for (index, media) in self.media.iter().enumerate() {
            put(&media_name(index, media.extension), &media.bytes)?;
        }

        let cursor = writer
            .finish()
            .map_err(|err| Doc2AnyError::Archive(format!("failed to finish DOCX: {}", err)))?;
        let bytes = cursor.into_inner();
        debug!(bytes = bytes.len(), "DOCX package written");
        Ok(bytes)
    }

    fn content_types(&self) -> String {
        let mut defaults = String::new();
        let mut seen: Vec<&str> = Vec::new();
        for media in &self.media {
            if !seen.contains(&media.extension) {
                seen.push(media.extension);
                defaults.push_str(&format!(
                    "<Default Extension=\"{0}\" ContentType=\"image/{0}\"/>",
                    media.extension
                ));
            }
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{defaults}<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#
        )
    }

    fn document_rels(&self) -> String {
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        );
        for (index, media) in self.media.iter().enumerate() {
            rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image{}.{}"/>"#,
                media_rel_id(index),
                index + 1,
                media.extension
            ));
        }
        rels.push_str("</Relationships>");
        rels
    }

    fn document_xml(&self) -> String {
        let mut body = String::new();
        for paragraph in &self.paragraphs {
            write_paragraph(&mut body, paragraph, &self.media);
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#
        )
    }
}

fn media_rel_id(index: usize) -> String {
    format!("rId{}", index + 100)
}

fn media_name(index: usize, extension: &str) -> String {
    format!("word/media/image{}.{}", index + 1, extension)
}

fn write_paragraph(out: &mut String, paragraph: &DocParagraph, media: &[Media]) {
    out.push_str("<w:p>");
    if paragraph.heading.is_some() || paragraph.centred || paragraph.spacing_after.is_some() {
        out.push_str("<w:pPr>");
        if let Some(level) = paragraph.heading {
            out.push_str(&format!("<w:pStyle w:val=\"Heading{level}\"/>"));
        }
        if let Some(after) = paragraph.spacing_after {
            out.push_str(&format!("<w:spacing w:after=\"{after}\"/>"));
        }
        if paragraph.centred {
            out.push_str("<w:jc w:val=\"center\"/>");
        }
        out.push_str("</w:pPr>");
    }
    for run in &paragraph.runs {
        write_run(out, run, media);
    }
    out.push_str("</w:p>");
}

fn write_run(out: &mut String, run: &Run, media: &[Media]) {
    let Some(content) = &run.content else {
        return;
    };
    out.push_str("<w:r>");
    if run.bold || run.italic || run.color.is_some() || run.size.is_some() {
        out.push_str("<w:rPr>");
        if run.bold {
            out.push_str("<w:b/>");
        }
        if run.italic {
            out.push_str("<w:i/>");
        }
        if let Some(color) = run.color {
            out.push_str(&format!("<w:color w:val=\"{color}\"/>"));
        }
        if let Some(size) = run.size {
            out.push_str(&format!("<w:sz w:val=\"{size}\"/>"));
        }
        out.push_str("</w:rPr>");
    }
    match content {
        RunContent::Text(text) => {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&escape(text));
            out.push_str("</w:t>");
        }
        RunContent::Break => out.push_str("<w:br/>"),
        RunContent::Tab => out.push_str("<w:tab/>"),
        RunContent::Picture { media: index, cx, cy } => {
            let extension = media.get(*index).map_or("png", |m| m.extension);
            let id = index + 1;
            out.push_str(&format!(
                r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="image{id}.{extension}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#,
                rel = media_rel_id(*index),
            ));
        }
    }
    out.push_str("</w:r>");
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const CORE_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Converted Document</dc:title><dc:creator>Doc2Any</dc:creator></cp:coreProperties>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading4"><w:name w:val="heading 4"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="3"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading5"><w:name w:val="heading 5"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="4"/></w:pPr><w:rPr><w:b/><w:sz w:val="22"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading6"><w:name w:val="heading 6"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="5"/></w:pPr><w:rPr><w:b/><w:i/><w:sz w:val="22"/></w:rPr></w:style></w:styles>"#;

// -- Encoders -----------------------------------------------------------------

/// Runs for one line: text between tabs, tab runs between them.
fn line_runs(line: &str, size: u32, runs: &mut Vec<Run>) {
    for (index, cell) in line.split('\t').enumerate() {
        if index > 0 {
            runs.push(Run::of(RunContent::Tab).size(size));
        }
        if !cell.is_empty() {
            runs.push(Run::text(cell).size(size));
        }
    }
}

/// Provenance header, then one paragraph per blank-line block with its
/// lines joined by breaks.
#[instrument(skip(text), fields(text_len = text.len()))]
pub fn encode_docx(text: &str, original_name: &str) -> Result<Vec<u8>> {
    let mut doc = DocxDocument::with_provenance(original_name, true);
    for paragraph in split_paragraphs(text) {
        let mut runs = Vec::new();
        for (index, line) in paragraph.split('\n').enumerate() {
            if index > 0 {
                runs.push(Run::of(RunContent::Break));
            }
            line_runs(line.strip_suffix('\r').unwrap_or(line), 24, &mut runs);
        }
        doc.push(DocParagraph::new(runs).spacing_after(200));
    }
    doc.to_bytes()
}

/// Lay out an HTML fragment with embedded images as a DOCX document.
#[instrument(skip(html), fields(html_len = html.len()))]
pub fn html_to_docx(html: &str, original_name: &str) -> Result<Vec<u8>> {
    let mut builder = HtmlDocx {
        doc: DocxDocument::with_provenance(original_name, false),
        current: Vec::new(),
        heading: None,
        pictures: 0,
    };
    html::walk(html, &mut builder)?;
    builder.flush();
    debug!(pictures = builder.pictures, "HTML converted to DOCX");
    builder.doc.to_bytes()
}

struct HtmlDocx {
    doc: DocxDocument,
    current: Vec<Run>,
    heading: Option<u8>,
    pictures: usize,
}

impl HtmlDocx {
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut paragraph = DocParagraph::new(std::mem::take(&mut self.current));
        match self.heading {
            Some(level) => paragraph = paragraph.heading(level),
            None => paragraph = paragraph.spacing_after(200),
        }
        self.doc.push(paragraph);
    }
}

impl HtmlVisitor for HtmlDocx {
    type Error = Doc2AnyError;

    fn text(&mut self, text: &str) -> Result<()> {
        let run = Run::text(text);
        self.current.push(match self.heading {
            Some(_) => run.bold(),
            None => run.size(24),
        });
        Ok(())
    }

    fn heading_start(&mut self, level: u8) -> Result<()> {
        self.flush();
        self.heading = Some(level);
        Ok(())
    }

    fn heading_end(&mut self, _level: u8) -> Result<()> {
        self.flush();
        self.heading = None;
        Ok(())
    }

    fn image(&mut self, src: &str) -> Result<()> {
        let Some((mime, bytes)) = html::decode_data_uri(src) else {
            return Ok(());
        };
        let (width, height) = match image::load_from_memory(&bytes) {
            Ok(decoded) => (decoded.width(), decoded.height()),
            Err(err) => {
                warn!(error = %err, "Skipping undecodable embedded image");
                return Ok(());
            }
        };
        let (w_mm, h_mm) = clamp_mm(width, height);
        let run = self.doc.add_picture(&mime, bytes, w_mm, h_mm)?;
        self.flush();
        self.doc.push(DocParagraph::new(vec![run]));
        self.pictures += 1;
        Ok(())
    }

    fn line_break(&mut self) -> Result<()> {
        self.current.push(Run::of(RunContent::Break));
        Ok(())
    }

    fn block_end(&mut self) -> Result<()> {
        self.flush();
        Ok(())
    }
}

/// Pixel size at 96 DPI in mm, shrunk to the page content box.
fn clamp_mm(width: u32, height: u32) -> (f32, f32) {
    let mut w = width as f32 * PX_TO_MM;
    let mut h = height as f32 * PX_TO_MM;
    if w > CONTENT_WIDTH_MM {
        h *= CONTENT_WIDTH_MM / w;
        w = CONTENT_WIDTH_MM;
    }
    if h > CONTENT_HEIGHT_MM {
        w *= CONTENT_HEIGHT_MM / h;
        h = CONTENT_HEIGHT_MM;
    }
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::docx::DocxReader;
    use crate::extract::docx::tests::tiny_png;

    #[test]
    fn text_round_trips_through_reader() {
        let text = "Hello & welcome\nsecond line\n\nname\tscore";
        let bytes = encode_docx(text, "notes.txt").unwrap();
        let reader = DocxReader::from_bytes(&bytes).unwrap();
        let text = reader.to_text();
        let header = "Converted Document\n\nOriginal: notes.txt\n\nConverted by Doc2Any";
        assert!(text.starts_with(header));
        assert!(text.contains("Hello & welcome\nsecond line"));
        assert!(text.ends_with("name\tscore"));
        assert_eq!(reader.paragraphs()[0].heading, Some(1));
    }

    #[test]
    fn html_images_become_pictures() {
        let html = format!(
            "<div class=\"page\"><p>Caption</p><img src=\"{}\"></div>",
            html::data_uri("image/png", &tiny_png())
        );
        let bytes = html_to_docx(&html, "scan.pdf").unwrap();
        let reader = DocxReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.image_count(), 1);
        assert!(reader.to_text().contains("Caption"));
        assert!(reader.to_html().contains("data:image/png;base64,"));
    }

    #[test]
    fn oversized_images_are_clamped() {
        let (w, h) = clamp_mm(2000, 1000);
        assert!((w - CONTENT_WIDTH_MM).abs() < 0.01);
        assert!((h - CONTENT_WIDTH_MM / 2.0).abs() < 0.01);

        let (w, h) = clamp_mm(100, 5000);
        assert!((h - CONTENT_HEIGHT_MM).abs() < 0.01);
        assert!(w < CONTENT_WIDTH_MM);
    }

    #[test]
    fn tabs_split_runs() {
        let mut runs = Vec::new();
        line_runs("a\tb", 24, &mut runs);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1].content, Some(RunContent::Tab));
    }
}
