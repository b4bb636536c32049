// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX reader — paragraphs, headings, breaks and embedded images from a
// WordprocessingML package.

use std::collections::HashMap;

use doc2any_core::error::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument, warn};

use super::archive::{self, Package, attr_local, xml_err};
use crate::html;

/// Inline content of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Tab,
    Break,
    /// Relationship id of an embedded picture.
    Image(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Heading level from a `Heading1`..`Heading6` or `Title` style.
    pub heading: Option<u8>,
    pub pieces: Vec<Piece>,
}

impl Paragraph {
    /// Paragraph text with tabs and breaks, pictures omitted.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Tab => out.push('\t'),
                Piece::Break => out.push('\n'),
                Piece::Image(_) => {}
            }
        }
        out
    }
}

/// An image part resolved through the document relationships.
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Parsed body of a DOCX document.
pub struct DocxReader {
    paragraphs: Vec<Paragraph>,
    media: HashMap<String, MediaPart>,
}

impl DocxReader {
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut package = archive::open(data)?;
        let document = archive::read_string(&mut package, "word/document.xml")?;
        let paragraphs = parse_document(&document)?;
        let media = load_media(&mut package);

        debug!(
            paragraphs = paragraphs.len(),
            media = media.len(),
            "DOCX parsed"
        );
        Ok(Self { paragraphs, media })
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Pictures that resolve to a decodable media part.
    pub fn image_count(&self) -> usize {
        self.paragraphs
            .iter()
            .flat_map(|p| &p.pieces)
            .filter(|piece| matches!(piece, Piece::Image(id) if self.media.contains_key(id)))
            .count()
    }

    /// Non-empty paragraphs separated by a blank line.
    pub fn to_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Semantic HTML with headings, paragraphs, line breaks and data-URI
    /// images.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for paragraph in &self.paragraphs {
            if paragraph.pieces.is_empty() {
                continue;
            }
            let tag = match paragraph.heading {
                Some(level) => format!("h{level}"),
                None => "p".to_string(),
            };
            out.push('<');
            out.push_str(&tag);
            out.push('>');
            for piece in &paragraph.pieces {
                match piece {
                    Piece::Text(text) => out.push_str(&html::escape(text)),
                    Piece::Tab => out.push('\t'),
                    Piece::Break => out.push_str("<br>"),
                    Piece::Image(id) => match self.media.get(id) {
                        Some(part) => {
                            out.push_str("<img src=\"");
                            out.push_str(&html::data_uri(part.mime, &part.bytes));
                            out.push_str("\">");
                        }
                        None => warn!(rel_id = %id, "picture without media part"),
                    },
                }
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push_str(">\n");
        }
        out
    }
}

fn heading_from_style(style: &str) -> Option<u8> {
    if style.eq_ignore_ascii_case("title") {
        return Some(1);
    }
    let level = style
        .strip_prefix("Heading")
        .or_else(|| style.strip_prefix("heading"))?
        .trim()
        .parse::<u8>()
        .ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn picture_ref(element: &BytesStart<'_>) -> Option<String> {
    match element.local_name().as_ref() {
        b"blip" => attr_local(element, b"embed"),
        b"imagedata" => attr_local(element, b"id"),
        _ => None,
    }
}

fn parse_document(xml: &str) -> Result<Vec<Paragraph>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<Paragraph> = None;
    let mut in_text = false;
    let mut in_props = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current = Some(Paragraph::default()),
                b"w:pPr" => in_props = true,
                b"w:t" => in_text = true,
                _ => {
                    if let (Some(id), Some(p)) = (picture_ref(&e), current.as_mut()) {
                        p.pieces.push(Piece::Image(id));
                    }
                }
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(Paragraph::default()),
                b"w:pStyle" => {
                    if let (Some(style), Some(p)) = (attr_local(&e, b"val"), current.as_mut()) {
                        p.heading = heading_from_style(&style);
                    }
                }
                b"w:tab" if !in_props => {
                    if let Some(p) = current.as_mut() {
                        p.pieces.push(Piece::Tab);
                    }
                }
                b"w:br" | b"w:cr" => {
                    if let Some(p) = current.as_mut() {
                        p.pieces.push(Piece::Break);
                    }
                }
                _ => {
                    if let (Some(id), Some(p)) = (picture_ref(&e), current.as_mut()) {
                        p.pieces.push(Piece::Image(id));
                    }
                }
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(xml_err)?;
                if let Some(p) = current.as_mut() {
                    match p.pieces.last_mut() {
                        Some(Piece::Text(prev)) => prev.push_str(&text),
                        _ => p.pieces.push(Piece::Text(text.into_owned())),
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                b"w:pPr" => in_props = false,
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

/// Image relationships of the main document, loaded and sniffed. Parts
/// that cannot be identified as raster images are skipped.
fn load_media(package: &mut Package<'_>) -> HashMap<String, MediaPart> {
    let mut media = HashMap::new();
    let rels = match archive::read_string(package, "word/_rels/document.xml.rels") {
        Ok(rels) => rels,
        Err(_) => return media,
    };

    let mut targets = Vec::new();
    let mut reader = Reader::from_str(&rels);
    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let external = attr_local(&e, b"TargetMode").is_some_and(|m| m == "External");
                let is_image = attr_local(&e, b"Type").is_some_and(|t| t.ends_with("/image"));
                if let (false, true, Some(id), Some(target)) = (
                    external,
                    is_image,
                    attr_local(&e, b"Id"),
                    attr_local(&e, b"Target"),
                ) {
                    targets.push((id, target));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                warn!(error = %err, "unreadable document relationships");
                break;
            }
            _ => {}
        }
    }

    for (id, target) in targets {
        let path = match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("word/{target}"),
        };
        let Ok(bytes) = archive::read_bytes(package, &path) else {
            warn!(%path, "missing media part");
            continue;
        };
        match image::guess_format(&bytes) {
            Ok(format) => {
                media.insert(
                    id,
                    MediaPart {
                        mime: format.to_mime_type(),
                        bytes,
                    },
                );
            }
            Err(_) => debug!(%path, "skipping non-raster media"),
        }
    }
    media
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extract::archive::tests::build_zip;

    pub(crate) fn tiny_png() -> Vec<u8> {
        let image = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            8,
            6,
            image::Rgba([0, 128, 255, 255]),
        ));
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    const BODY_NO_IMAGES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:pPr><w:pStyle w:val="Heading2"/><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Intro</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Fish &amp; chips</w:t></w:r><w:r><w:tab/><w:t>tab</w:t><w:br/><w:t>next</w:t></w:r></w:p>
<w:p/>
</w:body>
</w:document>"#;

    const BODY_WITH_IMAGE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
 xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
 xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<w:body>
<w:p><w:r><w:t>Before</w:t></w:r></w:p>
<w:p><w:r><w:drawing><a:graphic><a:graphicData><a:blip r:embed="rId7"/></a:graphicData></a:graphic></w:drawing></w:r></w:p>
</w:body>
</w:document>"#;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
<Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;

    pub(crate) fn docx_without_images() -> Vec<u8> {
        build_zip(&[("word/document.xml", BODY_NO_IMAGES.as_bytes())])
    }

    pub(crate) fn docx_with_image() -> Vec<u8> {
        let png = tiny_png();
        build_zip(&[
            ("word/document.xml", BODY_WITH_IMAGE.as_bytes()),
            ("word/_rels/document.xml.rels", RELS.as_bytes()),
            ("word/media/image1.png", &png),
        ])
    }

    #[test]
    fn paragraphs_headings_tabs_and_breaks() {
        let reader = DocxReader::from_bytes(&docx_without_images()).unwrap();
        let paragraphs = reader.paragraphs();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0].heading, Some(2));
        assert_eq!(paragraphs[0].text(), "Intro");
        assert_eq!(paragraphs[1].text(), "Fish & chips\ttab\nnext");
        assert_eq!(reader.to_text(), "Intro\n\nFish & chips\ttab\nnext");
        assert_eq!(reader.image_count(), 0);
    }

    #[test]
    fn html_escapes_and_marks_headings() {
        let reader = DocxReader::from_bytes(&docx_without_images()).unwrap();
        let html = reader.to_html();
        assert!(html.contains("<h2>Intro</h2>"));
        assert!(html.contains("<p>Fish &amp; chips\ttab<br>next</p>"));
    }

    #[test]
    fn images_resolve_through_relationships() {
        let reader = DocxReader::from_bytes(&docx_with_image()).unwrap();
        assert_eq!(reader.image_count(), 1);
        let html = reader.to_html();
        assert!(html.contains("<p>Before</p>"));
        assert!(html.contains("<img src=\"data:image/png;base64,"));
    }

    #[test]
    fn heading_styles() {
        assert_eq!(heading_from_style("Heading1"), Some(1));
        assert_eq!(heading_from_style("heading 3"), Some(3));
        assert_eq!(heading_from_style("Title"), Some(1));
        assert_eq!(heading_from_style("Normal"), None);
        assert_eq!(heading_from_style("Heading9"), None);
    }
}
