// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PPTX writer — a title slide plus content slides filled paragraph by
// paragraph up to a character budget, in a minimal 16:9 PresentationML
// package (one master, one blank layout, one theme).

use std::io::{Cursor, Write};

use doc2any_core::error::{Doc2AnyError, Result};
use tracing::{debug, instrument};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::html::escape;

const EMU_PER_INCH: f64 = 914_400.0;
const SLIDE_CX: i64 = 9_144_000;
const SLIDE_CY: i64 = 5_143_500;

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Blank-line separated paragraphs with their inner spacing intact. Only
/// the stray newlines of a wider break are stripped.
fn slide_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n")
        .map(|p| p.trim_matches(['\r', '\n']))
        .filter(|p| !p.trim().is_empty())
}

/// Group paragraphs into slide texts. A paragraph is never split; a new
/// slide starts when adding the next paragraph (and its separator) would
/// pass `budget` characters and the current slide already holds something.
pub fn chunk_slides(text: &str, budget: usize) -> Vec<String> {
    let mut slides = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in slide_paragraphs(text) {
        let len = paragraph.chars().count();
        if !current.is_empty() && current_len + 2 + len > budget {
            slides.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(paragraph);
        current_len += len;
    }
    if !current.trim().is_empty() {
        slides.push(current);
    }
    slides
}

struct TextBox<'a> {
    id: u32,
    name: &'a str,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    text: &'a str,
    /// Points.
    size: u32,
    bold: bool,
    italic: bool,
    color: &'a str,
    align: &'a str,
    anchor: &'a str,
}

impl TextBox<'_> {
    fn to_xml(&self) -> String {
        let bold = if self.bold { " b=\"1\"" } else { "" };
        let italic = if self.italic { " i=\"1\"" } else { "" };
        let paragraphs: String = self
            .text
            .split('\n')
            .map(|line| {
                let run = if line.is_empty() {
                    String::new()
                } else {
                    format!(
                        "<a:r><a:rPr lang=\"en-US\" sz=\"{size}\"{bold}{italic} dirty=\"0\"><a:solidFill><a:srgbClr val=\"{color}\"/></a:solidFill></a:rPr><a:t>{text}</a:t></a:r>",
                        size = self.size * 100,
                        color = self.color,
                        text = escape(line),
                    )
                };
                format!("<a:p><a:pPr algn=\"{}\"/>{run}</a:p>", self.align)
            })
            .collect();

        format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{name}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x=\"{x}\" y=\"{y}\"/><a:ext cx=\"{w}\" cy=\"{h}\"/></a:xfrm><a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap=\"square\" rtlCol=\"0\" anchor=\"{anchor}\"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>",
            id = self.id,
            name = self.name,
            x = emu(self.x),
            y = emu(self.y),
            w = emu(self.w),
            h = emu(self.h),
            anchor = self.anchor,
        )
    }
}

fn slide_xml(shapes: &[TextBox<'_>]) -> String {
    let shapes: String = shapes.iter().map(TextBox::to_xml).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS}><p:cSld><p:spTree>{GROUP}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

fn title_slide(original_name: &str) -> String {
    let original = format!("Original: {original_name}");
    slide_xml(&[
        TextBox {
            id: 2,
            name: "Title",
            x: 0.5,
            y: 2.0,
            w: 9.0,
            h: 1.0,
            text: "Converted Document",
            size: 36,
            bold: true,
            italic: false,
            color: "363636",
            align: "ctr",
            anchor: "ctr",
        },
        TextBox {
            id: 3,
            name: "Original",
            x: 0.5,
            y: 3.2,
            w: 9.0,
            h: 0.5,
            text: &original,
            size: 14,
            bold: false,
            italic: true,
            color: "666666",
            align: "ctr",
            anchor: "ctr",
        },
        TextBox {
            id: 4,
            name: "Attribution",
            x: 0.5,
            y: 3.7,
            w: 9.0,
            h: 0.5,
            text: "Converted by Doc2Any",
            size: 12,
            bold: false,
            italic: false,
            color: "999999",
            align: "ctr",
            anchor: "ctr",
        },
    ])
}

fn content_slide(text: &str, page: usize) -> String {
    let footer = format!("Page {page}");
    slide_xml(&[
        TextBox {
            id: 2,
            name: "Content",
            x: 0.5,
            y: 0.5,
            w: 9.0,
            h: 4.78,
            text,
            size: 14,
            bold: false,
            italic: false,
            color: "363636",
            align: "l",
            anchor: "t",
        },
        TextBox {
            id: 3,
            name: "Footer",
            x: 0.5,
            y: 5.0,
            w: 9.0,
            h: 0.3,
            text: &footer,
            size: 10,
            bold: false,
            italic: false,
            color: "999999",
            align: "r",
            anchor: "ctr",
        },
    ])
}

#[instrument(skip(text), fields(text_len = text.len()))]
pub fn encode_pptx(text: &str, original_name: &str, char_budget: usize) -> Result<Vec<u8>> {
    let chunks = chunk_slides(text, char_budget);
    let mut slides = vec![title_slide(original_name)];
    slides.extend(
        chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| content_slide(chunk, index + 1)),
    );

    let mut parts: Vec<(String, String)> = vec![
        ("[Content_Types].xml".into(), content_types(slides.len())),
        ("_rels/.rels".into(), ROOT_RELS.into()),
        ("docProps/core.xml".into(), core_props(original_name)),
        ("ppt/presentation.xml".into(), presentation(slides.len())),
        ("ppt/_rels/presentation.xml.rels".into(), presentation_rels(slides.len())),
        ("ppt/slideMasters/slideMaster1.xml".into(), master()),
        ("ppt/slideMasters/_rels/slideMaster1.xml.rels".into(), MASTER_RELS.into()),
        ("ppt/slideLayouts/slideLayout1.xml".into(), layout()),
        ("ppt/slideLayouts/_rels/slideLayout1.xml.rels".into(), LAYOUT_RELS.into()),
        ("ppt/theme/theme1.xml".into(), THEME.into()),
    ];
    for (index, slide) in slides.into_iter().enumerate() {
        let number = index + 1;
        parts.push((format!("ppt/slides/slide{number}.xml"), slide));
        parts.push((format!("ppt/slides/_rels/slide{number}.xml.rels"), SLIDE_RELS.into()));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in &parts {
        writer
            .start_file(name.as_str(), options)
            .map_err(|err| Doc2AnyError::Archive(format!("{name}: {err}")))?;
        writer.write_all(contents.as_bytes())?;
    }
    let bytes = writer
        .finish()
        .map_err(|err| Doc2AnyError::Archive(format!("failed to finish PPTX: {}", err)))?
        .into_inner();
    debug!(content_slides = chunks.len(), bytes = bytes.len(), "PPTX package written");
    Ok(bytes)
}

// -- Package parts ------------------------------------------------------------

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const GROUP: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

fn content_types(slides: usize) -> String {
    let overrides: String = (1..=slides)
        .map(|n| {
            format!(
                "<Override PartName=\"/ppt/slides/slide{n}.xml\" \
                 ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>{overrides}</Types>"#
    )
}

fn core_props(original_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Converted Document</dc:title><dc:subject>Converted from {}</dc:subject><dc:creator>Doc2Any</dc:creator></cp:coreProperties>"#,
        escape(original_name)
    )
}

/// Slides take relationship ids from rId3 upwards; rId1 is the master and
/// rId2 the theme.
fn presentation(slides: usize) -> String {
    let ids: String = (0..slides)
        .map(|i| format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 256 + i, i + 3))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="{SLIDE_CX}" cy="{SLIDE_CY}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn presentation_rels(slides: usize) -> String {
    let slide_rels: String = (0..slides)
        .map(|i| {
            format!(
                "<Relationship Id=\"rId{}\" \
                 Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" \
                 Target=\"slides/slide{}.xml\"/>",
                i + 3,
                i + 1
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>{slide_rels}</Relationships>"#
    )
}

fn master() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster {NS}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{GROUP}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn layout() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout {NS} type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{GROUP}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const MASTER_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#;

const LAYOUT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#;

const SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#;

const THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Doc2Any"><a:themeElements><a:clrScheme name="Doc2Any"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Doc2Any"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Doc2Any"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::package::extract_pptx;

    #[test]
    fn chunks_break_only_between_paragraphs() {
        let a = "a".repeat(900);
        let b = "b".repeat(900);
        let c = "c".repeat(100);
        let text = format!("{a}\n\n{b}\n\n{c}");
        let slides = chunk_slides(&text, 1500);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0], a);
        assert_eq!(slides[1], format!("{b}\n\n{c}"));
    }

    #[test]
    fn oversized_paragraph_gets_its_own_slide() {
        let long = "x".repeat(2000);
        let slides = chunk_slides(&format!("short\n\n{long}\n\ntail"), 1500);
        assert_eq!(slides, vec!["short".to_string(), long, "tail".to_string()]);
        assert!(chunk_slides("  \n\n ", 1500).is_empty());
    }

    #[test]
    fn separator_counts_against_the_budget() {
        let a = "a".repeat(750);
        let b = "b".repeat(749);
        let slides = chunk_slides(&format!("{a}\n\n{b}"), 1500);
        assert_eq!(slides, vec![a.clone(), b.clone()]);
        assert!(slides.iter().all(|s| s.chars().count() <= 1500));

        let b = "b".repeat(748);
        let slides = chunk_slides(&format!("{a}\n\n{b}"), 1500);
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].chars().count(), 1500);
    }

    #[test]
    fn paragraph_indentation_survives_chunking() {
        let slides = chunk_slides("  indented line  \n\n\n- item one\n  - nested", 1500);
        assert_eq!(slides, vec!["  indented line  \n\n- item one\n  - nested".to_string()]);
    }

    #[test]
    fn deck_reads_back_with_footers() {
        let bytes = encode_pptx("First point\n\nSecond & last", "deck.txt", 1500).unwrap();
        let text = extract_pptx(&bytes).unwrap();
        assert_eq!(
            text,
            "--- Slide 1 ---\nConverted Document Original: deck.txt Converted by Doc2Any\n\n\
             --- Slide 2 ---\nFirst point Second & last Page 1"
        );
    }

    #[test]
    fn presentation_lists_every_slide() {
        let xml = presentation(3);
        assert!(xml.contains("r:id=\"rId5\""));
        assert!(xml.contains(&format!("cx=\"{SLIDE_CX}\" cy=\"{SLIDE_CY}\"")));
    }
}
