// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODT text — zipped packages (`content.xml`) and flat XML documents.

use doc2any_core::error::Result;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::instrument;

use super::archive::{self, xml_err};

pub const NO_DOCUMENT_TEXT: &str = "[No text content found in document]";

/// Document text: paragraph and heading starts become newlines, line breaks
/// newlines, tabs tabs, `<text:s/>` a space. Text nodes are unescaped on their
/// own, so escaped markup in the content stays literal text.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn extract_odt(data: &[u8]) -> Result<String> {
    let xml = if data.starts_with(b"PK") {
        let mut package = archive::open(data)?;
        archive::read_string(&mut package, "content.xml")?
    } else {
        String::from_utf8_lossy(data).into_owned()
    };

    let text = flatten(&xml)?;
    let trimmed = text.trim();
    Ok(if trimmed.is_empty() {
        NO_DOCUMENT_TEXT.to_string()
    } else {
        trimmed.to_string()
    })
}

fn flatten(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    // Text outside <office:body> belongs to styles and metadata; whitespace
    // between paragraphs is layout only.
    let mut in_body = false;
    let mut paragraph_depth = 0usize;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.name().as_ref() {
                b"office:body" => in_body = true,
                b"text:p" | b"text:h" if in_body => {
                    out.push('\n');
                    paragraph_depth += 1;
                }
                _ => {}
            },
            Event::Empty(e) if in_body => match e.name().as_ref() {
                b"text:p" | b"text:h" | b"text:line-break" => out.push('\n'),
                b"text:tab" => out.push('\t'),
                b"text:s" => out.push(' '),
                _ => {}
            },
            Event::Text(t) if in_body && paragraph_depth > 0 => {
                out.push_str(&t.unescape().map_err(xml_err)?)
            }
            Event::End(e) => match e.name().as_ref() {
                b"office:body" => in_body = false,
                b"text:p" | b"text:h" => paragraph_depth = paragraph_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::archive::tests::build_zip;

    const CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="o" xmlns:text="t">
<office:automatic-styles><style:style name="P1">ignored</style:style></office:automatic-styles>
<office:body><office:text><text:h>Title</text:h><text:p>First<text:line-break/>line<text:tab/>tabbed</text:p><text:p>&lt;b&gt;not bold&lt;/b&gt; &amp; more</text:p></office:text></office:body>
</office:document-content>"#;

    #[test]
    fn zipped_content_is_flattened() {
        let data = build_zip(&[
            ("mimetype", b"application/vnd.oasis.opendocument.text"),
            ("content.xml", CONTENT.as_bytes()),
        ]);
        assert_eq!(
            extract_odt(&data).unwrap(),
            "Title\nFirst\nline\ttabbed\n<b>not bold</b> & more"
        );
    }

    #[test]
    fn flat_xml_is_read_directly() {
        let text = extract_odt(CONTENT.as_bytes()).unwrap();
        assert!(text.starts_with("Title\n"));
        assert!(!text.contains("ignored"));
    }

    #[test]
    fn empty_body_uses_placeholder() {
        let xml = r#"<office:document xmlns:office="o"><office:body><office:text/></office:body></office:document>"#;
        assert_eq!(extract_odt(xml.as_bytes()).unwrap(), NO_DOCUMENT_TEXT);
    }
}
