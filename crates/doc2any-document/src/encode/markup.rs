// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markup encoders: standalone HTML pages, RTF and flat ODF text (FODT).

use crate::html::escape;

use super::pdf::split_paragraphs;

const PAGE_STYLE: &str = "\
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            line-height: 1.6;
            max-width: 800px;
            margin: 0 auto;
            padding: 40px 20px;
            color: #333;
            background: #f9f9f9;
        }
        .header {
            text-align: center;
            margin-bottom: 30px;
            padding-bottom: 20px;
            border-bottom: 2px solid #e0e0e0;
        }
        .header h1 { margin: 0 0 10px 0; color: #2c3e50; }
        .header p { margin: 0; color: #7f8c8d; font-size: 14px; }
        .content {
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        .content p { margin: 0 0 15px 0; }
        .content img { max-width: 100%; height: auto; }
        .footer { text-align: center; margin-top: 30px; color: #95a5a6; font-size: 12px; }";

// -- HTML ---------------------------------------------------------------------

/// Escape text into paragraph markup: blank-line runs close the paragraph,
/// single newlines become `<br>`.
pub fn text_to_paragraphs(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut newlines = 0usize;
    let flush = |out: &mut String, newlines: usize| match newlines {
        0 => {}
        1 => out.push_str("<br>"),
        _ => out.push_str("</p><p>"),
    };
    for ch in escape_markup(text).chars() {
        if ch == '\n' {
            newlines += 1;
            continue;
        }
        flush(&mut out, newlines);
        newlines = 0;
        out.push(ch);
    }
    flush(&mut out, newlines);
    out
}

/// `&`, `<` and `>` only, leaving quotes as typed.
fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn page(original_name: &str, body: &str) -> String {
    let name = escape(original_name);
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>{name} - Converted by Doc2Any</title>
    <style>
{PAGE_STYLE}
    </style>
</head>
<body>
    <div class=\"header\">
        <h1>Converted Document</h1>
        <p>Original: {name}</p>
    </div>
    <div class=\"content\">
{body}
    </div>
    <div class=\"footer\">
        Converted by Doc2Any File Converter
    </div>
</body>
</html>"
    )
}

/// Styled standalone page around escaped plain text.
pub fn encode_html(text: &str, original_name: &str) -> String {
    page(original_name, &format!("        <p>{}</p>", text_to_paragraphs(text)))
}

/// Styled standalone page around an already-structured fragment.
pub fn encode_semantic_html(fragment: &str, original_name: &str) -> String {
    page(original_name, fragment)
}

// -- RTF ----------------------------------------------------------------------

/// Escape `\`, `{` and `}`. Characters outside ASCII become `\uN?` escapes.
pub fn escape_rtf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // RTF reads the parameter as a signed 16-bit value.
                    out.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
    out
}

/// Escaped body with blank-line runs as `\par\par` and single newlines as
/// `\line`.
fn rtf_body(text: &str) -> String {
    let escaped = escape_rtf(text);
    let mut out = String::with_capacity(escaped.len());
    let mut newlines = 0usize;
    let flush = |out: &mut String, newlines: usize| match newlines {
        0 => {}
        1 => out.push_str("\\line "),
        _ => out.push_str("\\par\\par "),
    };
    for ch in escaped.chars() {
        match ch {
            '\n' => newlines += 1,
            '\r' => {}
            other => {
                flush(&mut out, newlines);
                newlines = 0;
                out.push(other);
            }
        }
    }
    flush(&mut out, newlines);
    out
}

pub fn encode_rtf(text: &str, original_name: &str) -> String {
    format!(
        "{{\\rtf1\\ansi\\deff0
{{\\fonttbl{{\\f0 Arial;}}}}
{{\\colortbl;\\red0\\green0\\blue0;\\red102\\green102\\blue102;}}
\\paperw12240\\paperh15840\\margl1440\\margr1440\\margt1440\\margb1440
\\pard\\qc\\b\\fs32 Converted Document\\b0\\par
\\pard\\qc\\cf2\\fs20\\i Original: {}\\i0\\par
\\pard\\qc\\fs18 Converted by Doc2Any\\cf1\\par
\\par
\\pard\\fs24 {}\\par}}",
        escape_rtf(original_name),
        rtf_body(text)
    )
}

// -- FODT ---------------------------------------------------------------------

/// Single-file OpenDocument text: title, two subtitle lines, then one
/// paragraph per blank-line block with `<text:line-break/>` between lines.
pub fn encode_fodt(text: &str, original_name: &str) -> String {
    let paragraphs: Vec<String> = split_paragraphs(text)
        .map(|paragraph| {
            let lines: Vec<String> = paragraph.split('\n').map(escape).collect();
            format!(
                "            <text:p text:style-name=\"Standard\">{}</text:p>",
                lines.join("<text:line-break/>")
            )
        })
        .collect();

    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<office:document xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"
    xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"
    xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0"
    xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0"
    office:version="1.2" office:mimetype="application/vnd.oasis.opendocument.text">
    <office:styles>
        <style:style style:name="Title" style:family="paragraph">
            <style:text-properties fo:font-size="18pt" fo:font-weight="bold"/>
        </style:style>
        <style:style style:name="Subtitle" style:family="paragraph">
            <style:text-properties fo:font-size="12pt" fo:color="#666666" fo:font-style="italic"/>
        </style:style>
        <style:style style:name="Standard" style:family="paragraph">
            <style:text-properties fo:font-size="12pt"/>
        </style:style>
    </office:styles>
    <office:body>
        <office:text>
            <text:p text:style-name="Title">Converted Document</text:p>
            <text:p text:style-name="Subtitle">Original: {name}</text:p>
            <text:p text:style-name="Subtitle">Converted by Doc2Any</text:p>
            <text:p text:style-name="Standard"></text:p>
{body}
        </office:text>
    </office:body>
</office:document>"##,
        name = escape(original_name),
        body = paragraphs.join("\n")
    )
}
