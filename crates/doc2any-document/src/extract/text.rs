// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-like sources: plain text, RTF source, legacy DOC bytes and HTML.

use doc2any_core::Format;

use crate::html;

/// Lossy UTF-8 decode with any byte-order mark removed.
pub fn decode_text(data: &[u8]) -> String {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    String::from_utf8_lossy(data).into_owned()
}

/// Best-effort text from a legacy binary DOC: printable characters only,
/// runs of binary noise collapsed to a single line break.
pub fn extract_doc(data: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(data);
    let mut out = String::with_capacity(decoded.len() / 2);
    let mut in_noise = false;

    for ch in decoded.chars() {
        let noise = ch == char::REPLACEMENT_CHARACTER
            || (ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'));
        if noise {
            if !in_noise && !out.ends_with('\n') && !out.is_empty() {
                out.push('\n');
            }
            in_noise = true;
        } else {
            in_noise = false;
            out.push(ch);
        }
    }
    out.trim().to_string()
}

/// Raw markup for an HTML target, visible text otherwise.
pub fn extract_html(data: &[u8], target: Format) -> String {
    let source = decode_text(data);
    if target == Format::Html {
        source
    } else {
        html::strip_to_text(&source)
    }
}
