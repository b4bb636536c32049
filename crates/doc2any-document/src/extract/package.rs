// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Slide and sheet text from PPTX, XLSX and legacy XLS workbooks.
//
// PPTX and XLSX parts are located by name and visited in numeric order
// (`slide2.xml` before `slide10.xml`). XML is read with `quick-xml`; legacy
// BIFF workbooks go through `calamine`.

use std::io::Cursor;

use calamine::{Data, Reader as _, Xls};
use doc2any_core::error::{Doc2AnyError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument};

use super::archive::{self, attr_local, xml_err};

pub const NO_SLIDE_TEXT: &str = "[No text content found in presentation]";
pub const NO_SHEET_DATA: &str = "[No data found in spreadsheet]";

// -- PPTX ---------------------------------------------------------------------

/// `--- Slide N ---` blocks for every slide carrying text. Slide numbers
/// count empty slides too.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn extract_pptx(data: &[u8]) -> Result<String> {
    let mut package = archive::open(data)?;
    let slides = archive::numbered_parts(&package, "ppt/slides/slide", ".xml");
    debug!(slides = slides.len(), "PPTX slides located");

    let mut out = String::new();
    for (index, name) in slides.iter().enumerate() {
        let xml = archive::read_string(&mut package, name)?;
        let runs = slide_runs(&xml)?;
        let text = runs
            .iter()
            .map(String::as_str)
            .filter(|run| !run.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !text.trim().is_empty() {
            out.push_str(&format!("--- Slide {} ---\n{}\n\n", index + 1, text));
        }
    }

    let trimmed = out.trim();
    Ok(if trimmed.is_empty() {
        NO_SLIDE_TEXT.to_string()
    } else {
        trimmed.to_string()
    })
}

/// Text of every `<a:t>` run on a slide.
fn slide_runs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut runs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == b"a:t" => current = Some(String::new()),
            Event::Text(t) => {
                if let Some(run) = current.as_mut() {
                    run.push_str(&t.unescape().map_err(xml_err)?);
                }
            }
            Event::End(e) if e.name().as_ref() == b"a:t" => {
                if let Some(run) = current.take() {
                    runs.push(run);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(runs)
}

// -- XLSX ---------------------------------------------------------------------

/// `--- Sheet N ---` blocks with one tab-separated line per non-empty row.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn extract_xlsx(data: &[u8]) -> Result<String> {
    let mut package = archive::open(data)?;
    let shared = match archive::read_string(&mut package, "xl/sharedStrings.xml") {
        Ok(xml) => shared_strings(&xml)?,
        Err(_) => Vec::new(),
    };
    let sheets = archive::numbered_parts(&package, "xl/worksheets/sheet", ".xml");
    debug!(sheets = sheets.len(), shared = shared.len(), "XLSX parts located");

    let mut out = String::new();
    for (index, name) in sheets.iter().enumerate() {
        let xml = archive::read_string(&mut package, name)?;
        out.push_str(&format!("--- Sheet {} ---\n", index + 1));
        for row in sheet_rows(&xml, &shared)? {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out.push('\n');
    }

    let trimmed = out.trim();
    Ok(if trimmed.is_empty() {
        NO_SHEET_DATA.to_string()
    } else {
        trimmed.to_string()
    })
}

/// One string per `<si>`, rich-text runs concatenated, phonetic hints
/// skipped.
fn shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = !in_phonetic,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape().map_err(xml_err)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.extend(current.take()),
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

#[derive(Default)]
struct Cell {
    kind: Option<String>,
    value: Option<String>,
    inline: Option<String>,
}

impl Cell {
    /// Display value: shared-string lookup for `t="s"`, inline text for
    /// `t="inlineStr"`, the literal `<v>` otherwise.
    fn resolve(self, shared: &[String]) -> Option<String> {
        match self.kind.as_deref() {
            Some("s") => {
                let index = self.value?.trim().parse::<usize>().ok()?;
                shared.get(index).filter(|s| !s.is_empty()).cloned()
            }
            Some("inlineStr") => self.inline,
            _ => self.value,
        }
    }
}

fn sheet_rows(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Option<Cell> = None;
    let mut in_value = false;
    let mut in_inline = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row.clear(),
                b"c" => {
                    cell = Some(Cell {
                        kind: attr_local(&e, b"t"),
                        ..Cell::default()
                    })
                }
                b"v" => in_value = true,
                b"t" => in_inline = true,
                _ => {}
            },
            Event::Text(t) if in_value || in_inline => {
                let text = t.unescape().map_err(xml_err)?;
                if let Some(c) = cell.as_mut() {
                    let slot = if in_value { &mut c.value } else { &mut c.inline };
                    slot.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline = false,
                b"c" => {
                    if let Some(value) = cell.take().and_then(|c| c.resolve(shared)) {
                        row.push(value);
                    }
                }
                b"row" => {
                    if !row.is_empty() {
                        rows.push(std::mem::take(&mut row));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}

// -- XLS ----------------------------------------------------------------------

/// Legacy BIFF workbook, rendered like [`extract_xlsx`].
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn extract_xls(data: &[u8]) -> Result<String> {
    let mut workbook: Xls<_> = calamine::open_workbook_from_rs(Cursor::new(data))
        .map_err(|err| Doc2AnyError::Extraction(format!("failed to open xls: {err}")))?;

    let mut out = String::new();
    for (index, name) in workbook.sheet_names().iter().enumerate() {
        let range = workbook
            .worksheet_range(name)
            .map_err(|err| Doc2AnyError::Extraction(format!("sheet '{name}': {err}")))?;
        out.push_str(&format!("--- Sheet {} ---\n", index + 1));
        for cells in range.rows() {
            let values: Vec<String> = cells
                .iter()
                .filter(|cell| !matches!(cell, Data::Empty))
                .map(ToString::to_string)
                .collect();
            if !values.is_empty() {
                out.push_str(&values.join("\t"));
                out.push('\n');
            }
        }
        out.push('\n');
    }

    let trimmed = out.trim();
    Ok(if trimmed.is_empty() {
        NO_SHEET_DATA.to_string()
    } else {
        trimmed.to_string()
    })
}
