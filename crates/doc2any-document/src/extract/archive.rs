// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ZIP package access shared by the OOXML and ODF readers.

use std::io::{Cursor, Read};

use doc2any_core::error::{Doc2AnyError, Result};
use quick_xml::events::BytesStart;
use zip::ZipArchive;

pub type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub fn open(data: &[u8]) -> Result<Package<'_>> {
    ZipArchive::new(Cursor::new(data))
        .map_err(|err| Doc2AnyError::Archive(format!("not a ZIP package: {}", err)))
}

pub fn read_bytes(package: &mut Package<'_>, name: &str) -> Result<Vec<u8>> {
    let mut entry = package
        .by_name(name)
        .map_err(|err| Doc2AnyError::Archive(format!("{name}: {err}")))?;
    let mut buffer = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buffer)?;
    Ok(buffer)
}

pub fn read_string(package: &mut Package<'_>, name: &str) -> Result<String> {
    let bytes = read_bytes(package, name)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Entries named `{prefix}{N}{suffix}`, sorted by the numeric `N` so that
/// part 10 follows part 2.
pub fn numbered_parts(package: &Package<'_>, prefix: &str, suffix: &str) -> Vec<String> {
    let mut parts: Vec<(u32, String)> = package
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
            let index = number.parse::<u32>().ok()?;
            Some((index, name.to_string()))
        })
        .collect();
    parts.sort_by_key(|(index, _)| *index);
    parts.into_iter().map(|(_, name)| name).collect()
}

/// Value of the attribute whose local name (prefix ignored) is `local`.
pub fn attr_local(element: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

pub fn xml_err(err: impl std::fmt::Display) -> Doc2AnyError {
    Doc2AnyError::Xml(err.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Zip the given `(name, contents)` entries in order.
    pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, options).expect("start entry");
            writer.write_all(contents).expect("write entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    #[test]
    fn parts_sort_numerically() {
        let data = build_zip(&[
            ("ppt/slides/slide10.xml", b"ten"),
            ("ppt/slides/slide2.xml", b"two"),
            ("ppt/slides/_rels/slide1.xml.rels", b"rels"),
            ("ppt/slides/slide1.xml", b"one"),
        ]);
        let package = open(&data).unwrap();
        assert_eq!(
            numbered_parts(&package, "ppt/slides/slide", ".xml"),
            vec![
                "ppt/slides/slide1.xml",
                "ppt/slides/slide2.xml",
                "ppt/slides/slide10.xml"
            ]
        );
    }

    #[test]
    fn missing_entry_is_archive_error() {
        let data = build_zip(&[("a.txt", b"a")]);
        let mut package = open(&data).unwrap();
        assert_eq!(read_string(&mut package, "a.txt").unwrap(), "a");
        assert!(matches!(
            read_bytes(&mut package, "b.txt"),
            Err(Doc2AnyError::Archive(_))
        ));
    }

    #[test]
    fn non_zip_is_rejected() {
        assert!(matches!(open(b"plain text"), Err(Doc2AnyError::Archive(_))));
    }
}
