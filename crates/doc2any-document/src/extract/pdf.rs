// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — page text and embedded images from existing PDF documents
// using the `lopdf` crate.

use doc2any_core::error::{Doc2AnyError, Result};
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument, warn};

use crate::html;

/// An image XObject pulled out of a page, ready to embed elsewhere.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Reads text and images from an in-memory PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Create a reader from raw PDF bytes.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            Doc2AnyError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Text of every page in document order. Lines are trimmed and empty
    /// lines dropped; a page whose text cannot be decoded yields `""`.
    pub fn page_texts(&self) -> Vec<String> {
        self.document
            .get_pages()
            .keys()
            .map(|&page_number| match self.document.extract_text(&[page_number]) {
                Ok(raw) => raw
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n"),
                Err(err) => {
                    warn!(page_number, error = %err, "page text extraction failed");
                    String::new()
                }
            })
            .collect()
    }

    /// All page text, pages separated by a blank line.
    #[instrument(skip(self))]
    pub fn extract_text(&self) -> String {
        let pages = self.page_texts();
        debug!(pages = pages.len(), "PDF text extracted");
        pages
            .into_iter()
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Semantic HTML of the document: a `<p>` per text line and an `<img>`
    /// data URI per embedded image, page by page.
    #[instrument(skip(self))]
    pub fn to_html(&self) -> String {
        let texts = self.page_texts();
        let mut out = String::new();

        for (index, (&page_number, &page_id)) in self.document.get_pages().iter().enumerate() {
            out.push_str("<div class=\"page\">\n");
            if let Some(text) = texts.get(index) {
                for line in text.lines() {
                    out.push_str("<p>");
                    out.push_str(&html::escape(line));
                    out.push_str("</p>\n");
                }
            }
            for image in self.page_images(page_id) {
                out.push_str(&format!(
                    "<img src=\"{}\" width=\"{}\" height=\"{}\">\n",
                    html::data_uri(image.mime, &image.bytes),
                    image.width,
                    image.height
                ));
            }
            out.push_str("</div>\n");
            debug!(page_number, "page converted to HTML");
        }
        out
    }

    /// Image XObjects referenced by a page. JPEG streams pass through
    /// untouched; 8-bit RGB and grey rasters are re-encoded as PNG. Other
    /// encodings are skipped.
    pub fn page_images(&self, page_id: ObjectId) -> Vec<EmbeddedImage> {
        let Some(resources) = self.page_resources(page_id) else {
            return Vec::new();
        };
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| self.resolve_dict(obj))
        else {
            return Vec::new();
        };

        let mut images = Vec::new();
        for (name, obj) in xobjects.iter() {
            let Ok((_, Object::Stream(stream))) = self.document.dereference(obj) else {
                continue;
            };
            let is_image = stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|subtype| subtype == b"Image");
            if !is_image {
                continue;
            }
            let width = dict_u32(&stream.dict, b"Width");
            let height = dict_u32(&stream.dict, b"Height");

            match stream_filter(&stream.dict).as_deref() {
                Some(b"DCTDecode") => images.push(EmbeddedImage {
                    mime: "image/jpeg",
                    bytes: stream.content.clone(),
                    width,
                    height,
                }),
                Some(b"FlateDecode") | None => {
                    let samples = if stream.dict.get(b"Filter").is_ok() {
                        match stream.decompressed_content() {
                            Ok(samples) => samples,
                            Err(err) => {
                                warn!(
                                    xobject = %String::from_utf8_lossy(name),
                                    error = %err,
                                    "undecodable image stream"
                                );
                                continue;
                            }
                        }
                    } else {
                        stream.content.clone()
                    };
                    if let Some(png) = self.raw_samples_to_png(&stream.dict, samples, width, height)
                    {
                        images.push(png);
                    }
                }
                Some(other) => {
                    debug!(
                        filter = %String::from_utf8_lossy(other),
                        "skipping image with unsupported filter"
                    );
                }
            }
        }
        images
    }

    fn raw_samples_to_png(
        &self,
        dict: &Dictionary,
        samples: Vec<u8>,
        width: u32,
        height: u32,
    ) -> Option<EmbeddedImage> {
        if dict_u32(dict, b"BitsPerComponent") != 8 {
            return None;
        }
        let colour_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|obj| self.document.dereference(obj).ok())
            .and_then(|(_, obj)| obj.as_name().ok().map(<[u8]>::to_vec));

        let image = match colour_space.as_deref() {
            Some(b"DeviceRGB") => {
                DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, samples)?)
            }
            Some(b"DeviceGray") => {
                DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, samples)?)
            }
            _ => return None,
        };

        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .ok()?;
        Some(EmbeddedImage {
            mime: "image/png",
            bytes,
            width,
            height,
        })
    }

    /// The page's resource dictionary, inherited from ancestors when absent.
    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut node = self.document.get_object(page_id).ok()?.as_dict().ok()?;
        for _ in 0..16 {
            if let Some(resources) = node
                .get(b"Resources")
                .ok()
                .and_then(|obj| self.resolve_dict(obj))
            {
                return Some(resources);
            }
            node = node
                .get(b"Parent")
                .ok()
                .and_then(|obj| self.resolve_dict(obj))?;
        }
        None
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        let (_, target) = self.document.dereference(obj).ok()?;
        target.as_dict().ok()
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> u32 {
    dict.get(key)
        .and_then(Object::as_i64)
        .map(|v| v.max(0) as u32)
        .unwrap_or(0)
}

/// The single filter applied to a stream; `None` when unfiltered. Filter
/// chains report the first entry only when the chain has length one.
fn stream_filter(dict: &Dictionary) -> Option<Vec<u8>> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.clone()),
        Object::Array(items) if items.len() == 1 => {
            items[0].as_name().ok().map(<[u8]>::to_vec)
        }
        Object::Array(_) => Some(b"Chain".to_vec()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, dictionary};

    /// Build a PDF with one page per entry of `pages`, each showing its text.
    /// When `jpeg` is given, the first page also carries that image.
    pub(crate) fn build_pdf(pages: &[&str], jpeg: Option<(&[u8], u32, u32)>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids: Vec<Object> = Vec::new();
        for (index, text) in pages.iter().enumerate() {
            let mut xobjects = Dictionary::new();
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ];
            if let (0, Some((bytes, width, height))) = (index, jpeg) {
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => width as i64,
                        "Height" => height as i64,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                        "Filter" => "DCTDecode",
                    },
                    bytes.to_vec(),
                ));
                xobjects.set("Im1", image_id);
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![100.into(), 0.into(), 0.into(), 100.into(), 72.into(), 400.into()],
                ));
                operations.push(Operation::new("Do", vec!["Im1".into()]));
                operations.push(Operation::new("Q", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                    "XObject" => xobjects,
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("save test PDF");
        buffer
    }

    pub(crate) fn tiny_jpeg() -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, image::Rgb([200, 10, 10])));
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
            .expect("encode jpeg");
        bytes
    }

    #[test]
    fn pages_are_joined_in_order_by_blank_line() {
        let pdf = build_pdf(&["First page", "Second page"], None);
        let reader = PdfReader::from_bytes(&pdf).expect("load");
        assert_eq!(reader.page_count(), 2);

        let text = reader.extract_text();
        let first = text.find("First page").expect("first page text");
        let second = text.find("Second page").expect("second page text");
        assert!(first < second);
        assert!(text[first..second].contains("\n\n"));
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        assert!(matches!(
            PdfReader::from_bytes(b"not a pdf"),
            Err(Doc2AnyError::PdfError(_))
        ));
    }

    #[test]
    fn jpeg_xobjects_pass_through_into_html() {
        let jpeg = tiny_jpeg();
        let pdf = build_pdf(&["Caption"], Some((jpeg.as_slice(), 4, 3)));
        let reader = PdfReader::from_bytes(&pdf).expect("load");

        let page_id = *reader.document.get_pages().values().next().expect("one page");
        let images = reader.page_images(page_id);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].mime, "image/jpeg");
        assert_eq!(images[0].bytes, jpeg);
        assert_eq!((images[0].width, images[0].height), (4, 3));

        let html = reader.to_html();
        assert!(html.contains("<p>Caption</p>"));
        assert!(html.contains("<img src=\"data:image/jpeg;base64,"));
    }

    #[test]
    fn text_only_pdf_has_no_images() {
        let pdf = build_pdf(&["Only words"], None);
        let reader = PdfReader::from_bytes(&pdf).expect("load");
        assert_eq!(html::count_images(&reader.to_html()), 0);
    }
}
