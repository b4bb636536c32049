// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML helpers — escaping, data URIs, and a structural walk over an HTML
// fragment used by the image-preserving layout paths.

use std::convert::Infallible;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use scraper::{ElementRef, Html, Node};

/// Elements whose text never reaches the output.
const SKIPPED: &[&str] = &["script", "style", "head", "title", "noscript"];

/// Elements followed by vertical space.
const BLOCKS: &[&str] = &[
    "p", "div", "table", "tr", "ul", "ol", "li", "blockquote", "section", "article",
];

/// Callbacks for [`walk`], in document order. The first error stops the walk.
pub trait HtmlVisitor {
    type Error;

    /// Non-empty text node, whitespace collapsed.
    fn text(&mut self, text: &str) -> Result<(), Self::Error>;
    fn heading_start(&mut self, level: u8) -> Result<(), Self::Error>;
    fn heading_end(&mut self, level: u8) -> Result<(), Self::Error>;
    /// `<img>` with its `src` attribute.
    fn image(&mut self, src: &str) -> Result<(), Self::Error>;
    fn line_break(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    /// End of a block element (paragraph, list item, heading, ...).
    fn block_end(&mut self) -> Result<(), Self::Error>;
}

/// Walk an HTML fragment depth-first, reporting text, headings, images and
/// block boundaries.
pub fn walk<V: HtmlVisitor>(html: &str, visitor: &mut V) -> Result<(), V::Error> {
    let fragment = Html::parse_fragment(html);
    walk_element(fragment.root_element(), visitor)
}

fn walk_element<V: HtmlVisitor>(
    element: ElementRef<'_>,
    visitor: &mut V,
) -> Result<(), V::Error> {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = collapse_whitespace(text);
                if !collapsed.is_empty() {
                    visitor.text(&collapsed)?;
                }
            }
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child_el.value().name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                if name == "img" {
                    if let Some(src) = child_el.value().attr("src") {
                        visitor.image(src)?;
                    }
                    continue;
                }
                if name == "br" {
                    visitor.line_break()?;
                    continue;
                }
                if let Some(level) = heading_level(name) {
                    visitor.heading_start(level)?;
                    walk_element(child_el, visitor)?;
                    visitor.heading_end(level)?;
                    visitor.block_end()?;
                    continue;
                }
                walk_element(child_el, visitor)?;
                if BLOCKS.contains(&name) {
                    visitor.block_end()?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

struct TextCollector {
    out: String,
    images: usize,
}

impl HtmlVisitor for TextCollector {
    type Error = Infallible;

    fn text(&mut self, text: &str) -> Result<(), Infallible> {
        self.out.push_str(text);
        self.out.push(' ');
        Ok(())
    }
    fn heading_start(&mut self, _level: u8) -> Result<(), Infallible> {
        Ok(())
    }
    fn heading_end(&mut self, _level: u8) -> Result<(), Infallible> {
        Ok(())
    }
    fn image(&mut self, _src: &str) -> Result<(), Infallible> {
        self.images += 1;
        Ok(())
    }
    fn block_end(&mut self) -> Result<(), Infallible> {
        self.out.push(' ');
        Ok(())
    }
}

/// Visible text of an HTML document, tags removed and whitespace collapsed.
pub fn strip_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut collector = TextCollector {
        out: String::new(),
        images: 0,
    };
    let Ok(()) = walk_element(document.root_element(), &mut collector);
    collapse_whitespace(&collector.out)
}

/// Number of `<img>` elements in a fragment.
pub fn count_images(html: &str) -> usize {
    let mut collector = TextCollector {
        out: String::new(),
        images: 0,
    };
    let Ok(()) = walk(html, &mut collector);
    collector.images
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape the characters that would otherwise be read as markup.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decode a base64 `data:` URI into its MIME type and payload.
pub fn decode_data_uri(src: &str) -> Option<(String, Vec<u8>)> {
    let rest = src.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl HtmlVisitor for Recorder {
        type Error = Infallible;

        fn text(&mut self, text: &str) -> Result<(), Infallible> {
            self.events.push(format!("text:{text}"));
            Ok(())
        }
        fn heading_start(&mut self, level: u8) -> Result<(), Infallible> {
            self.events.push(format!("h{level}"));
            Ok(())
        }
        fn heading_end(&mut self, level: u8) -> Result<(), Infallible> {
            self.events.push(format!("/h{level}"));
            Ok(())
        }
        fn image(&mut self, src: &str) -> Result<(), Infallible> {
            self.events.push(format!("img:{src}"));
            Ok(())
        }
        fn block_end(&mut self) -> Result<(), Infallible> {
            self.events.push("block".into());
            Ok(())
        }
    }

    #[test]
    fn walk_reports_structure_in_order() {
        let mut recorder = Recorder::default();
        walk(
            "<h2>Title</h2><p>Hello   <b>world</b></p><img src=\"a.png\">",
            &mut recorder,
        )
        .unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "h2",
                "text:Title",
                "/h2",
                "block",
                "text:Hello",
                "text:world",
                "block",
                "img:a.png"
            ]
        );
    }

    /// Gives up at the first image.
    #[derive(Default)]
    struct NoImages {
        texts: usize,
    }

    impl HtmlVisitor for NoImages {
        type Error = String;

        fn text(&mut self, _text: &str) -> Result<(), String> {
            self.texts += 1;
            Ok(())
        }
        fn heading_start(&mut self, _level: u8) -> Result<(), String> {
            Ok(())
        }
        fn heading_end(&mut self, _level: u8) -> Result<(), String> {
            Ok(())
        }
        fn image(&mut self, src: &str) -> Result<(), String> {
            Err(format!("image {src}"))
        }
        fn block_end(&mut self) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn visitor_error_stops_the_walk() {
        let mut visitor = NoImages::default();
        let err = walk("<p>a</p><img src=\"x.png\"><p>b</p>", &mut visitor).unwrap_err();
        assert_eq!(err, "image x.png");
        assert_eq!(visitor.texts, 1);

        let mut visitor = NoImages::default();
        assert!(walk("<p>a</p><p>b</p>", &mut visitor).is_ok());
        assert_eq!(visitor.texts, 2);
    }

    #[test]
    fn strip_skips_scripts_and_collapses() {
        let text = strip_to_text(
            "<html><head><title>t</title><script>var x;</script></head>\
             <body><h1>One</h1>\n<p>two   three</p></body></html>",
        );
        assert_eq!(text, "One two three");
    }

    #[test]
    fn counts_images() {
        assert_eq!(count_images("<p>no pictures</p>"), 0);
        assert_eq!(count_images("<p><img src=\"x\"></p><img src=\"y\">"), 2);
    }

    #[test]
    fn data_uri_round_trip() {
        let uri = data_uri("image/png", &[1, 2, 3]);
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(decode_data_uri("https://example.com/a.png").is_none());
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
