// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode any accepted raster or SVG source, flatten onto a
// white background, stack pages and encode to the raster targets. Operates on
// in-memory images using the `image` and `resvg` crates.

use doc2any_core::Format;
use doc2any_core::error::{Doc2AnyError, Result};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops};
use tracing::{debug, info, instrument};

use super::ico;

/// Image processing pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, enabling
/// method chaining:
///
/// ```ignore
/// let jpeg = ImageProcessor::decode(Format::Png, &bytes)?
///     .flatten_onto_white()
///     .encode(Format::Jpg, 92)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded raster bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| Doc2AnyError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Rasterise an SVG document at its intrinsic size.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_svg(data: &[u8]) -> Result<Self> {
        use resvg::{tiny_skia, usvg};

        let options = usvg::Options::default();
        let tree = usvg::Tree::from_data(data, &options)
            .map_err(|err| Doc2AnyError::ImageError(format!("failed to parse SVG: {}", err)))?;
        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            Doc2AnyError::ImageError(format!(
                "SVG has unusable size {}x{}",
                size.width(),
                size.height()
            ))
        })?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let png = pixmap
            .encode_png()
            .map_err(|err| Doc2AnyError::ImageError(format!("SVG rasterisation failed: {}", err)))?;
        info!(width = size.width(), height = size.height(), "SVG rasterised");
        Self::from_bytes(&png)
    }

    /// Decode a source file of the given image format.
    pub fn decode(format: Format, data: &[u8]) -> Result<Self> {
        match format {
            Format::Svg => Self::from_svg(data),
            _ => Self::from_bytes(data),
        }
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Stack images top to bottom on a canvas as wide as the widest one.
    /// Uncovered canvas stays transparent.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn stack_vertical(pages: &[DynamicImage]) -> Result<Self> {
        let width = pages.iter().map(DynamicImage::width).max().unwrap_or(0);
        let height: u32 = pages.iter().map(DynamicImage::height).sum();
        if width == 0 || height == 0 {
            return Err(Doc2AnyError::ImageError("no pages to stack".into()));
        }

        let mut canvas = RgbaImage::new(width, height);
        let mut y: i64 = 0;
        for page in pages {
            imageops::overlay(&mut canvas, &page.to_rgba8(), 0, y);
            y += i64::from(page.height());
        }
        debug!(width, height, "Pages stacked");
        Ok(Self {
            image: DynamicImage::ImageRgba8(canvas),
        })
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Composite onto an opaque white background of the same size.
    pub fn flatten_onto_white(self) -> Self {
        let (width, height) = (self.image.width(), self.image.height());
        let mut background = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        imageops::overlay(&mut background, &self.image.to_rgba8(), 0, 0);
        Self {
            image: DynamicImage::ImageRgba8(background),
        }
    }

    /// Shrink so neither side exceeds `max`, preserving aspect ratio. The
    /// short side is truncated, never rounded up. Images already within
    /// bounds are left alone.
    #[instrument(skip(self), fields(max))]
    pub fn fit_within(self, max: u32) -> Self {
        let (w, h) = (self.image.width(), self.image.height());
        if w <= max && h <= max {
            return self;
        }
        let (new_w, new_h) = if w >= h {
            (max, ((u64::from(h) * u64::from(max)) / u64::from(w)).max(1) as u32)
        } else {
            (((u64::from(w) * u64::from(max)) / u64::from(h)).max(1) as u32, max)
        };
        info!(from_w = w, from_h = h, new_w, new_h, "Resizing image");
        Self {
            image: self
                .image
                .resize_exact(new_w, new_h, imageops::FilterType::Lanczos3),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| Doc2AnyError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode into a raster target. JPEG and BMP have no alpha channel, so
    /// they are flattened onto white first; ICO is fitted into 256×256.
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn encode(self, target: Format, jpeg_quality: u8) -> Result<Vec<u8>> {
        match target {
            Format::Jpg | Format::Jpeg => self.flatten_onto_white().to_jpeg_bytes(jpeg_quality),
            Format::Bmp => {
                let flat = DynamicImage::ImageRgb8(self.flatten_onto_white().image.to_rgb8());
                encode_to_format(&flat, ImageFormat::Bmp)
            }
            Format::Png => self.to_png_bytes(),
            Format::Gif => encode_to_format(&self.image, ImageFormat::Gif),
            Format::Webp => {
                let rgba = DynamicImage::ImageRgba8(self.image.to_rgba8());
                encode_to_format(&rgba, ImageFormat::WebP)
            }
            Format::Ico => ico::encode_ico(&self.fit_within(ico::MAX_ICO_SIDE).to_png_bytes()?),
            other => Err(Doc2AnyError::Encoding(format!(
                "{other} is not a raster image format"
            ))),
        }
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| Doc2AnyError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
