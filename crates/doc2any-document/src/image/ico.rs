// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-entry ICO container around a PNG payload.

use doc2any_core::error::{Doc2AnyError, Result};

/// Largest side an ICO directory entry can describe.
pub const MAX_ICO_SIDE: u32 = 256;

const HEADER_LEN: usize = 6;
const ENTRY_LEN: usize = 16;

/// Wrap an already-fitted PNG in an ICO file: 6-byte header, one 16-byte
/// directory entry, then the PNG bytes. A dimension of 256 is stored as 0.
pub fn encode_ico(png: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .map_err(|err| Doc2AnyError::ImageError(format!("ICO payload is not a PNG: {}", err)))?;
    let (width, height) = (decoded.width(), decoded.height());
    if width > MAX_ICO_SIDE || height > MAX_ICO_SIDE {
        return Err(Doc2AnyError::Encoding(format!(
            "icon {width}x{height} exceeds {MAX_ICO_SIDE}x{MAX_ICO_SIDE}"
        )));
    }
    let payload_len = u32::try_from(png.len())
        .map_err(|_| Doc2AnyError::Encoding("icon payload too large".into()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + ENTRY_LEN + png.len());
    // reserved, type = icon, count
    out.extend_from_slice(&[0, 0, 1, 0, 1, 0]);
    out.push(side_byte(width));
    out.push(side_byte(height));
    out.push(0); // palette size
    out.push(0); // reserved
    out.extend_from_slice(&1u16.to_le_bytes()); // planes
    out.extend_from_slice(&32u16.to_le_bytes()); // bits per pixel
    out.extend_from_slice(&payload_len.to_le_bytes());
    out.extend_from_slice(&((HEADER_LEN + ENTRY_LEN) as u32).to_le_bytes());
    out.extend_from_slice(png);
    Ok(out)
}

fn side_byte(side: u32) -> u8 {
    if side >= MAX_ICO_SIDE { 0 } else { side as u8 }
}
