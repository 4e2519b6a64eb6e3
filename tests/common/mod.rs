#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::json;
use std::io::Cursor;

/// Deterministic RGBA noise. Alpha is never posterized, so this stays large
/// at every quality level.
pub fn noise_rgba(width: u32, height: u32, seed: u64) -> DynamicImage {
    let mut state = seed.max(1);
    let img = RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let b = state.to_le_bytes();
        Rgba([b[0], b[1], b[2], b[3]])
    });
    DynamicImage::ImageRgba8(img)
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn blob_json(size: usize) -> serde_json::Value {
    json!({
        "$type": "blob",
        "ref": {"$link": "bafkreie5737gdxlw5i64vzichcalba3z2v5n6icifvx5xytvske7mr3hpm"},
        "mimeType": "image/png",
        "size": size
    })
}
