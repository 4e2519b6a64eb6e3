use crate::core::encoder;
use crate::domain::model::EncodedPayload;
use crate::utils::error::Result;
use image::imageops::FilterType;
use image::DynamicImage;

/// Square canvases tried in order. There is no tier after the last one.
pub const CANVAS_TIERS: [u32; 2] = [1024, 512];

/// Crop-to-fill `image` into a `size`x`size` canvas (center crop, no letterboxing).
pub fn fit_to_canvas(image: &DynamicImage, size: u32) -> DynamicImage {
    if image.width() == size && image.height() == size {
        return image.clone();
    }
    image.resize_to_fill(size, size, FilterType::Lanczos3)
}

/// Shrink `image` through the canvas tiers until its encoding fits `max_bytes`.
///
/// Each tier is cropped from the previous one. The last tier's best effort is
/// returned even when it is still over budget.
pub fn adapt(image: &DynamicImage, max_bytes: usize) -> Result<EncodedPayload> {
    let mut current = fit_to_canvas(image, CANVAS_TIERS[0]);
    let mut payload = encoder::encode(&current, max_bytes)?;
    tracing::debug!(
        "Tier {}x{}: {} bytes at quality {}",
        payload.width,
        payload.height,
        payload.len(),
        payload.quality
    );

    for &size in &CANVAS_TIERS[1..] {
        if payload.len() <= max_bytes {
            break;
        }
        current = fit_to_canvas(&current, size);
        payload = encoder::encode(&current, max_bytes)?;
        tracing::debug!(
            "Tier {}x{}: {} bytes at quality {}",
            payload.width,
            payload.height,
            payload.len(),
            payload.quality
        );
    }

    if payload.len() > max_bytes {
        tracing::warn!(
            "Image still {} bytes after the {}x{} tier (budget {})",
            payload.len(),
            payload.width,
            payload.height,
            max_bytes
        );
    }

    Ok(payload)
}
