//! Size-constrained PNG encoding.
//!
//! PNG is lossless, so a plain quality knob does nothing. Quality is applied
//! by posterizing the color channels before the encode: each step down the
//! ladder keeps fewer bits per channel, which the deflate stage turns into
//! fewer bytes. Alpha is left untouched.

use crate::domain::model::EncodedPayload;
use crate::utils::error::Result;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::error::{ImageError, ParameterError, ParameterErrorKind};
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

pub const INITIAL_QUALITY: u8 = 90;
pub const QUALITY_STEP: u8 = 10;
/// The ladder stops once quality would reach this value.
pub const QUALITY_FLOOR: u8 = 10;

/// Bits kept per color channel at `quality` (0-100). 90 and above is lossless.
pub fn bits_for_quality(quality: u8) -> u8 {
    ((u32::from(quality) * 8 + 50) / 90).clamp(1, 8) as u8
}

/// The qualities `encode` tries, in order.
pub fn quality_ladder() -> impl Iterator<Item = u8> {
    (QUALITY_FLOOR + QUALITY_STEP..=INITIAL_QUALITY)
        .rev()
        .step_by(QUALITY_STEP as usize)
}

/// Encode `image` as PNG at a single quality level.
pub fn encode_at_quality(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))
        .into());
    }

    let (mut pixels, color_type, channels) = if image.color().has_alpha() {
        (image.to_rgba8().into_raw(), ExtendedColorType::Rgba8, 4)
    } else {
        (image.to_rgb8().into_raw(), ExtendedColorType::Rgb8, 3)
    };

    let bits = bits_for_quality(quality);
    if bits < 8 {
        let mask = 0xFFu8 << (8 - bits);
        for (i, value) in pixels.iter_mut().enumerate() {
            if channels == 4 && i % 4 == 3 {
                continue;
            }
            *value &= mask;
        }
    }

    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Default, FilterType::Adaptive);
    encoder.write_image(&pixels, width, height, color_type)?;
    Ok(out)
}

/// Steps down the quality ladder for one image.
///
/// Deflate does not always reward posterizing, so a rung's own encoding can
/// come out larger than the rung above it. Each rung instead yields the
/// smaller of its own encoding and the best one so far, which keeps the
/// effective size non-increasing as quality falls. Ties keep the higher
/// quality.
pub struct LadderWalk<'a> {
    image: &'a DynamicImage,
    rungs: std::vec::IntoIter<u8>,
    best: Option<EncodedPayload>,
}

impl<'a> LadderWalk<'a> {
    pub fn new(image: &'a DynamicImage) -> Self {
        Self {
            image,
            rungs: quality_ladder().collect::<Vec<_>>().into_iter(),
            best: None,
        }
    }

    /// Encode the next rung. Returns the rung and the effective size at that
    /// rung, or `None` once the ladder is exhausted.
    pub fn step(&mut self) -> Result<Option<(u8, usize)>> {
        let Some(quality) = self.rungs.next() else {
            return Ok(None);
        };
        let bytes = encode_at_quality(self.image, quality)?;
        let own = bytes.len();

        let smaller = self.best.as_ref().map_or(true, |best| own < best.len());
        if smaller {
            self.best = Some(EncodedPayload {
                bytes,
                width: self.image.width(),
                height: self.image.height(),
                quality,
            });
        }

        let effective = self.best.as_ref().map_or(own, EncodedPayload::len);
        if effective < own {
            tracing::debug!(
                "Quality {} encoded to {} bytes, keeping {} bytes from a higher rung",
                quality,
                own,
                effective
            );
        }
        Ok(Some((quality, effective)))
    }

    /// The smallest encoding seen so far.
    pub fn finish(self) -> Result<EncodedPayload> {
        self.best.ok_or_else(|| {
            ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::Generic(
                "quality ladder produced no encoding".to_string(),
            )))
            .into()
        })
    }
}

/// Walk the quality ladder until the encoding fits in `max_bytes`.
///
/// Returns the first effective encoding at or under budget. If none fits,
/// the smallest attempt is returned and the caller has to check its size.
/// The payload's `quality` is the rung that produced its bytes.
pub fn encode(image: &DynamicImage, max_bytes: usize) -> Result<EncodedPayload> {
    let mut walk = LadderWalk::new(image);

    while let Some((quality, size)) = walk.step()? {
        tracing::debug!(
            "Encoded {}x{} at quality {}: {} bytes (budget {})",
            image.width(),
            image.height(),
            quality,
            size,
            max_bytes
        );
        if size <= max_bytes {
            break;
        }
    }

    walk.finish()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    /// Deterministic noise; incompressible at full bit depth.
    pub(crate) fn noise_rgb(width: u32, height: u32, seed: u64) -> DynamicImage {
        let mut state = seed.max(1);
        let img = RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let b = state.to_le_bytes();
            Rgb([b[0], b[1], b[2]])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Low-entropy images where deflate gains little from posterizing.
    pub(crate) fn structured_rgb(width: u32, height: u32, seed: u64, kind: u8) -> DynamicImage {
        let s = seed as u32;
        let img = RgbImage::from_fn(width, height, |x, y| match kind % 4 {
            0 => Rgb([
                (x.wrapping_mul(s % 7 + 1) % 256) as u8,
                (y.wrapping_mul(s % 5 + 1) % 256) as u8,
                ((x + y + s) % 256) as u8,
            ]),
            1 => {
                let band = ((x / (s % 6 + 1)) % 3) as u8;
                Rgb([band * 90 + (s % 17) as u8, 255 - band * 60, (s % 251) as u8])
            }
            2 => {
                let on = ((x / 3 + y / 2 + s) % 2) as u8;
                Rgb([on * 200 + 13, on * 37 + (y % 4) as u8, 250 - on * 100])
            }
            _ => {
                let v = (x ^ y ^ s).wrapping_mul(2_654_435_761) >> 28;
                Rgb([(v * 17) as u8, (v * 5 + x % 3) as u8, (y * 9 % 256) as u8])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    fn effective_sizes(image: &DynamicImage) -> Vec<usize> {
        let mut walk = LadderWalk::new(image);
        let mut sizes = Vec::new();
        while let Some((_, size)) = walk.step().unwrap() {
            sizes.push(size);
        }
        sizes
    }

    #[test]
    fn test_quality_ladder_steps() {
        let ladder: Vec<u8> = quality_ladder().collect();
        assert_eq!(ladder, vec![90, 80, 70, 60, 50, 40, 30, 20]);
    }

    #[test]
    fn test_bits_for_quality_is_monotonic() {
        assert_eq!(bits_for_quality(90), 8);
        assert_eq!(bits_for_quality(100), 8);
        assert_eq!(bits_for_quality(20), 2);
        let mut previous = 0;
        for quality in 0..=100u8 {
            let bits = bits_for_quality(quality);
            assert!(bits >= previous, "bits decreased at quality {}", quality);
            previous = bits;
        }
    }

    #[test]
    fn test_encode_fits_at_first_step() {
        let image = gradient(64, 64);
        let payload = encode(&image, usize::MAX).unwrap();
        assert_eq!(payload.quality, 90);
        assert_eq!((payload.width, payload.height), (64, 64));
        assert_eq!(&payload.bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_encode_highest_quality_is_lossless() {
        let image = gradient(32, 16);
        let payload = encode(&image, usize::MAX).unwrap();
        let decoded = image::load_from_memory(&payload.bytes).unwrap();
        assert_eq!(decoded.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn test_encode_exhausts_ladder_when_budget_unreachable() {
        let image = noise_rgb(32, 32, 7);
        let payload = encode(&image, 0).unwrap();
        assert_eq!(payload.quality, 20);
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_encode_steps_down_until_budget_met() {
        let image = noise_rgb(256, 256, 42);
        let full = encode_at_quality(&image, 90).unwrap();
        let budget = full.len() * 3 / 4;

        let payload = encode(&image, budget).unwrap();
        assert!(payload.quality < 90);
        assert!(payload.len() <= budget);
        // Previous step must have been over budget.
        let previous = encode_at_quality(&image, payload.quality + QUALITY_STEP).unwrap();
        assert!(previous.len() > budget);
    }

    #[test]
    fn test_size_non_decreasing_in_quality() {
        let image = noise_rgb(256, 256, 99);
        let sizes = effective_sizes(&image);
        assert_eq!(sizes.len(), 8);
        for pair in sizes.windows(2) {
            assert!(pair[0] >= pair[1], "sizes not monotonic: {:?}", sizes);
        }
    }

    #[test]
    fn test_structured_images_never_grow_down_the_ladder() {
        for seed in 0..200u64 {
            let kind = (seed % 4) as u8;
            let image = structured_rgb(8 + (seed % 9) as u32, 6 + (seed % 7) as u32, seed, kind);
            let sizes = effective_sizes(&image);
            for pair in sizes.windows(2) {
                assert!(
                    pair[0] >= pair[1],
                    "seed {} kind {}: sizes grew as quality fell: {:?}",
                    seed,
                    kind,
                    sizes
                );
            }
        }
    }

    #[test]
    fn test_encode_returns_smallest_rung_when_over_budget() {
        let image = structured_rgb(12, 10, 43, 3);
        let smallest = quality_ladder()
            .map(|q| encode_at_quality(&image, q).unwrap().len())
            .min()
            .unwrap();

        let payload = encode(&image, 0).unwrap();

        assert_eq!(payload.len(), smallest);
        assert_eq!(encode_at_quality(&image, payload.quality).unwrap(), payload.bytes);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let image = noise_rgb(128, 96, 5);
        let a = encode_at_quality(&image, 50).unwrap();
        let b = encode_at_quality(&image, 50).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_alpha_channel_preserved() {
        let img = RgbaImage::from_fn(8, 8, |x, y| Rgba([200, 100, 50, (x * 32 + y) as u8]));
        let bytes = encode_at_quality(&DynamicImage::ImageRgba8(img.clone()), 20).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        for (src, out) in img.pixels().zip(decoded.pixels()) {
            assert_eq!(src[3], out[3]);
            assert_eq!(out[0], 192);
        }
    }

    #[test]
    fn test_zero_sized_image_is_encoding_failure() {
        let image = DynamicImage::new_rgb8(0, 10);
        let result = encode(&image, 1024);
        assert!(matches!(
            result,
            Err(crate::utils::error::BotError::EncodingFailure(_))
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// The returned quality is always a rung of the ladder, its bytes
        /// are that rung's encoding, and a payload above budget is the
        /// smallest the ladder can produce.
        #[test]
        fn prop_encode_respects_ladder(
            (width, height) in (1u32..=24, 1u32..=24),
            seed in 1u64..10_000,
            budget in 0usize..4096,
        ) {
            let image = super::tests::noise_rgb(width, height, seed);
            let payload = encode(&image, budget).unwrap();

            prop_assert!(quality_ladder().any(|q| q == payload.quality));
            prop_assert_eq!(&encode_at_quality(&image, payload.quality).unwrap(), &payload.bytes);
            if payload.len() > budget {
                let smallest = quality_ladder()
                    .map(|q| encode_at_quality(&image, q).unwrap().len())
                    .min()
                    .unwrap();
                prop_assert_eq!(payload.len(), smallest);
            }
        }

        #[test]
        fn prop_structured_size_non_decreasing_in_quality(
            (width, height) in (1u32..=32, 1u32..=32),
            seed in 0u64..10_000,
            kind in 0u8..4,
        ) {
            let image = super::tests::structured_rgb(width, height, seed, kind);
            let mut walk = LadderWalk::new(&image);
            let mut previous = usize::MAX;
            while let Some((quality, size)) = walk.step().unwrap() {
                prop_assert!(size <= previous, "size grew to {} at quality {}", size, quality);
                previous = size;
            }
            prop_assert_eq!(walk.finish().unwrap().len(), previous);
        }

        #[test]
        fn prop_same_quality_same_bytes(
            (width, height) in (1u32..=20, 1u32..=20),
            seed in 1u64..10_000,
            quality in 0u8..=100,
        ) {
            let image = super::tests::noise_rgb(width, height, seed);
            let a = encode_at_quality(&image, quality).unwrap();
            let b = encode_at_quality(&image, quality).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
