use image::ImageEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;

use crate::foundation::error::{PlacardError, PlacardResult};
use crate::render::FrameRgba;
use crate::render::paint::unpremultiply_rgba8_in_place;

/// Target image encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EncodeFormat {
    /// Lossless PNG with alpha.
    Png,
    /// Lossy JPEG flattened over white; `quality` is 0-100.
    Jpeg {
        /// Encoder quality, clamped into 1-100.
        quality: u8,
    },
    /// WebP. The encoder here is lossless; there is no lossy WebP encoder in
    /// the stack, so no quality parameter applies (documented limitation).
    WebP,
}

impl EncodeFormat {
    /// Conventional file extension for the format.
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
            Self::WebP => "webp",
        }
    }
}

/// Encode a rendered frame into `format`.
///
/// The frame's premultiplied pixels are converted to straight alpha (or
/// flattened over white for JPEG) before encoding. Encoder failures surface
/// as [`PlacardError::Encode`]; an empty frame is rejected the same way.
#[tracing::instrument(skip(frame), fields(w = frame.width, h = frame.height))]
pub fn encode(frame: &FrameRgba, format: EncodeFormat) -> PlacardResult<Vec<u8>> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PlacardError::encode("cannot encode an empty frame"));
    }
    let expected = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.data.len() != expected {
        return Err(PlacardError::encode("frame buffer size mismatch"));
    }

    let mut out = Vec::new();
    match format {
        EncodeFormat::Png => {
            let mut straight = frame.data.clone();
            unpremultiply_rgba8_in_place(&mut straight);
            PngEncoder::new(&mut out)
                .write_image(
                    &straight,
                    frame.width,
                    frame.height,
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| PlacardError::encode(format!("png encode failed: {e}")))?;
        }
        EncodeFormat::Jpeg { quality } => {
            // Premultiplied-over-white flatten: c + (255 - a) per channel.
            let mut rgb = Vec::with_capacity(expected / 4 * 3);
            for px in frame.data.chunks_exact(4) {
                let inv = 255 - px[3];
                rgb.push(px[0].saturating_add(inv));
                rgb.push(px[1].saturating_add(inv));
                rgb.push(px[2].saturating_add(inv));
            }
            JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                .write_image(
                    &rgb,
                    frame.width,
                    frame.height,
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| PlacardError::encode(format!("jpeg encode failed: {e}")))?;
        }
        EncodeFormat::WebP => {
            let mut straight = frame.data.clone();
            unpremultiply_rgba8_in_place(&mut straight);
            WebPEncoder::new_lossless(&mut out)
                .write_image(
                    &straight,
                    frame.width,
                    frame.height,
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| PlacardError::encode(format!("webp encode failed: {e}")))?;
        }
    }
    Ok(out)
}
