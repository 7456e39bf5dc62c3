pub use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};

/// Pixel dimensions of a render target surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Create a surface size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either dimension is zero.
    ///
    /// Empty surfaces are a tolerated input: renderers treat them as a no-op
    /// rather than an error.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scale both dimensions by `factor`, rounding to whole pixels.
    ///
    /// Non-finite or non-positive factors collapse to an empty surface.
    pub fn scaled(self, factor: f64) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return Self::new(0, 0);
        }
        let scale = |v: u32| -> u32 { ((f64::from(v)) * factor).round().max(0.0) as u32 };
        Self::new(scale(self.width), scale(self.height))
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_rounds_to_pixels() {
        let s = SurfaceSize::new(1080, 1080);
        assert_eq!(s.scaled(2.0), SurfaceSize::new(2160, 2160));
        assert_eq!(s.scaled(0.5), SurfaceSize::new(540, 540));
        assert!(s.scaled(0.0).is_empty());
        assert!(s.scaled(f64::NAN).is_empty());
    }

    #[test]
    fn premultiply_matches_rounding() {
        let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
        assert_eq!(c.a, 128);
        assert_eq!(c.r, 128);
        assert_eq!(c.g, 64);
        assert_eq!(c.b, 0);
    }
}
