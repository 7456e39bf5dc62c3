use kurbo::{Affine, Point, Rect, Size};

use crate::foundation::core::SurfaceSize;
use crate::scene::model::ElementPosition;

/// Nominal auto-height fraction used when `height == 0` and no measured
/// content height is available yet. The text renderer replaces this with the
/// wrapped block's measured height before drawing and hit-testing.
pub const AUTO_HEIGHT_FRACTION: f64 = 0.2;

/// Device-space placement produced by the resolver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedLayout {
    /// Top-left of the element box in device pixels.
    pub origin: Point,
    /// Element box size in device pixels.
    pub size: Size,
    /// Rotation/scale pivot in device pixels (the anchor point).
    pub pivot: Point,
}

impl ResolvedLayout {
    /// Axis-aligned bounds of the unrotated element box.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }
}

/// Map a normalized element position into device space.
///
/// ```text
/// availW = W - 2P ; availH = H - 2P
/// ew = availW * width        (or eh when width == 0)
/// eh = availH * height       (or AUTO_HEIGHT_FRACTION * availH when height == 0)
/// ox = P + availW * x - ew * anchorX
/// oy = P + availH * y - eh * anchorY
/// ```
///
/// Nothing is clamped: out-of-range positions, negative sizes, and anchors
/// outside `[0, 1]` pass through unchanged and may place geometry off-canvas.
/// The interactive renderer and the exporter both call this with nothing but
/// a different `(surface, padding)` pair.
pub fn resolve_layout(
    position: &ElementPosition,
    surface: SurfaceSize,
    padding: f64,
) -> ResolvedLayout {
    let avail_w = f64::from(surface.width) - 2.0 * padding;
    let avail_h = f64::from(surface.height) - 2.0 * padding;

    let eh = if position.height == 0.0 {
        avail_h * AUTO_HEIGHT_FRACTION
    } else {
        avail_h * position.height
    };
    let ew = if position.width == 0.0 {
        eh
    } else {
        avail_w * position.width
    };

    let ox = padding + avail_w * position.x - ew * position.anchor_x;
    let oy = padding + avail_h * position.y - eh * position.anchor_y;

    ResolvedLayout {
        origin: Point::new(ox, oy),
        size: Size::new(ew, eh),
        pivot: Point::new(ox + ew * position.anchor_x, oy + eh * position.anchor_y),
    }
}

/// Re-anchor a resolved layout around a measured content height.
///
/// Used by the text path: the wrap result replaces the nominal auto height,
/// and the box is re-derived from the same anchor formula so the pivot stays
/// at the fractional position.
pub fn with_measured_height(
    position: &ElementPosition,
    surface: SurfaceSize,
    padding: f64,
    measured_height: f64,
) -> ResolvedLayout {
    let base = resolve_layout(position, surface, padding);
    let avail_h = f64::from(surface.height) - 2.0 * padding;
    let oy = padding + avail_h * position.y - measured_height * position.anchor_y;
    ResolvedLayout {
        origin: Point::new(base.origin.x, oy),
        size: Size::new(base.size.width, measured_height),
        pivot: base.pivot,
    }
}

/// Rotation-then-scale transform about the resolved pivot, composed with the
/// translation that places the element's local `[0,w]x[0,h]` space.
pub fn place_transform(position: &ElementPosition, layout: &ResolvedLayout) -> Affine {
    pivot_transform(position, layout) * Affine::translate(layout.origin.to_vec2())
}

/// Rotation and non-uniform scale about the pivot, in device space.
pub fn pivot_transform(position: &ElementPosition, layout: &ResolvedLayout) -> Affine {
    let pivot = layout.pivot.to_vec2();
    let rotate = Affine::rotate_about(position.rotation_deg.to_radians(), layout.pivot);
    let scale = Affine::translate(pivot)
        * Affine::scale_non_uniform(position.scale_x, position.scale_y)
        * Affine::translate(-pivot);
    rotate * scale
}

/// Point-in-rectangle test against the resolved (unrotated) box.
///
/// Rotation is deliberately ignored here; this mirrors the tap-to-select
/// behavior, which trades accuracy on rotated elements for a cheap test.
pub fn hit_test(
    position: &ElementPosition,
    surface: SurfaceSize,
    padding: f64,
    point: Point,
    measured_height: Option<f64>,
) -> bool {
    let layout = match measured_height {
        Some(h) => with_measured_height(position, surface, padding, h),
        None => resolve_layout(position, surface, padding),
    };
    // Negative sizes produce an inverted rect; normalize before testing.
    let r = layout.rect();
    let r = Rect::new(
        r.x0.min(r.x1),
        r.y0.min(r.y1),
        r.x0.max(r.x1),
        r.y0.max(r.y1),
    );
    r.contains(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centered(width: f64) -> ElementPosition {
        ElementPosition {
            width,
            height: 0.4,
            ..ElementPosition::default()
        }
    }

    #[test]
    fn worked_example_from_contract() {
        // canvas 1080x1080, padding 40, width 0.9, centered
        let layout = resolve_layout(
            &ElementPosition {
                width: 0.9,
                height: 0.5,
                ..ElementPosition::default()
            },
            SurfaceSize::new(1080, 1080),
            40.0,
        );
        assert!((layout.size.width - 900.0).abs() < 1e-9);
        assert!((layout.origin.x - 90.0).abs() < 1e-9);
    }

    #[test]
    fn centering_is_independent_of_width() {
        let surface = SurfaceSize::new(1080, 1080);
        for w in [0.1, 0.25, 0.5, 0.9, 1.3] {
            let layout = resolve_layout(&centered(w), surface, 40.0);
            let center_x = layout.origin.x + layout.size.width / 2.0;
            let center_y = layout.origin.y + layout.size.height / 2.0;
            assert!((center_x - 540.0).abs() < 1e-9, "w={w}");
            assert!((center_y - 540.0).abs() < 1e-9, "w={w}");
        }
    }

    #[test]
    fn pivot_sits_at_fractional_position() {
        let pos = ElementPosition {
            x: 0.25,
            y: 0.75,
            anchor_x: 0.1,
            anchor_y: 0.9,
            width: 0.3,
            height: 0.3,
            ..ElementPosition::default()
        };
        let layout = resolve_layout(&pos, SurfaceSize::new(1000, 1000), 0.0);
        assert!((layout.pivot.x - 250.0).abs() < 1e-9);
        assert!((layout.pivot.y - 750.0).abs() < 1e-9);
    }

    #[test]
    fn auto_height_and_height_derived_width() {
        let pos = ElementPosition {
            width: 0.0,
            height: 0.0,
            ..ElementPosition::default()
        };
        let layout = resolve_layout(&pos, SurfaceSize::new(1080, 1080), 40.0);
        // height: 0.2 * 1000, width derived square from height
        assert!((layout.size.height - 200.0).abs() < 1e-9);
        assert!((layout.size.width - 200.0).abs() < 1e-9);
    }

    #[test]
    fn measured_height_keeps_pivot() {
        let pos = ElementPosition {
            height: 0.0,
            ..ElementPosition::default()
        };
        let surface = SurfaceSize::new(1080, 1080);
        let nominal = resolve_layout(&pos, surface, 40.0);
        let measured = with_measured_height(&pos, surface, 40.0, 312.5);
        assert_eq!(nominal.pivot, measured.pivot);
        assert!((measured.size.height - 312.5).abs() < 1e-9);
        let center_y = measured.origin.y + measured.size.height / 2.0;
        assert!((center_y - 540.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_values_do_not_panic() {
        let pos = ElementPosition {
            x: -3.0,
            y: 7.0,
            width: -0.5,
            height: 2.0,
            anchor_x: 4.0,
            anchor_y: -1.0,
            rotation_deg: 1234.0,
            scale_x: -2.0,
            scale_y: 0.0,
        };
        let layout = resolve_layout(&pos, SurfaceSize::new(10, 10), 100.0);
        let _ = place_transform(&pos, &layout);
        assert!(layout.size.width < 0.0);
    }

    #[test]
    fn hit_test_uses_measured_height_and_ignores_rotation() {
        let pos = ElementPosition {
            height: 0.0,
            rotation_deg: 45.0,
            ..ElementPosition::default()
        };
        let surface = SurfaceSize::new(1000, 1000);
        // Measured block is short; a point inside the nominal box but outside
        // the measured box must miss.
        let inside = Point::new(500.0, 505.0);
        let outside = Point::new(500.0, 595.0);
        assert!(hit_test(&pos, surface, 0.0, inside, Some(40.0)));
        assert!(!hit_test(&pos, surface, 0.0, outside, Some(40.0)));
        assert!(hit_test(&pos, surface, 0.0, outside, None));
    }
}
