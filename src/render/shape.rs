use kurbo::{BezPath, Ellipse, Point, Rect, RoundedRect, Shape, Size};

use crate::scene::model::{ShapeKind, ShapeStyle};

/// Flattening tolerance used when converting analytic shapes to bezier paths.
const PATH_TOLERANCE: f64 = 0.1;

/// Bezier circle constant (control-point offset for a quarter arc).
const KAPPA: f64 = 0.552_284_749_831;

/// Return `true` for kinds that are open polylines (stroke-only, never
/// filled).
pub fn is_open(kind: ShapeKind) -> bool {
    matches!(kind, ShapeKind::Line | ShapeKind::Arrow)
}

/// Build the outline for a shape in local coordinates `[0,w] x [0,h]`.
///
/// Degenerate parameters (polygon/star with fewer than 3 sides, non-finite
/// boxes) degrade to the plain rectangle outline; this function never
/// panics.
pub fn shape_path(style: &ShapeStyle, size: Size) -> BezPath {
    let w = size.width;
    let h = size.height;
    if !w.is_finite() || !h.is_finite() {
        return rect_path(0.0, 0.0);
    }

    match style.kind {
        ShapeKind::Rectangle => rect_path(w, h),
        ShapeKind::RoundedRectangle => {
            let r = style.corner_radius.max(0.0).min(w.abs().min(h.abs()) / 2.0);
            from_shape(RoundedRect::new(0.0, 0.0, w, h, r))
        }
        ShapeKind::Circle => {
            let r = (w.min(h) / 2.0).abs();
            circle_path(Point::new(w / 2.0, h / 2.0), r, r, false)
        }
        ShapeKind::Oval => from_shape(Ellipse::new(
            (w / 2.0, h / 2.0),
            (w.abs() / 2.0, h.abs() / 2.0),
            0.0,
        )),
        ShapeKind::Triangle => polyline(
            &[
                Point::new(w / 2.0, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
            ],
            true,
        ),
        ShapeKind::Diamond => polyline(
            &[
                Point::new(w / 2.0, 0.0),
                Point::new(w, h / 2.0),
                Point::new(w / 2.0, h),
                Point::new(0.0, h / 2.0),
            ],
            true,
        ),
        ShapeKind::Pentagon => regular_polygon(5, w, h),
        ShapeKind::Hexagon => regular_polygon(6, w, h),
        ShapeKind::Polygon => {
            if style.sides < 3 {
                rect_path(w, h)
            } else {
                regular_polygon(style.sides, w, h)
            }
        }
        ShapeKind::Star => {
            if style.sides < 3 {
                rect_path(w, h)
            } else {
                star_path(style.sides, style.inner_radius, w, h)
            }
        }
        ShapeKind::Heart => heart_path(w, h),
        ShapeKind::Cross => cross_path(w, h),
        ShapeKind::Ring => ring_path(style.inner_radius, w, h),
        ShapeKind::Arrow => arrow_path(w, h),
        ShapeKind::Line => {
            let mut p = BezPath::new();
            p.move_to((0.0, h / 2.0));
            p.line_to((w, h / 2.0));
            p
        }
        ShapeKind::Parallelogram => {
            let s = w * 0.25;
            polyline(
                &[
                    Point::new(s, 0.0),
                    Point::new(w, 0.0),
                    Point::new(w - s, h),
                    Point::new(0.0, h),
                ],
                true,
            )
        }
        ShapeKind::Trapezoid => {
            let s = w * 0.2;
            polyline(
                &[
                    Point::new(s, 0.0),
                    Point::new(w - s, 0.0),
                    Point::new(w, h),
                    Point::new(0.0, h),
                ],
                true,
            )
        }
    }
}

/// Expand a path into a fillable stroke outline.
///
/// The rasterizer only fills; strokes are realized by filling the expanded
/// outline instead.
pub fn stroke_outline(path: &BezPath, width: f64) -> BezPath {
    kurbo::stroke(
        path.elements().iter().copied(),
        &kurbo::Stroke::new(width.max(0.0)),
        &kurbo::StrokeOpts::default(),
        PATH_TOLERANCE,
    )
}

pub(crate) fn from_shape(shape: impl Shape) -> BezPath {
    let mut p = BezPath::new();
    for el in shape.path_elements(PATH_TOLERANCE) {
        p.push(el);
    }
    p
}

fn rect_path(w: f64, h: f64) -> BezPath {
    from_shape(Rect::new(0.0, 0.0, w, h))
}

fn polyline(points: &[Point], close: bool) -> BezPath {
    let mut p = BezPath::new();
    let Some(first) = points.first() else {
        return p;
    };
    p.move_to(*first);
    for pt in &points[1..] {
        p.line_to(*pt);
    }
    if close {
        p.close_path();
    }
    p
}

/// Circle from four cubic arcs, with explicit winding so ring interiors can
/// run counter to their outer contour under the non-zero fill rule.
fn circle_path(center: Point, rx: f64, ry: f64, reverse: bool) -> BezPath {
    let (cx, cy) = (center.x, center.y);
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let mut p = BezPath::new();
    if !reverse {
        p.move_to((cx + rx, cy));
        p.curve_to((cx + rx, cy + ky), (cx + kx, cy + ry), (cx, cy + ry));
        p.curve_to((cx - kx, cy + ry), (cx - rx, cy + ky), (cx - rx, cy));
        p.curve_to((cx - rx, cy - ky), (cx - kx, cy - ry), (cx, cy - ry));
        p.curve_to((cx + kx, cy - ry), (cx + rx, cy - ky), (cx + rx, cy));
    } else {
        p.move_to((cx + rx, cy));
        p.curve_to((cx + rx, cy - ky), (cx + kx, cy - ry), (cx, cy - ry));
        p.curve_to((cx - kx, cy - ry), (cx - rx, cy - ky), (cx - rx, cy));
        p.curve_to((cx - rx, cy + ky), (cx - kx, cy + ry), (cx, cy + ry));
        p.curve_to((cx + kx, cy + ry), (cx + rx, cy + ky), (cx + rx, cy));
    }
    p.close_path();
    p
}

fn regular_polygon(sides: u32, w: f64, h: f64) -> BezPath {
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (rx, ry) = (w / 2.0, h / 2.0);
    let n = sides as usize;
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let th = -std::f64::consts::FRAC_PI_2 + (i as f64) * std::f64::consts::TAU / (n as f64);
        points.push(Point::new(cx + rx * th.cos(), cy + ry * th.sin()));
    }
    polyline(&points, true)
}

fn star_path(points_n: u32, inner_radius: f64, w: f64, h: f64) -> BezPath {
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (rx, ry) = (w / 2.0, h / 2.0);
    // Ratio outside (0, 1) would fold the star onto itself; pull it back in.
    let ir = if inner_radius.is_finite() {
        inner_radius.clamp(0.05, 0.95)
    } else {
        0.5
    };
    let n = points_n as usize;
    let mut points = Vec::with_capacity(2 * n);
    for i in 0..(2 * n) {
        let th =
            -std::f64::consts::FRAC_PI_2 + (i as f64) * std::f64::consts::PI / (n as f64);
        let (fx, fy) = if i % 2 == 0 { (rx, ry) } else { (rx * ir, ry * ir) };
        points.push(Point::new(cx + fx * th.cos(), cy + fy * th.sin()));
    }
    polyline(&points, true)
}

fn heart_path(w: f64, h: f64) -> BezPath {
    // Cubic approximation: two lobes meeting at the notch, tip at the bottom
    // center.
    let mut p = BezPath::new();
    p.move_to((0.5 * w, 0.35 * h));
    p.curve_to((0.5 * w, 0.22 * h), (0.4 * w, 0.08 * h), (0.25 * w, 0.08 * h));
    p.curve_to((0.08 * w, 0.08 * h), (0.0, 0.25 * h), (0.0, 0.4 * h));
    p.curve_to((0.0, 0.62 * h), (0.2 * w, 0.8 * h), (0.5 * w, h));
    p.curve_to((0.8 * w, 0.8 * h), (w, 0.62 * h), (w, 0.4 * h));
    p.curve_to((w, 0.25 * h), (0.92 * w, 0.08 * h), (0.75 * w, 0.08 * h));
    p.curve_to((0.6 * w, 0.08 * h), (0.5 * w, 0.22 * h), (0.5 * w, 0.35 * h));
    p.close_path();
    p
}

fn cross_path(w: f64, h: f64) -> BezPath {
    let (ax, ay) = (w / 3.0, h / 3.0);
    polyline(
        &[
            Point::new(ax, 0.0),
            Point::new(w - ax, 0.0),
            Point::new(w - ax, ay),
            Point::new(w, ay),
            Point::new(w, h - ay),
            Point::new(w - ax, h - ay),
            Point::new(w - ax, h),
            Point::new(ax, h),
            Point::new(ax, h - ay),
            Point::new(0.0, h - ay),
            Point::new(0.0, ay),
            Point::new(ax, ay),
        ],
        true,
    )
}

fn ring_path(inner_radius: f64, w: f64, h: f64) -> BezPath {
    let center = Point::new(w / 2.0, h / 2.0);
    let (rx, ry) = ((w / 2.0).abs(), (h / 2.0).abs());
    let ir = if inner_radius.is_finite() {
        inner_radius.clamp(0.05, 0.95)
    } else {
        0.5
    };
    let mut p = circle_path(center, rx, ry, false);
    // Inner contour wound the other way so non-zero fill leaves the hole.
    for el in circle_path(center, rx * ir, ry * ir, true).elements() {
        p.push(*el);
    }
    p
}

fn arrow_path(w: f64, h: f64) -> BezPath {
    let cy = h / 2.0;
    let head = (w * 0.25).min(h / 2.0);
    let mut p = BezPath::new();
    p.move_to((0.0, cy));
    p.line_to((w, cy));
    p.move_to((w - head, cy - head));
    p.line_to((w, cy));
    p.line_to((w - head, cy + head));
    p
}
