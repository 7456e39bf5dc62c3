use kurbo::{Affine, BezPath, Circle, Ellipse, Point, Rect};

use crate::foundation::color::PackedColor;
use crate::foundation::core::SurfaceSize;
use crate::foundation::math::hash_unit;
use crate::render::paint::{affine_to_cpu, bezpath_to_cpu, cpu_color};
use crate::render::shape::{from_shape, stroke_outline};
use crate::scene::model::{PatternKind, PatternSettings};

/// Default seed for the scatter-style generators.
///
/// The seed is an explicit parameter of [`render_pattern_overlay`] so tests
/// can supply their own; production call sites pass this constant, which is
/// what makes repeated renders of the same settings bit-for-bit identical.
pub const DEFAULT_PATTERN_SEED: u64 = 0x504C_4143_4152_4421;

/// Hard cap on lattice steps per axis, so hostile scale values cannot turn a
/// single overlay into millions of primitives.
const MAX_STEPS: usize = 720;

/// Paint one procedural pattern overlay across the surface.
///
/// Pure function of `(surface, settings, seed)`: no ambient state, no clock,
/// no global RNG. Only `OrganicBlobs` and `ScatteredDots` consume the seed.
pub(crate) fn render_pattern_overlay(
    ctx: &mut vello_cpu::RenderContext,
    settings: &PatternSettings,
    surface: SurfaceSize,
    seed: u64,
) {
    if surface.is_empty() {
        return;
    }
    let w = f64::from(surface.width);
    let h = f64::from(surface.height);

    let opacity = if settings.opacity.is_finite() {
        settings.opacity.clamp(0.0, 1.0)
    } else {
        1.0
    };
    if opacity <= 0.0 {
        return;
    }
    let scale = if settings.scale.is_finite() {
        settings.scale.clamp(0.05, 10.0)
    } else {
        1.0
    };
    let density = if settings.density.is_finite() {
        settings.density.clamp(0.05, 4.0)
    } else {
        1.0
    };
    let rotation = if settings.rotation_deg.is_finite() {
        settings.rotation_deg
    } else {
        0.0
    };

    let min_dim = w.min(h);
    let cell = ((min_dim / 12.0) * scale).max(1.0);
    let center = Point::new(w / 2.0, h / 2.0);
    // Primitives are laid out over a disc covering the rotated surface so no
    // rotation angle exposes unpainted corners.
    let half = (w * w + h * h).sqrt() / 2.0;
    let rot = Affine::rotate_about(rotation.to_radians(), center);

    let primary = settings.color;
    let secondary = settings.secondary_color;

    ctx.set_transform(affine_to_cpu(rot));
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity as f32);
    }

    match settings.kind {
        PatternKind::Dots => {
            let r = cell * 0.22 * density;
            for_lattice(center, half, cell, |x, y, _, _| {
                fill(ctx, primary, &from_shape(Circle::new((x, y), r)));
            });
        }
        PatternKind::Grid => {
            let t = cell * 0.06 * density;
            for v in steps(center.x, half, cell) {
                fill_rect(ctx, primary, v - t / 2.0, center.y - half, t, half * 2.0);
            }
            for v in steps(center.y, half, cell) {
                fill_rect(ctx, primary, center.x - half, v - t / 2.0, half * 2.0, t);
            }
        }
        PatternKind::Stripes => {
            let t = cell * 0.4 * density;
            for v in steps(center.y, half, cell) {
                fill_rect(ctx, primary, center.x - half, v - t / 2.0, half * 2.0, t);
            }
        }
        PatternKind::DiagonalLines => {
            parallel_lines(ctx, primary, center, half, cell, density, rotation + 45.0);
        }
        PatternKind::CrossHatch => {
            parallel_lines(ctx, primary, center, half, cell, density, rotation + 45.0);
            parallel_lines(ctx, secondary, center, half, cell, density, rotation - 45.0);
            ctx.set_transform(affine_to_cpu(rot));
        }
        PatternKind::Waves => {
            let amp = cell * 0.35 * density;
            let t = cell * 0.12 * density;
            for y in steps(center.y, half, cell) {
                let mut p = BezPath::new();
                p.move_to((center.x - half, y));
                for (i, x) in steps(center.x, half, cell).into_iter().enumerate() {
                    let mid_y = if i % 2 == 0 { y - amp } else { y + amp };
                    p.quad_to((x + cell / 2.0, mid_y), (x + cell, y));
                }
                fill(ctx, primary, &stroke_outline(&p, t));
            }
        }
        PatternKind::Circles => {
            let r = cell * 0.35;
            let t = cell * 0.08 * density;
            for_lattice(center, half, cell, |x, y, _, _| {
                let ring = stroke_outline(&from_shape(Circle::new((x, y), r)), t);
                fill(ctx, primary, &ring);
            });
        }
        PatternKind::Rings => {
            let t = cell * 0.1 * density;
            for i in 1..=MAX_STEPS {
                let r = (i as f64) * cell;
                if r >= half {
                    break;
                }
                let ring = stroke_outline(&from_shape(Circle::new(center, r)), t);
                fill(ctx, primary, &ring);
            }
        }
        PatternKind::Hexagons => {
            let r = cell * 0.42;
            let t = cell * 0.08 * density;
            for_lattice(center, half, cell, |x, y, _, row| {
                let x = if row % 2 == 0 { x } else { x + cell / 2.0 };
                let hexagon = ngon(Point::new(x, y), r, 6, -std::f64::consts::FRAC_PI_2);
                fill(ctx, primary, &stroke_outline(&hexagon, t));
            });
        }
        PatternKind::Triangles => {
            let r = cell * 0.4 * density;
            for_lattice(center, half, cell, |x, y, col, row| {
                let up = (col + row) % 2 == 0;
                let angle = if up {
                    -std::f64::consts::FRAC_PI_2
                } else {
                    std::f64::consts::FRAC_PI_2
                };
                let color = if up { primary } else { secondary };
                fill(ctx, color, &ngon(Point::new(x, y), r, 3, angle));
            });
        }
        PatternKind::Chevrons => {
            let amp = cell * 0.4 * density;
            let t = cell * 0.14 * density;
            for y in steps(center.y, half, cell) {
                let mut p = BezPath::new();
                p.move_to((center.x - half, y));
                for (i, x) in steps(center.x, half, cell).into_iter().enumerate() {
                    let peak_y = if i % 2 == 0 { y - amp } else { y + amp };
                    p.line_to((x + cell / 2.0, peak_y));
                    p.line_to((x + cell, y));
                }
                fill(ctx, primary, &stroke_outline(&p, t));
            }
        }
        PatternKind::Diamonds => {
            let r = cell * 0.35 * density;
            for_lattice(center, half, cell, |x, y, _, _| {
                fill(ctx, primary, &ngon(Point::new(x, y), r, 4, 0.0));
            });
        }
        PatternKind::Checkerboard => {
            for_lattice(center, half, cell, |x, y, col, row| {
                if (col + row) % 2 == 0 {
                    fill_rect(ctx, primary, x - cell / 2.0, y - cell / 2.0, cell, cell);
                }
            });
        }
        PatternKind::Stars => {
            let r = cell * 0.42 * density;
            for_lattice(center, half, cell, |x, y, _, _| {
                fill(ctx, primary, &four_point_star(Point::new(x, y), r));
            });
        }
        PatternKind::Crosses => {
            let arm = cell * 0.38 * density;
            let t = cell * 0.14 * density;
            for_lattice(center, half, cell, |x, y, _, _| {
                fill_rect(ctx, primary, x - arm, y - t / 2.0, arm * 2.0, t);
                fill_rect(ctx, primary, x - t / 2.0, y - arm, t, arm * 2.0);
            });
        }
        PatternKind::OrganicBlobs => {
            let count = ((min_dim / cell) as usize).clamp(4, 48);
            for i in 0..count {
                let k = i as u32;
                let x = hash_unit(seed, k, 0) * w;
                let y = hash_unit(seed, k, 1) * h;
                let rx = cell * (0.5 + hash_unit(seed, k, 2)) * density;
                let ry = cell * (0.5 + hash_unit(seed, k, 3)) * density;
                let th = hash_unit(seed, k, 4) * std::f64::consts::PI;
                let color = if i % 3 == 0 { secondary } else { primary };
                fill(ctx, color, &from_shape(Ellipse::new((x, y), (rx, ry), th)));
            }
        }
        PatternKind::ScatteredDots => {
            let count = (((min_dim / cell) * 12.0) as usize).clamp(16, 1024);
            for i in 0..count {
                let k = i as u32;
                let x = hash_unit(seed, k, 0) * w;
                let y = hash_unit(seed, k, 1) * h;
                let r = cell * (0.06 + hash_unit(seed, k, 2) * 0.2) * density;
                fill(ctx, primary, &from_shape(Circle::new((x, y), r)));
            }
        }
        PatternKind::CornerAccent => {
            let r = min_dim * 0.45 * density;
            fill(ctx, primary, &from_shape(Circle::new((0.0, 0.0), r)));
            fill(
                ctx,
                secondary,
                &from_shape(Circle::new((w, h), r * 0.55)),
            );
        }
        PatternKind::Frame => {
            let inset = cell;
            let t = cell * 0.3 * density;
            let frame = from_shape(Rect::new(inset, inset, w - inset, h - inset));
            fill(ctx, primary, &stroke_outline(&frame, t));
        }
        PatternKind::SoftShapes => {
            let discs: [(f64, f64, f64); 5] = [
                (0.2, 0.3, 0.35),
                (0.75, 0.2, 0.25),
                (0.85, 0.7, 0.3),
                (0.3, 0.8, 0.28),
                (0.55, 0.5, 0.2),
            ];
            for (i, (fx, fy, fr)) in discs.iter().enumerate() {
                let base = if i % 2 == 0 { primary } else { secondary };
                let soft = base.with_opacity(0.35);
                fill(
                    ctx,
                    soft,
                    &from_shape(Circle::new((fx * w, fy * h), fr * min_dim * density)),
                );
            }
        }
    }

    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn fill(ctx: &mut vello_cpu::RenderContext, color: PackedColor, path: &BezPath) {
    ctx.set_paint(cpu_color(color));
    ctx.fill_path(&bezpath_to_cpu(path));
}

fn fill_rect(
    ctx: &mut vello_cpu::RenderContext,
    color: PackedColor,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
) {
    ctx.set_paint(cpu_color(color));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x, y, x + w, y + h));
}

fn steps(center: f64, half: f64, cell: f64) -> Vec<f64> {
    let n = (((half * 2.0) / cell).ceil() as usize + 1).min(MAX_STEPS);
    (0..n).map(|i| center - half + (i as f64) * cell).collect()
}

fn for_lattice(
    center: Point,
    half: f64,
    cell: f64,
    mut draw: impl FnMut(f64, f64, usize, usize),
) {
    for (row, y) in steps(center.y, half, cell).into_iter().enumerate() {
        for (col, x) in steps(center.x, half, cell).into_iter().enumerate() {
            draw(x, y, col, row);
        }
    }
}

fn parallel_lines(
    ctx: &mut vello_cpu::RenderContext,
    color: PackedColor,
    center: Point,
    half: f64,
    cell: f64,
    density: f64,
    angle_deg: f64,
) {
    ctx.set_transform(affine_to_cpu(Affine::rotate_about(
        angle_deg.to_radians(),
        center,
    )));
    let t = cell * 0.08 * density;
    for v in steps(center.x, half, cell) {
        fill_rect(ctx, color, v - t / 2.0, center.y - half, t, half * 2.0);
    }
}

fn ngon(center: Point, radius: f64, sides: usize, start_angle: f64) -> BezPath {
    let mut p = BezPath::new();
    for i in 0..sides {
        let th = start_angle + (i as f64) * std::f64::consts::TAU / (sides as f64);
        let pt = (center.x + radius * th.cos(), center.y + radius * th.sin());
        if i == 0 {
            p.move_to(pt);
        } else {
            p.line_to(pt);
        }
    }
    p.close_path();
    p
}

fn four_point_star(center: Point, radius: f64) -> BezPath {
    let mut p = BezPath::new();
    for i in 0..8 {
        let th = -std::f64::consts::FRAC_PI_2
            + (i as f64) * std::f64::consts::FRAC_PI_4;
        let r = if i % 2 == 0 { radius } else { radius * 0.38 };
        let pt = (center.x + r * th.cos(), center.y + r * th.sin());
        if i == 0 {
            p.move_to(pt);
        } else {
            p.line_to(pt);
        }
    }
    p.close_path();
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(bytes: &[u8]) -> u64 {
        let mut h = crate::foundation::math::Fnv1a64::new(
            crate::foundation::math::Fnv1a64::OFFSET_BASIS,
        );
        h.write_bytes(bytes);
        h.finish()
    }

    fn render(settings: &PatternSettings, seed: u64) -> Vec<u8> {
        let mut ctx = vello_cpu::RenderContext::new(64, 64);
        let mut pixmap = vello_cpu::Pixmap::new(64, 64);
        render_pattern_overlay(&mut ctx, settings, SurfaceSize::new(64, 64), seed);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        pixmap.data_as_u8_slice().to_vec()
    }

    #[test]
    fn seeded_generators_are_bit_identical() {
        for kind in [PatternKind::OrganicBlobs, PatternKind::ScatteredDots] {
            let settings = PatternSettings {
                kind,
                ..PatternSettings::default()
            };
            let a = render(&settings, DEFAULT_PATTERN_SEED);
            let b = render(&settings, DEFAULT_PATTERN_SEED);
            assert_eq!(digest(&a), digest(&b), "{kind:?}");
            assert!(a.iter().any(|&v| v != 0), "{kind:?} drew nothing");
        }
    }

    #[test]
    fn different_seed_changes_scatter_output() {
        let settings = PatternSettings {
            kind: PatternKind::ScatteredDots,
            ..PatternSettings::default()
        };
        let a = render(&settings, 1);
        let b = render(&settings, 2);
        assert_ne!(digest(&a), digest(&b));
    }

    #[test]
    fn every_kind_renders_without_panicking() {
        for kind in [
            PatternKind::Dots,
            PatternKind::Grid,
            PatternKind::Stripes,
            PatternKind::DiagonalLines,
            PatternKind::CrossHatch,
            PatternKind::Waves,
            PatternKind::Circles,
            PatternKind::Rings,
            PatternKind::Hexagons,
            PatternKind::Triangles,
            PatternKind::Chevrons,
            PatternKind::Diamonds,
            PatternKind::Checkerboard,
            PatternKind::Stars,
            PatternKind::Crosses,
            PatternKind::OrganicBlobs,
            PatternKind::ScatteredDots,
            PatternKind::CornerAccent,
            PatternKind::Frame,
            PatternKind::SoftShapes,
        ] {
            let settings = PatternSettings {
                kind,
                rotation_deg: 30.0,
                ..PatternSettings::default()
            };
            let out = render(&settings, DEFAULT_PATTERN_SEED);
            assert!(out.iter().any(|&v| v != 0), "{kind:?} drew nothing");
        }
    }

    #[test]
    fn hostile_parameters_are_tolerated() {
        let settings = PatternSettings {
            kind: PatternKind::Dots,
            scale: f64::NAN,
            density: f64::INFINITY,
            rotation_deg: f64::NAN,
            opacity: 42.0,
            ..PatternSettings::default()
        };
        let _ = render(&settings, DEFAULT_PATTERN_SEED);

        let mut ctx = vello_cpu::RenderContext::new(16, 16);
        // Zero-size surface is a no-op, not an error.
        render_pattern_overlay(
            &mut ctx,
            &PatternSettings::default(),
            SurfaceSize::new(0, 0),
            DEFAULT_PATTERN_SEED,
        );
    }
}
