use kurbo::{Rect, RoundedRect};

use crate::foundation::color::PackedColor;
use crate::foundation::core::SurfaceSize;
use crate::foundation::error::PlacardResult;
use crate::render::paint::{bezpath_to_cpu, cpu_color, rgba_premul_to_image};
use crate::render::pattern::render_pattern_overlay;
use crate::render::shape::from_shape;
use crate::scene::model::{
    BackgroundKind, BackgroundSettings, GradientKind, GradientSettings, TileMode,
};

/// Built-in two-color gradient used when the configured color list is empty.
pub const DEFAULT_GRADIENT_COLORS: [PackedColor; 2] =
    [PackedColor(0xFF66_7EEA), PackedColor(0xFF76_4BA2)];

/// How a background draw resolved.
///
/// The fallback chain is an explicit value rather than a swallowed exception
/// so callers and tests can assert which path ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundOutcome {
    /// The configured background painted as requested.
    Rendered,
    /// A solid substitute color painted instead of the configured background.
    FallbackSolid,
    /// Nothing painted (zero-size target).
    Skipped,
}

/// Normalize a gradient color list so it is safe to build a brush from.
///
/// Two or more entries pass through verbatim; a singleton is duplicated; an
/// empty list becomes [`DEFAULT_GRADIENT_COLORS`]. Paint primitives behave
/// undefined below two colors, so this runs before any gradient
/// construction.
pub fn safe_color_list(colors: &[PackedColor]) -> Vec<PackedColor> {
    match colors.len() {
        0 => DEFAULT_GRADIENT_COLORS.to_vec(),
        1 => vec![colors[0], colors[0]],
        _ => colors.to_vec(),
    }
}

/// Paint the page background into `ctx`.
///
/// `corner_radius` is in device pixels (the caller folds its scale factor
/// in). A zero-size surface skips drawing entirely; any gradient
/// construction failure falls back to filling with the first safe color.
#[tracing::instrument(skip(ctx, settings), fields(kind = ?settings.kind))]
pub(crate) fn render_background(
    ctx: &mut vello_cpu::RenderContext,
    settings: &BackgroundSettings,
    surface: SurfaceSize,
    corner_radius: f64,
    pattern_seed: u64,
) -> PlacardResult<BackgroundOutcome> {
    if surface.is_empty() {
        return Ok(BackgroundOutcome::Skipped);
    }
    let w = f64::from(surface.width);
    let h = f64::from(surface.height);

    let base_path = if corner_radius > 0.0 {
        let r = corner_radius.min(w / 2.0).min(h / 2.0);
        from_shape(RoundedRect::new(0.0, 0.0, w, h, r))
    } else {
        from_shape(Rect::new(0.0, 0.0, w, h))
    };
    let cpu_path = bezpath_to_cpu(&base_path);

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

    match settings.kind {
        BackgroundKind::Solid => {
            ctx.set_paint(cpu_color(settings.solid.color));
            ctx.fill_path(&cpu_path);
            Ok(BackgroundOutcome::Rendered)
        }
        BackgroundKind::Gradient => {
            let safe = safe_color_list(&settings.gradient.colors);
            match rasterize_gradient(&settings.gradient, &safe, surface) {
                Ok(image) => {
                    ctx.set_paint(image);
                    ctx.fill_path(&cpu_path);
                    Ok(BackgroundOutcome::Rendered)
                }
                Err(err) => {
                    tracing::warn!(%err, "gradient brush failed, filling with first safe color");
                    ctx.set_paint(cpu_color(safe[0]));
                    ctx.fill_path(&cpu_path);
                    Ok(BackgroundOutcome::FallbackSolid)
                }
            }
        }
        BackgroundKind::Pattern => {
            ctx.set_paint(cpu_color(settings.pattern.background));
            ctx.fill_path(&cpu_path);
            render_pattern_overlay(ctx, &settings.pattern, surface, pattern_seed);
            Ok(BackgroundOutcome::Rendered)
        }
        BackgroundKind::Image => {
            // Image compositing is an external collaborator; this engine only
            // paints the fallback color.
            ctx.set_paint(cpu_color(settings.image.fallback_color));
            ctx.fill_path(&cpu_path);
            Ok(BackgroundOutcome::FallbackSolid)
        }
    }
}

/// Rasterize the gradient into a full-surface image paint.
///
/// The gradient is evaluated per pixel in premultiplied space and handed to
/// the raster layer as a plain image paint.
fn rasterize_gradient(
    settings: &GradientSettings,
    safe_colors: &[PackedColor],
    surface: SurfaceSize,
) -> PlacardResult<vello_cpu::Image> {
    let w = surface.width;
    let h = surface.height;
    let wf = f64::from(w);
    let hf = f64::from(h);

    let stops = resolve_stops(safe_colors.len(), &settings.stops);
    let premul: Vec<[f64; 4]> = safe_colors
        .iter()
        .map(|c| {
            let p = c.to_premul();
            [
                f64::from(p.r),
                f64::from(p.g),
                f64::from(p.b),
                f64::from(p.a),
            ]
        })
        .collect();

    let angle = if settings.angle_deg.is_finite() {
        settings.angle_deg.to_radians()
    } else {
        0.0
    };
    let (cx, cy) = (
        sane_fraction(settings.center_x, 0.5) * wf,
        sane_fraction(settings.center_y, 0.5) * hf,
    );
    // Radius below one pixel produces a degenerate brush; clamp up.
    let radius = (sane_fraction(settings.radius, 0.5) * wf.max(hf)).max(1.0);

    let (dir_x, dir_y) = (angle.cos(), angle.sin());
    let half_span = wf.max(hf) / 2.0;
    let (start_x, start_y) = (wf / 2.0 - dir_x * half_span, hf / 2.0 - dir_y * half_span);

    let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
    for y in 0..h {
        for x in 0..w {
            let px = f64::from(x) + 0.5;
            let py = f64::from(y) + 0.5;
            let raw_t = match settings.kind {
                GradientKind::Linear | GradientKind::Mesh => {
                    // Mesh is approximated by a plain linear gradient.
                    ((px - start_x) * dir_x + (py - start_y) * dir_y) / (2.0 * half_span)
                }
                GradientKind::Radial => {
                    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt() / radius
                }
                GradientKind::Sweep => {
                    (((py - cy).atan2(px - cx) - angle) / std::f64::consts::TAU).rem_euclid(1.0)
                }
            };
            let t = apply_tile(raw_t, settings.tile);
            let c = sample_stops(&premul, &stops, t);
            let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
            bytes[idx] = c[0];
            bytes[idx + 1] = c[1];
            bytes[idx + 2] = c[2];
            bytes[idx + 3] = c[3];
        }
    }

    rgba_premul_to_image(&bytes, w, h)
}

fn sane_fraction(v: f64, default: f64) -> f64 {
    if v.is_finite() { v } else { default }
}

fn apply_tile(t: f64, tile: TileMode) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    match tile {
        TileMode::Clamp => t.clamp(0.0, 1.0),
        TileMode::Repeat => t.rem_euclid(1.0),
        TileMode::Mirror => {
            let m = t.rem_euclid(2.0);
            if m > 1.0 { 2.0 - m } else { m }
        }
    }
}

/// Stop positions for `n` colors: the configured list when it matches in
/// length, is finite, and non-decreasing; uniform spacing otherwise.
fn resolve_stops(n: usize, configured: &[f64]) -> Vec<f64> {
    let usable = configured.len() == n
        && configured.iter().all(|s| s.is_finite() && (0.0..=1.0).contains(s))
        && configured.windows(2).all(|p| p[0] <= p[1]);
    if usable {
        return configured.to_vec();
    }
    if n == 1 {
        return vec![0.0];
    }
    (0..n).map(|i| (i as f64) / ((n - 1) as f64)).collect()
}

fn sample_stops(premul: &[[f64; 4]], stops: &[f64], t: f64) -> [u8; 4] {
    debug_assert_eq!(premul.len(), stops.len());
    let last = premul.len() - 1;
    if t <= stops[0] {
        return quantize(premul[0]);
    }
    if t >= stops[last] {
        return quantize(premul[last]);
    }
    for i in 0..last {
        let (s0, s1) = (stops[i], stops[i + 1]);
        if t <= s1 {
            let span = s1 - s0;
            let f = if span <= 0.0 { 0.0 } else { (t - s0) / span };
            let a = premul[i];
            let b = premul[i + 1];
            let lerp = |x: f64, y: f64| x + (y - x) * f;
            return quantize([
                lerp(a[0], b[0]),
                lerp(a[1], b[1]),
                lerp(a[2], b[2]),
                lerp(a[3], b[3]),
            ]);
        }
    }
    quantize(premul[last])
}

fn quantize(c: [f64; 4]) -> [u8; 4] {
    let q = |v: f64| -> u8 { v.round().clamp(0.0, 255.0) as u8 };
    [q(c[0]), q(c[1]), q(c[2]), q(c[3])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pattern::DEFAULT_PATTERN_SEED;

    #[test]
    fn singleton_color_list_is_duplicated() {
        let c = PackedColor::from_argb(255, 1, 2, 3);
        assert_eq!(safe_color_list(&[c]), vec![c, c]);
    }

    #[test]
    fn empty_color_list_uses_builtin_default() {
        assert_eq!(safe_color_list(&[]), DEFAULT_GRADIENT_COLORS.to_vec());
        // Deterministically: twice the same.
        assert_eq!(safe_color_list(&[]), safe_color_list(&[]));
    }

    #[test]
    fn two_or_more_colors_pass_through_verbatim() {
        let list = [
            PackedColor::WHITE,
            PackedColor::BLACK,
            PackedColor::from_argb(255, 9, 9, 9),
        ];
        assert_eq!(safe_color_list(&list), list.to_vec());
    }

    #[test]
    fn stops_fall_back_to_uniform_spacing() {
        assert_eq!(resolve_stops(3, &[0.0, 0.4, 1.0]), vec![0.0, 0.4, 1.0]);
        // Wrong length.
        assert_eq!(resolve_stops(3, &[0.5]), vec![0.0, 0.5, 1.0]);
        // Decreasing.
        assert_eq!(resolve_stops(2, &[0.9, 0.1]), vec![0.0, 1.0]);
        // Non-finite.
        assert_eq!(resolve_stops(2, &[0.0, f64::NAN]), vec![0.0, 1.0]);
    }

    #[test]
    fn tile_modes_map_positions() {
        assert_eq!(apply_tile(1.25, TileMode::Clamp), 1.0);
        assert!((apply_tile(1.25, TileMode::Repeat) - 0.25).abs() < 1e-12);
        assert!((apply_tile(1.25, TileMode::Mirror) - 0.75).abs() < 1e-12);
        assert_eq!(apply_tile(f64::NAN, TileMode::Repeat), 0.0);
    }

    fn render(settings: &BackgroundSettings, size: u16) -> (Vec<u8>, BackgroundOutcome) {
        let mut ctx = vello_cpu::RenderContext::new(size, size);
        let mut pixmap = vello_cpu::Pixmap::new(size, size);
        let outcome = render_background(
            &mut ctx,
            settings,
            SurfaceSize::new(u32::from(size), u32::from(size)),
            0.0,
            DEFAULT_PATTERN_SEED,
        )
        .unwrap();
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        (pixmap.data_as_u8_slice().to_vec(), outcome)
    }

    #[test]
    fn zero_size_surface_is_skipped() {
        let mut ctx = vello_cpu::RenderContext::new(8, 8);
        let outcome = render_background(
            &mut ctx,
            &BackgroundSettings::default(),
            SurfaceSize::new(0, 10),
            0.0,
            DEFAULT_PATTERN_SEED,
        )
        .unwrap();
        assert_eq!(outcome, BackgroundOutcome::Skipped);
    }

    #[test]
    fn solid_fill_covers_the_surface() {
        let mut settings = BackgroundSettings::default();
        settings.solid.color = PackedColor::from_argb(255, 10, 20, 30);
        let (px, outcome) = render(&settings, 8);
        assert_eq!(outcome, BackgroundOutcome::Rendered);
        assert_eq!(&px[0..4], &[10, 20, 30, 255]);
        let last = px.len() - 4;
        assert_eq!(&px[last..], &[10, 20, 30, 255]);
    }

    #[test]
    fn gradient_renders_between_endpoint_colors() {
        let mut settings = BackgroundSettings::default();
        settings.kind = BackgroundKind::Gradient;
        settings.gradient.kind = GradientKind::Linear;
        settings.gradient.angle_deg = 90.0;
        settings.gradient.colors =
            vec![PackedColor::from_argb(255, 0, 0, 0), PackedColor::WHITE];
        let (px, outcome) = render(&settings, 16);
        assert_eq!(outcome, BackgroundOutcome::Rendered);
        // Top row darker than bottom row.
        let top = px[0] as u32 + px[1] as u32 + px[2] as u32;
        let bottom_idx = px.len() - 4;
        let bottom =
            px[bottom_idx] as u32 + px[bottom_idx + 1] as u32 + px[bottom_idx + 2] as u32;
        assert!(top < bottom, "top {top} bottom {bottom}");
    }

    #[test]
    fn oversized_gradient_surface_falls_back_to_solid() {
        let mut ctx = vello_cpu::RenderContext::new(8, 8);
        let mut settings = BackgroundSettings::default();
        settings.kind = BackgroundKind::Gradient;
        settings.gradient.colors = vec![PackedColor::WHITE, PackedColor::BLACK];
        // Wider than a pixmap can be; brush construction fails and the first
        // safe color fills instead.
        let outcome = render_background(
            &mut ctx,
            &settings,
            SurfaceSize::new(100_000, 4),
            0.0,
            DEFAULT_PATTERN_SEED,
        )
        .unwrap();
        assert_eq!(outcome, BackgroundOutcome::FallbackSolid);
    }

    #[test]
    fn image_background_paints_fallback_color() {
        let mut settings = BackgroundSettings::default();
        settings.kind = BackgroundKind::Image;
        settings.image.fallback_color = PackedColor::from_argb(255, 7, 8, 9);
        let (px, outcome) = render(&settings, 8);
        assert_eq!(outcome, BackgroundOutcome::FallbackSolid);
        assert_eq!(&px[0..4], &[7, 8, 9, 255]);
    }

    #[test]
    fn sweep_and_radial_render_without_errors() {
        for kind in [GradientKind::Radial, GradientKind::Sweep, GradientKind::Mesh] {
            let mut settings = BackgroundSettings::default();
            settings.kind = BackgroundKind::Gradient;
            settings.gradient.kind = kind;
            settings.gradient.colors =
                vec![PackedColor::WHITE, PackedColor::from_argb(255, 200, 0, 0)];
            let (px, outcome) = render(&settings, 16);
            assert_eq!(outcome, BackgroundOutcome::Rendered, "{kind:?}");
            assert!(px.iter().any(|&v| v != 0), "{kind:?}");
        }
    }

    #[test]
    fn degenerate_radius_is_clamped_not_crashed() {
        let mut settings = BackgroundSettings::default();
        settings.kind = BackgroundKind::Gradient;
        settings.gradient.kind = GradientKind::Radial;
        settings.gradient.radius = 0.0;
        settings.gradient.colors = vec![PackedColor::WHITE, PackedColor::BLACK];
        let (_, outcome) = render(&settings, 8);
        assert_eq!(outcome, BackgroundOutcome::Rendered);
    }
}
