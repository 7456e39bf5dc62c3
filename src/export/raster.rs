use crate::foundation::error::{PlacardError, PlacardResult};
use crate::render::FrameRgba;
use crate::render::compositor::{PageRenderer, RenderOptions};
use crate::scene::model::Page;

/// Render `page` into an offscreen raster at `canvas_size x scale`.
///
/// This re-runs the exact layout/background/text/shape code of the
/// interactive path; only the `(surface, scale)` pair differs, so element
/// bounding boxes in the output are the interactive ones multiplied by
/// `scale`. Rounded corners are applied afterwards as a post-process by
/// [`clear_rounded_corners`].
///
/// Pure with respect to the page snapshot: the only side effect is the
/// output buffer allocation.
#[tracing::instrument(skip(renderer, page), fields(page = %page.id))]
pub fn render_to_image(
    renderer: &mut PageRenderer,
    page: &Page,
    scale: f64,
) -> PlacardResult<FrameRgba> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PlacardError::validation(
            "export scale must be finite and > 0",
        ));
    }
    let surface = page.canvas.aspect.size().scaled(scale);
    let rendered = renderer.render_page(page, surface, scale, None, &RenderOptions::default())?;
    let mut frame = rendered.frame;
    clear_rounded_corners(&mut frame, page.canvas.corner_radius * scale);
    Ok(frame)
}

/// Clear the four corner regions outside quarter-circle arcs.
///
/// This is the known post-process approximation of true rounded-corner
/// clipping: each corner pixel whose center lies outside the arc is zeroed.
/// A radius of zero (or an empty frame) leaves the buffer byte-identical.
pub fn clear_rounded_corners(frame: &mut FrameRgba, radius: f64) {
    if !(radius > 0.0) || frame.width == 0 || frame.height == 0 {
        return;
    }
    let w = frame.width as usize;
    let h = frame.height as usize;
    let r = radius
        .min(f64::from(frame.width) / 2.0)
        .min(f64::from(frame.height) / 2.0);
    let span = r.ceil() as usize;

    let mut clear_px = |x: usize, y: usize| {
        let idx = (y * w + x) * 4;
        frame.data[idx..idx + 4].fill(0);
    };

    for cy in 0..span.min(h) {
        for cx in 0..span.min(w) {
            let dx = r - (cx as f64 + 0.5);
            let dy = r - (cy as f64 + 0.5);
            if dx * dx + dy * dy <= r * r {
                continue;
            }
            // Same offset from all four corners.
            clear_px(cx, cy);
            clear_px(w - 1 - cx, cy);
            clear_px(cx, h - 1 - cy);
            clear_px(w - 1 - cx, h - 1 - cy);
        }
    }
}
