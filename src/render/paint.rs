use std::sync::Arc;

use kurbo::{Affine, BezPath, PathEl};

use crate::foundation::color::PackedColor;
use crate::foundation::error::{PlacardError, PlacardResult};

pub(crate) fn cpu_color(c: PackedColor) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.red(), c.green(), c.blue(), c.alpha())
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> PlacardResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PlacardError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PlacardError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PlacardError::render("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

pub(crate) fn rgba_premul_to_image(
    bytes_premul: &[u8],
    width: u32,
    height: u32,
) -> PlacardResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Convert a premultiplied buffer back to straight alpha in place.
pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        for c in 0..3 {
            let v = (u16::from(px[c]) * 255 + a / 2) / a;
            px[c] = v.min(255) as u8;
        }
    }
}
