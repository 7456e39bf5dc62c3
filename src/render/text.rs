use std::borrow::Cow;
use std::collections::HashMap;

use kurbo::{Affine, Rect, RoundedRect, Size};

use crate::foundation::color::PackedColor;
use crate::foundation::error::{PlacardError, PlacardResult};
use crate::render::paint::{affine_to_cpu, bezpath_to_cpu, cpu_color};
use crate::render::shape::from_shape;
use crate::scene::model::{TextAlign, TextStyle, TextTransform};

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrush {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl TextBrush {
    fn from_packed(c: PackedColor) -> Self {
        Self {
            r: c.red(),
            g: c.green(),
            b: c.blue(),
            a: c.alpha(),
        }
    }
}

/// Measured extent of a wrapped text block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BlockMetrics {
    /// Widest line advance in pixels.
    pub width: f64,
    /// Total block height in pixels (sum of line heights).
    pub height: f64,
}

/// Case transform applied to the displayed string only; the stored content is
/// never touched.
pub fn display_text(content: &str, transform: TextTransform) -> String {
    match transform {
        TextTransform::None => content.to_string(),
        TextTransform::Uppercase => content.to_uppercase(),
        TextTransform::Lowercase => content.to_lowercase(),
        TextTransform::Capitalize => {
            let mut out = String::with_capacity(content.len());
            let mut at_word_start = true;
            for ch in content.chars() {
                if ch.is_whitespace() {
                    at_word_start = true;
                    out.push(ch);
                } else if at_word_start {
                    at_word_start = false;
                    out.extend(ch.to_uppercase());
                } else {
                    out.extend(ch.to_lowercase());
                }
            }
            out
        }
    }
}

/// Stateful helper for building and drawing Parley text layouts.
///
/// Font resolution goes through the family stack with a generic fallback, so
/// an unknown family name degrades to the default font instead of failing.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    // Fonts resolved by parley are re-wrapped for the raster layer; keyed by
    // (blob id, index) so each face is converted once.
    cpu_fonts: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            cpu_fonts: HashMap::new(),
        }
    }

    /// Register a font from raw bytes and return its family name.
    ///
    /// Registered families take part in name resolution exactly like system
    /// fonts, which keeps headless renders deterministic.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> PlacardResult<String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            PlacardError::validation("no font families registered from font bytes")
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PlacardError::validation("registered font family has no name"))?
            .to_string();
        Ok(name)
    }

    /// Shape and wrap `text` against `max_width`, honoring the style's
    /// family/weight/italic, line height, letter spacing, and alignment.
    pub(crate) fn layout_block(
        &mut self,
        text: &str,
        style: &TextStyle,
        font_size_px: f32,
        max_width_px: f32,
    ) -> PlacardResult<parley::Layout<TextBrush>> {
        if !font_size_px.is_finite() || font_size_px <= 0.0 {
            return Err(PlacardError::validation(
                "text font size must be finite and > 0",
            ));
        }

        let family = if style.font_family.trim().is_empty() {
            "sans-serif".to_string()
        } else {
            format!("{}, sans-serif", style.font_family)
        };
        let weight = f32::from(style.font_weight.clamp(100, 900));
        let brush = TextBrush::from_packed(style.color);
        let line_height = if style.line_height.is_finite() && style.line_height > 0.0 {
            style.line_height as f32
        } else {
            1.2
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font_size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(weight),
        ));
        if style.italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }
        builder.push_default(parley::style::StyleProperty::LineHeight(
            parley::style::LineHeight::FontSizeRelative(line_height),
        ));
        if style.letter_spacing != 0.0 && style.letter_spacing.is_finite() {
            builder.push_default(parley::style::StyleProperty::LetterSpacing(
                (style.letter_spacing * f64::from(font_size_px)) as f32,
            ));
        }
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        let max_width = if max_width_px.is_finite() && max_width_px > 0.0 {
            Some(max_width_px)
        } else {
            None
        };
        layout.break_all_lines(max_width);
        layout.align(
            max_width,
            parley_alignment(style.align),
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }

    /// Measure a wrapped block from its line metrics.
    pub(crate) fn measure(layout: &parley::Layout<TextBrush>) -> BlockMetrics {
        let mut width = 0.0f64;
        let mut height = 0.0f64;
        for line in layout.lines() {
            let m = line.metrics();
            width = width.max(f64::from(m.advance));
            height += f64::from(m.ascent + m.descent + m.leading);
        }
        BlockMetrics { width, height }
    }

    /// Draw the block's glyphs with `transform` mapping block-local
    /// coordinates into device space. `color_override` replaces every run
    /// brush (shadow and outline passes).
    pub(crate) fn draw_glyphs(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layout: &parley::Layout<TextBrush>,
        transform: Affine,
        color_override: Option<PackedColor>,
    ) {
        ctx.set_transform(affine_to_cpu(transform));
        for line in layout.lines() {
            for item in line.items() {
                let parley::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                match color_override {
                    Some(c) => ctx.set_paint(cpu_color(c)),
                    None => {
                        let b = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));
                    }
                }
                let font = run.run().font();
                let key = (font.data.id(), font.index);
                let cpu_font = self
                    .cpu_fonts
                    .entry(key)
                    .or_insert_with(|| {
                        vello_cpu::peniko::FontData::new(
                            vello_cpu::peniko::Blob::from(font.data.as_ref().to_vec()),
                            font.index,
                        )
                    })
                    .clone();
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&cpu_font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    /// Draw underline / strikethrough bars for every glyph run.
    pub(crate) fn draw_decorations(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layout: &parley::Layout<TextBrush>,
        style: &TextStyle,
        font_size_px: f64,
        transform: Affine,
    ) {
        if !style.decoration.underline && !style.decoration.strikethrough {
            return;
        }
        let thickness = (font_size_px * 0.06).max(0.5);
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(cpu_color(style.color));
        for line in layout.lines() {
            for item in line.items() {
                let parley::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let x0 = f64::from(run.offset());
                let baseline = f64::from(run.baseline());
                let width: f64 = run.glyphs().map(|g| f64::from(g.advance)).sum();
                if width <= 0.0 {
                    continue;
                }
                if style.decoration.underline {
                    let y = baseline + font_size_px * 0.08;
                    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                        x0,
                        y,
                        x0 + width,
                        y + thickness,
                    ));
                }
                if style.decoration.strikethrough {
                    let y = baseline - font_size_px * 0.3;
                    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                        x0,
                        y,
                        x0 + width,
                        y + thickness,
                    ));
                }
            }
        }
    }
}

/// Draw one complete text block: chip, shadow pass, interactive glow/outline
/// passes, glyphs, then decorations.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_text_block(
    ctx: &mut vello_cpu::RenderContext,
    engine: &mut TextLayoutEngine,
    layout: &parley::Layout<TextBrush>,
    style: &TextStyle,
    font_size_px: f64,
    block: Size,
    transform: Affine,
    interactive_effects: bool,
) {
    if let Some(chip) = style.chip {
        let pad = (chip.padding.max(0.0)) * font_size_px;
        let radius = (chip.corner_radius.max(0.0)) * font_size_px;
        let rect = Rect::new(-pad, -pad, block.width + pad, block.height + pad);
        let path = if radius > 0.0 {
            from_shape(RoundedRect::from_rect(rect, radius))
        } else {
            from_shape(rect)
        };
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(cpu_color(chip.color));
        ctx.fill_path(&bezpath_to_cpu(&path));
    }

    if let Some(shadow) = style.shadow {
        let dx = shadow.dx * font_size_px;
        let dy = shadow.dy * font_size_px;
        // Blur is approximated: a wider blur fades the single offset pass.
        let alpha = 1.0 / (1.0 + shadow.blur.max(0.0));
        let color = shadow.color.with_opacity(alpha);
        engine.draw_glyphs(ctx, layout, transform * Affine::translate((dx, dy)), Some(color));
    }

    if interactive_effects {
        if let Some(glow) = style.glow {
            let r = (glow.radius.max(0.0)) * font_size_px;
            let color = glow.color.with_opacity(0.25);
            for (dx, dy) in ring_offsets(r) {
                engine.draw_glyphs(
                    ctx,
                    layout,
                    transform * Affine::translate((dx, dy)),
                    Some(color),
                );
            }
        }
        if let Some(outline) = style.outline {
            let r = (outline.width.max(0.0)) * font_size_px;
            for (dx, dy) in ring_offsets(r) {
                engine.draw_glyphs(
                    ctx,
                    layout,
                    transform * Affine::translate((dx, dy)),
                    Some(outline.color),
                );
            }
        }
    }

    engine.draw_glyphs(ctx, layout, transform, None);
    engine.draw_decorations(ctx, layout, style, font_size_px, transform);
}

fn ring_offsets(r: f64) -> [(f64, f64); 8] {
    let d = r * std::f64::consts::FRAC_1_SQRT_2;
    [
        (r, 0.0),
        (-r, 0.0),
        (0.0, r),
        (0.0, -r),
        (d, d),
        (d, -d),
        (-d, d),
        (-d, -d),
    ]
}

fn parley_alignment(align: TextAlign) -> parley::Alignment {
    match align {
        TextAlign::Left => parley::Alignment::Left,
        TextAlign::Center => parley::Alignment::Center,
        TextAlign::Right => parley::Alignment::Right,
        TextAlign::Justify => parley::Alignment::Justify,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_transforms_do_not_touch_storage() {
        let content = "heLLo wOrld";
        assert_eq!(display_text(content, TextTransform::None), "heLLo wOrld");
        assert_eq!(display_text(content, TextTransform::Uppercase), "HELLO WORLD");
        assert_eq!(display_text(content, TextTransform::Lowercase), "hello world");
        assert_eq!(display_text(content, TextTransform::Capitalize), "Hello World");
        // Multi-space and unicode word starts.
        assert_eq!(
            display_text("straße  zwei", TextTransform::Capitalize),
            "Straße  Zwei"
        );
    }

    #[test]
    fn layout_rejects_degenerate_font_size() {
        let mut engine = TextLayoutEngine::new();
        let style = TextStyle::default();
        assert!(engine.layout_block("hi", &style, 0.0, 100.0).is_err());
        assert!(engine.layout_block("hi", &style, f32::NAN, 100.0).is_err());
    }

    #[test]
    fn layout_tolerates_missing_families_and_empty_text() {
        let mut engine = TextLayoutEngine::new();
        let mut style = TextStyle::default();
        style.font_family = "no-such-family-placard".to_string();
        let layout = engine.layout_block("", &style, 24.0, 200.0).unwrap();
        let metrics = TextLayoutEngine::measure(&layout);
        assert!(metrics.width >= 0.0);
        assert!(metrics.height >= 0.0);
    }

    #[test]
    fn wrapping_respects_max_width_when_fonts_exist() {
        let mut engine = TextLayoutEngine::new();
        let style = TextStyle::default();
        let long = "word ".repeat(40);
        let Ok(layout) = engine.layout_block(long.trim(), &style, 16.0, 120.0) else {
            return;
        };
        let metrics = TextLayoutEngine::measure(&layout);
        // Without any resolvable font the layout is empty; with fonts the
        // wrap width must be honored.
        if metrics.height > 0.0 {
            assert!(metrics.width <= 121.0);
            assert!(layout.lines().count() > 1);
        }
    }

    #[test]
    fn ring_offsets_are_symmetric() {
        let offsets = ring_offsets(2.0);
        let sum_x: f64 = offsets.iter().map(|(x, _)| x).sum();
        let sum_y: f64 = offsets.iter().map(|(_, y)| y).sum();
        assert!(sum_x.abs() < 1e-9);
        assert!(sum_y.abs() < 1e-9);
    }
}
