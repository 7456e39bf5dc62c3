use kurbo::{Point, Rect, RoundedRect, Size, Vec2};
use smallvec::SmallVec;

use crate::foundation::color::PackedColor;
use crate::foundation::core::SurfaceSize;
use crate::foundation::error::{PlacardError, PlacardResult};
use crate::layout::resolver::{
    ResolvedLayout, hit_test as layout_hit_test, place_transform, resolve_layout,
    with_measured_height,
};
use crate::render::background::{BackgroundOutcome, render_background};
use crate::render::paint::{affine_to_cpu, bezpath_to_cpu, cpu_color};
use crate::render::pattern::DEFAULT_PATTERN_SEED;
use crate::render::shape::{from_shape, is_open, shape_path, stroke_outline};
use crate::render::text::{TextLayoutEngine, display_text, draw_text_block};
use crate::render::FrameRgba;
use crate::scene::interaction::InteractionState;
use crate::scene::model::{
    ImageElement, Page, ShapeElement, ShapeStyle, TextElement,
};

/// Paint-order rank for elements absent from `element_order`: they sort after
/// every listed element, keeping their relative natural order.
const UNORDERED_RANK: usize = usize::MAX;

/// Selection highlight color for the interactive path.
const SELECTION_COLOR: PackedColor = PackedColor(0xFF2D_8CFF);

/// A borrowed view of one element, merged across the typed collections.
#[derive(Clone, Copy, Debug)]
pub enum ElementRef<'a> {
    /// A text element.
    Text(&'a TextElement),
    /// A shape element.
    Shape(&'a ShapeElement),
    /// An image element.
    Image(&'a ImageElement),
}

impl<'a> ElementRef<'a> {
    /// The element's ID.
    pub fn id(&self) -> &'a str {
        match self {
            Self::Text(e) => &e.id,
            Self::Shape(e) => &e.id,
            Self::Image(e) => &e.id,
        }
    }

    fn locked(&self) -> bool {
        match self {
            Self::Text(e) => e.locked,
            Self::Shape(e) => e.locked,
            Self::Image(e) => e.locked,
        }
    }

    fn position(&self) -> crate::scene::model::ElementPosition {
        match self {
            Self::Text(e) => e.position,
            Self::Shape(e) => e.position,
            Self::Image(e) => e.position,
        }
    }
}

/// Merge the typed element collections into one bottom-to-top draw list.
///
/// With a non-empty `element_order`, elements sort by their index in it;
/// missing IDs receive the "not found" sentinel rank and stay in natural
/// order among themselves. An empty order yields text, then shape, then
/// image, in creation order. Stale order entries are ignored; this never
/// fails.
pub fn resolve_draw_order(page: &Page) -> SmallVec<[ElementRef<'_>; 8]> {
    let mut list: SmallVec<[ElementRef<'_>; 8]> = page
        .texts
        .iter()
        .map(ElementRef::Text)
        .chain(page.shapes.iter().map(ElementRef::Shape))
        .chain(page.images.iter().map(ElementRef::Image))
        .collect();

    if !page.element_order.is_empty() {
        list.sort_by_key(|el| {
            page.element_order
                .iter()
                .position(|id| id == el.id())
                .unwrap_or(UNORDERED_RANK)
        });
    }
    list
}

/// Options shared by both render paths.
#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    /// Seed for the deterministic pattern generators.
    pub pattern_seed: u64,
    /// Draw interactive-only decorations (selection highlight, canvas
    /// shadow, text outline/glow).
    pub interactive: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pattern_seed: DEFAULT_PATTERN_SEED,
            interactive: false,
        }
    }
}

/// A rendered page frame plus the background outcome that produced it.
#[derive(Clone, Debug)]
pub struct RenderedPage {
    /// The raster output (premultiplied RGBA8).
    pub frame: FrameRgba,
    /// Which background path ran.
    pub background: BackgroundOutcome,
}

/// Renders a [`Page`] into an offscreen pixel buffer.
///
/// The interactive path and the export rasterizer both run through
/// [`PageRenderer::render_page`]; the only difference between them is the
/// `(surface, scale)` pair and the decoration flag, which is what keeps the
/// on-screen result and the exported file geometrically identical.
pub struct PageRenderer {
    text_engine: TextLayoutEngine,
    ctx: Option<vello_cpu::RenderContext>,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer {
    /// Construct a renderer with a fresh text engine.
    pub fn new() -> Self {
        Self {
            text_engine: TextLayoutEngine::new(),
            ctx: None,
        }
    }

    /// Access the text engine, e.g. to register fonts.
    pub fn text_engine_mut(&mut self) -> &mut TextLayoutEngine {
        &mut self.text_engine
    }

    /// Render `page` into a `surface`-sized frame.
    ///
    /// `scale` converts base-canvas units (padding, corner radius, stroke
    /// widths) into device pixels; the interactive path passes its display
    /// scale, the exporter its export scale. A zero-size surface returns an
    /// empty frame rather than an error.
    #[tracing::instrument(skip(self, page, interaction, opts), fields(page = %page.id))]
    pub fn render_page(
        &mut self,
        page: &Page,
        surface: SurfaceSize,
        scale: f64,
        interaction: Option<&InteractionState>,
        opts: &RenderOptions,
    ) -> PlacardResult<RenderedPage> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(PlacardError::validation("render scale must be finite and > 0"));
        }
        if surface.is_empty() {
            return Ok(RenderedPage {
                frame: FrameRgba {
                    width: surface.width,
                    height: surface.height,
                    data: Vec::new(),
                },
                background: BackgroundOutcome::Skipped,
            });
        }
        let width: u16 = surface
            .width
            .try_into()
            .map_err(|_| PlacardError::render("surface width exceeds u16"))?;
        let height: u16 = surface
            .height
            .try_into()
            .map_err(|_| PlacardError::render("surface height exceeds u16"))?;

        let padding_px = page.canvas.padding * scale;
        let corner_px = page.canvas.corner_radius * scale;

        let background = self.with_ctx_mut(width, height, |this, ctx| {
            if opts.interactive
                && let Some(shadow) = page.canvas.shadow
            {
                draw_canvas_shadow(ctx, &shadow, surface, corner_px, scale);
            }

            let outcome =
                render_background(ctx, &page.background, surface, corner_px, opts.pattern_seed)?;

            for el in resolve_draw_order(page) {
                let mut pos = el.position();
                if let Some(state) = interaction {
                    let offset = state.offset_for(el.id());
                    pos.x += offset.x;
                    pos.y += offset.y;
                }

                let placed = match el {
                    ElementRef::Shape(e) => {
                        this.draw_shape(ctx, e, &pos, surface, padding_px, scale)
                    }
                    ElementRef::Image(e) => {
                        this.draw_image(ctx, e, &pos, surface, padding_px, scale)
                    }
                    ElementRef::Text(e) => {
                        this.draw_text(ctx, e, &pos, surface, padding_px, scale, opts.interactive)
                    }
                };

                if opts.interactive
                    && page.selected.as_deref() == Some(el.id())
                    && let Some(placed) = placed
                {
                    draw_selection(ctx, &pos, &placed, scale);
                }
            }

            Ok(outcome)
        })?;

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| PlacardError::render("render context missing after draw"))?;
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(RenderedPage {
            frame: FrameRgba {
                width: surface.width,
                height: surface.height,
                data: pixmap.data_as_u8_slice().to_vec(),
            },
            background,
        })
    }

    /// Topmost-first tap routing: the ID of the first unlocked element whose
    /// resolved rectangle contains `point`, or `None`.
    ///
    /// Text elements are tested against their measured wrapped height, not
    /// the nominal auto-height approximation.
    pub fn hit_test(
        &mut self,
        page: &Page,
        surface: SurfaceSize,
        scale: f64,
        point: Point,
    ) -> Option<String> {
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }
        let padding_px = page.canvas.padding * scale;
        let order = resolve_draw_order(page);
        for el in order.iter().rev() {
            if el.locked() {
                continue;
            }
            let measured = match el {
                ElementRef::Text(t) => self.measured_text_height(t, surface, padding_px),
                _ => None,
            };
            if layout_hit_test(&el.position(), surface, padding_px, point, measured) {
                return Some(el.id().to_string());
            }
        }
        None
    }

    fn measured_text_height(
        &mut self,
        element: &TextElement,
        surface: SurfaceSize,
        padding_px: f64,
    ) -> Option<f64> {
        let avail_w = f64::from(surface.width) - 2.0 * padding_px;
        let font_px = element.style.font_size * avail_w;
        if !font_px.is_finite() || font_px <= 0.0 {
            return None;
        }
        let display = display_text(&element.content, element.style.transform);
        let nominal = resolve_layout(&element.position, surface, padding_px);
        let layout = self
            .text_engine
            .layout_block(
                &display,
                &element.style,
                font_px as f32,
                nominal.size.width as f32,
            )
            .ok()?;
        let metrics = TextLayoutEngine::measure(&layout);
        (metrics.height > 0.0).then_some(metrics.height)
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> PlacardResult<R>,
    ) -> PlacardResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn draw_shape(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        element: &ShapeElement,
        pos: &crate::scene::model::ElementPosition,
        surface: SurfaceSize,
        padding_px: f64,
        scale: f64,
    ) -> Option<ResolvedLayout> {
        let layout = resolve_layout(pos, surface, padding_px);
        let style = ShapeStyle {
            corner_radius: element.style.corner_radius * scale,
            ..element.style
        };
        let path = shape_path(&style, layout.size);
        let transform = place_transform(pos, &layout);
        ctx.set_transform(affine_to_cpu(transform));

        if !is_open(style.kind)
            && let Some(fill) = style.fill
        {
            ctx.set_paint(cpu_color(fill));
            ctx.fill_path(&bezpath_to_cpu(&path));
        }
        if style.stroke_width > 0.0 {
            let outline = stroke_outline(&path, style.stroke_width * scale);
            ctx.set_paint(cpu_color(style.stroke_color));
            ctx.fill_path(&bezpath_to_cpu(&outline));
        }
        Some(layout)
    }

    fn draw_image(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        element: &ImageElement,
        pos: &crate::scene::model::ElementPosition,
        surface: SurfaceSize,
        padding_px: f64,
        scale: f64,
    ) -> Option<ResolvedLayout> {
        let layout = resolve_layout(pos, surface, padding_px);
        let rect = Rect::new(0.0, 0.0, layout.size.width, layout.size.height);
        let radius = element.style.corner_radius * scale;
        let path = if radius > 0.0 {
            from_shape(RoundedRect::from_rect(rect, radius))
        } else {
            from_shape(rect)
        };
        ctx.set_transform(affine_to_cpu(place_transform(pos, &layout)));
        // Decoded rasters come from an external collaborator; the engine
        // paints the placeholder.
        ctx.set_paint(cpu_color(element.style.placeholder));
        ctx.fill_path(&bezpath_to_cpu(&path));
        Some(layout)
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        element: &TextElement,
        pos: &crate::scene::model::ElementPosition,
        surface: SurfaceSize,
        padding_px: f64,
        scale: f64,
        interactive: bool,
    ) -> Option<ResolvedLayout> {
        let _ = scale;
        let avail_w = f64::from(surface.width) - 2.0 * padding_px;
        let font_px = element.style.font_size * avail_w;
        if !font_px.is_finite() || font_px <= 0.0 {
            tracing::debug!(id = %element.id, "skipping text with degenerate font size");
            return None;
        }

        let display = display_text(&element.content, element.style.transform);
        let nominal = resolve_layout(pos, surface, padding_px);
        let layout = match self.text_engine.layout_block(
            &display,
            &element.style,
            font_px as f32,
            nominal.size.width as f32,
        ) {
            Ok(l) => l,
            Err(err) => {
                tracing::warn!(id = %element.id, %err, "text layout failed, skipping element");
                return None;
            }
        };

        let metrics = TextLayoutEngine::measure(&layout);
        // Measured wrap height wins over the nominal approximation; an empty
        // layout (no resolvable fonts) keeps the nominal box.
        let measured_h = if metrics.height > 0.0 {
            metrics.height
        } else {
            nominal.size.height
        };
        let placed = with_measured_height(pos, surface, padding_px, measured_h);
        let transform = place_transform(pos, &placed);

        draw_text_block(
            ctx,
            &mut self.text_engine,
            &layout,
            &element.style,
            font_px,
            Size::new(placed.size.width, placed.size.height),
            transform,
            interactive,
        );
        Some(placed)
    }
}

fn draw_canvas_shadow(
    ctx: &mut vello_cpu::RenderContext,
    shadow: &crate::scene::model::CanvasShadow,
    surface: SurfaceSize,
    corner_px: f64,
    scale: f64,
) {
    let w = f64::from(surface.width);
    let h = f64::from(surface.height);
    let rect = Rect::new(0.0, 0.0, w, h);
    let path = if corner_px > 0.0 {
        from_shape(RoundedRect::from_rect(rect, corner_px))
    } else {
        from_shape(rect)
    };
    let alpha = 1.0 / (1.0 + shadow.blur.max(0.0) / 8.0);
    ctx.set_transform(affine_to_cpu(kurbo::Affine::translate(Vec2::new(
        shadow.dx * scale,
        shadow.dy * scale,
    ))));
    ctx.set_paint(cpu_color(shadow.color.with_opacity(alpha)));
    ctx.fill_path(&bezpath_to_cpu(&path));
}

fn draw_selection(
    ctx: &mut vello_cpu::RenderContext,
    pos: &crate::scene::model::ElementPosition,
    placed: &ResolvedLayout,
    scale: f64,
) {
    let rect = Rect::new(0.0, 0.0, placed.size.width, placed.size.height);
    let outline = stroke_outline(&from_shape(rect), 2.0 * scale);
    ctx.set_transform(affine_to_cpu(place_transform(pos, placed)));
    ctx.set_paint(cpu_color(SELECTION_COLOR));
    ctx.fill_path(&bezpath_to_cpu(&outline));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::model::{CanvasSettings, ImageElement, ShapeKind, TextElement};

    fn page_with_one_of_each() -> Page {
        let mut page = Page::new(CanvasSettings::default());
        page.add_text(TextElement::new("t"));
        page.add_shape(crate::scene::model::ShapeElement::new(ShapeKind::Circle));
        page.add_image(ImageElement::new("img.png"));
        page
    }

    #[test]
    fn empty_order_uses_natural_concatenation() {
        let mut page = page_with_one_of_each();
        page.element_order.clear();
        let order = resolve_draw_order(&page);
        assert_eq!(order.len(), 3);
        assert!(matches!(order[0], ElementRef::Text(_)));
        assert!(matches!(order[1], ElementRef::Shape(_)));
        assert!(matches!(order[2], ElementRef::Image(_)));
    }

    #[test]
    fn partial_order_ranks_listed_elements_first() {
        let mut page = page_with_one_of_each();
        let image_id = page.images[0].id.clone();
        page.element_order = vec![image_id.clone()];
        let order = resolve_draw_order(&page);
        assert_eq!(order[0].id(), image_id);
        // Unlisted keep their relative natural order.
        assert!(matches!(order[1], ElementRef::Text(_)));
        assert!(matches!(order[2], ElementRef::Shape(_)));
    }

    #[test]
    fn stale_order_entries_never_fail() {
        let mut page = page_with_one_of_each();
        page.element_order = vec![
            "ghost-1".to_string(),
            page.shapes[0].id.clone(),
            "ghost-2".to_string(),
        ];
        let order = resolve_draw_order(&page);
        assert_eq!(order.len(), 3);
        assert!(matches!(order[0], ElementRef::Shape(_)));
    }

    #[test]
    fn render_rejects_bad_scale_and_tolerates_empty_surface() {
        let mut renderer = PageRenderer::new();
        let page = page_with_one_of_each();
        assert!(
            renderer
                .render_page(
                    &page,
                    SurfaceSize::new(64, 64),
                    f64::NAN,
                    None,
                    &RenderOptions::default(),
                )
                .is_err()
        );
        let out = renderer
            .render_page(
                &page,
                SurfaceSize::new(0, 64),
                1.0,
                None,
                &RenderOptions::default(),
            )
            .unwrap();
        assert!(out.frame.data.is_empty());
        assert_eq!(out.background, BackgroundOutcome::Skipped);
    }

    #[test]
    fn render_produces_filled_frame() {
        let mut renderer = PageRenderer::new();
        let mut page = page_with_one_of_each();
        page.canvas.aspect = crate::scene::model::AspectRatio::Custom {
            width: 64,
            height: 64,
        };
        let out = renderer
            .render_page(
                &page,
                SurfaceSize::new(64, 64),
                1.0,
                None,
                &RenderOptions::default(),
            )
            .unwrap();
        assert_eq!(out.frame.data.len(), 64 * 64 * 4);
        assert_eq!(out.background, BackgroundOutcome::Rendered);
        assert!(out.frame.data.iter().any(|&v| v != 0));
    }

    #[test]
    fn hit_test_honors_order_lock_and_rotation_simplification() {
        let mut page = Page::new(CanvasSettings::default());
        let mut bottom = crate::scene::model::ShapeElement::new(ShapeKind::Rectangle);
        bottom.position.width = 0.5;
        bottom.position.height = 0.5;
        let mut top = crate::scene::model::ShapeElement::new(ShapeKind::Rectangle);
        top.position.width = 0.5;
        top.position.height = 0.5;
        let bottom_id = bottom.id.clone();
        let top_id = top.id.clone();
        page.add_shape(bottom);
        page.add_shape(top);

        let mut renderer = PageRenderer::new();
        let surface = SurfaceSize::new(1080, 1080);
        let center = Point::new(540.0, 540.0);

        // Topmost wins.
        assert_eq!(
            renderer.hit_test(&page, surface, 1.0, center),
            Some(top_id.clone())
        );

        // Locked elements are skipped.
        page.shapes[1].locked = true;
        assert_eq!(
            renderer.hit_test(&page, surface, 1.0, center),
            Some(bottom_id)
        );

        // Outside everything: no hit.
        assert_eq!(renderer.hit_test(&page, surface, 1.0, Point::new(5.0, 5.0)), None);
    }
}
