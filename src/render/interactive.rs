use kurbo::Point;

use crate::foundation::core::SurfaceSize;
use crate::foundation::error::PlacardResult;
use crate::render::compositor::{PageRenderer, RenderOptions, RenderedPage};
use crate::render::pattern::DEFAULT_PATTERN_SEED;
use crate::scene::interaction::InteractionState;
use crate::scene::model::Page;

/// The on-screen render path.
///
/// Wraps the shared [`PageRenderer`] with the interactive decoration set
/// (selection highlight, canvas shadow, text outline/glow) and tap routing.
/// Gestures hand in an immutable page snapshot plus the transient
/// [`InteractionState`]; nothing here mutates the page.
pub struct InteractiveRenderer {
    renderer: PageRenderer,
}

impl Default for InteractiveRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveRenderer {
    /// Construct the interactive renderer.
    pub fn new() -> Self {
        Self {
            renderer: PageRenderer::new(),
        }
    }

    /// Access the shared page renderer (e.g. to register fonts).
    pub fn page_renderer_mut(&mut self) -> &mut PageRenderer {
        &mut self.renderer
    }

    /// Render one frame at display density.
    ///
    /// `surface` is the on-screen target in device pixels and
    /// `display_scale` converts base-canvas units to those pixels. The frame
    /// uses the exact same layout and paint code as the exporter.
    pub fn render(
        &mut self,
        page: &Page,
        surface: SurfaceSize,
        display_scale: f64,
        interaction: Option<&InteractionState>,
    ) -> PlacardResult<RenderedPage> {
        self.renderer.render_page(
            page,
            surface,
            display_scale,
            interaction,
            &RenderOptions {
                pattern_seed: DEFAULT_PATTERN_SEED,
                interactive: true,
            },
        )
    }

    /// Route a tap to the topmost unlocked element under `point`, or `None`
    /// to clear the selection.
    pub fn hit_test(
        &mut self,
        page: &Page,
        surface: SurfaceSize,
        display_scale: f64,
        point: Point,
    ) -> Option<String> {
        self.renderer.hit_test(page, surface, display_scale, point)
    }
}
