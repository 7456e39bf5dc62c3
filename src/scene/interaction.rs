use crate::foundation::core::Vec2;
use crate::scene::model::Page;

/// Transient gesture state carried alongside the immutable [`Page`] during a
/// drag.
///
/// The page itself is never mutated mid-gesture: the renderer applies the
/// accumulated delta when drawing the active element, and [`commit`]
/// produces the new page snapshot at gesture end.
///
/// [`commit`]: InteractionState::commit
#[derive(Clone, Debug, Default)]
pub struct InteractionState {
    /// ID of the element being dragged, if any.
    pub active: Option<String>,
    /// Accumulated drag delta in normalized (fractional) content-area units.
    pub delta: Vec2,
}

impl InteractionState {
    /// Start a drag on `element_id`.
    pub fn begin_drag(element_id: impl Into<String>) -> Self {
        Self {
            active: Some(element_id.into()),
            delta: Vec2::ZERO,
        }
    }

    /// Accumulate a device-pixel drag delta, converting it into normalized
    /// units against the padded content area.
    ///
    /// Degenerate (zero or negative) content areas leave the delta unchanged.
    pub fn push_drag_px(&mut self, delta_px: Vec2, avail_w: f64, avail_h: f64) {
        if avail_w > 0.0 && avail_h > 0.0 {
            self.delta += Vec2::new(delta_px.x / avail_w, delta_px.y / avail_h);
        }
    }

    /// Normalized offset to apply to `element_id` while rendering, zero for
    /// every element that is not being dragged.
    pub fn offset_for(&self, element_id: &str) -> Vec2 {
        match &self.active {
            Some(active) if active == element_id => self.delta,
            _ => Vec2::ZERO,
        }
    }

    /// Fold the accumulated delta into a new page snapshot and end the
    /// gesture. Unknown or missing active IDs return an unchanged clone.
    pub fn commit(&self, page: &Page) -> Page {
        let mut next = page.clone();
        let Some(active) = &self.active else {
            return next;
        };

        if let Some(e) = next.texts.iter_mut().find(|e| e.id == *active) {
            e.position.x += self.delta.x;
            e.position.y += self.delta.y;
        } else if let Some(e) = next.shapes.iter_mut().find(|e| e.id == *active) {
            e.position.x += self.delta.x;
            e.position.y += self.delta.y;
        } else if let Some(e) = next.images.iter_mut().find(|e| e.id == *active) {
            e.position.x += self.delta.x;
            e.position.y += self.delta.y;
        }
        next
    }
}
