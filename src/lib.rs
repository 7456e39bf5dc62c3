//! Placard is a page composition and raster export engine.
//!
//! A [`Page`] of text, shape, and image elements over a styled background is
//! the single source of truth. The same layout and paint code backs two
//! paths:
//!
//! - [`InteractiveRenderer`] draws at display density and routes taps back to
//!   element IDs
//! - [`export_page`] re-renders offscreen at an arbitrary scale, applies
//!   rounded-corner masking, encodes, and hands the bytes to an
//!   [`ExportSink`]
//!
//! The two outputs are geometrically identical up to the scale factor.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// The offline export path.
pub mod export;
/// Layout resolution.
pub mod layout;
/// Rendering stages.
pub mod render;
/// The scene model.
pub mod scene;

pub use crate::foundation::color::PackedColor;
pub use crate::foundation::core::{
    Affine, BezPath, Point, Rect, Rgba8Premul, Size, SurfaceSize, Vec2,
};
pub use crate::foundation::error::{PlacardError, PlacardResult};

pub use crate::export::encode::{EncodeFormat, encode};
pub use crate::export::raster::{clear_rounded_corners, render_to_image};
pub use crate::export::sink::{
    ExportArtifact, ExportDestination, ExportSettings, ExportSink, InMemorySink, export_page,
    export_page_in_background,
};
pub use crate::layout::resolver::{ResolvedLayout, hit_test, resolve_layout};
pub use crate::render::FrameRgba;
pub use crate::render::background::{BackgroundOutcome, safe_color_list};
pub use crate::render::compositor::{
    ElementRef, PageRenderer, RenderOptions, RenderedPage, resolve_draw_order,
};
pub use crate::render::interactive::InteractiveRenderer;
pub use crate::render::pattern::DEFAULT_PATTERN_SEED;
pub use crate::render::text::TextLayoutEngine;
pub use crate::scene::interaction::InteractionState;
pub use crate::scene::model::{
    AspectRatio, BackgroundKind, BackgroundSettings, CanvasSettings, ElementPosition,
    GradientKind, GradientSettings, ImageElement, Page, PatternKind, PatternSettings,
    ShapeElement, ShapeKind, TextAlign, TextElement, TextStyle, TileMode,
};
