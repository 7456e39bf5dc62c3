use crate::foundation::color::PackedColor;
use crate::foundation::core::SurfaceSize;
use crate::foundation::error::{PlacardError, PlacardResult};

/// Generate a fresh random element ID.
pub fn fresh_element_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// One page of content: background settings plus ordered element collections.
///
/// The page exclusively owns its element and background records (value
/// semantics). Renderers only read a page; edits replace list entries and
/// produce a new snapshot at the caller's level.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Page {
    /// Stable page identifier.
    pub id: String,
    /// Target canvas geometry (pixel size, padding, corner radius, shadow).
    pub canvas: CanvasSettings,
    /// Background configuration.
    pub background: BackgroundSettings,
    /// Text elements, in creation order.
    pub texts: Vec<TextElement>,
    /// Shape elements, in creation order.
    pub shapes: Vec<ShapeElement>,
    /// Image elements, in creation order.
    pub images: Vec<ImageElement>,
    /// Explicit paint order (element IDs, bottom first). IDs missing from
    /// this list sort after all listed elements; stale IDs are ignored.
    pub element_order: Vec<String>,
    /// Currently selected element, if any.
    pub selected: Option<String>,
}

impl Page {
    /// Create an empty page with a fresh ID and a solid white background.
    pub fn new(canvas: CanvasSettings) -> Self {
        Self {
            id: fresh_element_id(),
            canvas,
            background: BackgroundSettings::default(),
            texts: Vec::new(),
            shapes: Vec::new(),
            images: Vec::new(),
            element_order: Vec::new(),
            selected: None,
        }
    }

    /// Add a text element and append it to the paint order.
    pub fn add_text(&mut self, element: TextElement) {
        self.element_order.push(element.id.clone());
        self.texts.push(element);
    }

    /// Add a shape element and append it to the paint order.
    pub fn add_shape(&mut self, element: ShapeElement) {
        self.element_order.push(element.id.clone());
        self.shapes.push(element);
    }

    /// Add an image element and append it to the paint order.
    pub fn add_image(&mut self, element: ImageElement) {
        self.element_order.push(element.id.clone());
        self.images.push(element);
    }

    /// Remove the element with `id` from every collection, the paint order,
    /// and the selection. Unknown IDs are a no-op.
    pub fn remove_element(&mut self, id: &str) {
        self.texts.retain(|e| e.id != id);
        self.shapes.retain(|e| e.id != id);
        self.images.retain(|e| e.id != id);
        self.element_order.retain(|e| e != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
    }

    /// Iterate over the IDs of all live elements.
    pub fn element_ids(&self) -> impl Iterator<Item = &str> {
        self.texts
            .iter()
            .map(|e| e.id.as_str())
            .chain(self.shapes.iter().map(|e| e.id.as_str()))
            .chain(self.images.iter().map(|e| e.id.as_str()))
    }

    /// Advisory validation of the page structure.
    ///
    /// Renderers tolerate everything this rejects (stale order entries,
    /// duplicate IDs); callers that want early feedback can check here.
    pub fn validate(&self) -> PlacardResult<()> {
        let size = self.canvas.aspect.size();
        if size.is_empty() {
            return Err(PlacardError::validation(
                "canvas pixel size must be non-zero",
            ));
        }

        let mut seen = std::collections::BTreeSet::new();
        for id in self.element_ids() {
            if !seen.insert(id) {
                return Err(PlacardError::validation(format!(
                    "duplicate element id '{id}'"
                )));
            }
        }
        for id in &self.element_order {
            if !seen.contains(id.as_str()) {
                return Err(PlacardError::validation(format!(
                    "element_order references missing element '{id}'"
                )));
            }
        }
        Ok(())
    }
}

/// Canvas geometry settings.
///
/// `padding` and `corner_radius` are in base-canvas pixels; the export path
/// multiplies them by its scale factor so both paths stay geometrically
/// identical.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CanvasSettings {
    /// Target aspect ratio / pixel size.
    pub aspect: AspectRatio,
    /// Rounded-corner radius in base-canvas pixels.
    pub corner_radius: f64,
    /// Content padding in base-canvas pixels.
    pub padding: f64,
    /// Optional page drop shadow (interactive path only).
    pub shadow: Option<CanvasShadow>,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::Square,
            corner_radius: 0.0,
            padding: 0.0,
            shadow: None,
        }
    }
}

/// Canvas aspect ratio presets plus an explicit custom size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AspectRatio {
    /// 1080 x 1080.
    Square,
    /// 1080 x 1350.
    Portrait4x5,
    /// 1080 x 1920.
    Story9x16,
    /// 1920 x 1080.
    Landscape16x9,
    /// Explicit pixel dimensions.
    Custom {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

impl AspectRatio {
    /// Pixel size of this aspect ratio at base scale.
    pub fn size(self) -> SurfaceSize {
        match self {
            Self::Square => SurfaceSize::new(1080, 1080),
            Self::Portrait4x5 => SurfaceSize::new(1080, 1350),
            Self::Story9x16 => SurfaceSize::new(1080, 1920),
            Self::Landscape16x9 => SurfaceSize::new(1920, 1080),
            Self::Custom { width, height } => SurfaceSize::new(width, height),
        }
    }
}

/// Drop shadow drawn behind the page by the interactive path.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct CanvasShadow {
    /// Shadow color.
    pub color: PackedColor,
    /// Horizontal offset in base-canvas pixels.
    pub dx: f64,
    /// Vertical offset in base-canvas pixels.
    pub dy: f64,
    /// Blur radius in base-canvas pixels (approximated by the offset pass).
    pub blur: f64,
}

/// Which background sub-record is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BackgroundKind {
    /// Single solid color.
    Solid,
    /// Multi-stop gradient.
    Gradient,
    /// Procedural pattern overlay on a base color.
    Pattern,
    /// Backdrop image (rendered as its fallback color by this engine).
    Image,
}

/// Background configuration. One sub-record per kind; only the record
/// selected by `kind` is meaningful.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BackgroundSettings {
    /// Active background kind.
    pub kind: BackgroundKind,
    /// Solid settings.
    pub solid: SolidSettings,
    /// Gradient settings.
    pub gradient: GradientSettings,
    /// Pattern settings.
    pub pattern: PatternSettings,
    /// Image settings.
    pub image: ImageBackdropSettings,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            kind: BackgroundKind::Solid,
            solid: SolidSettings::default(),
            gradient: GradientSettings::default(),
            pattern: PatternSettings::default(),
            image: ImageBackdropSettings::default(),
        }
    }
}

/// Solid background settings.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct SolidSettings {
    /// Fill color.
    pub color: PackedColor,
}

impl Default for SolidSettings {
    fn default() -> Self {
        Self {
            color: PackedColor::WHITE,
        }
    }
}

/// Gradient family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GradientKind {
    /// Linear gradient along an angle through the rect center.
    Linear,
    /// Radial gradient from a fractional center.
    Radial,
    /// Sweep gradient around a fractional center.
    Sweep,
    /// Mesh gradient; approximated by a linear gradient (documented
    /// limitation).
    Mesh,
}

/// How gradient positions outside `[0, 1]` map back into the stop range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TileMode {
    /// Clamp to the end colors.
    Clamp,
    /// Repeat the stop range.
    Repeat,
    /// Mirror the stop range.
    Mirror,
}

/// Gradient background settings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GradientSettings {
    /// Gradient family.
    pub kind: GradientKind,
    /// Ordered color list. May be empty or a singleton; the renderer
    /// normalizes to at least two entries before painting.
    pub colors: Vec<PackedColor>,
    /// Color stop positions in `[0, 1]`. Ignored unless it matches
    /// `colors` in length and is monotonically non-decreasing.
    pub stops: Vec<f64>,
    /// Linear gradient angle in degrees.
    pub angle_deg: f64,
    /// Fractional center x (radial/sweep).
    pub center_x: f64,
    /// Fractional center y (radial/sweep).
    pub center_y: f64,
    /// Radial radius as a fraction of `max(W, H)`.
    pub radius: f64,
    /// Tile mode outside the stop range.
    pub tile: TileMode,
}

impl Default for GradientSettings {
    fn default() -> Self {
        Self {
            kind: GradientKind::Linear,
            colors: Vec::new(),
            stops: Vec::new(),
            angle_deg: 0.0,
            center_x: 0.5,
            center_y: 0.5,
            radius: 0.5,
            tile: TileMode::Clamp,
        }
    }
}

/// Procedural pattern family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PatternKind {
    /// Regular dot lattice.
    Dots,
    /// Horizontal + vertical line grid.
    Grid,
    /// Horizontal stripes.
    Stripes,
    /// Parallel diagonal lines.
    DiagonalLines,
    /// Two crossing diagonal line families.
    CrossHatch,
    /// Horizontal sine-like wave strokes.
    Waves,
    /// Outlined circle lattice.
    Circles,
    /// Concentric rings from the center.
    Rings,
    /// Hexagon outline lattice.
    Hexagons,
    /// Triangle lattice.
    Triangles,
    /// Chevron (zig-zag) rows.
    Chevrons,
    /// Diamond lattice.
    Diamonds,
    /// Alternating filled squares.
    Checkerboard,
    /// Four-point star lattice.
    Stars,
    /// Plus-sign lattice.
    Crosses,
    /// Seeded irregular blobs (deterministic for a given seed).
    OrganicBlobs,
    /// Seeded scattered dots (deterministic for a given seed).
    ScatteredDots,
    /// A single oversized accent circle in one corner.
    CornerAccent,
    /// An inset rectangular frame.
    Frame,
    /// Large soft translucent discs.
    SoftShapes,
}

/// Pattern background settings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PatternSettings {
    /// Pattern family.
    pub kind: PatternKind,
    /// Primary pattern color.
    pub color: PackedColor,
    /// Secondary color used by alternating generators.
    pub secondary_color: PackedColor,
    /// Base color painted before the overlay.
    pub background: PackedColor,
    /// Cell-size multiplier (1.0 is the nominal tiling).
    pub scale: f64,
    /// Primitive-size multiplier within a cell.
    pub density: f64,
    /// Overlay rotation in degrees about the surface center.
    pub rotation_deg: f64,
    /// Overlay opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            kind: PatternKind::Dots,
            color: PackedColor::BLACK,
            secondary_color: PackedColor::from_argb(255, 128, 128, 128),
            background: PackedColor::WHITE,
            scale: 1.0,
            density: 1.0,
            rotation_deg: 0.0,
            opacity: 1.0,
        }
    }
}

/// Backdrop image settings. Image compositing is an external collaborator;
/// this engine renders the fallback color.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageBackdropSettings {
    /// Source reference handed to the external image collaborator.
    pub source: String,
    /// Color painted while no decoded raster is available.
    pub fallback_color: PackedColor,
}

impl Default for ImageBackdropSettings {
    fn default() -> Self {
        Self {
            source: String::new(),
            fallback_color: PackedColor::from_argb(255, 230, 230, 230),
        }
    }
}

/// Normalized element placement within the padded content area.
///
/// `x`/`y` are the center-anchored fractional position, `width`/`height` are
/// fractions of the available area (`height == 0` means "derive from
/// content"), `rotation_deg` turns about the anchor point, and
/// `anchor_x`/`anchor_y` locate the pivot within the element's own box.
/// None of these are clamped; renderers must tolerate out-of-range values
/// (geometry may land off-canvas, which is allowed).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementPosition {
    /// Fractional x of the anchor within the padded area.
    pub x: f64,
    /// Fractional y of the anchor within the padded area.
    pub y: f64,
    /// Fractional width (0 derives width from height).
    pub width: f64,
    /// Fractional height (0 means auto, from content).
    pub height: f64,
    /// Rotation in degrees about the anchor point.
    pub rotation_deg: f64,
    /// Pivot x within the element box.
    pub anchor_x: f64,
    /// Pivot y within the element box.
    pub anchor_y: f64,
    /// Horizontal scale about the pivot.
    pub scale_x: f64,
    /// Vertical scale about the pivot.
    pub scale_y: f64,
}

impl Default for ElementPosition {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            width: 0.5,
            height: 0.0,
            rotation_deg: 0.0,
            anchor_x: 0.5,
            anchor_y: 0.5,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TextAlign {
    /// Align to the left edge of the wrap width.
    Left,
    /// Center within the wrap width.
    Center,
    /// Align to the right edge of the wrap width.
    Right,
    /// Justify full lines to the wrap width.
    Justify,
}

/// Case transform applied to displayed text only (stored content is never
/// mutated).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TextTransform {
    /// Display the stored content verbatim.
    None,
    /// Uppercase every character.
    Uppercase,
    /// Lowercase every character.
    Lowercase,
    /// Uppercase the first letter of each word.
    Capitalize,
}

/// Underline / strikethrough flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TextDecoration {
    /// Draw an underline.
    pub underline: bool,
    /// Draw a strikethrough.
    pub strikethrough: bool,
}

/// Drop shadow behind the glyphs. Offsets and blur are in em units
/// (multiples of the resolved font size).
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextShadow {
    /// Shadow color.
    pub color: PackedColor,
    /// Horizontal offset in em.
    pub dx: f64,
    /// Vertical offset in em.
    pub dy: f64,
    /// Blur radius in em; biases the offset pass.
    pub blur: f64,
}

/// Rounded background chip behind the wrapped text block. Padding and corner
/// radius are in em units.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextChip {
    /// Chip fill color.
    pub color: PackedColor,
    /// Padding around the measured block in em.
    pub padding: f64,
    /// Corner radius in em.
    pub corner_radius: f64,
}

/// Glyph outline, interactive path only.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextOutline {
    /// Outline color.
    pub color: PackedColor,
    /// Outline width in em.
    pub width: f64,
}

/// Glyph glow, interactive path only.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextGlow {
    /// Glow color.
    pub color: PackedColor,
    /// Glow radius in em.
    pub radius: f64,
}

/// Text style record.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    /// Font family name, resolved with a default-font fallback.
    pub font_family: String,
    /// Numeric weight 100-900.
    pub font_weight: u16,
    /// Italic flag.
    pub italic: bool,
    /// Font size as a fraction of the available (padded) width, so both
    /// render paths scale identically.
    pub font_size: f64,
    /// Glyph color.
    pub color: PackedColor,
    /// Horizontal alignment within the wrap width.
    pub align: TextAlign,
    /// Line height as a multiplier of the font size.
    pub line_height: f64,
    /// Letter spacing in em.
    pub letter_spacing: f64,
    /// Underline / strikethrough flags.
    pub decoration: TextDecoration,
    /// Display-only case transform.
    pub transform: TextTransform,
    /// Optional drop shadow.
    pub shadow: Option<TextShadow>,
    /// Optional background chip.
    pub chip: Option<TextChip>,
    /// Optional outline (interactive path only).
    pub outline: Option<TextOutline>,
    /// Optional glow (interactive path only).
    pub glow: Option<TextGlow>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_weight: 400,
            italic: false,
            font_size: 0.05,
            color: PackedColor::BLACK,
            align: TextAlign::Center,
            line_height: 1.2,
            letter_spacing: 0.0,
            decoration: TextDecoration::default(),
            transform: TextTransform::None,
            shadow: None,
            chip: None,
            outline: None,
            glow: None,
        }
    }
}

/// A text element.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextElement {
    /// Element ID.
    pub id: String,
    /// Stored content (never mutated by display transforms).
    pub content: String,
    /// Normalized placement.
    pub position: ElementPosition,
    /// Lock flag; locked elements are skipped by hit-testing.
    pub locked: bool,
    /// Style record.
    pub style: TextStyle,
}

impl TextElement {
    /// Create a text element with a fresh ID and default style.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: fresh_element_id(),
            content: content.into(),
            position: ElementPosition::default(),
            locked: false,
            style: TextStyle::default(),
        }
    }
}

/// Shape outline family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Rectangle,
    /// Rectangle with rounded corners.
    RoundedRectangle,
    /// Circle inscribed in the box.
    Circle,
    /// Ellipse filling the box.
    Oval,
    /// Upward triangle.
    Triangle,
    /// Four-point diamond.
    Diamond,
    /// Regular pentagon.
    Pentagon,
    /// Regular hexagon.
    Hexagon,
    /// Regular polygon with `sides` sides.
    Polygon,
    /// Parametric star with `sides` points and an inner-radius ratio.
    Star,
    /// Heart from cubic curves.
    Heart,
    /// Plus-sign cross.
    Cross,
    /// Annulus (outer circle minus inner circle).
    Ring,
    /// Open arrow (stroke only).
    Arrow,
    /// Open line (stroke only).
    Line,
    /// Slanted parallelogram.
    Parallelogram,
    /// Symmetric trapezoid.
    Trapezoid,
}

/// Shape style record.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShapeStyle {
    /// Shape family.
    pub kind: ShapeKind,
    /// Fill color; `None` is a valid, intentional "no fill" state.
    pub fill: Option<PackedColor>,
    /// Stroke color, used when `stroke_width > 0`.
    pub stroke_color: PackedColor,
    /// Stroke width in base-canvas pixels.
    pub stroke_width: f64,
    /// Corner radius for rounded rectangles, in base-canvas pixels.
    pub corner_radius: f64,
    /// Side/point count for polygon and star kinds.
    pub sides: u32,
    /// Inner-radius ratio in `(0, 1)` for star and ring kinds.
    pub inner_radius: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Rectangle,
            fill: Some(PackedColor::BLACK),
            stroke_color: PackedColor::BLACK,
            stroke_width: 0.0,
            corner_radius: 16.0,
            sides: 5,
            inner_radius: 0.5,
        }
    }
}

/// A shape element.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShapeElement {
    /// Element ID.
    pub id: String,
    /// Normalized placement.
    pub position: ElementPosition,
    /// Lock flag; locked elements are skipped by hit-testing.
    pub locked: bool,
    /// Style record.
    pub style: ShapeStyle,
}

impl ShapeElement {
    /// Create a shape element with a fresh ID.
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            id: fresh_element_id(),
            position: ElementPosition::default(),
            locked: false,
            style: ShapeStyle {
                kind,
                ..ShapeStyle::default()
            },
        }
    }
}

/// Image style record. Decoding and compositing are external collaborators;
/// this engine draws the placeholder fill.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageStyle {
    /// Source reference handed to the external image collaborator.
    pub source: String,
    /// Placeholder fill color.
    pub placeholder: PackedColor,
    /// Corner radius of the placeholder box in base-canvas pixels.
    pub corner_radius: f64,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            source: String::new(),
            placeholder: PackedColor::from_argb(255, 210, 210, 210),
            corner_radius: 0.0,
        }
    }
}

/// An image element.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ImageElement {
    /// Element ID.
    pub id: String,
    /// Normalized placement.
    pub position: ElementPosition,
    /// Lock flag; locked elements are skipped by hit-testing.
    pub locked: bool,
    /// Style record.
    pub style: ImageStyle,
}

impl ImageElement {
    /// Create an image element with a fresh ID.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: fresh_element_id(),
            position: ElementPosition::default(),
            locked: false,
            style: ImageStyle {
                source: source.into(),
                ..ImageStyle::default()
            },
        }
    }
}
