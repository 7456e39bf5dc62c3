use crate::export::encode::{EncodeFormat, encode};
use crate::export::raster::render_to_image;
use crate::foundation::error::PlacardResult;
use crate::render::compositor::PageRenderer;
use crate::scene::model::Page;

/// Where the persistence collaborator should place the encoded file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExportDestination {
    /// The device's shared media store.
    Gallery,
    /// A transient cache location (e.g. for sharing).
    Cache,
}

/// Full configuration of one export request.
#[derive(Clone, Debug)]
pub struct ExportSettings {
    /// Raster scale relative to the base canvas size.
    pub scale: f64,
    /// Output encoding.
    pub format: EncodeFormat,
    /// Persistence destination.
    pub destination: ExportDestination,
    /// File name without extension; the format's extension is appended.
    pub file_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            format: EncodeFormat::Png,
            destination: ExportDestination::Gallery,
            file_name: "placard-export".to_string(),
        }
    }
}

/// Result handle of a completed export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    /// URI returned by the persistence collaborator.
    pub uri: String,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Encoded byte length.
    pub byte_len: usize,
}

/// Persistence collaborator: stores encoded bytes and returns a URI.
///
/// The core never touches the filesystem directly; implementations bridge to
/// a media store, a cache directory, or a test buffer.
pub trait ExportSink: Send {
    /// Persist `bytes` under `file_name` at `destination`, returning a URI
    /// or a typed failure.
    fn persist(
        &mut self,
        bytes: &[u8],
        file_name: &str,
        destination: ExportDestination,
    ) -> PlacardResult<String>;
}

/// One entry captured by [`InMemorySink`].
#[derive(Clone, Debug)]
pub struct StoredExport {
    /// File name the export was persisted under.
    pub file_name: String,
    /// Requested destination.
    pub destination: ExportDestination,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    entries: Vec<StoredExport>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the captured exports.
    pub fn entries(&self) -> &[StoredExport] {
        &self.entries
    }
}

impl ExportSink for InMemorySink {
    fn persist(
        &mut self,
        bytes: &[u8],
        file_name: &str,
        destination: ExportDestination,
    ) -> PlacardResult<String> {
        self.entries.push(StoredExport {
            file_name: file_name.to_string(),
            destination,
            bytes: bytes.to_vec(),
        });
        Ok(format!("mem://{file_name}"))
    }
}

/// Render, mask, encode, and persist one page.
///
/// Fails atomically: any error leaves the sink untouched and nothing partial
/// behind. The core does not serialize concurrent exports; callers gate
/// re-entrant requests (e.g. with a busy flag). There is no mid-render
/// cancellation.
#[tracing::instrument(skip(renderer, page, settings, sink), fields(page = %page.id))]
pub fn export_page(
    renderer: &mut PageRenderer,
    page: &Page,
    settings: &ExportSettings,
    sink: &mut dyn ExportSink,
) -> PlacardResult<ExportArtifact> {
    let frame = render_to_image(renderer, page, settings.scale)?;
    let bytes = encode(&frame, settings.format)?;
    let file_name = format!(
        "{}.{}",
        settings.file_name,
        settings.format.file_extension()
    );
    let uri = sink.persist(&bytes, &file_name, settings.destination)?;
    Ok(ExportArtifact {
        uri,
        width: frame.width,
        height: frame.height,
        byte_len: bytes.len(),
    })
}

/// Run a whole export on a worker thread against a copied page snapshot, so
/// concurrent edits cannot corrupt the in-flight render.
///
/// The worker uses a fresh renderer; fonts registered on another renderer are
/// not visible to it (system-resolved families are).
pub fn export_page_in_background<S: ExportSink + 'static>(
    page: Page,
    settings: ExportSettings,
    mut sink: S,
) -> std::thread::JoinHandle<PlacardResult<ExportArtifact>> {
    std::thread::spawn(move || {
        let mut renderer = PageRenderer::new();
        export_page(&mut renderer, &page, &settings, &mut sink)
    })
}

/// Short human-readable message for a failed export.
///
/// The interactive view stays untouched on failure; this string is what the
/// surrounding UI surfaces.
pub fn export_failure_message(err: &crate::foundation::error::PlacardError) -> String {
    format!("Export failed: {err}")
}
