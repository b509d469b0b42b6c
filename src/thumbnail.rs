//! Page thumbnails: rasterization on a background worker, with a
//! cancellation token per displayed thumbnail so that a render whose
//! inputs changed in the meantime is never drawn.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use image::{ImageBuffer, Rgba, RgbaImage};
use log::{debug, warn};
use pdfium_render::prelude::*;

use crate::error::{Result, StudioError};
use crate::model::{FileId, SourceFile};

/// Anything that can turn one page of a PDF into pixels
pub trait PageRasterizer {
    /// Rasterize page `page_index` (0-based). The viewport is the page size in
    /// points times `scale`; the surface is the viewport times `pixel_density`.
    fn rasterize(
        &mut self,
        bytes: &[u8],
        page_index: usize,
        scale: f32,
        pixel_density: f32,
    ) -> Result<RasterSurface>;
}

/// A rendered page
#[derive(Debug, Clone)]
pub struct RasterSurface {
    /// Size in logical points (the viewport)
    pub viewport: [f32; 2],
    pub image: RgbaImage,
}

impl RasterSurface {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Pixel size of a surface for a page of `page_points` at `scale`
pub fn surface_size(page_points: [f32; 2], scale: f32, pixel_density: f32) -> ([f32; 2], [u32; 2]) {
    let viewport = [page_points[0] * scale, page_points[1] * scale];
    let density = if pixel_density > 0.0 { pixel_density } else { 1.0 };
    let pixels = [
        ((viewport[0] * density).round() as u32).max(1),
        ((viewport[1] * density).round() as u32).max(1),
    ];
    (viewport, pixels)
}

/// Rasterizer backed by the system Pdfium library
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    pub fn bind() -> Result<Self> {
        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| StudioError::Render(format!("cannot load Pdfium: {:?}", e)))?;
        debug!("Successfully initialized Pdfium");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(
        &mut self,
        bytes: &[u8],
        page_index: usize,
        scale: f32,
        pixel_density: f32,
    ) -> Result<RasterSurface> {
        let render_error = |e: PdfiumError| StudioError::Render(format!("{:?}", e));

        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(render_error)?;
        let index = u16::try_from(page_index)
            .map_err(|_| StudioError::Render(format!("page index too large: {}", page_index)))?;
        let page = document.pages().get(index).map_err(render_error)?;

        let (viewport, [width_px, height_px]) =
            surface_size([page.width().value, page.height().value], scale, pixel_density);

        let config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32);
        let bitmap = page.render_with_config(&config).map_err(render_error)?;

        let bitmap_width = bitmap.width() as u32;
        let bitmap_height = bitmap.height() as u32;
        let image = bgra_to_rgba(bitmap_width, bitmap_height, bitmap.as_raw_bytes().to_vec())?;

        Ok(RasterSurface { viewport, image })
    }
}

/// Pdfium hands out BGRA rows; egui and `image` want RGBA
fn bgra_to_rgba(width: u32, height: u32, mut pixels: Vec<u8>) -> Result<RgbaImage> {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, pixels)
        .ok_or_else(|| StudioError::Render("bitmap size does not match its pixel data".to_string()))
}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Cancellation token of one render request.
///
/// Clones share the cancelled flag; two tokens are the same request when
/// their ids are equal.
#[derive(Debug, Clone)]
pub struct RenderToken {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl RenderToken {
    pub fn new() -> Self {
        Self {
            id: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for RenderToken {
    fn default() -> Self {
        Self::new()
    }
}

/// What a thumbnail shows
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailKey {
    pub file_id: FileId,
    pub page_index: usize,
    pub scale: f32,
    pub pixel_density: f32,
}

/// A render job for the worker
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub key: ThumbnailKey,
    pub bytes: Arc<[u8]>,
}

impl RenderRequest {
    pub fn new(file: &SourceFile, page_index: usize, scale: f32, pixel_density: f32) -> Self {
        Self {
            key: ThumbnailKey {
                file_id: file.id.clone(),
                page_index,
                scale,
                pixel_density,
            },
            bytes: file.shared_bytes(),
        }
    }
}

/// A successful render that was still wanted when it finished
#[derive(Debug)]
pub struct CompletedRender {
    pub key: ThumbnailKey,
    pub token: RenderToken,
    pub surface: RasterSurface,
}

/// How a render that was still wanted ended
#[derive(Debug)]
pub enum RenderEvent {
    Completed(CompletedRender),
    /// Already logged; the thumbnail stays blank
    Failed { key: ThumbnailKey, token: RenderToken },
}

impl RenderEvent {
    pub fn token(&self) -> &RenderToken {
        match self {
            RenderEvent::Completed(done) => &done.token,
            RenderEvent::Failed { token, .. } => token,
        }
    }

    pub fn completed(self) -> Option<CompletedRender> {
        match self {
            RenderEvent::Completed(done) => Some(done),
            RenderEvent::Failed { .. } => None,
        }
    }
}

struct RenderJob {
    request: RenderRequest,
    token: RenderToken,
}

struct RenderOutcome {
    key: ThumbnailKey,
    token: RenderToken,
    result: Result<RasterSurface>,
}

/// Renders thumbnails on a dedicated worker thread that owns the rasterizer
pub struct ThumbnailRenderer {
    jobs: Sender<RenderJob>,
    outcomes: Receiver<RenderOutcome>,
}

impl ThumbnailRenderer {
    /// Spawn the worker; `make_rasterizer` runs on the worker thread. If it
    /// fails, every render fails (and is logged) and thumbnails stay blank.
    pub fn spawn<F, R>(make_rasterizer: F) -> Self
    where
        F: FnOnce() -> Result<R> + Send + 'static,
        R: PageRasterizer,
    {
        let (jobs, job_rx) = mpsc::channel::<RenderJob>();
        let (outcome_tx, outcomes) = mpsc::channel::<RenderOutcome>();

        thread::spawn(move || {
            let mut rasterizer = match make_rasterizer() {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!("Thumbnail rendering unavailable: {}", e);
                    None
                }
            };

            for job in job_rx {
                if job.token.is_cancelled() {
                    continue;
                }
                let key = job.request.key.clone();
                let result = match rasterizer.as_mut() {
                    Some(r) => panic::catch_unwind(AssertUnwindSafe(|| {
                        r.rasterize(
                            &job.request.bytes,
                            key.page_index,
                            key.scale,
                            key.pixel_density,
                        )
                    }))
                    .unwrap_or_else(|_| Err(StudioError::Render("rasterizer panicked".to_string()))),
                    None => Err(StudioError::Render("no rasterizer available".to_string())),
                };
                let outcome = RenderOutcome {
                    key,
                    token: job.token,
                    result,
                };
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
        });

        Self { jobs, outcomes }
    }

    /// Spawn a worker bound to the system Pdfium library
    pub fn with_pdfium() -> Self {
        Self::spawn(PdfiumRasterizer::bind)
    }

    /// Queue a render and return its token
    pub fn submit(&self, request: RenderRequest) -> RenderToken {
        let token = RenderToken::new();
        let job = RenderJob {
            request,
            token: token.clone(),
        };
        if self.jobs.send(job).is_err() {
            warn!("Thumbnail worker is gone; render dropped");
        }
        token
    }

    /// Drain finished renders. Cancelled renders are dropped; failures are
    /// logged and reported as [`RenderEvent::Failed`] so their slot can
    /// settle.
    pub fn poll(&self) -> Vec<RenderEvent> {
        let mut events = Vec::new();
        for outcome in self.outcomes.try_iter() {
            if outcome.token.is_cancelled() {
                debug!("Discarding stale render of page {}", outcome.key.page_index + 1);
                continue;
            }
            match outcome.result {
                Ok(surface) => events.push(RenderEvent::Completed(CompletedRender {
                    key: outcome.key,
                    token: outcome.token,
                    surface,
                })),
                Err(e) => {
                    warn!(
                        "Preview error for {} page {}: {}",
                        outcome.key.file_id,
                        outcome.key.page_index + 1,
                        e
                    );
                    events.push(RenderEvent::Failed {
                        key: outcome.key,
                        token: outcome.token,
                    });
                }
            }
        }
        events
    }
}

/// State of one displayed thumbnail. `T` is whatever the front-end draws
/// with (a texture in the GUI).
#[derive(Debug)]
pub struct ThumbnailSlot<T> {
    key: Option<ThumbnailKey>,
    token: Option<RenderToken>,
    surface: Option<T>,
}

impl<T> Default for ThumbnailSlot<T> {
    fn default() -> Self {
        Self {
            key: None,
            token: None,
            surface: None,
        }
    }
}

impl<T> ThumbnailSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the slot does not already show (or wait for) `key`
    pub fn needs_render(&self, key: &ThumbnailKey) -> bool {
        self.key.as_ref() != Some(key)
    }

    /// Start showing `key`, rendered under `token`. Any render still in
    /// flight for the previous key is cancelled and the old surface cleared.
    pub fn begin(&mut self, key: ThumbnailKey, token: RenderToken) {
        self.cancel();
        self.key = Some(key);
        self.token = Some(token);
        self.surface = None;
    }

    /// Whether `token` is this slot's live request
    pub fn is_current(&self, token: &RenderToken) -> bool {
        matches!(&self.token, Some(current) if current.id() == token.id() && !current.is_cancelled())
    }

    /// Store a finished surface if `token` is this slot's current request.
    /// Returns whether the surface was accepted.
    pub fn commit(&mut self, token: &RenderToken, surface: T) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.surface = Some(surface);
        true
    }

    /// Settle the slot after its current render failed. It stays blank and
    /// is not re-rendered until its key changes.
    pub fn fail(&mut self, token: &RenderToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.token = None;
        true
    }

    pub fn surface(&self) -> Option<&T> {
        self.surface.as_ref()
    }

    pub fn key(&self) -> Option<&ThumbnailKey> {
        self.key.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.token.is_some() && self.surface.is_none()
    }

    /// Cancel the in-flight render, if any
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

impl<T> Drop for ThumbnailSlot<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
