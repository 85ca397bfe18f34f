//! Page rasterization via PDFium.
//!
//! `PdfiumRenderer` is stateless. Each call binds the library and opens the
//! document afresh; the OS caches the loaded library.

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::{PageRenderer, Result};
use crate::error::PdfError;

const POINTS_PER_INCH: f32 = 72.0;

/// PDFium-backed page renderer.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    max_dimension: u32,
}

impl PdfiumRenderer {
    /// Create a renderer, failing fast when the PDFium library cannot be
    /// found.
    ///
    /// Discovery order:
    /// 1. `PDFIUM_DYNAMIC_LIB_PATH` env var (explicit path to library file)
    /// 2. Alongside the running executable
    /// 3. System library search paths
    pub fn new(max_dimension: u32) -> Result<Self> {
        let _ = load_pdfium()?;
        Ok(Self {
            max_dimension: max_dimension.max(1),
        })
    }

    fn render(&self, page: &PdfPage, index: usize, scale: f32) -> Result<DynamicImage> {
        let (width, height) = render_dimensions(
            page.width().value,
            page.height().value,
            scale,
            self.max_dimension,
        );

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_maximum_height(height as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfError::Render {
                page: index + 1,
                reason: e.to_string(),
            })?;

        let (w, h) = (bitmap.width() as u32, bitmap.height() as u32);
        let raster = RgbaImage::from_raw(w, h, bitmap.as_rgba_bytes()).ok_or_else(|| {
            PdfError::Render {
                page: index + 1,
                reason: format!("bitmap buffer does not match {}x{}", w, h),
            }
        })?;

        debug!("Rendered page {} at {}x{}", index + 1, w, h);
        Ok(DynamicImage::ImageRgba8(raster))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_page(&self, path: &Path, page: usize, scale: f32) -> Result<DynamicImage> {
        let pdfium = load_pdfium()?;
        let document = pdfium.load_pdf_from_file(path, None).map_err(map_load_error)?;
        let pages = document.pages();

        let index = u16::try_from(page).map_err(|_| PdfError::Render {
            page: page + 1,
            reason: "page index out of range".to_string(),
        })?;
        let pdf_page = pages.get(index).map_err(|e| PdfError::Render {
            page: page + 1,
            reason: format!("document has {} pages: {}", pages.len(), e),
        })?;

        self.render(&pdf_page, page, scale)
    }

    fn render_all(&self, path: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        let pdfium = load_pdfium()?;
        let document = pdfium.load_pdf_from_file(path, None).map_err(map_load_error)?;
        let scale = dpi as f32 / POINTS_PER_INCH;

        let images = document
            .pages()
            .iter()
            .enumerate()
            .map(|(index, page)| self.render(&page, index, scale))
            .collect::<Result<Vec<_>>>()?;

        if images.is_empty() {
            return Err(PdfError::NoPages);
        }
        Ok(images)
    }
}

fn load_pdfium() -> Result<Pdfium> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        debug!("Loading PDFium from {}", path);
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            PdfError::RendererUnavailable(format!("failed to load PDFium from {}: {}", path, e))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        let lib_path =
            Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!("Loaded PDFium from {}", exe_dir.display());
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        PdfError::RendererUnavailable(format!(
            "PDFium library not found, set PDFIUM_DYNAMIC_LIB_PATH: {}",
            e
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

fn map_load_error(e: PdfiumError) -> PdfError {
    let message = e.to_string();
    let lower = message.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        PdfError::Encrypted
    } else {
        PdfError::Parse(message)
    }
}

/// Pixel size for a page of `width_points` x `height_points` at `scale`
/// pixels per point, capped to `max_dimension` on the longer side with
/// the aspect ratio kept. Both sides are at least 1.
fn render_dimensions(
    width_points: f32,
    height_points: f32,
    scale: f32,
    max_dimension: u32,
) -> (u32, u32) {
    let raw_w = (width_points * scale).max(1.0);
    let raw_h = (height_points * scale).max(1.0);

    let longest = raw_w.max(raw_h);
    if longest <= max_dimension as f32 {
        return (raw_w.round() as u32, raw_h.round() as u32);
    }

    let ratio = max_dimension as f32 / longest;
    let w = ((raw_w * ratio).round() as u32).clamp(1, max_dimension);
    let h = ((raw_h * ratio).round() as u32).clamp(1, max_dimension);
    warn!(
        "Page raster {}x{} capped to {}x{}",
        raw_w as u32, raw_h as u32, w, h
    );
    (w, h)
}
