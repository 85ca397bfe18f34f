//! PDF text extraction with OCR fallback.

mod extractor;
mod loader;
#[cfg(feature = "native")]
mod renderer;

pub use extractor::{
    ExtractionStrategy, FullRenderStrategy, PageLayerStrategy, TextExtractor, text_density,
};
pub use loader::{LopdfReader, load_document};
#[cfg(feature = "native")]
pub use renderer::PdfiumRenderer;

#[cfg(test)]
pub(crate) use extractor::fakes;
#[cfg(test)]
pub(crate) use loader::test_pdf;

use std::path::Path;

use image::DynamicImage;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Source of per-page embedded text.
pub trait PageTextReader: Send + Sync {
    /// Text layer of every page, in page order. A page without a text
    /// layer yields an empty string.
    fn page_texts(&self, path: &Path) -> Result<Vec<String>>;
}

/// Page rasterizer.
pub trait PageRenderer: Send + Sync {
    /// Render one page (0-indexed) at `scale` pixels per PDF point.
    fn render_page(&self, path: &Path, page: usize, scale: f32) -> Result<DynamicImage>;

    /// Render every page at `dpi`.
    fn render_all(&self, path: &Path, dpi: u32) -> Result<Vec<DynamicImage>>;
}
