//! Document text extraction as an ordered list of strategies.
//!
//! The default order is the per-page text layer with OCR for sparse pages,
//! then full-document rendering with OCR on every page. The first strategy
//! that completes wins; if none does, the document has no text.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info, warn};

use super::{PageRenderer, PageTextReader, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;
use crate::ocr::{OcrEngine, OcrPreprocessor};

/// One way of turning a PDF into text.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Extract the document text. An `Err` hands over to the next strategy.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Ratio of non-blank characters to all characters on a page.
///
/// Empty text has density 0.
pub fn text_density(text: &str) -> f32 {
    let total = text.chars().count();
    let kept = text.trim().chars().count();
    kept as f32 / total.max(1) as f32
}

/// Preprocess a raster and run OCR on it.
fn ocr_page(
    ocr: &dyn OcrEngine,
    preprocessor: &OcrPreprocessor,
    image: &DynamicImage,
    page: usize,
) -> Result<String> {
    let binary = preprocessor
        .process(image)
        .map_err(|source| PdfError::PageOcr { page, source })?;
    ocr.recognize(&DynamicImage::ImageLuma8(binary))
        .map_err(|source| PdfError::PageOcr { page, source })
}

/// Embedded text per page; pages whose density falls below the
/// threshold are rendered and OCR'd instead.
pub struct PageLayerStrategy {
    reader: Arc<dyn PageTextReader>,
    renderer: Arc<dyn PageRenderer>,
    ocr: Arc<dyn OcrEngine>,
    preprocessor: OcrPreprocessor,
    density_threshold: f32,
    render_scale: f32,
}

impl PageLayerStrategy {
    pub fn new(
        reader: Arc<dyn PageTextReader>,
        renderer: Arc<dyn PageRenderer>,
        ocr: Arc<dyn OcrEngine>,
        preprocessor: OcrPreprocessor,
        config: &PdfConfig,
    ) -> Self {
        Self {
            reader,
            renderer,
            ocr,
            preprocessor,
            density_threshold: config.ocr_density_threshold,
            render_scale: config.render_scale,
        }
    }
}

impl ExtractionStrategy for PageLayerStrategy {
    fn name(&self) -> &'static str {
        "page text layer"
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let pages = self.reader.page_texts(path)?;
        let mut parts = Vec::with_capacity(pages.len());

        for (index, page_text) in pages.into_iter().enumerate() {
            let density = text_density(&page_text);
            if density < self.density_threshold {
                info!("Page {}: text density {:.3}, running OCR", index + 1, density);
                let image = self.renderer.render_page(path, index, self.render_scale)?;
                parts.push(ocr_page(
                    self.ocr.as_ref(),
                    &self.preprocessor,
                    &image,
                    index + 1,
                )?);
            } else {
                parts.push(page_text);
            }
        }

        Ok(parts.join(" ").trim().to_string())
    }
}

/// Render every page and OCR all of them unconditionally.
pub struct FullRenderStrategy {
    renderer: Arc<dyn PageRenderer>,
    ocr: Arc<dyn OcrEngine>,
    preprocessor: OcrPreprocessor,
    dpi: u32,
}

impl FullRenderStrategy {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        ocr: Arc<dyn OcrEngine>,
        preprocessor: OcrPreprocessor,
        dpi: u32,
    ) -> Self {
        Self {
            renderer,
            ocr,
            preprocessor,
            dpi,
        }
    }
}

impl ExtractionStrategy for FullRenderStrategy {
    fn name(&self) -> &'static str {
        "full-document OCR"
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let images = self.renderer.render_all(path, self.dpi)?;
        let mut parts = Vec::with_capacity(images.len());

        for (index, image) in images.iter().enumerate() {
            debug!("OCR on page {}", index + 1);
            parts.push(ocr_page(
                self.ocr.as_ref(),
                &self.preprocessor,
                image,
                index + 1,
            )?);
        }

        Ok(parts.join(" ").trim().to_string())
    }
}

/// PDF to raw text, trying each strategy in order.
pub struct TextExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl TextExtractor {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// The default strategy order over shared collaborators.
    pub fn with_defaults(
        reader: Arc<dyn PageTextReader>,
        renderer: Arc<dyn PageRenderer>,
        ocr: Arc<dyn OcrEngine>,
        preprocessor: OcrPreprocessor,
        config: &PdfConfig,
    ) -> Self {
        Self::new(vec![
            Box::new(PageLayerStrategy::new(
                reader,
                renderer.clone(),
                ocr.clone(),
                preprocessor.clone(),
                config,
            )),
            Box::new(FullRenderStrategy::new(
                renderer,
                ocr,
                preprocessor,
                config.fallback_dpi,
            )),
        ])
    }

    /// Extract the document text. Returns `""` when every strategy fails
    /// (including by panicking inside a PDF library); the failures are
    /// logged, not returned.
    pub fn extract(&self, path: &Path) -> String {
        for strategy in &self.strategies {
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| strategy.extract(path)))
                .unwrap_or_else(|_| {
                    Err(PdfError::TextExtraction(format!("{} panicked", strategy.name())))
                });
            match attempt {
                Ok(text) => {
                    debug!(
                        "{}: extracted {} chars via {}",
                        path.display(),
                        text.chars().count(),
                        strategy.name()
                    );
                    return text;
                }
                Err(e) => warn!("{} failed for {}: {}", strategy.name(), path.display(), e),
            }
        }

        warn!("No extraction strategy succeeded for {}", path.display());
        String::new()
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::fakes::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor(reader: FakeReader, renderer: Arc<FakeRenderer>, ocr: Arc<FakeOcr>) -> TextExtractor {
        TextExtractor::with_defaults(
            Arc::new(reader),
            renderer,
            ocr,
            OcrPreprocessor::default(),
            &PdfConfig::default(),
        )
    }

    #[test]
    fn test_text_density() {
        assert_eq!(text_density(""), 0.0);
        assert_eq!(text_density("abcd"), 1.0);
        assert_eq!(text_density("    ab    "), 0.2);
        assert!(text_density(&format!("a{}", " ".repeat(20))) < 0.1);
    }

    #[test]
    fn test_dense_text_never_invokes_ocr() {
        let renderer = Arc::new(FakeRenderer::with_pages(2));
        let ocr = Arc::new(FakeOcr::returning("should not appear"));
        let extractor = extractor(
            FakeReader::pages(&["Invoice page one", "Order Date: 2024-01-05"]),
            renderer.clone(),
            ocr.clone(),
        );

        let text = extractor.extract(Path::new("doc.pdf"));

        assert_eq!(text, "Invoice page one Order Date: 2024-01-05");
        assert_eq!(ocr.calls(), 0);
        assert_eq!(renderer.page_renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sparse_pages_ocr_once_each() {
        let renderer = Arc::new(FakeRenderer::with_pages(4));
        let ocr = Arc::new(FakeOcr::returning("scanned"));
        let extractor = extractor(
            FakeReader::pages(&["", "Dense text page", "   \n  ", "Another dense page"]),
            renderer.clone(),
            ocr.clone(),
        );

        let text = extractor.extract(Path::new("doc.pdf"));

        assert_eq!(text, "scanned Dense text page scanned Another dense page");
        assert_eq!(ocr.calls(), 2);
        assert_eq!(renderer.page_renders.load(Ordering::SeqCst), 2);
        assert_eq!(renderer.full_renders.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unreadable_pdf_falls_back_to_full_render() {
        let renderer = Arc::new(FakeRenderer::with_pages(3));
        let ocr = Arc::new(FakeOcr::returning("page"));
        let extractor = extractor(FakeReader::failing("broken xref"), renderer.clone(), ocr.clone());

        let text = extractor.extract(Path::new("doc.pdf"));

        assert_eq!(text, "page page page");
        assert_eq!(ocr.calls(), 3);
        assert_eq!(renderer.full_renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ocr_failure_on_sparse_page_falls_back() {
        let renderer = Arc::new(FakeRenderer::with_pages(1));
        let ocr = Arc::new(FakeOcr::failing());
        let extractor = extractor(FakeReader::pages(&[""]), renderer.clone(), ocr.clone());

        assert_eq!(extractor.extract(Path::new("doc.pdf")), "");
        // Once in the page strategy, once in the fallback.
        assert_eq!(ocr.calls(), 2);
        assert_eq!(renderer.full_renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_everything_fails_yields_empty() {
        let renderer = Arc::new(FakeRenderer::failing());
        let ocr = Arc::new(FakeOcr::returning("unused"));
        let extractor = extractor(FakeReader::failing("bad"), renderer, ocr.clone());

        assert_eq!(extractor.extract(Path::new("doc.pdf")), "");
        assert_eq!(ocr.calls(), 0);
    }

    #[test]
    fn test_blank_ocr_is_success_not_fallback() {
        let renderer = Arc::new(FakeRenderer::with_pages(1));
        let ocr = Arc::new(FakeOcr::returning(""));
        let extractor = extractor(FakeReader::pages(&[""]), renderer.clone(), ocr.clone());

        assert_eq!(extractor.extract(Path::new("doc.pdf")), "");
        assert_eq!(ocr.calls(), 1);
        assert_eq!(renderer.full_renders.load(Ordering::SeqCst), 0);
    }

    struct PanickingStrategy;

    impl ExtractionStrategy for PanickingStrategy {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn extract(&self, _path: &Path) -> Result<String> {
            panic!("malformed font program")
        }
    }

    #[test]
    fn test_panicking_strategy_falls_through() {
        let renderer = Arc::new(FakeRenderer::with_pages(1));
        let ocr = Arc::new(FakeOcr::returning("recovered"));
        let extractor = TextExtractor::new(vec![
            Box::new(PanickingStrategy),
            Box::new(FullRenderStrategy::new(renderer, ocr, OcrPreprocessor::default(), 200)),
        ]);

        assert_eq!(extractor.extract(Path::new("doc.pdf")), "recovered");
    }

    #[test]
    fn test_empty_strategy_list() {
        assert_eq!(TextExtractor::new(Vec::new()).extract(Path::new("x.pdf")), "");
    }
}
