//! PDF to classification result.
//!
//! `predict` chains extraction, normalization, classification and field
//! extraction. The two empty-text checkpoints and any classifier failure
//! come back as error records; nothing escapes as an `Err` or a panic.

use std::path::Path;

use tracing::{info, warn};

use crate::classifier::SequenceClassifier;
use crate::error::PredictError;
use crate::fields::extract_fields;
use crate::models::document::{ClassificationResult, PredictionOutcome};
use crate::pdf::TextExtractor;
use crate::text::clean;

#[cfg(feature = "native")]
use crate::{
    classifier::OnnxClassifier,
    error::{OcrError, PdfError},
    models::config::DoctypeConfig,
    ocr::{OcrEngine, OcrPreprocessor, PureOcrEngine},
    pdf::{LopdfReader, PageRenderer, PdfiumRenderer},
};
#[cfg(feature = "native")]
use doctype_inference::OrtBackend;
#[cfg(feature = "native")]
use std::sync::Arc;

/// Extractor plus classifier; built once and reused for every document.
pub struct DocumentPipeline<C: SequenceClassifier> {
    extractor: TextExtractor,
    classifier: C,
}

impl<C: SequenceClassifier> DocumentPipeline<C> {
    pub fn new(extractor: TextExtractor, classifier: C) -> Self {
        Self {
            extractor,
            classifier,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Classify the PDF at `pdf_path`.
    pub fn predict(&self, pdf_path: &Path) -> PredictionOutcome {
        match self.try_predict(pdf_path) {
            Ok(result) => {
                info!(
                    "{}: {} ({:.3})",
                    pdf_path.display(),
                    result.predicted_class,
                    result.confidence
                );
                PredictionOutcome::Success(result)
            }
            Err(e) => {
                warn!("{}: {}", pdf_path.display(), e);
                PredictionOutcome::failure(e.to_string())
            }
        }
    }

    /// Like [`predict`](Self::predict), keeping the failure typed.
    pub fn try_predict(&self, pdf_path: &Path) -> Result<ClassificationResult, PredictError> {
        let text = self.extractor.extract(pdf_path);
        self.classify_text(&text)
    }

    /// Everything after extraction, on already-extracted raw text.
    pub fn classify_text(&self, raw_text: &str) -> Result<ClassificationResult, PredictError> {
        if raw_text.trim().is_empty() {
            return Err(PredictError::NoText);
        }

        let cleaned = clean(raw_text);
        if cleaned.trim().is_empty() {
            return Err(PredictError::EmptyAfterCleaning);
        }

        let prediction = self.classifier.classify(&cleaned)?;
        let extracted_info = extract_fields(&prediction.label, raw_text);

        Ok(ClassificationResult {
            predicted_class: prediction.label,
            confidence: prediction.confidence,
            extracted_info,
            text_length: cleaned.chars().count(),
            original_text_length: raw_text.chars().count(),
        })
    }
}

#[cfg(feature = "native")]
impl DocumentPipeline<OnnxClassifier<OrtBackend>> {
    /// Load every collaborator named in `config`.
    ///
    /// The classifier is required. The rasterizer and OCR models are not:
    /// without them text-layer PDFs still classify, and OCR-dependent
    /// pages fail over to the no-text record.
    pub fn from_config(config: &DoctypeConfig) -> crate::Result<Self> {
        let classifier = OnnxClassifier::load(&config.classifier)?;
        let preprocessor = OcrPreprocessor::new(config.preprocessing.clone())?;

        let renderer: Arc<dyn PageRenderer> =
            match PdfiumRenderer::new(config.pdf.max_render_dimension) {
                Ok(renderer) => Arc::new(renderer),
                Err(e) => {
                    warn!("Page rendering disabled: {}", e);
                    Arc::new(Unavailable(e.to_string()))
                }
            };

        let ocr: Arc<dyn OcrEngine> = match PureOcrEngine::from_config(&config.ocr) {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                warn!("OCR disabled: {}", e);
                Arc::new(Unavailable(e.to_string()))
            }
        };

        let extractor = TextExtractor::with_defaults(
            Arc::new(LopdfReader::new()),
            renderer,
            ocr,
            preprocessor,
            &config.pdf,
        );

        Ok(Self::new(extractor, classifier))
    }
}

/// Stand-in for a collaborator that failed to load.
#[cfg(feature = "native")]
struct Unavailable(String);

#[cfg(feature = "native")]
impl PageRenderer for Unavailable {
    fn render_page(
        &self,
        _path: &Path,
        _page: usize,
        _scale: f32,
    ) -> crate::pdf::Result<image::DynamicImage> {
        Err(PdfError::RendererUnavailable(self.0.clone()))
    }

    fn render_all(&self, _path: &Path, _dpi: u32) -> crate::pdf::Result<Vec<image::DynamicImage>> {
        Err(PdfError::RendererUnavailable(self.0.clone()))
    }
}

#[cfg(feature = "native")]
impl OcrEngine for Unavailable {
    fn recognize(&self, _image: &image::DynamicImage) -> Result<String, OcrError> {
        Err(OcrError::ModelLoad(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::classifier::Prediction;
    use crate::error::ClassifierError;
    use crate::models::config::PdfConfig;
    use crate::models::document::FieldValue;
    use crate::ocr::OcrPreprocessor;
    use crate::pdf::fakes::{FakeOcr, FakeReader, FakeRenderer};
    use crate::pdf::{LopdfReader, test_pdf};
    use pretty_assertions::assert_eq;

    /// Returns a fixed label; counts calls and remembers the last input.
    struct FakeClassifier {
        label: &'static str,
        calls: AtomicUsize,
        last_input: std::sync::Mutex<String>,
        labels: Vec<String>,
    }

    impl FakeClassifier {
        fn new(label: &'static str) -> Self {
            Self {
                label,
                calls: AtomicUsize::new(0),
                last_input: Default::default(),
                labels: vec![label.to_string()],
            }
        }
    }

    impl SequenceClassifier for FakeClassifier {
        fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock().unwrap() = text.to_string();
            if self.label.is_empty() {
                return Err(ClassifierError::UnexpectedOutput("fake failure".into()));
            }
            Ok(Prediction {
                label: self.label.to_string(),
                confidence: 0.973,
            })
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }
    }

    fn pipeline(
        reader: FakeReader,
        ocr: FakeOcr,
        label: &'static str,
    ) -> DocumentPipeline<FakeClassifier> {
        let extractor = TextExtractor::with_defaults(
            Arc::new(reader),
            Arc::new(FakeRenderer::with_pages(1)),
            Arc::new(ocr),
            OcrPreprocessor::default(),
            &PdfConfig::default(),
        );
        DocumentPipeline::new(extractor, FakeClassifier::new(label))
    }

    #[test]
    fn test_text_native_invoice() {
        let pipeline = pipeline(
            FakeReader::pages(&[
                "INVOICE\nOrder Date: 2024-01-05\nContact Name: John Smith\nAddress: 12 Main St\n",
            ]),
            FakeOcr::returning("unused"),
            "invoice",
        );

        let outcome = pipeline.predict(Path::new("invoice.pdf"));
        let result = outcome.result().expect("success record");

        assert_eq!(result.predicted_class, "invoice");
        assert_eq!(result.confidence, 0.973);
        assert_eq!(result.extracted_info.text("Order Date"), Some("2024-01-05"));
        assert_eq!(result.extracted_info.text("Contact Name"), Some("John Smith"));
        assert!(result.text_length <= result.original_text_length);
        assert_eq!(
            result.text_length,
            pipeline.classifier().last_input.lock().unwrap().chars().count()
        );
    }

    #[test]
    fn test_blank_scan_is_no_text_record() {
        let pipeline = pipeline(FakeReader::pages(&[""]), FakeOcr::returning("  \n "), "invoice");

        let outcome = pipeline.predict(Path::new("scan.pdf"));

        assert_eq!(outcome.error(), Some("no text extracted from PDF"));
        assert_eq!(pipeline.classifier().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_noise_only_is_empty_after_cleaning() {
        let pipeline = pipeline(
            FakeReader::pages(&["1234 5678 !!! the of to https://example.com"]),
            FakeOcr::returning("unused"),
            "invoice",
        );

        let outcome = pipeline.predict(Path::new("noise.pdf"));

        assert_eq!(outcome.error(), Some("text is empty after cleaning"));
        assert_eq!(pipeline.classifier().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shipping_order_fields() {
        let text = "SHIPPING ORDER\n\
                    Order ID: 10248\n\
                    Order Date: 2016-07-04\n\
                    Shipped Date: 2016-07-16\n\
                    Ship Name: Vins et alcools Chevalier\n\
                    Ship Address: 59 rue de l'Abbaye\n\
                    Ship City: Reims\n\
                    Ship Region: Western Europe\n\
                    Ship Postal Code: 51100\n\
                    Ship Country: France\n\
                    product: Queso Cabrales\nquantity: 12\nunit price: 14.0\ntotal: 168.0\n";
        let pipeline = pipeline(
            FakeReader::pages(&[text]),
            FakeOcr::returning("unused"),
            "shippingorder",
        );

        let result = pipeline.try_predict(Path::new("ship.pdf")).unwrap();
        let fields = &result.extracted_info;

        for name in [
            "Order ID",
            "Order Date",
            "Shipped Date",
            "Ship Name",
            "Ship Address",
            "Ship City",
            "Ship Region",
            "Ship Postal Code",
            "Ship Country",
        ] {
            assert!(fields.text(name).is_some(), "{name} missing");
        }
        assert_eq!(fields.text("Ship City"), Some("Reims"));
        match fields.get("Products") {
            Some(FieldValue::Rows(rows)) => {
                assert_eq!(rows[0], vec!["Queso Cabrales", "12", "14.0", "168.0"]);
            }
            other => panic!("unexpected products {other:?}"),
        }
    }

    #[test]
    fn test_ocr_text_is_classified() {
        let pipeline = pipeline(
            FakeReader::pages(&[""]),
            FakeOcr::returning("Quarterly report\nCategory: Beverages"),
            "report",
        );

        let result = pipeline.try_predict(Path::new("scan.pdf")).unwrap();

        assert_eq!(result.predicted_class, "report");
        assert_eq!(result.extracted_info.text("Category"), Some("Beverages"));
    }

    #[test]
    fn test_classifier_failure_is_error_record() {
        let pipeline = pipeline(
            FakeReader::pages(&["Invoice for services rendered"]),
            FakeOcr::returning("unused"),
            "",
        );

        let outcome = pipeline.predict(Path::new("x.pdf"));

        assert!(!outcome.is_success());
        assert!(outcome.error().unwrap().contains("fake failure"));
    }

    #[test]
    fn test_unknown_label_has_empty_fields() {
        let pipeline = pipeline(
            FakeReader::pages(&["Receipt for coffee purchase"]),
            FakeOcr::returning("unused"),
            "receipt",
        );

        let result = pipeline.try_predict(Path::new("r.pdf")).unwrap();
        assert!(result.extracted_info.is_empty());
    }

    #[test]
    fn test_real_pdf_text_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        std::fs::write(&path, test_pdf(&["Order Date: 2024-01-05", "Contact Name: John Smith"]))
            .unwrap();

        let ocr = Arc::new(FakeOcr::returning("unused"));
        let extractor = TextExtractor::with_defaults(
            Arc::new(LopdfReader::new()),
            Arc::new(FakeRenderer::with_pages(2)),
            ocr.clone(),
            OcrPreprocessor::default(),
            &PdfConfig::default(),
        );
        let pipeline = DocumentPipeline::new(extractor, FakeClassifier::new("invoice"));

        let result = pipeline.try_predict(&path).unwrap();

        assert_eq!(ocr.calls(), 0);
        assert_eq!(result.predicted_class, "invoice");
        assert_eq!(result.extracted_info.text("Order Date"), Some("2024-01-05"));
    }

    #[test]
    fn test_missing_file_is_no_text_record() {
        let pipeline = DocumentPipeline::new(
            TextExtractor::with_defaults(
                Arc::new(LopdfReader::new()),
                Arc::new(FakeRenderer::failing()),
                Arc::new(FakeOcr::returning("unused")),
                OcrPreprocessor::default(),
                &PdfConfig::default(),
            ),
            FakeClassifier::new("invoice"),
        );

        let outcome = pipeline.predict(Path::new("/nonexistent/missing.pdf"));
        assert_eq!(outcome.error(), Some("no text extracted from PDF"));
    }
}
