//! Error types for the doctype-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the doctype library.
#[derive(Error, Debug)]
pub enum DoctypeError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Classifier loading or inference error.
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Usage statistics error.
    #[error("stats error: {0}")]
    Stats(#[from] StatsError),

    /// Inference error from the inference layer.
    #[error("inference error: {0}")]
    Inference(#[from] doctype_inference::InferenceError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to rasterize a page.
    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    /// No rasterizer could be loaded.
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// OCR failed while reading a page.
    #[error("OCR failed on page {page}: {source}")]
    PageOcr {
        page: usize,
        #[source]
        source: OcrError,
    },

    /// I/O error while reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text detection or recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to the document-type classifier.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The model artifact directory or one of its files is missing.
    #[error("model artifact not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// The tokenizer could not be loaded or failed on the input.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// The label encoder artifact is missing or malformed.
    #[error("label encoder error: {0}")]
    LabelEncoder(String),

    /// Inference failed.
    #[error("inference error: {0}")]
    Inference(#[from] doctype_inference::InferenceError),

    /// The model produced output of an unexpected shape or type.
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),

    /// The model predicted an index the label encoder does not know.
    #[error("predicted index {index} outside label set of {classes}")]
    UnknownLabelIndex { index: usize, classes: usize },
}

/// Errors related to the usage statistics store.
#[derive(Error, Debug)]
pub enum StatsError {
    /// Failed to read or write the stats file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize the stats.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// No history entry carries the given filename.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The store lock was poisoned by a panicking writer.
    #[error("stats store lock poisoned")]
    Poisoned,
}

/// Failures surfaced by the prediction pipeline as error records.
#[derive(Error, Debug)]
pub enum PredictError {
    /// No text could be obtained from the PDF by any path.
    #[error("no text extracted from PDF")]
    NoText,

    /// Text was extracted but nothing survived normalization.
    #[error("text is empty after cleaning")]
    EmptyAfterCleaning,

    /// Tokenization or model execution failed.
    #[error("{0}")]
    Classification(#[from] ClassifierError),
}

/// Result type for the doctype library.
pub type Result<T> = std::result::Result<T, DoctypeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_error_messages() {
        assert_eq!(PredictError::NoText.to_string(), "no text extracted from PDF");
        assert_eq!(
            PredictError::EmptyAfterCleaning.to_string(),
            "text is empty after cleaning"
        );
    }

    #[test]
    fn test_model_not_found_message() {
        let err = ClassifierError::ModelNotFound(PathBuf::from("models/missing"));
        assert_eq!(err.to_string(), "model artifact not found: models/missing");
    }
}
