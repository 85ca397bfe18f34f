//! Core library for PDF business-document classification.
//!
//! This crate provides:
//! - PDF text extraction with a per-page OCR fallback
//! - Text normalization (stopwords, lemmatization)
//! - Document-type classification with an ONNX transformer
//! - Category-specific field extraction
//! - Usage statistics

pub mod classifier;
pub mod error;
pub mod fields;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod stats;
pub mod text;

pub use classifier::{LabelEncoder, OnnxClassifier, Prediction, SequenceClassifier};
pub use error::{
    ClassifierError, DoctypeError, OcrError, PdfError, PredictError, Result, StatsError,
};
pub use fields::extract_fields;
pub use models::{
    ClassificationResult, DoctypeConfig, DocumentCategory, ExtractedFields, FieldValue,
    PredictionOutcome,
};
pub use ocr::{OcrEngine, OcrPreprocessor, TextBox};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{LopdfReader, PageRenderer, PageTextReader, TextExtractor};
#[cfg(feature = "native")]
pub use pdf::PdfiumRenderer;
pub use pipeline::DocumentPipeline;
pub use stats::{HistoryEntry, StatsStore, StatsSummary, UsageStats};
pub use text::clean;

/// Re-export inference types.
pub use doctype_inference::{Device, InferenceBackend, InputTensor, OutputTensor};

#[cfg(feature = "native")]
pub use doctype_inference::OrtBackend;
