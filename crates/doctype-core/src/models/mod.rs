//! Data models: configuration and result records.

pub mod config;
pub mod document;

pub use config::DoctypeConfig;
pub use document::{
    ClassificationResult, DocumentCategory, ExtractedFields, FieldValue, PredictionOutcome,
};
