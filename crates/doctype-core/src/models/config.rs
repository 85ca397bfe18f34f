//! Configuration structures for the classification pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the doctype pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctypeConfig {
    /// PDF text extraction configuration.
    pub pdf: PdfConfig,

    /// Image preprocessing applied before OCR.
    pub preprocessing: PreprocessConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Document-type classifier configuration.
    pub classifier: ClassifierConfig,

    /// Usage statistics configuration.
    pub stats: StatsConfig,
}

/// PDF text extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Pages whose stripped/raw text ratio falls below this are OCR'd.
    pub ocr_density_threshold: f32,

    /// Scale factor for rendering a sparse page before OCR.
    pub render_scale: f32,

    /// DPI for the whole-document rendering fallback.
    pub fallback_dpi: u32,

    /// Maximum raster dimension (either side) in pixels.
    pub max_render_dimension: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            ocr_density_threshold: 0.1,
            render_scale: 2.0,
            fallback_dpi: 200,
            max_render_dimension: 6000,
        }
    }
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Median blur kernel size (odd).
    pub median_kernel: u32,

    /// CLAHE contrast clip limit.
    pub clahe_clip_limit: f32,

    /// CLAHE tiles per side.
    pub clahe_tile_grid: u32,

    /// Adaptive threshold neighbourhood size (odd).
    pub threshold_block_size: u32,

    /// Constant subtracted from the weighted neighbourhood mean.
    pub threshold_c: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            median_kernel: 3,
            clahe_clip_limit: 2.0,
            clahe_tile_grid: 8,
            threshold_block_size: 11,
            threshold_c: 2.0,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing OCR model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name (Latin script: English and French).
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/ocr"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

/// Classifier model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Directory holding the model, tokenizer and label encoder.
    pub model_dir: PathBuf,

    /// ONNX model file name.
    pub model_file: String,

    /// Tokenizer file name.
    pub tokenizer_file: String,

    /// Maximum sequence length (truncation and padding target).
    pub max_length: usize,

    /// Allow an accelerator when the startup probe finds one.
    pub use_gpu: bool,

    /// Number of CPU threads for inference.
    pub num_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/pdf_classifier_final"),
            model_file: "model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            max_length: 512,
            use_gpu: true,
            num_threads: 4,
        }
    }
}

/// Usage statistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Path of the JSON stats file.
    pub path: PathBuf,

    /// Number of history entries kept.
    pub history_limit: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("analysis_stats.json"),
            history_limit: 100,
        }
    }
}

impl DoctypeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Full path to an OCR model file.
    pub fn ocr_model_path(&self, file_name: &str) -> PathBuf {
        self.ocr.model_dir.join(file_name)
    }
}
