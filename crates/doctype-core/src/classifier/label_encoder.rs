//! Class index to label mapping stored next to the model.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClassifierError;

/// Label encoder file written alongside the exported model.
pub const LABEL_ENCODER_FILE: &str = "label_encoder.json";

/// Hugging Face model config, used when no label encoder file exists.
pub const MODEL_CONFIG_FILE: &str = "config.json";

/// Ordered class labels; a label's position is its class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

#[derive(Deserialize)]
struct HfConfig {
    id2label: BTreeMap<String, String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ClassifierError> {
        if classes.is_empty() {
            return Err(ClassifierError::LabelEncoder("label set is empty".into()));
        }
        Ok(Self { classes })
    }

    /// Load from a model directory: `label_encoder.json` if present,
    /// otherwise `id2label` from `config.json`.
    pub fn from_dir(dir: &Path) -> Result<Self, ClassifierError> {
        let encoder_path = dir.join(LABEL_ENCODER_FILE);
        if encoder_path.exists() {
            return Self::from_json_file(&encoder_path);
        }

        let config_path = dir.join(MODEL_CONFIG_FILE);
        if config_path.exists() {
            return Self::from_model_config(&config_path);
        }

        Err(ClassifierError::LabelEncoder(format!(
            "neither {} nor {} found in {}",
            LABEL_ENCODER_FILE,
            MODEL_CONFIG_FILE,
            dir.display()
        )))
    }

    /// Parse `{"classes": [...]}`.
    pub fn from_json_file(path: &Path) -> Result<Self, ClassifierError> {
        let content = read(path)?;
        let encoder: LabelEncoder = serde_json::from_str(&content)
            .map_err(|e| ClassifierError::LabelEncoder(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded {} classes from {}", encoder.classes.len(), path.display());
        Self::new(encoder.classes)
    }

    /// Parse the `id2label` table of a model config. Ids must be exactly
    /// `0..n`.
    pub fn from_model_config(path: &Path) -> Result<Self, ClassifierError> {
        let content = read(path)?;
        let config: HfConfig = serde_json::from_str(&content)
            .map_err(|e| ClassifierError::LabelEncoder(format!("{}: {}", path.display(), e)))?;

        let mut indexed = config
            .id2label
            .into_iter()
            .map(|(id, label)| {
                id.trim()
                    .parse::<usize>()
                    .map(|id| (id, label))
                    .map_err(|_| ClassifierError::LabelEncoder(format!("non-numeric label id '{}'", id)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        indexed.sort_by_key(|(id, _)| *id);

        if indexed.iter().enumerate().any(|(position, (id, _))| position != *id) {
            return Err(ClassifierError::LabelEncoder(
                "id2label ids are not contiguous from 0".into(),
            ));
        }

        debug!("Loaded {} classes from {}", indexed.len(), path.display());
        Self::new(indexed.into_iter().map(|(_, label)| label).collect())
    }

    /// Label for a class index.
    pub fn decode(&self, index: usize) -> Result<&str, ClassifierError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(ClassifierError::UnknownLabelIndex {
                index,
                classes: self.classes.len(),
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn read(path: &Path) -> Result<String, ClassifierError> {
    std::fs::read_to_string(path)
        .map_err(|e| ClassifierError::LabelEncoder(format!("{}: {}", path.display(), e)))
}
