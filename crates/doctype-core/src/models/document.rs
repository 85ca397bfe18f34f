//! Classification result records.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Known business-document categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentCategory {
    Invoice,
    PurchaseOrder,
    Report,
    ShippingOrder,
}

impl DocumentCategory {
    /// All categories, in label-encoder order.
    pub const ALL: [DocumentCategory; 4] = [
        DocumentCategory::Invoice,
        DocumentCategory::PurchaseOrder,
        DocumentCategory::Report,
        DocumentCategory::ShippingOrder,
    ];

    /// Match a model label, ignoring case and whitespace.
    ///
    /// `"Purchase Order"`, `"purchase order"` and `"purchaseorder"` all map
    /// to `PurchaseOrder`.
    pub fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "invoice" => Some(DocumentCategory::Invoice),
            "purchaseorder" => Some(DocumentCategory::PurchaseOrder),
            "report" => Some(DocumentCategory::Report),
            "shippingorder" => Some(DocumentCategory::ShippingOrder),
            _ => None,
        }
    }

    /// Key used for this category in usage statistics.
    pub fn stats_key(&self) -> &'static str {
        match self {
            DocumentCategory::Invoice => "invoice",
            DocumentCategory::PurchaseOrder => "purchase order",
            DocumentCategory::Report => "report",
            DocumentCategory::ShippingOrder => "shippingorder",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentCategory::Invoice => "invoice",
            DocumentCategory::PurchaseOrder => "purchase order",
            DocumentCategory::Report => "report",
            DocumentCategory::ShippingOrder => "shipping order",
        };
        f.write_str(name)
    }
}

/// An extracted field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A single trimmed capture.
    Text(String),
    /// Every match of a repeating pattern, one row of captures per match.
    Rows(Vec<Vec<String>>),
}

/// Field name to value mapping, in rule order.
///
/// A field whose pattern did not match is present with `None` and
/// serializes as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    entries: Vec<(String, Option<FieldValue>)>,
}

impl ExtractedFields {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<FieldValue>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a field. `None` when the field is unknown or missing.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Whether the mapping has an entry (matched or not) for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Scalar value of a field.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Repeating value of a field.
    pub fn rows(&self, name: &str) -> Option<&[Vec<String>]> {
        match self.get(name) {
            Some(FieldValue::Rows(rows)) => Some(rows.as_slice()),
            _ => None,
        }
    }

    /// Iterate over fields in rule order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FieldValue>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExtractedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Successful classification of one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Label from the model's closed label set.
    pub predicted_class: String,
    /// Softmax probability of the label, rounded to 3 decimals.
    pub confidence: f64,
    /// Category-specific fields pulled from the raw text.
    pub extracted_info: ExtractedFields,
    /// Length of the normalized text in characters.
    pub text_length: usize,
    /// Length of the raw extracted text in characters.
    pub original_text_length: usize,
}

/// Result record returned by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionOutcome {
    Success(ClassificationResult),
    Failure { error: String },
}

impl PredictionOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        PredictionOutcome::Failure {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictionOutcome::Success(_))
    }

    /// The classification, if the pipeline succeeded.
    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            PredictionOutcome::Success(result) => Some(result),
            PredictionOutcome::Failure { .. } => None,
        }
    }

    /// The error message, if the pipeline failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            PredictionOutcome::Success(_) => None,
            PredictionOutcome::Failure { error } => Some(error),
        }
    }
}
