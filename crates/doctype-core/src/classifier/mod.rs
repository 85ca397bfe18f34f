//! Document-type classification.
//!
//! A fine-tuned sequence-classification transformer exported to ONNX,
//! its tokenizer and its label encoder are loaded together once and then
//! shared read-only.

mod label_encoder;
mod onnx;

pub use label_encoder::{LABEL_ENCODER_FILE, LabelEncoder, MODEL_CONFIG_FILE};
pub use onnx::{OnnxClassifier, load_tokenizer};

use serde::Serialize;

use crate::error::ClassifierError;

/// A label and its softmax probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// Probability in [0, 1], rounded to 3 decimals.
    pub confidence: f64,
}

/// Normalized text to a document label.
pub trait SequenceClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError>;

    /// The closed set of labels this classifier can produce.
    fn labels(&self) -> &[String];
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest element; the first one on ties.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// Round to 3 decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[2.0, 1.0, 0.1]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let probs = softmax(&[1000.0, 999.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs[0] - 0.7310586).abs() < 1e-5);
    }

    #[test]
    fn test_argmax_first_on_tie() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.91249), 0.912);
        assert_eq!(round3(0.9996), 1.0);
        assert_eq!(round3(0.0), 0.0);
    }
}
