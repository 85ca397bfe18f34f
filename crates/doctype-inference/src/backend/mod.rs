//! Inference backends.

#[cfg(feature = "native")]
pub mod ort;

use crate::{InputTensor, OutputTensor, Result};

/// A loaded model that maps named input tensors to named outputs.
///
/// A backend is read-only once built and may serve concurrent callers.
pub trait InferenceBackend: Send + Sync {
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>>;

    /// Input names declared by the model graph.
    fn input_names(&self) -> &[String];

    /// Output names declared by the model graph.
    fn output_names(&self) -> &[String];

    /// Whether the graph declares an input called `name`.
    fn accepts(&self, name: &str) -> bool {
        self.input_names().iter().any(|n| n == name)
    }
}
