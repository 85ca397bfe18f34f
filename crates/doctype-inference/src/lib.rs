//! ONNX inference abstraction layer for doctype.
//!
//! This crate provides a small, backend-neutral interface for running ONNX
//! models:
//! - `InferenceBackend`, the trait the classifier and tests program against
//! - `OrtBackend`, ONNX Runtime with XNNPACK on CPU and optional CUDA
//! - `Device`, the accelerator probe performed once at startup

mod backend;
mod device;
mod error;
mod tensor;

pub use backend::InferenceBackend;
pub use device::Device;
pub use error::InferenceError;
pub use tensor::{InputTensor, OutputTensor, TensorType};

#[cfg(feature = "native")]
pub use backend::ort::{OrtBackend, OrtOptions};

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
