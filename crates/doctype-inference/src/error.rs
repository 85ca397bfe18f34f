//! Inference errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    /// The model bytes could not be turned into a session.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Session options were rejected by the runtime.
    #[error("failed to configure session: {0}")]
    SessionConfig(String),

    /// Input data does not fit its declared shape or the model.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The runtime failed while executing the graph.
    #[error("inference failed: {0}")]
    Run(String),

    /// An output has an element type the tensor layer does not carry.
    #[error("unsupported element type for output '{0}'")]
    UnsupportedOutput(String),

    /// A previous run panicked while holding the session.
    #[error("session lock poisoned")]
    Poisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
