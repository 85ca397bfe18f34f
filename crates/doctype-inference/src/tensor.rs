//! Backend-neutral tensors.
//!
//! Classifier inputs are `i64` token sequences and its outputs are `f32`
//! logits; both directions carry either element type.

use ndarray::{ArrayD, IxDyn};

use crate::{InferenceError, Result};

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorType {
    Float32,
    Int64,
}

/// Tensor fed to a model.
#[derive(Debug, Clone)]
pub enum InputTensor {
    Float32(ArrayD<f32>),
    Int64(ArrayD<i64>),
}

/// Tensor produced by a model.
#[derive(Debug, Clone)]
pub enum OutputTensor {
    Float32(ArrayD<f32>),
    Int64(ArrayD<i64>),
}

macro_rules! tensor_meta {
    ($name:ident) => {
        impl $name {
            pub fn shape(&self) -> &[usize] {
                match self {
                    $name::Float32(arr) => arr.shape(),
                    $name::Int64(arr) => arr.shape(),
                }
            }

            pub fn dtype(&self) -> TensorType {
                match self {
                    $name::Float32(_) => TensorType::Float32,
                    $name::Int64(_) => TensorType::Int64,
                }
            }

            /// Number of elements.
            pub fn len(&self) -> usize {
                match self {
                    $name::Float32(arr) => arr.len(),
                    $name::Int64(arr) => arr.len(),
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }
        }
    };
}

tensor_meta!(InputTensor);
tensor_meta!(OutputTensor);

fn shaped<T>(data: Vec<T>, shape: &[usize]) -> Result<ArrayD<T>> {
    ArrayD::from_shape_vec(IxDyn(shape), data).map_err(|e| {
        InferenceError::InvalidInput(format!("data does not fit shape {:?}: {}", shape, e))
    })
}

impl InputTensor {
    pub fn from_f32(data: Vec<f32>, shape: &[usize]) -> Result<Self> {
        shaped(data, shape).map(InputTensor::Float32)
    }

    pub fn from_i64(data: Vec<i64>, shape: &[usize]) -> Result<Self> {
        shaped(data, shape).map(InputTensor::Int64)
    }

    /// A single-row `[1, n]` batch of tokenizer ids or mask values.
    pub fn from_token_ids(ids: &[u32]) -> Result<Self> {
        let data: Vec<i64> = ids.iter().map(|&id| i64::from(id)).collect();
        Self::from_i64(data, &[1, ids.len()])
    }
}

impl OutputTensor {
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            OutputTensor::Float32(arr) => Some(arr),
            OutputTensor::Int64(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<&ArrayD<i64>> {
        match self {
            OutputTensor::Int64(arr) => Some(arr),
            OutputTensor::Float32(_) => None,
        }
    }
}
