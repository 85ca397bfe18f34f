//! ONNX Runtime (ort) backend with XNNPACK on CPU and optional CUDA.

use std::path::Path;
use std::sync::Mutex;

use ndarray::{ArrayD, IxDyn};
use ort::ep::{ExecutionProviderDispatch, XNNPACK};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::{DynValue, Tensor};
use tracing::{debug, trace};

use crate::device::Device;
use crate::error::InferenceError;
use crate::tensor::{InputTensor, OutputTensor};
use crate::{InferenceBackend, Result};

/// Session options for `OrtBackend`.
#[derive(Debug, Clone, Copy)]
pub struct OrtOptions {
    /// Device chosen by [`Device::probe`].
    pub device: Device,
    pub intra_threads: usize,
}

impl Default for OrtOptions {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            intra_threads: 4,
        }
    }
}

/// ONNX Runtime session. `Session::run` needs `&mut`, so calls are
/// serialized behind a mutex.
pub struct OrtBackend {
    session: Mutex<Session>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl OrtBackend {
    pub fn from_file<P: AsRef<Path>>(path: P, options: OrtOptions) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        debug!("Read {} bytes of ONNX model from {}", bytes.len(), path.display());
        Self::from_bytes(&bytes, options)
    }

    pub fn from_bytes(bytes: &[u8], options: OrtOptions) -> Result<Self> {
        let session = Session::builder()
            .map_err(session_config)?
            .with_execution_providers(execution_providers(options.device))
            .map_err(session_config)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(session_config)?
            .with_intra_threads(options.intra_threads)
            .map_err(session_config)?
            .commit_from_memory(bytes)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        debug!(
            "Session ready on {}: inputs {:?}, outputs {:?}",
            options.device, input_names, output_names
        );

        Ok(Self {
            session: Mutex::new(session),
            input_names,
            output_names,
        })
    }
}

fn session_config<E: std::fmt::Display>(e: E) -> InferenceError {
    InferenceError::SessionConfig(e.to_string())
}

fn execution_providers(device: Device) -> Vec<ExecutionProviderDispatch> {
    match device {
        #[cfg(feature = "cuda")]
        Device::Cuda => vec![ort::ep::CUDA::default().build(), XNNPACK::default().build()],
        // Without the cuda feature the probe never selects Cuda.
        _ => vec![XNNPACK::default().build()],
    }
}

fn dims(shape: &[usize]) -> Vec<i64> {
    shape.iter().map(|&d| d as i64).collect()
}

fn to_session_value(tensor: &InputTensor) -> Result<SessionInputValue<'static>> {
    let value = match tensor {
        InputTensor::Float32(arr) => {
            Tensor::from_array((dims(arr.shape()), arr.iter().copied().collect::<Vec<f32>>()))
                .map(Into::into)
        }
        InputTensor::Int64(arr) => {
            Tensor::from_array((dims(arr.shape()), arr.iter().copied().collect::<Vec<i64>>()))
                .map(Into::into)
        }
    };
    value.map_err(|e| InferenceError::InvalidInput(e.to_string()))
}

fn to_array<T: Clone>(shape: &[i64], data: &[T]) -> Result<ArrayD<T>> {
    let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
    ArrayD::from_shape_vec(IxDyn(&shape), data.to_vec())
        .map_err(|e| InferenceError::Run(format!("output does not fit its shape: {}", e)))
}

fn from_session_value(name: &str, value: &DynValue) -> Result<OutputTensor> {
    if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
        return to_array(shape, data).map(OutputTensor::Float32);
    }
    if let Ok((shape, data)) = value.try_extract_tensor::<i64>() {
        return to_array(shape, data).map(OutputTensor::Int64);
    }
    Err(InferenceError::UnsupportedOutput(name.to_string()))
}

impl InferenceBackend for OrtBackend {
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>> {
        if let Some((name, _)) = inputs.iter().find(|(name, _)| !self.accepts(name)) {
            return Err(InferenceError::InvalidInput(format!(
                "model has no input named '{}'",
                name
            )));
        }

        let session_inputs = inputs
            .iter()
            .map(|(name, tensor)| {
                trace!("Input '{}' shape {:?}", name, tensor.shape());
                Ok((*name, to_session_value(tensor)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut session = self.session.lock().map_err(|_| InferenceError::Poisoned)?;
        let outputs = session
            .run(session_inputs)
            .map_err(|e| InferenceError::Run(e.to_string()))?;

        let results = outputs
            .iter()
            .map(|(name, value)| Ok((name.to_string(), from_session_value(name, &value)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(results)
    }

    fn input_names(&self) -> &[String] {
        &self.input_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }
}
