//! Execution device selection.

use std::fmt;

use tracing::debug;

/// Device an inference session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// General-purpose processor (XNNPACK-accelerated where available).
    Cpu,
    /// NVIDIA accelerator through the CUDA execution provider.
    Cuda,
}

impl Device {
    /// Probe the environment once for an accelerator.
    ///
    /// Returns `Device::Cuda` only when GPU use is allowed, the crate was
    /// built with the `cuda` feature and ONNX Runtime reports the provider
    /// as available. Everything else runs on the CPU.
    pub fn probe(allow_gpu: bool) -> Self {
        if !allow_gpu {
            debug!("GPU disabled by configuration, using CPU");
            return Device::Cpu;
        }

        if cuda_available() {
            debug!("CUDA execution provider available");
            Device::Cuda
        } else {
            debug!("No accelerator found, using CPU");
            Device::Cpu
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

#[cfg(feature = "cuda")]
fn cuda_available() -> bool {
    use ort::ep::ExecutionProvider;

    ort::ep::CUDA::default().is_available().unwrap_or(false)
}

#[cfg(not(feature = "cuda"))]
fn cuda_available() -> bool {
    false
}
