//! Backend selection for training and inference.
//!
//! The pipeline is CPU-sized (28x28 single-channel samples, per-image batches
//! of a handful of slices), so the default backend is NdArray. The `cuda`
//! feature switches to the CUDA backend for GPU execution.

use burn::backend::Autodiff;

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn_cuda::Cuda;

#[cfg(not(feature = "cuda"))]
pub type DefaultBackend = burn::backend::NdArray;

/// The autodiff backend used for training.
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Get the default device for the selected backend.
pub fn default_device() -> <DefaultBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}

/// Get a human-readable name for the compiled backend.
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }
    #[cfg(not(feature = "cuda"))]
    {
        "NdArray (CPU)"
    }
}
