//! Batch assembly for Burn
//!
//! Builds per-image training batches from preprocessed slice samples. The
//! batch is the atomic unit of one incremental training step: all labeled
//! slices of one source image, never more.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

use super::sample::SliceSample;
use crate::SAMPLE_SIZE;

/// A batch of slice samples for one training step
#[derive(Clone, Debug)]
pub struct SliceBatch<B: Backend> {
    /// Images with shape `[batch_size, 1, 28, 28]`
    pub images: Tensor<B, 4>,
    /// Labels with shape `[batch_size]`
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher for slice samples
#[derive(Clone, Debug)]
pub struct SliceBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> SliceBatcher<B> {
    /// Create a new batcher for the given device
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SliceSample, SliceBatch<B>> for SliceBatcher<B> {
    fn batch(&self, items: Vec<SliceSample>) -> SliceBatch<B> {
        let batch_size = items.len();

        let buffers: Vec<Vec<f32>> = items.iter().map(|item| item.image.clone()).collect();
        let images = stack_slices::<B>(&buffers, &self.device);

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets_data, [batch_size]),
            &self.device,
        );

        SliceBatch { images, targets }
    }
}

/// Stack normalized slice buffers into a `[n, 1, 28, 28]` tensor.
///
/// Shared by the training batcher and the inference path so both feed the
/// classifier the same layout.
pub fn stack_slices<B: Backend>(buffers: &[Vec<f32>], device: &B::Device) -> Tensor<B, 4> {
    let batch_size = buffers.len();
    let data: Vec<f32> = buffers.iter().flatten().copied().collect();

    Tensor::<B, 4>::from_floats(
        TensorData::new(data, [batch_size, 1, SAMPLE_SIZE, SAMPLE_SIZE]),
        device,
    )
}
