//! CNN architecture for digit classification
//!
//! A small convolutional network over 28x28 single-channel inputs:
//! two valid-padding convolution stages with 2x2 max pooling, a hidden dense
//! layer, and a 10-way output head. Small enough for CPU training at a few
//! samples per incremental step.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Linear, LinearConfig, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Configuration for the digit classifier CNN
#[derive(Config, Debug)]
pub struct DigitClassifierConfig {
    /// Number of output classes
    #[config(default = "10")]
    pub num_classes: usize,

    /// Input sample side length (assumes square samples)
    #[config(default = "28")]
    pub input_size: usize,

    /// Number of input channels (1 for grayscale)
    #[config(default = "1")]
    pub in_channels: usize,

    /// Filters in the first convolution stage (doubled in the second)
    #[config(default = "32")]
    pub base_filters: usize,

    /// Units in the hidden dense layer
    #[config(default = "128")]
    pub hidden_units: usize,
}

impl DigitClassifierConfig {
    /// Feature count after both conv+pool stages, for the first dense layer.
    ///
    /// Each stage is a 3x3 valid-padding convolution (side - 2) followed by a
    /// 2x2 max pool (side / 2).
    pub fn flattened_features(&self) -> usize {
        let after_stage1 = (self.input_size - 2) / 2;
        let after_stage2 = (after_stage1 - 2) / 2;
        self.base_filters * 2 * after_stage2 * after_stage2
    }
}

/// Digit classifier CNN
///
/// Architecture:
/// - Conv 3x3 (base filters) -> ReLU -> MaxPool 2x2
/// - Conv 3x3 (2x base filters) -> ReLU -> MaxPool 2x2
/// - Flatten -> Dense (hidden units) -> ReLU -> Dense (classes)
#[derive(Module, Debug)]
pub struct DigitClassifier<B: Backend> {
    conv1: Conv2d<B>,
    pool1: MaxPool2d,
    conv2: Conv2d<B>,
    pool2: MaxPool2d,
    fc1: Linear<B>,
    fc2: Linear<B>,
    relu: Relu,

    num_classes: usize,
}

impl<B: Backend> DigitClassifier<B> {
    /// Create a new classifier from configuration
    pub fn new(config: &DigitClassifierConfig, device: &B::Device) -> Self {
        let conv1 =
            Conv2dConfig::new([config.in_channels, config.base_filters], [3, 3]).init(device);
        let pool1 = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        let conv2 =
            Conv2dConfig::new([config.base_filters, config.base_filters * 2], [3, 3]).init(device);
        let pool2 = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        let fc1 = LinearConfig::new(config.flattened_features(), config.hidden_units).init(device);
        let fc2 = LinearConfig::new(config.hidden_units, config.num_classes).init(device);

        Self {
            conv1,
            pool1,
            conv2,
            pool2,
            fc1,
            fc2,
            relu: Relu::new(),
            num_classes: config.num_classes,
        }
    }

    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 1, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool1.forward(self.relu.forward(self.conv1.forward(x)));
        let x = self.pool2.forward(self.relu.forward(self.conv2.forward(x)));

        // Flatten: [B, C, H, W] -> [B, C*H*W]
        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        let x = self.relu.forward(self.fc1.forward(x));
        self.fc2.forward(x)
    }

    /// Forward pass with softmax for inference
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_flattened_features() {
        // 28 -> 26 -> 13 -> 11 -> 5; 64 filters * 5 * 5
        let config = DigitClassifierConfig::new();
        assert_eq!(config.flattened_features(), 1600);
    }

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let config = DigitClassifierConfig::new();
        let model = DigitClassifier::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 1, 28, 28], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 10]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let device = Default::default();
        let config = DigitClassifierConfig::new();
        let model = DigitClassifier::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 1, 28, 28], &device);
        let probs: Vec<f32> = model.forward_softmax(input).into_data().to_vec().unwrap();

        assert_eq!(probs.len(), 10);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(probs.iter().all(|&p| p >= 0.0));
    }
}
