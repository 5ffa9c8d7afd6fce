// ============================================================
// Layer 5 — HALD Chooser Model
// ============================================================
// A compact residual CNN over the re-concatenated stereo pair:
//
//   conv stem (7x7, stride 2) + max-pool
//     │
//   3 residual stages (the 2nd and 3rd halve the resolution
//   and double the channels)
//     │
//   adaptive average pool → linear head over num_classes
//
// The classifier head width is fixed by the label codec built
// from the training manifest, which is why the architecture
// config is persisted alongside the weights (infra::artifact) —
// inference must rebuild exactly this shape before loading.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

#[derive(Config, Debug)]
pub struct HaldNetConfig {
    /// Size of the label vocabulary — the classifier head width.
    pub num_classes: usize,
    /// Channels out of the stem; each downsampling stage doubles this.
    #[config(default = 32)]
    pub base_channels: usize,
}

impl HaldNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> HaldNet<B> {
        let c = self.base_channels;
        let stem_conv = Conv2dConfig::new([3, c], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);
        let stem_norm = BatchNormConfig::new(c).init(device);
        let stem_pool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let stage1 = self.build_block(c, c, 1, device);
        let stage2 = self.build_block(c, 2 * c, 2, device);
        let stage3 = self.build_block(2 * c, 4 * c, 2, device);

        let pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let head = LinearConfig::new(4 * c, self.num_classes).init(device);

        HaldNet {
            stem_conv,
            stem_norm,
            stem_pool,
            stage1,
            stage2,
            stage3,
            pool,
            head,
            activation: Relu::new(),
        }
    }

    fn build_block<B: Backend>(
        &self,
        channels_in: usize,
        channels_out: usize,
        stride: usize,
        device: &B::Device,
    ) -> ResidualBlock<B> {
        let conv1 = Conv2dConfig::new([channels_in, channels_out], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let norm1 = BatchNormConfig::new(channels_out).init(device);
        let conv2 = Conv2dConfig::new([channels_out, channels_out], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let norm2 = BatchNormConfig::new(channels_out).init(device);

        // The shortcut needs a 1x1 projection whenever the block
        // changes resolution or width.
        let (shortcut, shortcut_norm) = if stride != 1 || channels_in != channels_out {
            let conv = Conv2dConfig::new([channels_in, channels_out], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device);
            let norm = BatchNormConfig::new(channels_out).init(device);
            (Some(conv), Some(norm))
        } else {
            (None, None)
        };

        ResidualBlock {
            conv1,
            norm1,
            conv2,
            norm2,
            shortcut,
            shortcut_norm,
            activation: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    norm2: BatchNorm<B, 2>,
    shortcut: Option<Conv2d<B>>,
    shortcut_norm: Option<BatchNorm<B, 2>>,
    activation: Relu,
}

impl<B: Backend> ResidualBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.activation.forward(self.norm1.forward(self.conv1.forward(x.clone())));
        let out = self.norm2.forward(self.conv2.forward(out));
        let identity = match (&self.shortcut, &self.shortcut_norm) {
            (Some(conv), Some(norm)) => norm.forward(conv.forward(x)),
            _ => x,
        };
        self.activation.forward(out + identity)
    }
}

#[derive(Module, Debug)]
pub struct HaldNet<B: Backend> {
    stem_conv: Conv2d<B>,
    stem_norm: BatchNorm<B, 2>,
    stem_pool: MaxPool2d,
    stage1: ResidualBlock<B>,
    stage2: ResidualBlock<B>,
    stage3: ResidualBlock<B>,
    pool: AdaptiveAvgPool2d,
    head: Linear<B>,
    activation: Relu,
}

impl<B: Backend> HaldNet<B> {
    /// images: [batch, 3, h, w] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.stem_norm.forward(self.stem_conv.forward(images)));
        let x = self.stem_pool.forward(x);
        let x = self.stage1.forward(x);
        let x = self.stage2.forward(x);
        let x = self.stage3.forward(x);
        let x = self.pool.forward(x); // [batch, 4c, 1, 1]
        let x = x.flatten::<2>(1, 3); // [batch, 4c]
        self.head.forward(x)
    }

    /// Cross-entropy loss plus the raw logits, for the training loop.
    pub fn forward_loss(
        &self,
        images: Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(images);
        let loss = burn::nn::loss::CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_forward_logit_shape() {
        let device = Default::default();
        let model: HaldNet<TestBackend> = HaldNetConfig::new(7)
            .with_base_channels(8)
            .init(&device);
        let images = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 64], &device);
        let logits = model.forward(images);
        assert_eq!(logits.dims(), [2, 7]);
    }
}
