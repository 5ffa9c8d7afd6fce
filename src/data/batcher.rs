// ============================================================
// Layer 4 — Stereo Batcher
// ============================================================
// Implements Burn's Batcher trait: converts a Vec<SbsSample>
// into one (batch, 3, H, 2*W/2) image tensor plus the target
// class indices.
//
// For every sample access in stochastic mode, ONE fresh seed is
// drawn and handed to both halves of the paired augmenter, so
// left and right always share the same transform decisions. The
// thread-local generator used for the draw is never shared
// across batcher calls on other threads.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use rand::Rng;

use crate::data::augment::{
    augment_half, concat_halves_chw, resize_half, split_sbs, to_normalized_chw, AugmentConfig,
};
use crate::data::dataset::SbsSample;

// ─── StereoBatch ──────────────────────────────────────────────────────────────
/// A batch of stereo samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct StereoBatch<B: Backend> {
    /// Normalized frames — shape: [batch, 3, half_height, 2*half_width]
    pub images: Tensor<B, 4>,

    /// Target class indices — shape: [batch]
    pub targets: Tensor<B, 1, Int>,
}

// ─── StereoBatcher ────────────────────────────────────────────────────────────
#[derive(Clone)]
pub struct StereoBatcher<B: Backend> {
    device: B::Device,
    cfg: AugmentConfig,
    /// Stochastic paired pipeline when true; deterministic resize
    /// when false (inference, reproducible predictions).
    augment: bool,
}

impl<B: Backend> StereoBatcher<B> {
    /// Batcher for training/validation: paired stochastic pipeline.
    pub fn stochastic(device: B::Device, cfg: AugmentConfig) -> Self {
        Self { device, cfg, augment: true }
    }

    /// Batcher for inference: deterministic resize only.
    pub fn deterministic(device: B::Device, cfg: AugmentConfig) -> Self {
        Self { device, cfg, augment: false }
    }

    /// Split, transform, normalize, and re-concatenate one frame.
    fn sample_data(&self, sample: &SbsSample) -> Vec<f32> {
        let (left, right) = split_sbs(&sample.image);
        let (left, right) = if self.augment {
            // The paired draw: one seed, two independent pipeline runs.
            let seed: u64 = rand::thread_rng().gen();
            (
                augment_half(&left, seed, &self.cfg),
                augment_half(&right, seed, &self.cfg),
            )
        } else {
            (resize_half(&left, &self.cfg), resize_half(&right, &self.cfg))
        };
        concat_halves_chw(
            &to_normalized_chw(&left),
            &to_normalized_chw(&right),
            self.cfg.half_height as usize,
            self.cfg.half_width as usize,
        )
    }
}

impl<B: Backend> Batcher<SbsSample, StereoBatch<B>> for StereoBatcher<B> {
    fn batch(&self, items: Vec<SbsSample>) -> StereoBatch<B> {
        let batch_size = items.len();
        let height = self.cfg.half_height as usize;
        let width = 2 * self.cfg.half_width as usize;

        let mut flat: Vec<f32> = Vec::with_capacity(batch_size * 3 * height * width);
        let mut targets: Vec<i32> = Vec::with_capacity(batch_size);
        for sample in &items {
            flat.extend(self.sample_data(sample));
            targets.push(sample.class_index as i32);
        }

        let images = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, 3, height, width]);
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device);

        StereoBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    type TestBackend = burn::backend::NdArray;

    fn test_sample(class_index: usize) -> SbsSample {
        SbsSample {
            stem: "t".to_string(),
            file_name: "t.png".to_string(),
            label: "ahg_oleg_cp".to_string(),
            class_index,
            image: RgbImage::from_pixel(8, 4, image::Rgb([40, 80, 120])),
        }
    }

    fn tiny_config() -> AugmentConfig {
        AugmentConfig {
            half_width: 2,
            half_height: 2,
            ..AugmentConfig::default()
        }
    }

    #[test]
    fn test_batch_shape_and_targets() {
        let device = Default::default();
        let batcher = StereoBatcher::<TestBackend>::deterministic(device, tiny_config());
        let batch = batcher.batch(vec![test_sample(2), test_sample(5)]);
        assert_eq!(batch.images.dims(), [2, 3, 2, 4]);
        let targets: Vec<i64> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![2, 5]);
    }

    #[test]
    fn test_deterministic_batcher_is_reproducible() {
        let device = Default::default();
        let batcher = StereoBatcher::<TestBackend>::deterministic(device, tiny_config());
        let a = batcher.batch(vec![test_sample(0)]);
        let b = batcher.batch(vec![test_sample(0)]);
        let da: Vec<f32> = a.images.into_data().to_vec().unwrap();
        let db: Vec<f32> = b.images.into_data().to_vec().unwrap();
        assert_eq!(da, db);
    }
}
