// ============================================================
// Layer 5 — Net Predictor (Inference)
// ============================================================
// Loads a weights/codec artifact pair and predicts the HALD
// label for one SBS image: deterministic paired transform, one
// forward pass, arg-max, decode through the codec that was
// trained with these exact weights.

use std::path::Path;

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::data::augment::{
    concat_halves_chw, resize_half, split_sbs, to_normalized_chw, AugmentConfig,
};
use crate::data::dataset::load_rgb;
use crate::domain::label_codec::LabelCodec;
use crate::domain::traits::Predictor;
use crate::infra::artifact::ArtifactManager;
use crate::ml::model::HaldNet;

type InferBackend = burn::backend::Wgpu;

pub struct NetPredictor {
    model: HaldNet<InferBackend>,
    codec: LabelCodec,
    augment_cfg: AugmentConfig,
    device: burn::backend::wgpu::WgpuDevice,
}

impl NetPredictor {
    /// Load the model and its co-versioned codec from a weights
    /// path. The codec file is resolved through the artifact
    /// naming convention; a weights file without its matching
    /// codec is rejected, never guessed around.
    pub fn from_artifact(weights_path: &Path) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let (model, _model_cfg, codec) =
            ArtifactManager::load::<InferBackend>(weights_path, &device).with_context(|| {
                format!("cannot load artifact pair from '{}'", weights_path.display())
            })?;
        tracing::info!(
            "Model loaded from '{}' with {} labels",
            weights_path.display(),
            codec.len()
        );
        Ok(Self {
            model,
            codec,
            augment_cfg: AugmentConfig::default(),
            device,
        })
    }

    /// Predict the HALD label for one SBS image.
    pub fn predict(&self, image_path: &Path) -> Result<String> {
        let image = load_rgb(image_path)?;

        // Deterministic variant of the paired transform: no
        // stochastic steps, so the prediction is reproducible.
        let (left, right) = split_sbs(&image);
        let data = concat_halves_chw(
            &to_normalized_chw(&resize_half(&left, &self.augment_cfg)),
            &to_normalized_chw(&resize_half(&right, &self.augment_cfg)),
            self.augment_cfg.half_height as usize,
            self.augment_cfg.half_width as usize,
        );

        let input = Tensor::<InferBackend, 1>::from_floats(data.as_slice(), &self.device)
            .reshape([
                1,
                3,
                self.augment_cfg.half_height as usize,
                2 * self.augment_cfg.half_width as usize,
            ]);

        let logits = self.model.forward(input);
        let predicted: i64 = logits.argmax(1).flatten::<1>(0, 1).into_scalar().elem();

        // Decoding can only miss when weights and codec are not the
        // pair they claim to be — a consistency check, not a normal
        // branch.
        let label = self.codec.decode(predicted as usize)?;
        tracing::info!(
            "Predicted HALD for '{}' is '{}' (code: {})",
            image_path.display(),
            label,
            predicted
        );
        Ok(label.to_string())
    }
}

impl Predictor for NetPredictor {
    fn predict_label(&self, image_path: &Path) -> Result<String> {
        self.predict(image_path)
    }
}
