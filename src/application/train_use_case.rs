// ============================================================
// Layer 2 — Train Use Case
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Read the manifest               (Layer 4 - data)
//   Step 2: Build the label codec           (Layer 3 - domain)
//   Step 3: List samples (decode + encode)  (Layer 4 - data)
//   Step 4: Seeded train/validation split   (Layer 4 - data)
//   Step 5: Build datasets                  (Layer 4 - data)
//   Step 6: Run the training session        (Layer 5 - ml)
//
// Persistence (artifact pair, metrics) happens inside the
// session, through the artifact manager, and only when an output
// directory is configured.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::augment::{SBS_HEIGHT, SBS_WIDTH};
use crate::data::dataset::SbsDataset;
use crate::data::manifest::read_manifest;
use crate::data::splitter::{split_train_val, SplitNames, SPLIT_SEED};
use crate::domain::label_codec::LabelCodec;
use crate::infra::artifact::ArtifactManager;
use crate::ml::policy::StopPolicy;
use crate::ml::trainer::{run_training, TrainSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// All knobs of a training run. Serializable so a run's exact
// configuration can be kept next to its artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub manifest_path: String,
    pub sbs_dir: String,
    /// Extension shared by every SBS image (e.g. "TIF").
    pub sbs_ext: String,
    /// Artifact output directory; `None` disables persistence.
    pub out_dir: Option<String>,
    pub epochs: usize,
    pub batch_size: usize,
    pub lr: f64,
    pub base_channels: usize,
    /// Geometry each half is resized to.
    pub half_width: u32,
    pub half_height: u32,
    /// Proportion of samples used for training, e.g. 0.8 = 80%.
    pub train_fraction: f64,
    /// Seed of the reproducible train/validation partition.
    pub split_seed: u64,
    /// Seed of the per-epoch batch shuffling.
    pub shuffle_seed: u64,
    /// Skip (and count) undecodable images instead of aborting.
    pub skip_undecodable: bool,
    pub policy: StopPolicy,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            manifest_path: "sbs_to_hald.csv".to_string(),
            sbs_dir: "ALL_SBS_1080".to_string(),
            sbs_ext: "TIF".to_string(),
            out_dir: Some("MODELS".to_string()),
            epochs: 20,
            batch_size: 32,
            lr: 1e-4,
            base_channels: 32,
            half_width: SBS_WIDTH / 2,
            half_height: SBS_HEIGHT,
            train_fraction: 0.8,
            split_seed: SPLIT_SEED,
            shuffle_seed: 42,
            skip_undecodable: false,
            policy: StopPolicy::default(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;

        // ── Step 1: Read the manifest ─────────────────────────────────────────
        tracing::info!("Reading manifest '{}'", cfg.manifest_path);
        let entries = read_manifest(Path::new(&cfg.manifest_path))?;
        if entries.is_empty() {
            bail!("manifest '{}' lists no samples", cfg.manifest_path);
        }
        tracing::info!("Manifest lists {} sample(s)", entries.len());

        // ── Step 2: Build the label codec ─────────────────────────────────────
        // Built once from the manifest's label column; persisted
        // with the weights at save time.
        let codec = LabelCodec::from_labels(entries.iter().map(|e| e.label.as_str()));
        tracing::info!("Label codec covers {} HALD label(s)", codec.len());

        // ── Step 3: List samples (decode images, encode labels) ───────────────
        let (dataset, skipped) = SbsDataset::from_entries(
            &entries,
            Path::new(&cfg.sbs_dir),
            &cfg.sbs_ext,
            &codec,
            cfg.skip_undecodable,
        )?;
        if skipped > 0 {
            tracing::warn!("{} sample(s) skipped as undecodable", skipped);
        }
        if dataset.sample_count() == 0 {
            bail!("no decodable samples under '{}'", cfg.sbs_dir);
        }

        // ── Step 4: Seeded train/validation split ─────────────────────────────
        // Same manifest + same seed = same partition, so a session
        // can be audited without re-deriving the held-out set.
        let (train_samples, val_samples) =
            split_train_val(dataset.into_samples(), cfg.train_fraction, cfg.split_seed);
        let split = SplitNames {
            train: train_samples.iter().map(|s| s.file_name.clone()).collect(),
            valid: val_samples.iter().map(|s| s.file_name.clone()).collect(),
        };
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 5: Build Burn datasets ───────────────────────────────────────
        let train_dataset = SbsDataset::new(train_samples);
        let val_dataset = SbsDataset::new(val_samples);

        // ── Step 6: Run the training session ──────────────────────────────────
        let manager = cfg.out_dir.as_ref().map(ArtifactManager::new);
        run_training(
            cfg,
            train_dataset,
            val_dataset,
            &codec,
            &split,
            manager.as_ref(),
        )
    }
}
