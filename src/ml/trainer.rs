// ============================================================
// Layer 5 — Training Session
// ============================================================
// The iterative optimization loop with per-epoch accuracy
// bookkeeping and the two-tier early-stopping policy.
//
// Backend split (Burn idiom):
//   - Training runs on Autodiff<Wgpu> for gradients
//   - model.valid() strips autodiff for the validation pass
//
// Session state (epoch counter, validation-accuracy history) is
// created here and discarded with the returned summary — it is
// never part of the saved artifact.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::augment::AugmentConfig;
use crate::data::batcher::StereoBatcher;
use crate::data::dataset::SbsDataset;
use crate::data::splitter::SplitNames;
use crate::domain::label_codec::LabelCodec;
use crate::infra::artifact::{ArtifactManager, ArtifactPair};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{HaldNet, HaldNetConfig};
use crate::ml::policy::EpochDecision;

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
type ValidBackend = burn::backend::Wgpu;

/// How a training session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainOutcome {
    /// Validation accuracy reached the sufficient threshold; the
    /// artifact was persisted if an output directory was configured.
    StoppedSufficient { epoch: usize, val_accuracy: f64 },
    /// Accuracy plateaued near the ceiling; nothing was saved.
    StoppedStagnant { epoch: usize, val_accuracy: f64 },
    /// The epoch budget ran out.
    Exhausted,
}

#[derive(Debug)]
pub struct TrainSummary {
    pub outcome: TrainOutcome,
    /// Average loss per batch of the last completed epoch.
    pub avg_loss_per_batch: f64,
    /// One validation-accuracy entry (percent) per completed epoch.
    pub history: Vec<f64>,
    /// The persisted artifact, when the session saved one.
    pub artifact: Option<ArtifactPair>,
}

pub fn run_training(
    cfg: &TrainConfig,
    train_dataset: SbsDataset,
    val_dataset: SbsDataset,
    codec: &LabelCodec,
    split: &SplitNames,
    artifacts: Option<&ArtifactManager>,
) -> Result<TrainSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = HaldNetConfig::new(codec.len()).with_base_channels(cfg.base_channels);
    let mut model: HaldNet<TrainBackend> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} classes, base_channels={}",
        codec.len(),
        cfg.base_channels
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new()
        .with_epsilon(1e-8)
        .with_weight_decay(Some(WeightDecayConfig::new(1e-4)));
    let mut optim = optim_cfg.init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    // Both sides use the paired stochastic pipeline; only true
    // inference switches to the deterministic variant.
    let augment_cfg = AugmentConfig {
        half_width: cfg.half_width,
        half_height: cfg.half_height,
        ..AugmentConfig::default()
    };
    let train_batcher =
        StereoBatcher::<TrainBackend>::stochastic(device.clone(), augment_cfg.clone());
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.shuffle_seed)
        .num_workers(1)
        .build(train_dataset);

    let val_batcher =
        StereoBatcher::<ValidBackend>::stochastic(device.clone(), augment_cfg.clone());
    let val_loader = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let metrics = match artifacts {
        Some(manager) => Some(MetricsLogger::new(manager.out_dir())?),
        None => None,
    };

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut history: Vec<f64> = Vec::with_capacity(cfg.epochs);
    let mut last_avg_loss = f64::NAN;

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut batches = 0usize;
        let mut correct = 0usize;
        let mut total = 0usize;

        for batch in train_loader.iter() {
            let targets = batch.targets.clone();
            let (loss, logits) = model.forward_loss(batch.images, batch.targets);

            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches += 1;

            // argmax(1) returns [batch,1] — squeeze before .equal()
            let predicted = logits.argmax(1).flatten::<1>(0, 1);
            total += targets.dims()[0];
            correct += predicted
                .equal(targets)
                .int()
                .sum()
                .into_scalar()
                .elem::<i64>() as usize;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
        let train_accuracy = if total > 0 { 100.0 * correct as f64 / total as f64 } else { 0.0 };
        last_avg_loss = avg_train_loss;

        // ── Validation phase (no parameter updates) ───────────────────────────
        let val_accuracy = validate(&model.valid(), &val_loader);

        println!(
            "Epoch {:>3}/{} | loss={:.4} | train_acc={:.2}% | val_acc={:.2}%",
            epoch, cfg.epochs, avg_train_loss, train_accuracy, val_accuracy,
        );
        if let Some(logger) = &metrics {
            logger.log(&EpochMetrics {
                epoch,
                train_loss: avg_train_loss,
                train_acc: train_accuracy,
                val_acc: val_accuracy,
            })?;
        }

        // ── Early-stopping assessment ─────────────────────────────────────────
        history.push(val_accuracy);
        match cfg.policy.assess(&history) {
            EpochDecision::StopSufficient => {
                tracing::info!(
                    "Epoch {}/{}: stopping early, validation accuracy {:.2}% is sufficient",
                    epoch,
                    cfg.epochs,
                    val_accuracy
                );
                let artifact = match artifacts {
                    Some(manager) => Some(manager.save(&model, &model_cfg, codec, split)?),
                    None => None,
                };
                return Ok(TrainSummary {
                    outcome: TrainOutcome::StoppedSufficient { epoch, val_accuracy },
                    avg_loss_per_batch: avg_train_loss,
                    history,
                    artifact,
                });
            }
            EpochDecision::StopStagnant => {
                tracing::warn!(
                    "Epoch {}/{}: aborting, validation accuracy no longer grows",
                    epoch,
                    cfg.epochs
                );
                return Ok(TrainSummary {
                    outcome: TrainOutcome::StoppedStagnant { epoch, val_accuracy },
                    avg_loss_per_batch: avg_train_loss,
                    history,
                    artifact: None,
                });
            }
            EpochDecision::Continue => {}
        }
    }

    tracing::info!("Epoch budget consumed; no accuracy threshold reached");
    Ok(TrainSummary {
        outcome: TrainOutcome::Exhausted,
        avg_loss_per_batch: last_avg_loss,
        history,
        artifact: None,
    })
}

/// One full pass over the validation loader; returns accuracy in
/// percent.
fn validate(
    model: &HaldNet<ValidBackend>,
    val_loader: &std::sync::Arc<dyn burn::data::dataloader::DataLoader<crate::data::batcher::StereoBatch<ValidBackend>>>,
) -> f64 {
    let mut correct = 0usize;
    let mut total = 0usize;
    for batch in val_loader.iter() {
        let logits = model.forward(batch.images);
        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        total += batch.targets.dims()[0];
        correct += predicted
            .equal(batch.targets)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>() as usize;
    }
    if total > 0 {
        100.0 * correct as f64 / total as f64
    } else {
        0.0
    }
}
