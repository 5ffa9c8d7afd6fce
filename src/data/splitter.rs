// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles samples with a seeded generator and splits them into
// a training set and a validation set.
//
// The seed is a fixed constant by default: repeated runs over the
// same manifest must produce the SAME partition, so a session can
// be resumed or audited without re-deriving which images were
// held out.
//
// Split ratio: 80% training, 20% validation (configurable).
// Uses Fisher-Yates via rand::seq::SliceRandom.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Fixed constant used for every reproducible split.
pub const SPLIT_SEED: u64 = 42;

/// File names held out on each side of a split; persisted next to
/// the model artifact so a run's partition is auditable.
#[derive(Debug, Clone)]
pub struct SplitNames {
    pub train: Vec<String>,
    pub valid: Vec<String>,
}

/// Shuffle `samples` with a generator seeded by `seed` and split
/// into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - Shuffle seed; same seed, same partition
pub fn split_train_val<T>(
    mut samples: Vec<T>,
    train_fraction: f64,
    seed: u64,
) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    // split_off(n) removes elements [n..] and returns them
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}
