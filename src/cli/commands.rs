// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `correlate`, `train`, and
// `choose`, and all their configurable flags. The From impls at
// the bottom are the boundary between Layer 1 and Layer 2 — the
// application layer never sees clap types.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::choose_use_case::{ChooseConfig, PredictorKind};
use crate::application::correlate_use_case::CorrelateConfig;
use crate::application::train_use_case::TrainConfig;
use crate::data::augment::{SBS_HEIGHT, SBS_WIDTH};
use crate::data::splitter::SPLIT_SEED;
use crate::ml::policy::StopPolicy;

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild a labeled manifest from a directory of finished anaglyphs
    Correlate(CorrelateArgs),

    /// Train the HALD chooser on a labeled manifest
    Train(TrainArgs),

    /// Predict the HALD for one SBS image and print the conversion parameters
    Choose(ChooseArgs),
}

#[derive(Args, Debug)]
pub struct CorrelateArgs {
    /// Directory containing the hand-finished anaglyph images
    #[arg(long)]
    pub ana_dir: String,

    /// Manifest CSV to write
    #[arg(long, default_value = "sbs_to_hald.csv")]
    pub out_manifest: String,

    /// SBS source directory to cross-check coverage against
    #[arg(long)]
    pub sbs_dir: Option<String>,

    /// Prefix every HALD label token starts with
    #[arg(long, default_value = "ahg_")]
    pub label_prefix: String,

    /// Label assumed for finished images without a label token
    #[arg(long, default_value = "ahg_oleg_id")]
    pub identity_label: String,
}

impl From<CorrelateArgs> for CorrelateConfig {
    fn from(a: CorrelateArgs) -> Self {
        CorrelateConfig {
            ana_dir: a.ana_dir,
            out_manifest: a.out_manifest,
            sbs_dir: a.sbs_dir,
            label_prefix: a.label_prefix,
            identity_label: a.identity_label,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Manifest CSV listing (stem, label) pairs
    #[arg(long, default_value = "sbs_to_hald.csv")]
    pub manifest: String,

    /// Directory containing the SBS source images
    #[arg(long)]
    pub sbs_dir: String,

    /// Extension shared by every SBS image
    #[arg(long, default_value = "TIF")]
    pub sbs_ext: String,

    /// Directory to save the artifact pair; omit to train without saving
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Number of samples per forward/backward pass
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Channels out of the model's stem convolution
    #[arg(long, default_value_t = 32)]
    pub base_channels: usize,

    /// Width each SBS half is resized to
    #[arg(long, default_value_t = SBS_WIDTH / 2)]
    pub half_width: u32,

    /// Height each SBS half is resized to
    #[arg(long, default_value_t = SBS_HEIGHT)]
    pub half_height: u32,

    /// Proportion of samples used for training
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Seed of the reproducible train/validation partition
    #[arg(long, default_value_t = SPLIT_SEED)]
    pub split_seed: u64,

    /// Skip (and count) undecodable images instead of aborting
    #[arg(long, default_value_t = false)]
    pub skip_undecodable: bool,

    /// Validation accuracy (percent) that stops training and saves
    #[arg(long, default_value_t = 96.5)]
    pub sufficient_accuracy: f64,

    /// Validation accuracy (percent) above which a plateau aborts
    #[arg(long, default_value_t = 99.0)]
    pub stagnation_accuracy: f64,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            manifest_path: a.manifest,
            sbs_dir: a.sbs_dir,
            sbs_ext: a.sbs_ext,
            out_dir: a.out_dir,
            epochs: a.epochs,
            batch_size: a.batch_size,
            lr: a.lr,
            base_channels: a.base_channels,
            half_width: a.half_width,
            half_height: a.half_height,
            train_fraction: a.train_fraction,
            split_seed: a.split_seed,
            shuffle_seed: 42,
            skip_undecodable: a.skip_undecodable,
            policy: StopPolicy {
                sufficient_accuracy: a.sufficient_accuracy,
                stagnation_accuracy: a.stagnation_accuracy,
                ..StopPolicy::default()
            },
        }
    }
}

/// Which HALD-selection strategy `choose` runs.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PredictorArg {
    /// Trained CNN over the stereo pair
    Net,
    /// Persisted decision tree over histogram features
    Tree,
}

/// All arguments for the `choose` command
#[derive(Args, Debug)]
pub struct ChooseArgs {
    /// The SBS image to choose a HALD for
    pub sbs_path: String,

    /// HALD-selection strategy
    #[arg(long, value_enum, default_value = "net")]
    pub predictor: PredictorArg,

    /// Weights file of a trained net (predictor = net)
    #[arg(long)]
    pub weights: Option<String>,

    /// Persisted decision tree JSON (predictor = tree)
    #[arg(long)]
    pub tree: Option<String>,

    /// Histogram feature table CSV (predictor = tree)
    #[arg(long)]
    pub histograms: Option<String>,

    /// Candidate directory searched for LUT files (repeatable, in order)
    #[arg(long = "lut-dir")]
    pub lut_dirs: Vec<String>,

    /// Extension of the LUT files
    #[arg(long, default_value = "TIF")]
    pub lut_ext: String,

    /// Directory the anaglyph output path is derived under
    #[arg(long, default_value = "TMP")]
    pub out_dir: String,
}

impl From<&ChooseArgs> for ChooseConfig {
    fn from(a: &ChooseArgs) -> Self {
        ChooseConfig {
            predictor: match a.predictor {
                PredictorArg::Net => PredictorKind::Net,
                PredictorArg::Tree => PredictorKind::Tree,
            },
            weights_path: a.weights.clone(),
            tree_path: a.tree.clone(),
            histogram_csv: a.histograms.clone(),
            lut_dirs: a.lut_dirs.clone(),
            lut_ext: a.lut_ext.clone(),
            out_dir: a.out_dir.clone(),
        }
    }
}
