// ============================================================
// Layer 2 — Choose Use Case
// ============================================================
// Turns one SBS image into the parameter set for the external
// color-grading tool:
//
//   Step 1: Predict the HALD label    (Layer 5 - ml, via the
//                                      configured Predictor)
//   Step 2: Look up the gamma value   (Layer 3 - domain)
//   Step 3: Resolve the LUT file      (first match across the
//                                      candidate directories)
//   Step 4: Derive the output path
//
// The resulting ConversionRequest is where this crate's
// responsibility ends; executing the tool is the caller's job.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::error::ChooserError;
use crate::domain::hald::{choose_gamma, lut_file_name, ConversionRequest, IDENTITY_LABEL};
use crate::domain::traits::Predictor;
use crate::ml::inferencer::NetPredictor;
use crate::ml::tree::TreePredictor;

/// Which HALD-selection strategy to run. Chosen through
/// configuration — callers never inspect the concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictorKind {
    Net,
    Tree,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChooseConfig {
    pub predictor: PredictorKind,
    /// Weights file of a trained net (PredictorKind::Net).
    pub weights_path: Option<String>,
    /// Persisted decision tree (PredictorKind::Tree).
    pub tree_path: Option<String>,
    /// Histogram feature table (PredictorKind::Tree).
    pub histogram_csv: Option<String>,
    /// Candidate directories searched for LUT files, in order.
    pub lut_dirs: Vec<String>,
    /// Extension of the LUT files (e.g. "TIF").
    pub lut_ext: String,
    /// Directory the anaglyph output path is derived under.
    pub out_dir: String,
}

pub struct ChooseUseCase {
    config: ChooseConfig,
    predictor: Box<dyn Predictor>,
}

impl ChooseUseCase {
    /// Build the configured predictor. Loading happens here, once,
    /// so repeated choose() calls reuse the same model.
    pub fn new(config: ChooseConfig) -> Result<Self> {
        let predictor: Box<dyn Predictor> = match config.predictor {
            PredictorKind::Net => {
                let weights = config
                    .weights_path
                    .as_deref()
                    .context("the net predictor needs --weights")?;
                Box::new(NetPredictor::from_artifact(Path::new(weights))?)
            }
            PredictorKind::Tree => {
                let tree = config
                    .tree_path
                    .as_deref()
                    .context("the tree predictor needs --tree")?;
                let histograms = config
                    .histogram_csv
                    .as_deref()
                    .context("the tree predictor needs --histograms")?;
                Box::new(TreePredictor::load(Path::new(tree), Path::new(histograms))?)
            }
        };
        Ok(Self { config, predictor })
    }

    /// Choose the HALD for one SBS image and assemble the
    /// conversion parameters.
    pub fn choose(&self, sbs_path: &Path) -> Result<ConversionRequest> {
        let cfg = &self.config;

        // ── Step 1: Predict ───────────────────────────────────────────────────
        let label = self.predictor.predict_label(sbs_path)?;

        // ── Step 2: Gamma ─────────────────────────────────────────────────────
        let gamma = choose_gamma(&label);

        // ── Step 3: LUT file (identity needs none) ────────────────────────────
        let lut_path = if label == IDENTITY_LABEL {
            None
        } else {
            Some(find_lut_file(&label, &cfg.lut_dirs, &cfg.lut_ext)?)
        };

        // ── Step 4: Output path ───────────────────────────────────────────────
        let stem = sbs_path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("'{}' has no file stem", sbs_path.display()))?;
        let out_path = Path::new(&cfg.out_dir).join(format!("{stem}_{label}.jpg"));

        Ok(ConversionRequest {
            sbs_path: sbs_path.to_path_buf(),
            label,
            gamma,
            lut_path,
            out_path,
        })
    }
}

/// Search the candidate directories for the label's LUT file;
/// first match wins.
fn find_lut_file(
    label: &str,
    lut_dirs: &[String],
    lut_ext: &str,
) -> Result<PathBuf, ChooserError> {
    let file_name = lut_file_name(label, lut_ext);
    for dir in lut_dirs {
        let candidate = Path::new(dir).join(&file_name);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(ChooserError::LutNotFound {
        file_name,
        searched: lut_dirs.len(),
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_matching_lut_dir_wins() {
        let empty = tempdir().unwrap();
        let stocked = tempdir().unwrap();
        let lut_name = lut_file_name("ahg_oleg_gp", "TIF");
        std::fs::write(stocked.path().join(&lut_name), b"lut").unwrap();

        let dirs = vec![
            empty.path().to_string_lossy().into_owned(),
            stocked.path().to_string_lossy().into_owned(),
        ];
        let found = find_lut_file("ahg_oleg_gp", &dirs, "TIF").unwrap();
        assert_eq!(found, stocked.path().join(lut_name));
    }

    #[test]
    fn test_missing_lut_is_fatal_for_that_request() {
        let empty = tempdir().unwrap();
        let dirs = vec![empty.path().to_string_lossy().into_owned()];
        let err = find_lut_file("ahg_oleg_gp", &dirs, "TIF").unwrap_err();
        assert!(matches!(err, ChooserError::LutNotFound { searched: 1, .. }));
    }
}
