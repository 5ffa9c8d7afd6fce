// ============================================================
// Layer 6 — Model Artifact Manager
// ============================================================
// A trained model is TWO files that only make sense together:
// the weights blob and the label codec that maps class indices
// back to HALD labels. One timestamp token, generated at save
// time, is embedded in both names and is the only link between
// them:
//
//   <out_dir>/
//     hald_chooser_params__<token>.mpk       ← weights (CompactRecorder)
//     hald_chooser_codes__<token>.csv        ← codec table
//     hald_chooser_config__<token>.json      ← architecture config
//     hald_chooser_train_imgs__<token>.txt   ← split membership
//     hald_chooser_valid_imgs__<token>.txt   ← split membership
//
// Loading parses the weights filename into a structured record
// (prefix, segment, token, extension) and rebuilds the companion
// names from it — an exact, invertible derivation. Anything that
// does not parse, or whose companion is missing, is rejected
// with ArtifactNamingMismatch; a model without its codec must
// never run.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use chrono::Local;

use crate::data::splitter::SplitNames;
use crate::domain::error::ChooserError;
use crate::domain::label_codec::LabelCodec;
use crate::ml::model::{HaldNet, HaldNetConfig};

pub const ARTIFACT_PREFIX: &str = "hald_chooser";
const PARAMS_MARKER: &str = "_params__";
const WEIGHTS_EXT: &str = "mpk";
const TOKEN_FORMAT: &str = "%Y%m%d-%H%M%S";

// ─── ArtifactPair ─────────────────────────────────────────────────────────────
/// The structured record behind the naming convention. The token
/// is carried explicitly so companion paths are derived from the
/// record, never by ad-hoc string substitution on full paths.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPair {
    pub token: String,
    pub weights_path: PathBuf,
    pub codec_path: PathBuf,
    pub config_path: PathBuf,
    pub train_names_path: PathBuf,
    pub valid_names_path: PathBuf,
}

impl ArtifactPair {
    /// Build every artifact path for one token.
    pub fn with_token(out_dir: &Path, token: &str) -> Self {
        let name = |segment: &str, ext: &str| {
            out_dir.join(format!("{ARTIFACT_PREFIX}_{segment}__{token}.{ext}"))
        };
        Self {
            token: token.to_string(),
            weights_path: name("params", WEIGHTS_EXT),
            codec_path: name("codes", "csv"),
            config_path: name("config", "json"),
            train_names_path: name("train_imgs", "txt"),
            valid_names_path: name("valid_imgs", "txt"),
        }
    }

    /// Parse a weights path back into the structured record.
    ///
    /// The file name must be exactly
    /// `<prefix>_params__<YYYYMMDD-HHMMSS>.mpk`; anything else is
    /// an ArtifactNamingMismatch.
    pub fn from_weights_path(weights_path: &Path) -> Result<Self, ChooserError> {
        let mismatch = |reason: &str| ChooserError::ArtifactNamingMismatch {
            path: weights_path.to_path_buf(),
            reason: reason.to_string(),
        };

        let file_name = weights_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| mismatch("path has no file name"))?;
        let stem = file_name
            .strip_suffix(&format!(".{WEIGHTS_EXT}"))
            .ok_or_else(|| mismatch("weights file must end in '.mpk'"))?;
        let at = stem
            .rfind(PARAMS_MARKER)
            .ok_or_else(|| mismatch("missing '_params__' segment"))?;
        let prefix = &stem[..at];
        let token = &stem[at + PARAMS_MARKER.len()..];

        if prefix != ARTIFACT_PREFIX {
            return Err(mismatch("unexpected artifact prefix"));
        }
        if !is_valid_token(token) {
            return Err(mismatch("timestamp token must look like 20250814-231159"));
        }

        let out_dir = weights_path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self::with_token(out_dir, token))
    }
}

fn is_valid_token(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 15
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'-'
        && bytes[9..].iter().all(u8::is_ascii_digit)
}

// ─── ArtifactManager ──────────────────────────────────────────────────────────
pub struct ArtifactManager {
    out_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Persist weights, codec, architecture config, and the split
    /// membership lists under one freshly generated token.
    pub fn save<B: Backend>(
        &self,
        model: &HaldNet<B>,
        model_cfg: &HaldNetConfig,
        codec: &LabelCodec,
        split: &SplitNames,
    ) -> Result<ArtifactPair> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("cannot create '{}'", self.out_dir.display()))?;

        let token = Local::now().format(TOKEN_FORMAT).to_string();
        let pair = ArtifactPair::with_token(&self.out_dir, &token);

        // The recorder appends its own '.mpk' extension.
        CompactRecorder::new()
            .record(model.clone().into_record(), pair.weights_path.with_extension(""))
            .with_context(|| {
                format!("failed to save weights to '{}'", pair.weights_path.display())
            })?;
        tracing::info!("Saved model weights in '{}'", pair.weights_path.display());

        write_codec_table(&pair.codec_path, codec)?;
        tracing::info!("Saved label codes in '{}'", pair.codec_path.display());

        let config_json = serde_json::to_string_pretty(model_cfg)?;
        fs::write(&pair.config_path, config_json)
            .with_context(|| format!("cannot write '{}'", pair.config_path.display()))?;

        write_name_list(&pair.train_names_path, &split.train)?;
        write_name_list(&pair.valid_names_path, &split.valid)?;

        Ok(pair)
    }

    /// Load a weights file together with its companions. The codec
    /// and config paths are derived from the weights name; missing
    /// companions abort the load.
    pub fn load<B: Backend>(
        weights_path: &Path,
        device: &B::Device,
    ) -> Result<(HaldNet<B>, HaldNetConfig, LabelCodec)> {
        let pair = ArtifactPair::from_weights_path(weights_path)?;

        let require = |companion: &Path| -> Result<(), ChooserError> {
            if companion.exists() {
                Ok(())
            } else {
                Err(ChooserError::ArtifactNamingMismatch {
                    path: weights_path.to_path_buf(),
                    reason: format!("companion file '{}' does not exist", companion.display()),
                })
            }
        };
        require(&pair.codec_path)?;
        require(&pair.config_path)?;

        let codec = read_codec_table(&pair.codec_path)?;

        let config_json = fs::read_to_string(&pair.config_path)
            .with_context(|| format!("cannot read '{}'", pair.config_path.display()))?;
        let model_cfg: HaldNetConfig = serde_json::from_str(&config_json)
            .with_context(|| format!("malformed config '{}'", pair.config_path.display()))?;

        let record = CompactRecorder::new()
            .load(pair.weights_path.with_extension(""), device)
            .with_context(|| {
                format!("cannot load weights from '{}'", pair.weights_path.display())
            })?;
        let model = model_cfg.init(device).load_record(record);

        tracing::info!("Loaded model weights from '{}'", pair.weights_path.display());
        Ok((model, model_cfg, codec))
    }
}

/// Codec table format: one header row of class indices, one data
/// row of label strings, column order = index order.
fn write_codec_table(path: &Path, codec: &LabelCodec) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot write '{}'", path.display()))?;
    let header: Vec<String> = (0..codec.len()).map(|i| i.to_string()).collect();
    writer.write_record(&header)?;
    writer.write_record(codec.labels())?;
    writer.flush()?;
    Ok(())
}

fn read_codec_table(path: &Path) -> Result<LabelCodec> {
    let table_err = |reason: String| ChooserError::ManifestRead {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader =
        csv::Reader::from_path(path).map_err(|e| table_err(e.to_string()))?;

    // The header row carries the indices; it must be dense and in
    // order, otherwise the table was edited or truncated.
    let headers = reader.headers().map_err(|e| table_err(e.to_string()))?.clone();
    for (expected, cell) in headers.iter().enumerate() {
        let parsed: usize = cell
            .parse()
            .map_err(|_| table_err(format!("non-numeric index column '{cell}'")))?;
        if parsed != expected {
            return Err(table_err(format!(
                "index column '{cell}' out of order (expected {expected})"
            ))
            .into());
        }
    }

    let mut records = reader.records();
    let row = records
        .next()
        .ok_or_else(|| table_err("missing label row".to_string()))?
        .map_err(|e| table_err(e.to_string()))?;
    if row.len() != headers.len() {
        return Err(table_err("label row width does not match header".to_string()).into());
    }

    let labels: Vec<String> = row.iter().map(str::to_string).collect();
    Ok(LabelCodec::from_table(labels)?)
}

fn write_name_list(path: &Path, names: &[String]) -> Result<()> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("cannot write '{}'", path.display()))?;
    for name in names {
        writeln!(file, "{name}")?;
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_pair_names_differ_only_in_segment_and_extension() {
        let pair = ArtifactPair::with_token(Path::new("MODELS"), "20250814-231159");
        assert_eq!(
            pair.weights_path,
            Path::new("MODELS/hald_chooser_params__20250814-231159.mpk")
        );
        assert_eq!(
            pair.codec_path,
            Path::new("MODELS/hald_chooser_codes__20250814-231159.csv")
        );
    }

    #[test]
    fn test_weights_path_derivation_round_trip() {
        let pair = ArtifactPair::with_token(Path::new("out"), "20240101-000000");
        let reparsed = ArtifactPair::from_weights_path(&pair.weights_path).unwrap();
        assert_eq!(pair, reparsed);
    }

    #[test]
    fn test_foreign_names_are_rejected() {
        for name in [
            "model.mpk",
            "hald_chooser_params__banana.mpk",
            "hald_chooser_params__20250814-231159.pth",
            "other_params__20250814-231159.mpk",
            "hald_chooser_codes__20250814-231159.mpk",
        ] {
            let err = ArtifactPair::from_weights_path(Path::new(name)).unwrap_err();
            assert!(
                matches!(err, ChooserError::ArtifactNamingMismatch { .. }),
                "'{name}' should not parse"
            );
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path());

        let device = Default::default();
        let model_cfg = HaldNetConfig::new(3).with_base_channels(4);
        let model: HaldNet<TestBackend> = model_cfg.init(&device);
        let codec = LabelCodec::from_labels(["ahg_oleg_id", "ahg_oleg_cp", "ahg_oleg_xc"]);
        let split = SplitNames {
            train: vec!["a.TIF".to_string()],
            valid: vec!["b.TIF".to_string()],
        };

        let pair = manager.save(&model, &model_cfg, &codec, &split).unwrap();
        assert!(pair.weights_path.exists());
        assert!(pair.codec_path.exists());

        let (_model, loaded_cfg, loaded_codec) =
            ArtifactManager::load::<TestBackend>(&pair.weights_path, &device).unwrap();
        assert_eq!(loaded_cfg.num_classes, 3);
        assert_eq!(loaded_codec, codec);
    }

    #[test]
    fn test_missing_codec_companion_aborts_load() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path());

        let device = Default::default();
        let model_cfg = HaldNetConfig::new(2).with_base_channels(4);
        let model: HaldNet<TestBackend> = model_cfg.init(&device);
        let codec = LabelCodec::from_labels(["ahg_oleg_id", "ahg_oleg_cp"]);
        let split = SplitNames { train: vec![], valid: vec![] };

        let pair = manager.save(&model, &model_cfg, &codec, &split).unwrap();
        std::fs::remove_file(&pair.codec_path).unwrap();

        let err = ArtifactManager::load::<TestBackend>(&pair.weights_path, &device).unwrap_err();
        let err = err.downcast_ref::<ChooserError>().unwrap();
        assert!(matches!(err, ChooserError::ArtifactNamingMismatch { .. }));
    }
}
