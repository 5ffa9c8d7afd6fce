// ============================================================
// Layer 2 — Correlate Use Case
// ============================================================
// Rebuilds a labeled training manifest from a directory of
// hand-finished anaglyphs:
//
//   Step 1: List the finished image files       (Layer 4 - data)
//   Step 2: Recover (source, label) per name    (Layer 4 - data)
//   Step 3: Cross-check source-set coverage     (Layer 4 - data)
//   Step 4: Write the manifest CSV              (Layer 4 - data)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::correlator::{
    correlate_stems, list_image_files, map_sources_to_labels, CorrelationReport,
};
use crate::data::manifest::write_manifest;
use crate::domain::hald::{HALD_LABEL_PREFIX, IDENTITY_LABEL};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelateConfig {
    /// Directory of finished anaglyph images.
    pub ana_dir: String,
    /// Where the manifest CSV is written.
    pub out_manifest: String,
    /// SBS source directory; when given, the finished images are
    /// merge-joined against the bare source names to report how
    /// much of the source set is covered.
    pub sbs_dir: Option<String>,
    /// Prefix every label token starts with.
    pub label_prefix: String,
    /// Label assumed for finished images without a label token.
    pub identity_label: String,
}

impl Default for CorrelateConfig {
    fn default() -> Self {
        Self {
            ana_dir: ".".to_string(),
            out_manifest: "sbs_to_hald.csv".to_string(),
            sbs_dir: None,
            label_prefix: HALD_LABEL_PREFIX.to_string(),
            identity_label: IDENTITY_LABEL.to_string(),
        }
    }
}

pub struct CorrelateUseCase {
    config: CorrelateConfig,
}

impl CorrelateUseCase {
    pub fn new(config: CorrelateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<CorrelationReport> {
        let cfg = &self.config;

        // ── Step 1: List finished images ──────────────────────────────────────
        let names = list_image_files(Path::new(&cfg.ana_dir))?;
        tracing::info!("Found {} anaglyph(s) in '{}'", names.len(), cfg.ana_dir);

        // ── Step 2: Recover source stems and labels ───────────────────────────
        let report =
            map_sources_to_labels(&names, &cfg.label_prefix, &cfg.identity_label);
        tracing::info!(
            "Found {} SBS-name-to-HALD mapping(s); {} without label token, {} duplication(s)",
            report.mappings.len(),
            report.unmatched,
            report.duplicates
        );

        // ── Step 3: Cross-check coverage against the source set ───────────────
        if let Some(sbs_dir) = &cfg.sbs_dir {
            let bare = list_image_files(Path::new(sbs_dir))?;
            let pairs = correlate_stems(&bare, &names)?;
            tracing::info!(
                "{} of {} SBS image(s) in '{}' have a finished counterpart",
                pairs.len(),
                bare.len(),
                sbs_dir
            );
        }

        // ── Step 4: Write the manifest ────────────────────────────────────────
        write_manifest(Path::new(&cfg.out_manifest), &report.mappings)?;
        tracing::info!(
            "Stored {} mapping(s) in '{}'",
            report.mappings.len(),
            cfg.out_manifest
        );

        Ok(report)
    }
}
