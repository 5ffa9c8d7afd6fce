// ============================================================
// Layer 3 — HALD Vocabulary and LUT Decision Types
// ============================================================
// The fixed HALD-LUT vocabulary this pipeline targets, the
// per-LUT gamma correction table, and the parameter record
// handed to the external color-grading tool. Pure data — the
// filesystem search for LUT files lives in the application
// layer.

use std::path::PathBuf;

/// Every HALD label token starts with this prefix; the filename
/// correlator uses it to tell a label suffix apart from the rest
/// of an image stem.
pub const HALD_LABEL_PREFIX: &str = "ahg_";

/// The "no-op" LUT choice. Finished images graded with it carry no
/// label suffix at all, and no LUT file is needed to apply it.
pub const IDENTITY_LABEL: &str = "ahg_oleg_id";

/// Gamma correction paired with each known HALD LUT.
/// Labels absent from this table get [`DEFAULT_GAMMA`].
const HALD_GAMMA_TABLE: &[(&str, f64)] = &[
    ("ahg_oleg_id", 1.00),
    ("ahg_oleg_cp", 1.00),
    ("ahg_oleg_mc", 1.00),
    ("ahg_oleg_gp", 1.00),
    ("ahg_oleg_ec", 0.95),
    ("ahg_oleg_xc", 0.88),
    ("ahg_oleg_sf", 0.88),
];

pub const DEFAULT_GAMMA: f64 = 1.00;

/// Gamma value for a chosen HALD label. Unrecognized labels fall
/// back to the neutral 1.0.
pub fn choose_gamma(label: &str) -> f64 {
    HALD_GAMMA_TABLE
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, gamma)| *gamma)
        .unwrap_or(DEFAULT_GAMMA)
}

/// File name of the HALD CLUT image for a label, per the
/// `hald__<label>__16.<ext>` convention.
pub fn lut_file_name(label: &str, ext: &str) -> String {
    format!("hald__{label}__16.{ext}")
}

/// Everything the external color-grading tool needs for one
/// anaglyph conversion. Producing this record is where the core's
/// responsibility ends; command construction and process execution
/// belong to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    /// The source side-by-side image.
    pub sbs_path: PathBuf,
    /// The chosen HALD label.
    pub label: String,
    /// Gamma correction to apply before the LUT.
    pub gamma: f64,
    /// Resolved LUT file; `None` for the identity choice.
    pub lut_path: Option<PathBuf>,
    /// Derived output path: `<out_dir>/<source-stem>_<label>.jpg`.
    pub out_path: PathBuf,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_return_table_values() {
        assert_eq!(choose_gamma("ahg_oleg_id"), 1.00);
        assert_eq!(choose_gamma("ahg_oleg_ec"), 0.95);
        assert_eq!(choose_gamma("ahg_oleg_xc"), 0.88);
        assert_eq!(choose_gamma("ahg_oleg_sf"), 0.88);
    }

    #[test]
    fn test_unrecognized_label_defaults_to_one() {
        assert_eq!(choose_gamma("ahg_oleg_nope"), 1.00);
        assert_eq!(choose_gamma(""), 1.00);
    }

    #[test]
    fn test_lut_file_name_convention() {
        assert_eq!(
            lut_file_name("ahg_oleg_gp", "TIF"),
            "hald__ahg_oleg_gp__16.TIF"
        );
    }
}
