// ============================================================
// Layer 4 — Filename Correlator
// ============================================================
// Reconstructs a labeled training set from raw directory
// listings. Finished anaglyphs are named
//   <source-stem>_<label-token>.<ext>
// or, for the identity ("no-op") LUT choice, just
//   <source-stem>.<ext>
// so the label for each source image can be recovered from the
// finished image's filename alone.
//
// Two independent algorithms live here:
//   1. label/source extraction from one filename
//   2. a two-pointer merge-join that pairs a set of bare stems
//      with a set of label-suffixed stems

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::error::ChooserError;

/// Raster formats accepted when listing a directory of images.
const IMAGE_EXTENSIONS: &[&str] = &["bmp", "jpg", "jpeg", "png", "tif", "gif"];

/// List the image file names (leaf names, extension kept) found
/// directly under `dir`. Non-image entries are ignored.
pub fn list_image_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("cannot read directory '{}'", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_image && path.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Strip the final extension from a file name.
/// "DSC123.TIF" -> "DSC123"; "a.b.TIF" -> "a.b"; "noext" -> "noext".
fn strip_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// Extract the label token from a finished-image filename.
///
/// The stem is scanned from the end for a separator-delimited
/// token starting with `prefix` and containing no further dot;
/// e.g. "DSC123456_ahg_oleg_cp.JPG" -> Some("ahg_oleg_cp").
/// Returns `None` when no such token exists (the identity case).
pub fn detect_label(file_name: &str, prefix: &str) -> Option<String> {
    let stem = strip_extension(file_name);
    let needle = format!("_{prefix}");
    let at = stem.rfind(&needle)?;
    let token = &stem[at + 1..];
    if token.len() > prefix.len() && !token.contains('.') {
        Some(token.to_string())
    } else {
        None
    }
}

/// Extract the source-image stem from a finished-image filename.
/// "DSC123456_ahg_oleg_cp.JPG" -> Some("DSC123456"); `None` when
/// the name carries no label token.
pub fn detect_source(file_name: &str, prefix: &str) -> Option<String> {
    let stem = strip_extension(file_name);
    let needle = format!("_{prefix}");
    let at = stem.rfind(&needle)?;
    let token = &stem[at + 1..];
    if at > 0 && token.len() > prefix.len() && !token.contains('.') {
        Some(stem[..at].to_string())
    } else {
        None
    }
}

/// Outcome of correlating one directory of finished images.
#[derive(Debug, Clone)]
pub struct CorrelationReport {
    /// `(source-stem, label)` pairs in first-seen order.
    pub mappings: Vec<(String, String)>,
    /// Finished images whose names carried no label token and were
    /// assigned the identity label.
    pub unmatched: usize,
    /// Collisions where two finished images resolved to the same
    /// source stem. Last-seen mapping wins; the count is reported,
    /// never silently dropped.
    pub duplicates: usize,
}

/// Map every finished-image filename to its source stem and label.
///
/// Names without a label token are assigned `identity_label` and
/// their whole stem becomes the source stem. When two finished
/// images resolve to the same source stem, the last-seen label
/// wins and the collision is counted.
pub fn map_sources_to_labels(
    file_names: &[String],
    prefix: &str,
    identity_label: &str,
) -> CorrelationReport {
    let mut order: Vec<String> = Vec::new();
    let mut labels: HashMap<String, String> = HashMap::new();
    let mut unmatched = 0usize;
    let mut duplicates = 0usize;

    for name in file_names {
        let label = match detect_label(name, prefix) {
            Some(label) => label,
            None => {
                unmatched += 1;
                identity_label.to_string()
            }
        };
        let source = detect_source(name, prefix)
            .unwrap_or_else(|| strip_extension(name).to_string());

        if let Some(previous) = labels.insert(source.clone(), label.clone()) {
            duplicates += 1;
            tracing::warn!(
                "Duplicated HALD choice for '{}': '{}' and '{}'",
                source,
                previous,
                label
            );
        } else {
            order.push(source);
        }
    }

    let mappings = order
        .into_iter()
        .map(|source| {
            let label = labels[&source].clone();
            (source, label)
        })
        .collect();

    CorrelationReport { mappings, unmatched, duplicates }
}

/// Case-insensitive sort key: lowercase stem, extension stripped.
fn stem_key(file_name: &str) -> String {
    strip_extension(file_name).to_lowercase()
}

/// The first `n` characters of `s` (the whole of `s` if shorter).
fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((at, _)) => &s[..at],
        None => s,
    }
}

/// Pair bare file names with their label-suffixed counterparts.
///
/// Both lists are sorted by their case-insensitive, extension-
/// stripped stems, then walked with two cursors. At every step the
/// bare stem is compared against the equal-length prefix of the
/// suffixed stem: a bare stem is always a prefix of its own
/// suffixed form once both are lowercased, so equal prefixes mean
/// a match. Runs in at most |bare| + |suffixed| comparisons.
///
// Known ambiguity, deliberately not resolved: when one bare stem
// is a proper prefix of ANOTHER bare stem's suffixed form (e.g.
// "img1" vs "img10_ahg_oleg_cp"), the prefix comparison cannot
// tell them apart and may pair the wrong files.
///
/// The explicit step budget is a safety net against a cursor bug
/// looping forever; exhausting it is a fatal error, never an
/// expected outcome.
pub fn correlate_stems(
    bare: &[String],
    suffixed: &[String],
) -> Result<Vec<(String, String)>, ChooserError> {
    let mut bare_sorted: Vec<&String> = bare.iter().collect();
    bare_sorted.sort_by_key(|n| stem_key(n));
    let mut suffixed_sorted: Vec<&String> = suffixed.iter().collect();
    suffixed_sorted.sort_by_key(|n| stem_key(n));

    let budget = bare.len() + suffixed.len() + 4;
    let mut steps_left = budget;

    let mut pairs = Vec::new();
    let mut i = 0usize;
    let mut j = 0usize;
    while i < bare_sorted.len() && j < suffixed_sorted.len() {
        if steps_left == 0 {
            return Err(ChooserError::CorrelationBudgetExhausted { budget });
        }
        steps_left -= 1;

        let bare_stem = stem_key(bare_sorted[i]);
        let suffixed_stem = stem_key(suffixed_sorted[j]);
        let prefix = char_prefix(&suffixed_stem, bare_stem.chars().count());

        match bare_stem.as_str().cmp(prefix) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                pairs.push((bare_sorted[i].clone(), suffixed_sorted[j].clone()));
                i += 1;
                j += 1;
            }
        }
    }
    Ok(pairs)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_label_with_suffix() {
        assert_eq!(
            detect_label("DSC123456_ahg_oleg_cp.JPG", "ahg_"),
            Some("ahg_oleg_cp".to_string())
        );
    }

    #[test]
    fn test_detect_label_without_suffix() {
        assert_eq!(detect_label("DSC123456.JPG", "ahg_"), None);
        assert_eq!(detect_label("DSC_0111.TIF", "ahg_"), None);
    }

    #[test]
    fn test_detect_label_takes_last_token() {
        // A stem that happens to contain the prefix twice: the token
        // is searched from the end of the stem.
        assert_eq!(
            detect_label("trip_ahg_oleg_cp_ahg_oleg_gp.jpg", "ahg_"),
            Some("ahg_oleg_gp".to_string())
        );
    }

    #[test]
    fn test_detect_source() {
        assert_eq!(
            detect_source("DSC123456_ahg_oleg_cp.JPG", "ahg_"),
            Some("DSC123456".to_string())
        );
        assert_eq!(detect_source("DSC123456.JPG", "ahg_"), None);
    }

    #[test]
    fn test_correlate_example_pairing() {
        // Only img1 exists on both sides; img2 and img3 stay unmatched.
        let bare = vec!["img1".to_string(), "img2".to_string()];
        let suffixed = vec![
            "img1_ahg_oleg_cp".to_string(),
            "img3_ahg_oleg_id".to_string(),
        ];
        let pairs = correlate_stems(&bare, &suffixed).unwrap();
        assert_eq!(
            pairs,
            vec![("img1".to_string(), "img1_ahg_oleg_cp".to_string())]
        );
    }

    #[test]
    fn test_correlate_is_case_insensitive_and_ignores_extensions() {
        let bare = vec!["F2.a".to_string(), "f1.a".to_string()];
        let suffixed = vec![
            "f1_ahg_oleg_gp.b".to_string(),
            "F2_ahg_oleg_mc.b".to_string(),
            "f3_ahg_oleg_cp.b".to_string(),
        ];
        let pairs = correlate_stems(&bare, &suffixed).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("f1.a".to_string(), "f1_ahg_oleg_gp.b".to_string()));
        assert_eq!(pairs[1], ("F2.a".to_string(), "F2_ahg_oleg_mc.b".to_string()));
    }

    #[test]
    fn test_correlate_empty_inputs() {
        let pairs = correlate_stems(&[], &[]).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_map_sources_counts_duplicates_last_write_wins() {
        let names = vec![
            "img1_ahg_oleg_cp.jpg".to_string(),
            "img1_ahg_oleg_gp.jpg".to_string(),
            "img2.jpg".to_string(),
        ];
        let report = map_sources_to_labels(&names, "ahg_", "ahg_oleg_id");
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(
            report.mappings,
            vec![
                ("img1".to_string(), "ahg_oleg_gp".to_string()),
                ("img2".to_string(), "ahg_oleg_id".to_string()),
            ]
        );
    }
}
