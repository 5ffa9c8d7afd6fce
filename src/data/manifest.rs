// ============================================================
// Layer 4 — Manifest I/O
// ============================================================
// The manifest is the tabular bridge between the correlator and
// the sample source: column 0 = SBS image stem (no extension),
// column 1 = HALD label, header row present.

use std::path::Path;

use crate::domain::error::ChooserError;

/// Column headers written to (and expected in) a manifest file.
pub const MANIFEST_HEADER: [&str; 2] = ["SbsFileName", "HaldId"];

/// One manifest row.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    /// Image stem without extension, e.g. "DSC00033".
    pub stem: String,
    /// HALD label, e.g. "ahg_oleg_cp".
    pub label: String,
}

/// Read a manifest file. Any I/O or shape problem is fatal to the
/// whole call — a half-read manifest would silently shrink the
/// training set.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>, ChooserError> {
    let manifest_err = |reason: String| ChooserError::ManifestRead {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| manifest_err(e.to_string()))?;

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| manifest_err(e.to_string()))?;
        let stem = record
            .get(0)
            .ok_or_else(|| manifest_err("missing stem column".to_string()))?;
        let label = record
            .get(1)
            .ok_or_else(|| manifest_err("missing label column".to_string()))?;
        if stem.is_empty() || label.is_empty() {
            return Err(manifest_err(format!(
                "empty cell in row {}",
                entries.len() + 2
            )));
        }
        entries.push(ManifestEntry {
            stem: stem.to_string(),
            label: label.to_string(),
        });
    }
    Ok(entries)
}

/// Write `(stem, label)` mappings as a manifest file, header included.
pub fn write_manifest(
    path: &Path,
    mappings: &[(String, String)],
) -> Result<(), ChooserError> {
    let manifest_err = |reason: String| ChooserError::ManifestRead {
        path: path.to_path_buf(),
        reason,
    };

    let mut writer = csv::Writer::from_path(path).map_err(|e| manifest_err(e.to_string()))?;
    writer
        .write_record(MANIFEST_HEADER)
        .map_err(|e| manifest_err(e.to_string()))?;
    for (stem, label) in mappings {
        writer
            .write_record([stem.as_str(), label.as_str()])
            .map_err(|e| manifest_err(e.to_string()))?;
    }
    writer.flush().map_err(|e| manifest_err(e.to_string()))?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sbs_to_hald.csv");
        let mappings = vec![
            ("DSC00033".to_string(), "ahg_oleg_cp".to_string()),
            ("DSC00034".to_string(), "ahg_oleg_id".to_string()),
        ];
        write_manifest(&path, &mappings).unwrap();

        let entries = read_manifest(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].stem, "DSC00033");
        assert_eq!(entries[0].label, "ahg_oleg_cp");
        assert_eq!(entries[1].label, "ahg_oleg_id");
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let err = read_manifest(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, ChooserError::ManifestRead { .. }));
    }
}
