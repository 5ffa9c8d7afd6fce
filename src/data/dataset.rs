// ============================================================
// Layer 4 — Stereo Sample Source
// ============================================================
// Turns manifest rows into training samples. Labels are encoded
// through the codec and images are decoded AT LISTING TIME, so a
// bad label or an unreadable image surfaces before the first
// epoch instead of mid-training.
//
// The decoded frame is kept; the augmented tensor is not — it is
// recomputed by the batcher on every access.

use std::path::{Path, PathBuf};

use burn::data::dataset::Dataset;
use image::RgbImage;

use crate::data::manifest::ManifestEntry;
use crate::domain::error::ChooserError;
use crate::domain::label_codec::LabelCodec;

/// One listed training sample: the decoded SBS frame plus its
/// label in both string and encoded form.
#[derive(Debug, Clone)]
pub struct SbsSample {
    /// Manifest stem, e.g. "DSC00033".
    pub stem: String,
    /// Full file name, e.g. "DSC00033.TIF" — kept for traceability.
    pub file_name: String,
    pub label: String,
    pub class_index: usize,
    pub image: RgbImage,
}

/// Decode one image file into an RGB raster.
pub fn load_rgb(path: &Path) -> Result<RgbImage, ChooserError> {
    let decoded = image::open(path).map_err(|e| ChooserError::ImageDecode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(decoded.to_rgb8())
}

#[derive(Debug)]
pub struct SbsDataset {
    samples: Vec<SbsSample>,
}

impl SbsDataset {
    pub fn new(samples: Vec<SbsSample>) -> Self {
        Self { samples }
    }

    /// List samples for every manifest entry.
    ///
    /// Every label is encoded up front (`UnknownLabel` is fatal —
    /// the codec was built from this manifest, so a miss means the
    /// inputs changed underneath us). Decode failures are fatal by
    /// default; with `skip_undecodable` they are counted, logged,
    /// and the sample is dropped — the only local recovery this
    /// pipeline allows.
    ///
    /// Returns the dataset and the number of skipped samples.
    pub fn from_entries(
        entries: &[ManifestEntry],
        sbs_dir: &Path,
        sbs_ext: &str,
        codec: &LabelCodec,
        skip_undecodable: bool,
    ) -> Result<(Self, usize), ChooserError> {
        let mut samples = Vec::with_capacity(entries.len());
        let mut skipped = 0usize;

        for entry in entries {
            let class_index = codec.encode(&entry.label)?;
            let file_name = format!("{}.{}", entry.stem, sbs_ext);
            let path: PathBuf = sbs_dir.join(&file_name);
            let image = match load_rgb(&path) {
                Ok(image) => image,
                Err(e) if skip_undecodable => {
                    skipped += 1;
                    tracing::warn!("Skipping sample '{}': {}", file_name, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            samples.push(SbsSample {
                stem: entry.stem.clone(),
                file_name,
                label: entry.label.clone(),
                class_index,
                image,
            });
        }

        tracing::info!(
            "Listed {} sample(s) ({} skipped) from '{}'",
            samples.len(),
            skipped,
            sbs_dir.display()
        );
        Ok((Self::new(samples), skipped))
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// File names of the listed samples, in listing order.
    pub fn file_names(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.file_name.clone()).collect()
    }

    pub fn into_samples(self) -> Vec<SbsSample> {
        self.samples
    }
}

impl Dataset<SbsSample> for SbsDataset {
    fn get(&self, index: usize) -> Option<SbsSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::manifest::ManifestEntry;
    use tempfile::tempdir;

    fn write_test_image(dir: &Path, name: &str, w: u32, h: u32) {
        let img = RgbImage::from_pixel(w, h, image::Rgb([10, 20, 30]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_listing_encodes_labels_up_front() {
        let dir = tempdir().unwrap();
        write_test_image(dir.path(), "a.png", 8, 4);
        let entries = vec![ManifestEntry {
            stem: "a".to_string(),
            label: "ahg_oleg_cp".to_string(),
        }];
        let codec = LabelCodec::from_labels(["ahg_oleg_cp", "ahg_oleg_id"]);
        let (dataset, skipped) =
            SbsDataset::from_entries(&entries, dir.path(), "png", &codec, false).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(dataset.sample_count(), 1);
        let sample = dataset.get(0).unwrap();
        assert_eq!(sample.class_index, codec.encode("ahg_oleg_cp").unwrap());
        assert_eq!(sample.file_name, "a.png");
    }

    #[test]
    fn test_unknown_label_fails_at_listing_time() {
        let dir = tempdir().unwrap();
        let entries = vec![ManifestEntry {
            stem: "a".to_string(),
            label: "ahg_oleg_zz".to_string(),
        }];
        let codec = LabelCodec::from_labels(["ahg_oleg_cp"]);
        let err =
            SbsDataset::from_entries(&entries, dir.path(), "png", &codec, false).unwrap_err();
        assert!(matches!(err, ChooserError::UnknownLabel(_)));
    }

    #[test]
    fn test_missing_image_propagates_by_default() {
        let dir = tempdir().unwrap();
        let entries = vec![ManifestEntry {
            stem: "missing".to_string(),
            label: "ahg_oleg_cp".to_string(),
        }];
        let codec = LabelCodec::from_labels(["ahg_oleg_cp"]);
        let err =
            SbsDataset::from_entries(&entries, dir.path(), "png", &codec, false).unwrap_err();
        assert!(matches!(err, ChooserError::ImageDecode { .. }));
    }

    #[test]
    fn test_missing_image_skipped_and_counted_when_lenient() {
        let dir = tempdir().unwrap();
        write_test_image(dir.path(), "ok.png", 8, 4);
        let entries = vec![
            ManifestEntry { stem: "missing".to_string(), label: "ahg_oleg_cp".to_string() },
            ManifestEntry { stem: "ok".to_string(), label: "ahg_oleg_cp".to_string() },
        ];
        let codec = LabelCodec::from_labels(["ahg_oleg_cp"]);
        let (dataset, skipped) =
            SbsDataset::from_entries(&entries, dir.path(), "png", &codec, true).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(dataset.sample_count(), 1);
    }
}
