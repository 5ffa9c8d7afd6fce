// ============================================================
// Layer 3 — Label Codec
// ============================================================
// Bidirectional mapping between a HALD label string (e.g.
// "ahg_oleg_cp") and the dense class index the classifier
// operates over.
//
// Index assignment is canonical: indices 0..N-1 follow the
// ascending alphabetical order of the distinct labels observed
// at construction time. The codec built during training must be
// persisted next to the trained weights and reloaded for every
// later prediction — weights and codec are one inseparable
// artifact (see infra::artifact).

use std::collections::HashMap;

use crate::domain::error::ChooserError;

/// Bijective label <-> class-index mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelCodec {
    label_to_index: HashMap<String, usize>,
    /// Labels in index order — position IS the class index.
    index_to_label: Vec<String>,
}

impl LabelCodec {
    /// Build a codec from the label column of a manifest.
    /// Duplicates collapse; the distinct labels are sorted
    /// alphabetically and numbered 0..N-1.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct: Vec<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        distinct.sort();
        distinct.dedup();

        let label_to_index = distinct
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();

        Self { label_to_index, index_to_label: distinct }
    }

    /// Rebuild a codec from a persisted flat table.
    /// `labels` must already be in index order (position = index);
    /// the order is trusted, never re-sorted, so a reloaded codec
    /// decodes exactly as the one that was saved.
    pub fn from_table(labels: Vec<String>) -> Result<Self, ChooserError> {
        let mut label_to_index = HashMap::with_capacity(labels.len());
        for (idx, label) in labels.iter().enumerate() {
            if label_to_index.insert(label.clone(), idx).is_some() {
                return Err(ChooserError::CodecTable(format!(
                    "label '{label}' appears more than once"
                )));
            }
        }
        Ok(Self { label_to_index, index_to_label: labels })
    }

    /// Label string -> class index.
    pub fn encode(&self, label: &str) -> Result<usize, ChooserError> {
        self.label_to_index
            .get(label)
            .copied()
            .ok_or_else(|| ChooserError::UnknownLabel(label.to_string()))
    }

    /// Class index -> label string.
    pub fn decode(&self, index: usize) -> Result<&str, ChooserError> {
        self.index_to_label
            .get(index)
            .map(String::as_str)
            .ok_or(ChooserError::UnknownPredictedIndex {
                index,
                known: self.index_to_label.len(),
            })
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.index_to_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_label.is_empty()
    }

    /// The flat table view used for persistence: labels in index order.
    pub fn labels(&self) -> &[String] {
        &self.index_to_label
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabetical_index_assignment() {
        let codec = LabelCodec::from_labels(["ahg_oleg_mc", "ahg_oleg_cp", "ahg_oleg_id"]);
        assert_eq!(codec.len(), 3);
        assert_eq!(codec.encode("ahg_oleg_cp").unwrap(), 0);
        assert_eq!(codec.encode("ahg_oleg_id").unwrap(), 1);
        assert_eq!(codec.encode("ahg_oleg_mc").unwrap(), 2);
    }

    #[test]
    fn test_round_trip_every_label() {
        let labels = ["ahg_oleg_id", "ahg_oleg_cp", "ahg_oleg_sf", "ahg_oleg_cp"];
        let codec = LabelCodec::from_labels(labels);
        for label in ["ahg_oleg_id", "ahg_oleg_cp", "ahg_oleg_sf"] {
            let idx = codec.encode(label).unwrap();
            assert_eq!(codec.decode(idx).unwrap(), label);
        }
    }

    #[test]
    fn test_unknown_label_fails() {
        let codec = LabelCodec::from_labels(["ahg_oleg_id"]);
        let err = codec.encode("ahg_oleg_zz").unwrap_err();
        assert!(matches!(err, ChooserError::UnknownLabel(_)));
    }

    #[test]
    fn test_unknown_index_fails() {
        let codec = LabelCodec::from_labels(["ahg_oleg_id"]);
        let err = codec.decode(5).unwrap_err();
        assert!(matches!(
            err,
            ChooserError::UnknownPredictedIndex { index: 5, known: 1 }
        ));
    }

    #[test]
    fn test_table_round_trip_preserves_order() {
        let codec = LabelCodec::from_labels(["ahg_oleg_xc", "ahg_oleg_ec"]);
        let reloaded = LabelCodec::from_table(codec.labels().to_vec()).unwrap();
        assert_eq!(codec, reloaded);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let err = LabelCodec::from_table(vec!["a".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, ChooserError::CodecTable(_)));
    }
}
