// ============================================================
// Layer 5 — Tree Predictor
// ============================================================
// The second HALD-selection strategy: a persisted binary
// decision tree evaluated over per-image red/cyan histogram
// features. The tree is trained elsewhere; here it is only
// loaded (serde JSON) and evaluated.
//
// Features come from a histogram table CSV keyed by file name:
// column 0 = filename, remaining columns = bin values in
// ascending bin order.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::traits::Predictor;

/// One node of the persisted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Descend `below` when `features[feature] <= threshold`,
    /// `above` otherwise.
    Split {
        feature: usize,
        threshold: f64,
        below: Box<TreeNode>,
        above: Box<TreeNode>,
    },
    Leaf { label: String },
}

impl TreeNode {
    fn evaluate<'a>(&'a self, features: &[f64]) -> Result<&'a str> {
        match self {
            TreeNode::Leaf { label } => Ok(label),
            TreeNode::Split { feature, threshold, below, above } => {
                let value = features.get(*feature).ok_or_else(|| {
                    anyhow!(
                        "tree references feature {} but only {} are available",
                        feature,
                        features.len()
                    )
                })?;
                if *value <= *threshold {
                    below.evaluate(features)
                } else {
                    above.evaluate(features)
                }
            }
        }
    }
}

pub struct TreePredictor {
    root: TreeNode,
    /// file name -> histogram bins, ascending bin order.
    histograms: HashMap<String, Vec<f64>>,
}

impl TreePredictor {
    /// Load the tree model and the histogram feature table.
    pub fn load(tree_path: &Path, histogram_csv: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(tree_path)
            .with_context(|| format!("cannot read tree model '{}'", tree_path.display()))?;
        let root: TreeNode = serde_json::from_str(&json)
            .with_context(|| format!("malformed tree model '{}'", tree_path.display()))?;

        let histograms = read_histogram_table(histogram_csv)?;
        tracing::info!(
            "Loaded decision tree '{}' and {} histogram row(s)",
            tree_path.display(),
            histograms.len()
        );
        Ok(Self { root, histograms })
    }

    /// Predict the HALD label for an image listed in the
    /// histogram table.
    pub fn predict_file(&self, file_name: &str) -> Result<String> {
        let features = self
            .histograms
            .get(file_name)
            .ok_or_else(|| anyhow!("image '{}' missing from the histogram table", file_name))?;
        Ok(self.root.evaluate(features)?.to_string())
    }
}

impl Predictor for TreePredictor {
    fn predict_label(&self, image_path: &Path) -> Result<String> {
        let file_name = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("image path '{}' has no file name", image_path.display()))?;
        self.predict_file(file_name)
    }
}

/// Read the histogram table: filename column plus one f64 column
/// per bin, header row present.
fn read_histogram_table(path: &Path) -> Result<HashMap<String, Vec<f64>>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot read histogram table '{}'", path.display()))?;

    let mut table = HashMap::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("malformed histogram row in '{}'", path.display()))?;
        let mut cells = record.iter();
        let file_name = match cells.next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => bail!("histogram row without a filename in '{}'", path.display()),
        };
        let bins = cells
            .map(|cell| {
                cell.parse::<f64>()
                    .with_context(|| format!("non-numeric histogram bin '{cell}' for '{file_name}'"))
            })
            .collect::<Result<Vec<f64>>>()?;
        table.insert(file_name, bins);
    }
    Ok(table)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn two_leaf_tree() -> TreeNode {
        TreeNode::Split {
            feature: 1,
            threshold: 0.5,
            below: Box::new(TreeNode::Leaf { label: "ahg_oleg_id".to_string() }),
            above: Box::new(TreeNode::Leaf { label: "ahg_oleg_xc".to_string() }),
        }
    }

    #[test]
    fn test_evaluate_both_branches() {
        let tree = two_leaf_tree();
        assert_eq!(tree.evaluate(&[0.0, 0.2]).unwrap(), "ahg_oleg_id");
        assert_eq!(tree.evaluate(&[0.0, 0.9]).unwrap(), "ahg_oleg_xc");
    }

    #[test]
    fn test_feature_out_of_range_is_an_error() {
        let tree = two_leaf_tree();
        assert!(tree.evaluate(&[0.0]).is_err());
    }

    #[test]
    fn test_tree_json_round_trip() {
        let tree = two_leaf_tree();
        let json = serde_json::to_string(&tree).unwrap();
        let reloaded: TreeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(tree, reloaded);
    }

    #[test]
    fn test_load_and_predict_from_files() {
        let dir = tempdir().unwrap();
        let tree_path = dir.path().join("tree.json");
        std::fs::write(
            &tree_path,
            serde_json::to_string(&two_leaf_tree()).unwrap(),
        )
        .unwrap();

        let hist_path = dir.path().join("hist.csv");
        let mut f = std::fs::File::create(&hist_path).unwrap();
        writeln!(f, "filename,b0,b1").unwrap();
        writeln!(f, "dark.TIF,0.1,0.2").unwrap();
        writeln!(f, "bright.TIF,0.1,0.8").unwrap();
        drop(f);

        let predictor = TreePredictor::load(&tree_path, &hist_path).unwrap();
        assert_eq!(predictor.predict_file("dark.TIF").unwrap(), "ahg_oleg_id");
        assert_eq!(predictor.predict_file("bright.TIF").unwrap(), "ahg_oleg_xc");
        assert!(predictor.predict_file("missing.TIF").is_err());
    }
}
