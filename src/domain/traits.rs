// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The one seam where two HALD-selection strategies are
// interchangeable. Callers pick an implementation through
// configuration and hold a `Box<dyn Predictor>` — never by
// inspecting the concrete type.

use std::path::Path;

use anyhow::Result;

// ─── Predictor ────────────────────────────────────────────────────────────────
/// Any component that can choose a HALD label for one image.
///
/// Implementations:
///   - NetPredictor  → trained CNN over the stereo pair (ml::inferencer)
///   - TreePredictor → persisted decision tree over histogram features (ml::tree)
pub trait Predictor {
    /// Predict the HALD label for the image at `image_path`.
    fn predict_label(&self, image_path: &Path) -> Result<String>;
}
