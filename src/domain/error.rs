// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure class the pipeline can surface, as one enum.
// The lower layers (domain, data, ml, infra) return these typed
// variants; the application layer wraps them in anyhow::Result
// and adds call-site context.
//
// None of these are retried automatically — this is an offline
// training/inference pipeline, not a service.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChooserError {
    /// The manifest (or another tabular input file) is missing,
    /// unreadable, or malformed. Fatal to the whole call.
    #[error("cannot read manifest {path:?}: {reason}")]
    ManifestRead { path: PathBuf, reason: String },

    /// A label string is not part of the codec's vocabulary.
    #[error("unknown label '{0}'")]
    UnknownLabel(String),

    /// A predicted class index is outside the codec's known range.
    /// Should not occur when weights and codec are a matched pair.
    #[error("predicted class index {index} is outside the codec range 0..{known}")]
    UnknownPredictedIndex { index: usize, known: usize },

    /// The label codec table is not a dense bijection over 0..N.
    #[error("label codec table is not bijective: {0}")]
    CodecTable(String),

    /// A weights path does not follow the artifact naming convention,
    /// or its companion file cannot be resolved. Loading aborts.
    #[error("artifact naming mismatch for {path:?}: {reason}")]
    ArtifactNamingMismatch { path: PathBuf, reason: String },

    /// A listed image could not be opened or decoded.
    #[error("cannot decode image {path:?}: {reason}")]
    ImageDecode { path: PathBuf, reason: String },

    /// The filename merge-join consumed its step budget without
    /// terminating. The budget is a hard safety net — exceeding it
    /// means the cursor logic is broken, not that the input is large.
    #[error("filename correlation exceeded its step budget of {budget} comparisons")]
    CorrelationBudgetExhausted { budget: usize },

    /// No LUT file for the chosen label exists in any candidate
    /// directory. Fatal to that one conversion request only.
    #[error("LUT file '{file_name}' not found in any of {searched} candidate directories")]
    LutNotFound { file_name: String, searched: usize },
}
