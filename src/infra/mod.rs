// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   artifact.rs — the weights/codec artifact pair: one timestamp
//                 token links every file of a training run, and
//                 loading verifies the pairing before any
//                 prediction can happen.
//
//   metrics.rs  — per-epoch training metrics CSV.

/// Weights + label-codec artifact pairing
pub mod artifact;

/// Training metrics CSV logger
pub mod metrics;
