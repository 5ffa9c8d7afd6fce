// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types that define what the system talks about:
// labels and their class indices, the HALD/gamma vocabulary,
// the error taxonomy, and the predictor abstraction.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain structs, enums, and traits

// Failure classes surfaced by the pipeline
pub mod error;

// The HALD vocabulary, gamma table, and conversion request record
pub mod hald;

// Bijective label <-> class-index mapping
pub mod label_codec;

// The Predictor seam with its two implementations
pub mod traits;
