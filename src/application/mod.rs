// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per command, each orchestrating the lower layers:
//
//   correlate_use_case — finished anaglyphs → labeled manifest
//   train_use_case     — manifest → trained artifact pair
//   choose_use_case    — one image → (label, gamma, LUT, output)
//
// No ML math, no argument parsing — only workflow coordination.

// Manifest reconstruction from finished images
pub mod correlate_use_case;

// The training workflow
pub mod train_use_case;

// The prediction / LUT-decision workflow
pub mod choose_use_case;
