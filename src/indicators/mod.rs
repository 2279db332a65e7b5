// =============================================================================
// Derived Metrics Module
// =============================================================================
//
// Pure, side-effect-free derivations over normalized tables.

pub mod cvd;

pub use cvd::{derive_cvd, CvdCandle};
