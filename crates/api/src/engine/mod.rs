//! Try-on orchestration: remote generation first, local fallback second.

pub mod tryon;

pub use tryon::{ResultSource, TryOnEngine, TryOnOutcome};
