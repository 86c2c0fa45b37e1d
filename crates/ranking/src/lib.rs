pub mod quality;
pub mod rerank;

pub use quality::{quality_score, QualityInputs};
pub use rerank::{rerank, Candidate, OutcomeSignals, Ranked};
