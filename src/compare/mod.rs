mod engine;
mod rank;
mod spearman;

pub use engine::{ComparisonEngine, ExternalEngine, Hit, NativeEngine};
pub use rank::rank_transform;
pub use spearman::{compare, fingerprint_ranks, spearman, Comparison, LengthScore};
