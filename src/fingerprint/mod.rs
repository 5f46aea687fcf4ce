mod accumulator;
mod allele;
mod file;
mod filter;
mod genotype;
mod normalize;
mod reference;
mod vectors;

pub use accumulator::Accumulator;
pub use allele::Allele;
pub use file::{FingerprintFile, FingerprintMeta};
pub use filter::{CallFilter, RegionSet};
pub use genotype::{
    open_calls, CallRecord, CallStats, GenotypeCall, InputFormat, SkipReason, TsvCalls, VcfCalls,
};
pub use normalize::normalize;
pub use reference::{parse_rsid, AlleleFrequencies, ReferenceTable};
pub use vectors::Fingerprint;
