pub mod compare;
pub mod fingerprint;
pub mod search;
pub mod serialize;
