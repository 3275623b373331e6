//! Hamming / ungapped filter cascade.
pub mod fingerprint;
pub mod ungapped;

pub use fingerprint::{Fingerprint, FingerprintMode};
pub use ungapped::{ungapped_cutoff, UngappedExtender};
