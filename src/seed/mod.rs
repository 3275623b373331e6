//! Spaced-seed indexing and seed-joining.
pub mod index;
pub mod join;
pub mod shape;

pub use index::{SeedArray, SeedIndex};
pub use join::SeedJoinIterator;
pub use shape::Shape;

/// A seed is the alphabet-radix encoding of the letters a shape selects at one
/// sequence position, folded into a single integer for sorting/bucketing.
pub type SeedValue = u64;

/// Sentinel for a masked-out or invalid seed position.
pub const EMPTY_SEED: SeedValue = u64::MAX;
