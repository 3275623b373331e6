//! Banded Smith-Waterman DP engine: a fast approximate score-only scan
//! (`swipe`), a seed-anchored banded extension built on top of it
//! (`anchored`), and an exact traceback pass (`traceback`) for confirmed
//! hits.
pub mod anchored;
pub mod hsp;
pub mod matrix;
pub mod simd;
pub mod swipe;
pub mod traceback;
pub mod traits;

pub use hsp::Hsp;
pub use traits::ScoreTraits;

/// A target queued for the DP engine: the sequence, its diagonal band, and an
/// optional seed anchor for the anchored extension path.
#[derive(Debug, Clone)]
pub struct DpTarget {
    pub target_idx: u32,
    pub sequence: Vec<u8>,
    pub d_begin: i32,
    pub d_end: i32,
    pub anchor: Option<anchored::Anchor>,
}

impl DpTarget {
    pub fn band(&self) -> i32 {
        self.d_end - self.d_begin
    }
}

/// A DP score bin saturated before the target finished; the driver re-queues
/// the target into the next wider bin. This is expected control flow, never
/// a [`crate::error::SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Saturation {
    pub target_idx: u32,
}
