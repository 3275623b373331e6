//! Anchored SWIPE: seed-anchored left/right banded extensions.
use crate::dp::hsp::Range;
use crate::dp::swipe::{self, Mode};
use crate::dp::traits::ScoreTraits;
use crate::dp::{DpTarget, Saturation};
use crate::scoring::{CompositionBias, LongScoreProfile};

/// A seed extension used as the center of a banded extension.
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    pub query_begin: i32,
    pub query_end: i32,
    pub subject_begin: i32,
    pub subject_end: i32,
    pub score: i32,
    pub d_min_left: i32,
    pub d_max_left: i32,
    pub d_min_right: i32,
    pub d_max_right: i32,
    pub prefix_score: i32,
}

impl Anchor {
    /// Band half-width for one side's extension: 15% of the anchor's diagonal
    /// spread, floored at a sensitivity-dependent minimum.
    pub fn band_width(d_min: i32, d_max: i32, sens_min: i32) -> i32 {
        (((d_max - d_min) as f64 * 0.15).round() as i32).max(sens_min)
    }
}

/// Result of one anchored extension: total score and the combined HSP ranges.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredResult {
    pub score: i64,
    pub query_range: Range,
    pub subject_range: Range,
}

/// Runs the right extension over `query[anchor.query_end..]` x
/// `target[anchor.subject_end..]`, and the left extension over the reversed
/// prefixes, then sums `anchor.score + right.score + left.score`.
pub fn extend<T: ScoreTraits>(
    anchor: &Anchor,
    query_profile: &LongScoreProfile,
    query_profile_rev: &LongScoreProfile,
    target: &[u8],
    gap_open: i32,
    gap_extend: i32,
    cbs: Option<&CompositionBias>,
    sens_min_band: i32,
) -> Result<AnchoredResult, Saturation> {
    let right_band = Anchor::band_width(anchor.d_min_right, anchor.d_max_right, sens_min_band);
    let left_band = Anchor::band_width(anchor.d_min_left, anchor.d_max_left, sens_min_band);

    let right_target = DpTarget {
        target_idx: 0,
        sequence: target[anchor.subject_end as usize..].to_vec(),
        d_begin: -right_band,
        d_end: right_band,
        anchor: None,
    };
    let right_profile_suffix = query_profile.suffix(anchor.query_end.max(0) as usize);
    let right = swipe::align::<T>(
        &right_profile_suffix,
        &right_target,
        gap_open,
        gap_extend,
        cbs,
        Mode::Local,
    )?
    .map(|r| (r.score, r.query_end, r.subject_end))
    .unwrap_or((0, 0, 0));

    let reversed_target: Vec<u8> = target[..anchor.subject_begin as usize]
        .iter()
        .rev()
        .copied()
        .collect();
    let left_target = DpTarget {
        target_idx: 0,
        sequence: reversed_target,
        d_begin: -left_band,
        d_end: left_band,
        anchor: None,
    };
    let left_from = (query_profile_rev.len() as i32 - anchor.query_begin).max(0) as usize;
    let left_profile_prefix = query_profile_rev.suffix(left_from);
    let left = swipe::align::<T>(
        &left_profile_prefix,
        &left_target,
        gap_open,
        gap_extend,
        cbs,
        Mode::Local,
    )?
    .map(|r| (r.score, r.query_end, r.subject_end))
    .unwrap_or((0, 0, 0));

    let total_score = anchor.prefix_score as i64 + right.0 as i64 + left.0 as i64;
    Ok(AnchoredResult {
        score: total_score,
        query_range: Range {
            begin: anchor.query_begin - left.1,
            end: anchor.query_end + right.1,
        },
        subject_range: Range {
            begin: anchor.subject_begin - left.2,
            end: anchor.subject_end + right.2,
        },
    })
}
