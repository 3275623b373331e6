//! The banded affine-gap SWIPE recurrence: diagonal score plus composition
//! bias, maxed against the horizontal/vertical gap states, saturated, then
//! the gap states decay by `gap_extend` and a fresh gap may open at
//! `current - gap_open`. This module runs that recurrence one target at a
//! time; `dp::simd::SimdVector` is the seam where a future batched
//! implementation would process `T::CHANNELS` targets per call instead.
use crate::dp::matrix::ScoreOnlyMatrix;
use crate::dp::traits::ScoreTraits;
use crate::dp::{DpTarget, Saturation};
use crate::scoring::{CompositionBias, LongScoreProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Smith-Waterman local alignment: cells floor at zero.
    Local,
    /// Semi-global: no zero floor, the previous cell's value carries through.
    SemiGlobal,
}

/// Raw result of one banded DP pass: best score and its column/row, before
/// E-value/bitscore conversion (done by the caller once it knows qlen/tlen).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAlignment {
    pub score: i64,
    pub query_end: i32,
    pub subject_end: i32,
}

/// Runs the banded affine-gap recurrence for one query profile against one
/// `DpTarget`, in score width `T`. Returns `Err(Saturation)` if any cell's
/// true score would exceed `T::MAX`, signaling the driver to re-dispatch this
/// target to the next wider bin.
pub fn align<T: ScoreTraits>(
    profile: &LongScoreProfile,
    target: &DpTarget,
    gap_open: i32,
    gap_extend: i32,
    cbs: Option<&CompositionBias>,
    mode: Mode,
) -> Result<Option<RawAlignment>, Saturation> {
    let qlen = profile.len() as i32;
    let tlen = target.sequence.len() as i32;
    if qlen == 0 || tlen == 0 {
        return Ok(None);
    }

    let d_begin = target.d_begin.max(-(qlen - 1));
    let d_end = target.d_end.min(tlen);
    if d_begin >= d_end {
        return Ok(None);
    }
    let band = (d_end - d_begin) as usize;

    let gap_open_t = T::from_i32(gap_open);
    let gap_extend_t = T::from_i32(gap_extend);

    let mut matrix = ScoreOnlyMatrix::<T>::new(band + 1);
    let mut h_gap = vec![T::MIN; band + 1];
    let mut best = T::ZERO;
    let mut best_i = 0i32;
    let mut best_j = 0i32;
    let mut saturated = false;

    // One column per target position j = 0..tlen. Row r within the column
    // corresponds to query position i = j - d_begin - r (so r=0 is the top of
    // the band, decreasing diagonal as r increases).
    for j in 0..tlen {
        matrix.advance();
        let mut v_gap = T::MIN;
        let prev_col = matrix.prev_row().to_vec();

        for r in 0..band {
            let i = j - d_begin - r as i32;
            if i < 0 || i >= qlen {
                continue;
            }
            let letter = target.sequence[j as usize];
            let raw_score = profile.row((i + 1) as usize)[letter as usize] as i32;
            let bias = cbs.map(|c| c.at(i as usize)).unwrap_or(0);
            let diag = if j == 0 { T::ZERO } else { prev_col[r] };

            let (mut sum, overflow1) = diag.saturating_add(T::from_i32(raw_score + bias));
            if overflow1 {
                saturated = true;
            }
            sum = sum.max(h_gap[r]);
            sum = sum.max(v_gap);
            if mode == Mode::Local {
                sum = sum.max(T::ZERO);
            }

            matrix.curr_row_mut()[r] = sum;
            if sum > best {
                best = sum;
                best_i = i;
                best_j = j;
            }

            let opened = sum.saturating_sub(gap_open_t);
            h_gap[r] = h_gap[r].saturating_sub(gap_extend_t).max(opened);
            v_gap = v_gap.saturating_sub(gap_extend_t).max(opened);
        }
    }

    if saturated {
        return Err(Saturation {
            target_idx: target.target_idx,
        });
    }

    if best == T::ZERO {
        return Ok(None);
    }

    Ok(Some(RawAlignment {
        score: best.to_i32() as i64,
        query_end: best_i + 1,
        subject_end: best_j + 1,
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dp::DpTarget;
    use crate::scoring::Matrix;

    fn target_of(seq: &[u8], d_begin: i32, d_end: i32) -> DpTarget {
        DpTarget {
            target_idx: 0,
            sequence: seq.to_vec(),
            d_begin,
            d_end,
            anchor: None,
        }
    }

    #[test]
    fn identical_sequences_on_main_diagonal_score_self_score() {
        let m = Matrix::blosum62(11, 1);
        let seq = vec![0u8, 1, 2]; // MKT-ish indices
        let profile = m.build_profile(&seq);
        let target = target_of(&seq, 0, 1);
        let result = align::<i16>(&profile, &target, 11, 1, None, Mode::Local)
            .unwrap()
            .unwrap();
        let expected = m.self_alignment_score(&seq);
        assert_eq!(result.score, expected);
    }

    #[test]
    fn mismatch_reduces_score_below_identical() {
        let m = Matrix::blosum62(11, 1);
        let query = vec![0u8, 1, 2]; // M K T alphabet indices per BLOSUM62_20 order (A R N D...)
        let target_seq = vec![0u8, 1, 2];
        let mut mismatched = target_seq.clone();
        mismatched[1] = 4; // swap one letter
        let profile = m.build_profile(&query);

        let ident = align::<i16>(
            &profile,
            &target_of(&target_seq, 0, 1),
            11,
            1,
            None,
            Mode::Local,
        )
        .unwrap()
        .unwrap();
        let mismatch = align::<i16>(
            &profile,
            &target_of(&mismatched, 0, 1),
            11,
            1,
            None,
            Mode::Local,
        )
        .unwrap()
        .unwrap();
        assert!(mismatch.score <= ident.score);
    }

    #[test]
    fn empty_target_yields_no_alignment() {
        let m = Matrix::blosum62(11, 1);
        let profile = m.build_profile(&[0, 1, 2]);
        let result = align::<i16>(&profile, &target_of(&[], 0, 1), 11, 1, None, Mode::Local).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn narrow_bin_saturates_on_long_identical_sequence() {
        let m = Matrix::blosum62(11, 1);
        let seq = vec![7u8; 200]; // G is a positive self-score letter
        let profile = m.build_profile(&seq);
        let target = target_of(&seq, 0, 1);
        let result = align::<i8>(&profile, &target, 11, 1, None, Mode::Local);
        assert!(result.is_err());
    }

    fn encode(letters: &[u8]) -> Vec<u8> {
        crate::alphabet::encode_sequence(letters).unwrap()
    }

    #[test]
    fn mkt_against_itself_scores_fifteen() {
        let m = Matrix::blosum62(11, 1);
        let seq = encode(b"MKT");
        let profile = m.build_profile(&seq);
        let result = align::<i16>(&profile, &target_of(&seq, 0, 1), 11, 1, None, Mode::Local)
            .unwrap()
            .unwrap();
        assert_eq!(result.score, 15); // M/M + K/K + T/T = 5 + 5 + 5
    }

    #[test]
    fn met_against_mkt_scores_eleven() {
        let m = Matrix::blosum62(11, 1);
        let query = encode(b"MKT");
        let target = encode(b"MET");
        let profile = m.build_profile(&query);
        let result = align::<i16>(&profile, &target_of(&target, 0, 1), 11, 1, None, Mode::Local)
            .unwrap()
            .unwrap();
        assert_eq!(result.score, 11); // M/M + K/E + T/T = 5 + 1 + 5
    }

    #[test]
    fn widening_the_band_never_scores_below_the_single_diagonal_it_contains() {
        // This checks only a structural property of the fast approximate
        // banded scan (widening the band is monotonic); the exact score for
        // this pair — and the identities/mismatches/gap count the real
        // aligner settles on — is pinned in `dp::traceback`'s tests instead,
        // since only the full unbanded traceback pass produces those stats.
        //
        // MKTAAA vs MKTGAAA (one residue inserted in the target): every
        // alignment reachable on the single main diagonal is also reachable
        // once the band is widened to include the off-by-one diagonal the
        // insertion shifts onto, so the wider band can only match or beat it.
        let m = Matrix::blosum62(11, 1);
        let query = encode(b"MKTAAA");
        let target = encode(b"MKTGAAA");
        let profile = m.build_profile(&query);

        let widened = align::<i16>(&profile, &target_of(&target, -1, 2), 11, 1, None, Mode::Local)
            .unwrap()
            .unwrap();
        let single_diagonal = align::<i16>(&profile, &target_of(&target, 0, 1), 11, 1, None, Mode::Local)
            .unwrap()
            .unwrap();
        assert!(widened.score >= single_diagonal.score);
    }
}
