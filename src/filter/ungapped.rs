//! Stage 2: ungapped window extension.
//!
//! A windowed local-max scan around each surviving stage-1 seed location,
//! scored one pair at a time; the pipeline driver calls it once per
//! surviving stage-1 hit. A SIMD multi-channel version of the same scan is a
//! natural future optimization but is not required for correctness.
use crate::scoring::Matrix;
use crate::sequence::SequenceSet;

/// Score cutoff for an ungapped extension, scaled down for short queries so
/// short reads are not unfairly penalized (mirrors `ungapped_cutoff(qlen)`).
pub fn ungapped_cutoff(qlen: i32, base_cutoff: i32) -> i32 {
    if qlen < 50 {
        (base_cutoff as f64 * (qlen as f64 / 50.0)).round() as i32
    } else {
        base_cutoff
    }
}

/// Neutral mask letter substituted at clipped window edges; scores no better
/// than any real pair against any letter.
const MASK_SCORE: i32 = 0;

pub struct UngappedExtender<'a> {
    matrix: &'a Matrix,
    window: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UngappedHit {
    pub score: i32,
    pub query_offset: i32,
    pub target_offset: i32,
}

impl<'a> UngappedExtender<'a> {
    pub fn new(matrix: &'a Matrix, window: i32) -> Self {
        UngappedExtender { matrix, window }
    }

    /// Extends a seed hit at `(query_offset, target_offset)` within clipped
    /// windows of up to `self.window` letters on each side, tracking the
    /// best running score (a one-dimensional local-max scan, the scalar
    /// equivalent of the SIMD channel scan in `search_query_offset`).
    pub fn extend(
        &self,
        query: &SequenceSet,
        query_seq: usize,
        query_offset: i32,
        target: &SequenceSet,
        target_global_offset: usize,
    ) -> UngappedHit {
        let q_bytes = query.get(query_seq);
        let (t_lo, t_hi) = target.bounds_of(target_global_offset);
        let t_local = target_global_offset - t_lo;
        let t_bytes = &target_raw(target, t_lo, t_hi)[..];

        let mut running = 0i32;
        let mut best = 0i32;
        let mut best_delta = 0i32;

        for delta in -(self.window)..=self.window {
            let qi = query_offset + delta;
            let ti = t_local as i32 + delta;
            let score = if qi < 0 || qi as usize >= q_bytes.len() || ti < 0 || ti as usize >= t_bytes.len()
            {
                MASK_SCORE
            } else {
                self.matrix.score(q_bytes[qi as usize], t_bytes[ti as usize])
            };
            running += score;
            if running < 0 {
                running = 0;
            }
            if running > best {
                best = running;
                best_delta = delta;
            }
        }

        UngappedHit {
            score: best,
            query_offset: query_offset + best_delta,
            target_offset: t_local as i32 + best_delta,
        }
    }
}

fn target_raw(seqs: &SequenceSet, lo: usize, hi: usize) -> Vec<u8> {
    (lo..hi).map(|g| seqs.letter_at(g)).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sequence::Sequence;

    #[test]
    fn cutoff_scales_down_for_short_queries() {
        assert!(ungapped_cutoff(20, 100) < ungapped_cutoff(200, 100));
    }

    #[test]
    fn identical_window_scores_positively() {
        let matrix = Matrix::blosum62(11, 1);
        let mut set = SequenceSet::new();
        set.push(&Sequence::from_ascii(b"MKTMKTMKT"));
        let extender = UngappedExtender::new(&matrix, 4);
        let hit = extender.extend(&set, 0, 4, &set, 4);
        assert!(hit.score > 0);
    }
}
