//! Exact affine-gap local alignment with backward traceback.
//!
//! The banded engine in [`crate::dp::swipe`] is a fast, approximate score
//! scan used to screen candidates; once a candidate clears the e-value
//! threshold this module re-aligns the pair exactly (full `O(qlen * tlen)`,
//! no band) and walks the traceback to recover identities, mismatches, gap
//! opens, alignment length and an edit transcript.
use crate::dp::hsp::EditOp;
use crate::scoring::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trace {
    Diag,
    Up,
    Left,
}

/// A fully traced local alignment.
#[derive(Debug, Clone)]
pub struct TracedAlignment {
    pub score: i64,
    pub query_begin: i32,
    pub query_end: i32,
    pub subject_begin: i32,
    pub subject_end: i32,
    pub identities: u32,
    pub mismatches: u32,
    pub gap_opens: u32,
    pub length: u32,
    pub transcript: Vec<EditOp>,
}

/// Runs a full local (Smith-Waterman, affine-gap) alignment of `query`
/// against `target` and recovers the optimal traceback. Letters are alphabet
/// indices, not ASCII bytes. `None` if no positive-scoring alignment exists.
pub fn align_and_trace(
    query: &[u8],
    target: &[u8],
    matrix: &Matrix,
    gap_open: i32,
    gap_extend: i32,
) -> Option<TracedAlignment> {
    let qlen = query.len();
    let tlen = target.len();
    if qlen == 0 || tlen == 0 {
        return None;
    }

    let rows = qlen + 1;
    let cols = tlen + 1;
    let neg_inf = i64::MIN / 2;
    let gap_open = gap_open as i64;
    let gap_extend = gap_extend as i64;

    let mut h = vec![0i64; rows * cols];
    let mut e = vec![neg_inf; rows * cols];
    let mut f = vec![neg_inf; rows * cols];
    let mut trace = vec![Trace::Diag; rows * cols];
    let idx = |i: usize, j: usize| i * cols + j;

    let mut best = 0i64;
    let mut best_i = 0usize;
    let mut best_j = 0usize;

    for i in 1..rows {
        for j in 1..cols {
            let diag = h[idx(i - 1, j - 1)] + matrix.score(query[i - 1], target[j - 1]) as i64;
            let e_val = (h[idx(i, j - 1)] - gap_open).max(e[idx(i, j - 1)] - gap_extend);
            let f_val = (h[idx(i - 1, j)] - gap_open).max(f[idx(i - 1, j)] - gap_extend);
            e[idx(i, j)] = e_val;
            f[idx(i, j)] = f_val;

            let cell = diag.max(e_val).max(f_val).max(0);
            let t = if cell != 0 && cell == diag {
                Trace::Diag
            } else if cell != 0 && cell == e_val {
                Trace::Left
            } else {
                Trace::Up
            };
            h[idx(i, j)] = cell;
            trace[idx(i, j)] = t;

            if cell > best {
                best = cell;
                best_i = i;
                best_j = j;
            }
        }
    }

    if best == 0 {
        return None;
    }

    let mut ops = Vec::new();
    let mut identities = 0u32;
    let mut mismatches = 0u32;
    let mut gap_opens = 0u32;
    let (mut i, mut j) = (best_i, best_j);
    while i > 0 && j > 0 && h[idx(i, j)] != 0 {
        match trace[idx(i, j)] {
            Trace::Diag => {
                if query[i - 1] == target[j - 1] {
                    identities += 1;
                    ops.push(EditOp::Match);
                } else {
                    mismatches += 1;
                    ops.push(EditOp::Mismatch);
                }
                i -= 1;
                j -= 1;
            }
            Trace::Left => {
                if h[idx(i, j - 1)] - gap_open == e[idx(i, j)] {
                    gap_opens += 1;
                }
                ops.push(EditOp::Deletion);
                j -= 1;
            }
            Trace::Up => {
                if h[idx(i - 1, j)] - gap_open == f[idx(i, j)] {
                    gap_opens += 1;
                }
                ops.push(EditOp::Insertion);
                i -= 1;
            }
        }
    }
    ops.reverse();
    let length = ops.len() as u32;

    Some(TracedAlignment {
        score: best,
        query_begin: i as i32,
        query_end: best_i as i32,
        subject_begin: j as i32,
        subject_end: best_j as i32,
        identities,
        mismatches,
        gap_opens,
        length,
        transcript: ops,
    })
}

/// Replays a transcript against the scoring matrix and returns its score,
/// used to cross-check a [`TracedAlignment`] against the DP's own result.
pub fn rescore(
    transcript: &[EditOp],
    query: &[u8],
    target: &[u8],
    matrix: &Matrix,
    gap_open: i32,
    gap_extend: i32,
) -> i64 {
    let mut score = 0i64;
    let mut qi = 0usize;
    let mut ti = 0usize;
    let mut in_gap = false;
    for op in transcript {
        match op {
            EditOp::Match | EditOp::Mismatch => {
                score += matrix.score(query[qi], target[ti]) as i64;
                qi += 1;
                ti += 1;
                in_gap = false;
            }
            EditOp::Deletion => {
                score -= if in_gap { gap_extend as i64 } else { gap_open as i64 };
                ti += 1;
                in_gap = true;
            }
            EditOp::Insertion => {
                score -= if in_gap { gap_extend as i64 } else { gap_open as i64 };
                qi += 1;
                in_gap = true;
            }
        }
    }
    score
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode(letters: &[u8]) -> Vec<u8> {
        crate::alphabet::encode_sequence(letters).unwrap()
    }

    #[test]
    fn identical_sequence_traces_all_matches() {
        let m = Matrix::blosum62(11, 1);
        let seq = encode(b"MKT");
        let traced = align_and_trace(&seq, &seq, &m, 11, 1).unwrap();
        assert_eq!(traced.score, 15);
        assert_eq!(traced.identities, 3);
        assert_eq!(traced.mismatches, 0);
        assert_eq!(traced.gap_opens, 0);
        assert_eq!(traced.length, 3);
    }

    #[test]
    fn single_mismatch_is_counted_exactly() {
        let m = Matrix::blosum62(11, 1);
        let query = encode(b"MKT");
        let target = encode(b"MET");
        let traced = align_and_trace(&query, &target, &m, 11, 1).unwrap();
        assert_eq!(traced.score, 11); // M/M + K/E + T/T = 5 + 1 + 5
        assert_eq!(traced.identities, 2);
        assert_eq!(traced.mismatches, 1);
        assert_eq!(traced.gap_opens, 0);
        assert_eq!(traced.length, 3);
    }

    #[test]
    fn insertion_in_target_is_absorbed_by_a_cheaper_substitution() {
        // MKTAAA vs MKTGAAA. A real BLOSUM62 local aligner never pays the
        // gap_open=11 cost here: substituting A for G costs 0, so the optimal
        // local alignment runs straight through (M/M, K/K, T/T, A/G, A/A,
        // A/A) and leaves the target's trailing A unaligned, scoring higher
        // than any alignment that opens a gap over the inserted G.
        let m = Matrix::blosum62(11, 1);
        let query = encode(b"MKTAAA");
        let target = encode(b"MKTGAAA");
        let traced = align_and_trace(&query, &target, &m, 11, 1).unwrap();
        assert_eq!(traced.score, 23);
        assert_eq!(traced.identities, 5);
        assert_eq!(traced.mismatches, 1);
        assert_eq!(traced.gap_opens, 0);
        assert_eq!(traced.length, 6);
        assert_eq!(traced.query_end, 6);
        assert_eq!(traced.subject_end, 6);
    }

    #[test]
    fn rescore_matches_traced_score() {
        let m = Matrix::blosum62(11, 1);
        let query = encode(b"MKTAAA");
        let target = encode(b"MKTGAAA");
        let traced = align_and_trace(&query, &target, &m, 11, 1).unwrap();
        let q_slice = &query[traced.query_begin as usize..traced.query_end as usize];
        let t_slice = &target[traced.subject_begin as usize..traced.subject_end as usize];
        let replayed = rescore(&traced.transcript, q_slice, t_slice, &m, 11, 1);
        assert_eq!(replayed, traced.score);
    }
}
