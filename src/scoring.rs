//! Scoring substrate: matrix lookups, composition-biased profiles, and
//! Scoring matrices, long score profiles, composition bias, and
//! Karlin-Altschul statistics.
use crate::alphabet::ALPHABET_SIZE;

/// BLOSUM62 over the 20 standard amino acids, embedded in the 32-symbol
/// alphabet with zero score against ambiguity/gap/mask/unknown symbols.
/// Row/column order matches `alphabet::AMINO_ACID_LETTERS`.
pub struct Matrix {
    table: [[i8; ALPHABET_SIZE]; ALPHABET_SIZE],
    pub gap_open: i32,
    pub gap_extend: i32,
}

const BLOSUM62_20: [[i8; 20]; 20] = [
    [4,-1,-2,-2, 0,-1,-1, 0,-2,-1,-1,-1,-1,-2,-1, 1, 0,-3,-2, 0],
    [-1,5, 0,-2,-3, 1, 0,-2, 0,-3,-2, 2,-1,-3,-2,-1,-1,-3,-2,-3],
    [-2,0, 6, 1,-3, 0, 0, 0, 1,-3,-3, 0,-2,-3,-2, 1, 0,-4,-2,-3],
    [-2,-2,1, 6,-3, 0, 2,-1,-1,-3,-4,-1,-3,-3,-1, 0,-1,-4,-3,-3],
    [0,-3,-3,-3, 9,-3,-4,-3,-3,-1,-1,-3,-1,-2,-3,-1,-1,-2,-2,-1],
    [-1,1, 0, 0,-3, 5, 2,-2, 0,-3,-2, 1, 0,-3,-1, 0,-1,-2,-1,-2],
    [-1,0, 0, 2,-4, 2, 5,-2, 0,-3,-3, 1,-2,-3,-1, 0,-1,-3,-2,-2],
    [0,-2,0,-1,-3,-2,-2, 6,-2,-4,-4,-2,-3,-3,-2, 0,-2,-2,-3,-3],
    [-2,0,1,-1,-3, 0, 0,-2, 8,-3,-3,-1,-2,-1,-2,-1,-2,-2, 2,-3],
    [-1,-3,-3,-3,-1,-3,-3,-4,-3, 4, 2,-3, 1, 0,-3,-2,-1,-3,-1, 3],
    [-1,-2,-3,-4,-1,-2,-3,-4,-3, 2, 4,-2, 2, 0,-3,-2,-1,-2,-1, 1],
    [-1,2, 0,-1,-3, 1, 1,-2,-1,-3,-2, 5,-1,-3,-1, 0,-1,-3,-2,-2],
    [-1,-1,-2,-3,-1, 0,-2,-3,-2, 1, 2,-1, 5, 0,-2,-1,-1,-1,-1, 1],
    [-2,-3,-3,-3,-2,-3,-3,-3,-1, 0, 0,-3, 0, 6,-4,-2,-2, 1, 3,-1],
    [-1,-2,-2,-1,-3,-1,-1,-2,-2,-3,-3,-1,-2,-4, 7,-1,-1,-4,-3,-2],
    [1,-1,1, 0,-1, 0, 0, 0,-1,-2,-2, 0,-1,-2,-1, 4, 1,-3,-2,-2],
    [0,-1,0,-1,-1,-1,-1,-2,-2,-1,-1,-1,-1,-2,-1, 1, 5,-2,-2, 0],
    [-3,-3,-4,-4,-2,-2,-3,-2,-2,-3,-2,-3,-1, 1,-4,-3,-2,11, 2,-3],
    [-2,-2,-2,-3,-2,-1,-2,-3, 2,-1,-1,-2,-1, 3,-3,-2,-2, 2, 7,-1],
    [0,-3,-3,-3,-1,-2,-2,-3,-3, 3, 1,-2, 1,-1,-2,-2, 0,-3,-1, 4],
];

impl Matrix {
    pub fn blosum62(gap_open: i32, gap_extend: i32) -> Self {
        let mut table = [[0i8; ALPHABET_SIZE]; ALPHABET_SIZE];
        for i in 0..20 {
            for j in 0..20 {
                table[i][j] = BLOSUM62_20[i][j];
            }
        }
        Matrix {
            table,
            gap_open,
            gap_extend,
        }
    }

    #[inline]
    pub fn score(&self, a: u8, b: u8) -> i32 {
        self.table[a as usize][b as usize] as i32
    }

    /// Self-alignment score of a letter, used by the band=1 boundary test.
    #[inline]
    pub fn self_score(&self, a: u8) -> i32 {
        self.score(a, a)
    }

    pub fn self_alignment_score(&self, seq: &[u8]) -> i64 {
        seq.iter().map(|&a| self.self_score(a) as i64).sum()
    }

    /// Builds a `LongScoreProfile`: for each query position, the 32 scores
    /// against every alphabet letter, with one byte of -1 padding on each
    /// side so windowed SIMD loads never read undefined memory.
    pub fn build_profile(&self, query: &[u8]) -> LongScoreProfile {
        let mut rows = Vec::with_capacity(query.len() + 2);
        rows.push([-1i8; ALPHABET_SIZE]);
        for &q in query {
            let mut row = [-1i8; ALPHABET_SIZE];
            for t in 0..ALPHABET_SIZE {
                row[t] = self.table[q as usize][t];
            }
            rows.push(row);
        }
        rows.push([-1i8; ALPHABET_SIZE]);
        LongScoreProfile { rows }
    }
}

/// Precomputed per-position scores against every alphabet letter.
#[derive(Debug, Clone)]
pub struct LongScoreProfile {
    rows: Vec<[i8; ALPHABET_SIZE]>,
}

impl LongScoreProfile {
    /// Row for 1-based query position `i` (`0` and `len+1` are the padding rows).
    #[inline]
    pub fn row(&self, i: usize) -> &[i8; ALPHABET_SIZE] {
        &self.rows[i]
    }

    pub fn reversed(&self) -> LongScoreProfile {
        let mut rows = self.rows.clone();
        rows.reverse();
        LongScoreProfile { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len().saturating_sub(2)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A profile over the suffix starting at query position `from` (0-based),
    /// reusing this profile's rows and padding convention. Used by the
    /// anchored extension to slice out the left/right halves of a query
    /// profile without re-scoring from the original letters.
    pub fn suffix(&self, from: usize) -> LongScoreProfile {
        let from = from.min(self.len());
        let mut rows = Vec::with_capacity(self.len() - from + 2);
        rows.push([-1i8; ALPHABET_SIZE]);
        rows.extend_from_slice(&self.rows[from + 1..self.rows.len() - 1]);
        rows.push([-1i8; ALPHABET_SIZE]);
        LongScoreProfile { rows }
    }
}

/// Composition bias: a per-query-position integer offset added to the raw
/// substitution score before gap/band logic.
#[derive(Debug, Clone, Default)]
pub struct CompositionBias {
    pub offsets: Vec<i32>,
}

impl CompositionBias {
    pub fn none(len: usize) -> Self {
        CompositionBias {
            offsets: vec![0; len],
        }
    }

    #[inline]
    pub fn at(&self, i: usize) -> i32 {
        self.offsets.get(i).copied().unwrap_or(0)
    }
}

/// Karlin-Altschul bit-score and E-value conversion. Lambda/K are looked up
/// once per matrix; BLOSUM62 with gap_open=11/gap_extend=1 uses the standard
/// published constants.
#[derive(Debug, Clone, Copy)]
pub struct KarlinAltschul {
    pub lambda: f64,
    pub k: f64,
}

impl KarlinAltschul {
    pub const BLOSUM62_GAPPED: KarlinAltschul = KarlinAltschul {
        lambda: 0.267,
        k: 0.041,
    };

    pub fn bitscore(&self, raw_score: i64) -> f64 {
        (self.lambda * raw_score as f64 - self.k.ln()) / std::f64::consts::LN_2
    }

    /// E-value for a raw score over a search space of `qlen * tlen` (or the
    /// database's total letter count for one-vs-many searches).
    pub fn evalue(&self, raw_score: i64, qlen: u32, tlen: u32) -> f64 {
        let search_space = qlen as f64 * tlen as f64;
        self.k * search_space * (-self.lambda * raw_score as f64).exp()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blosum62_identity_scores_are_positive() {
        let m = Matrix::blosum62(11, 1);
        assert_eq!(m.score(0, 0), 4); // A/A
    }

    #[test]
    fn profile_padding_is_sentinel() {
        let m = Matrix::blosum62(11, 1);
        let profile = m.build_profile(&[0, 1, 2]);
        assert_eq!(profile.row(0), &[-1i8; ALPHABET_SIZE]);
        assert_eq!(profile.len(), 3);
    }

    #[test]
    fn evalue_decreases_with_score() {
        let ka = KarlinAltschul::BLOSUM62_GAPPED;
        let low = ka.evalue(20, 100, 100);
        let high = ka.evalue(100, 100, 100);
        assert!(high < low);
    }
}
