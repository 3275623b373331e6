//! Stage 1: Hamming fingerprint filtering.
//!
//! Five kernel variants (`all_vs_all`, `all_vs_all_self`, and the
//! query/target-linearized forms dispatched by `run_tiled`) over a straight
//! byte comparison; a `dp::simd`-backed vectorized version could replace
//! `Fingerprint::match_count` without changing this module's API.
use crate::sequence::SequenceSet;

pub const FINGERPRINT_WIDTH: usize = 48;

/// 48 letters of sequence context centered on a seed location, padded with a
/// sentinel byte (`255`, outside the alphabet) at sequence boundaries so it
/// never spuriously matches real data.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprint {
    letters: [u8; FINGERPRINT_WIDTH],
}

const PAD: u8 = 255;

impl Fingerprint {
    pub fn extract(seqs: &SequenceSet, global_offset: usize) -> Self {
        let (lo, hi) = seqs.bounds_of(global_offset);
        let center = global_offset as isize;
        let half = (FINGERPRINT_WIDTH / 2) as isize;
        let mut letters = [PAD; FINGERPRINT_WIDTH];
        for i in 0..FINGERPRINT_WIDTH {
            let pos = center - half + i as isize;
            if pos >= lo as isize && pos < hi as isize {
                letters[i] = seqs.letter_at(pos as usize);
            }
        }
        Fingerprint { letters }
    }

    /// Number of positions at which the two fingerprints agree.
    #[inline]
    pub fn match_count(&self, other: &Fingerprint) -> u32 {
        self.letters
            .iter()
            .zip(other.letters.iter())
            .filter(|(a, b)| a == b)
            .count() as u32
    }
}

/// Which of the five stage-1 kernel shapes to run, mirroring
/// `stage1`/`stage1_query_lin`/`stage1_query_lin_ranked`/`stage1_target_lin`/`stage1_self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintMode {
    /// Full tile-wise all-vs-all comparison.
    Full,
    /// One query fingerprint vs. all target fingerprints.
    QueryLinear,
    /// All query fingerprints vs. one target fingerprint.
    TargetLinear,
    /// Self-alignment: compare the block against itself, upper triangle only.
    SelfUpperTriangle,
}

/// Runs stage 1 over one seed bucket, returning the indices into `targets`
/// that pass `hamming_filter_id`. `query`/`targets` are fingerprints already
/// extracted for the bucket's locations.
pub fn all_vs_all(
    query: &[Fingerprint],
    targets: &[Fingerprint],
    hamming_filter_id: u32,
) -> Vec<(usize, usize)> {
    let mut hits = Vec::new();
    for (i, q) in query.iter().enumerate() {
        for (j, t) in targets.iter().enumerate() {
            if q.match_count(t) >= hamming_filter_id {
                hits.push((i, j));
            }
        }
    }
    hits
}

/// Self-alignment variant: only the upper triangle `j > i` is compared, and
/// both sides are drawn from the same fingerprint slice.
pub fn all_vs_all_self(items: &[Fingerprint], hamming_filter_id: u32) -> Vec<(usize, usize)> {
    let mut hits = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if items[i].match_count(&items[j]) >= hamming_filter_id {
                hits.push((i, j));
            }
        }
    }
    hits
}

/// Runs the requested kernel over tiles of `tile_size`, matching the
/// tile-major iteration of `stage1`/`stage1_self` in the original source.
pub fn run_tiled(
    mode: FingerprintMode,
    query: &[Fingerprint],
    target: &[Fingerprint],
    tile_size: usize,
    hamming_filter_id: u32,
) -> Vec<(usize, usize)> {
    let mut hits = Vec::new();
    match mode {
        FingerprintMode::Full => {
            for qi in (0..query.len()).step_by(tile_size) {
                let qend = (qi + tile_size).min(query.len());
                for ti in (0..target.len()).step_by(tile_size) {
                    let tend = (ti + tile_size).min(target.len());
                    for (di, dj) in all_vs_all(&query[qi..qend], &target[ti..tend], hamming_filter_id)
                    {
                        hits.push((qi + di, ti + dj));
                    }
                }
            }
        }
        FingerprintMode::QueryLinear => {
            for ti in (0..target.len()).step_by(tile_size) {
                let tend = (ti + tile_size).min(target.len());
                for (_, dj) in all_vs_all(&query[..1], &target[ti..tend], hamming_filter_id) {
                    hits.push((0, ti + dj));
                }
            }
        }
        FingerprintMode::TargetLinear => {
            for qi in (0..query.len()).step_by(tile_size) {
                let qend = (qi + tile_size).min(query.len());
                for (di, _) in all_vs_all(&query[qi..qend], &target[..1], hamming_filter_id) {
                    hits.push((qi + di, 0));
                }
            }
        }
        FingerprintMode::SelfUpperTriangle => {
            for i in (0..target.len()).step_by(tile_size) {
                let iend = (i + tile_size).min(target.len());
                for (di, dj) in all_vs_all_self(&target[i..iend], hamming_filter_id) {
                    hits.push((i + di, i + dj));
                }
                for j in ((i + tile_size)..target.len()).step_by(tile_size) {
                    let jend = (j + tile_size).min(target.len());
                    for (di, dj) in
                        all_vs_all(&target[i..iend], &target[j..jend], hamming_filter_id)
                    {
                        hits.push((i + di, j + dj));
                    }
                }
            }
        }
    }
    hits
}

#[cfg(test)]
mod test {
    use super::*;

    fn fp_of(letters: &[u8]) -> Fingerprint {
        let mut set = SequenceSet::new();
        set.push(&crate::sequence::Sequence::from_encoded(letters.to_vec()));
        Fingerprint::extract(&set, FINGERPRINT_WIDTH / 2)
    }

    #[test]
    fn identical_fingerprints_match_fully() {
        let letters = vec![1u8; FINGERPRINT_WIDTH + 4];
        let fp = fp_of(&letters);
        assert_eq!(fp.match_count(&fp), FINGERPRINT_WIDTH as u32);
    }

    #[test]
    fn single_mismatch_drops_count_by_one() {
        let mut a = vec![1u8; FINGERPRINT_WIDTH + 4];
        let b = a.clone();
        a[10] = 2;
        let mut set = SequenceSet::new();
        set.push(&crate::sequence::Sequence::from_encoded(a));
        let fp_a = Fingerprint::extract(&set, FINGERPRINT_WIDTH / 2);
        let mut set_b = SequenceSet::new();
        set_b.push(&crate::sequence::Sequence::from_encoded(b));
        let fp_b = Fingerprint::extract(&set_b, FINGERPRINT_WIDTH / 2);
        assert_eq!(fp_a.match_count(&fp_b), FINGERPRINT_WIDTH as u32 - 1);
    }

    #[test]
    fn hamming_filter_id_threshold_boundary() {
        let mut a = vec![1u8; FINGERPRINT_WIDTH + 4];
        let mut b = a.clone();
        a[10] = 2;
        b[10] = 3;
        let mut set_a = SequenceSet::new();
        set_a.push(&crate::sequence::Sequence::from_encoded(a));
        let fp_a = Fingerprint::extract(&set_a, FINGERPRINT_WIDTH / 2);
        let mut set_b = SequenceSet::new();
        set_b.push(&crate::sequence::Sequence::from_encoded(b));
        let fp_b = Fingerprint::extract(&set_b, FINGERPRINT_WIDTH / 2);
        let hits = all_vs_all(&[fp_a], &[fp_b], 47);
        assert_eq!(hits.len(), 1);
        let hits = all_vs_all(&[fp_a], &[fp_b], 48);
        assert!(hits.is_empty());
    }

    #[test]
    fn self_mode_only_emits_upper_triangle() {
        let items: Vec<Fingerprint> = (0..4).map(|_| fp_of(&vec![1u8; FINGERPRINT_WIDTH + 4])).collect();
        let hits = all_vs_all_self(&items, 48);
        assert!(hits.iter().all(|(i, j)| j > i));
        assert_eq!(hits.len(), 6); // 4 choose 2
    }
}
