//! Partitioned seed arrays built over one sequence block and one shape.
use crate::alphabet;
use crate::sequence::Block;

use super::shape::Shape;
use super::{SeedValue, EMPTY_SEED};

/// A seed location: a 48-bit global offset plus the owning block-local
/// sequence id. Both fields are kept unconditionally; callers that only need
/// the offset ignore `seq_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedLoc {
    pub global_offset: u64,
    pub seq_id: u32,
}

/// All seed locations for one shape over one block, partitioned by a numeric
/// bucket of the seed value and sorted within each partition. A
/// `SeedHistogram` (the `partition_sizes` field) lets the seed-join iterator
/// address partitions directly without rescanning.
#[derive(Debug, Clone)]
pub struct SeedArray {
    partition_count: usize,
    partitions: Vec<Vec<(SeedValue, PackedLoc)>>,
}

impl SeedArray {
    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    pub fn partition(&self, i: usize) -> &[(SeedValue, PackedLoc)] {
        &self.partitions[i]
    }

    pub fn partition_sizes(&self) -> Vec<usize> {
        self.partitions.iter().map(|p| p.len()).collect()
    }

    fn bucket_of(seed: SeedValue, partition_count: usize) -> usize {
        (seed as usize) % partition_count
    }
}

/// Builds a `SeedArray` for one shape over `block`, applying a seed-complexity
/// cutoff (a minimum count of distinct letters within the shape's span) and
/// optional minimizer windowing.
///
/// The complexity cut is applied once here, at enumeration time, independent
/// of which side a later stage-1 kernel linearizes — it is a property of the
/// index, not of the kernel. (See DESIGN.md #1.)
pub struct SeedIndex;

impl SeedIndex {
    pub fn build(
        block: &Block,
        shape: &Shape,
        partition_count: usize,
        seed_complexity_cut: usize,
        minimizer_window: Option<usize>,
    ) -> SeedArray {
        let mut partitions: Vec<Vec<(SeedValue, PackedLoc)>> =
            vec![Vec::new(); partition_count.max(1)];
        let mut raw: Vec<(SeedValue, PackedLoc)> = Vec::new();

        for seq_id in 0..block.len() {
            let seq = block.seqs.get(seq_id);
            if seq.len() < shape.span() {
                continue;
            }
            for pos in 0..=(seq.len() - shape.span()) {
                if !passes_complexity_cut(seq, pos, shape.span(), seed_complexity_cut) {
                    continue;
                }
                let value = shape.seed_at(seq, pos);
                if value == EMPTY_SEED {
                    continue;
                }
                let global_offset = block.seqs.offset_of(seq_id) + pos;
                raw.push((
                    value,
                    PackedLoc {
                        global_offset: global_offset as u64,
                        seq_id: seq_id as u32,
                    },
                ));
            }
        }

        if let Some(window) = minimizer_window {
            raw = minimize(raw, window);
        }

        for (value, loc) in raw {
            let bucket = SeedArray::bucket_of(value, partitions.len());
            partitions[bucket].push((value, loc));
        }
        for p in &mut partitions {
            p.sort_unstable_by_key(|(v, _)| *v);
        }

        SeedArray {
            partition_count: partitions.len(),
            partitions,
        }
    }
}

fn passes_complexity_cut(seq: &[u8], pos: usize, span: usize, cut: usize) -> bool {
    if cut == 0 {
        return true;
    }
    let mut seen = [false; alphabet::ALPHABET_SIZE];
    let mut distinct = 0;
    for &letter in &seq[pos..pos + span] {
        let idx = letter as usize;
        if !seen[idx] {
            seen[idx] = true;
            distinct += 1;
        }
    }
    distinct >= cut
}

/// Retains, within each non-overlapping window of `window` consecutive seeds
/// (in array order), only the numerically smallest seed value.
fn minimize(
    mut raw: Vec<(SeedValue, PackedLoc)>,
    window: usize,
) -> Vec<(SeedValue, PackedLoc)> {
    if window <= 1 {
        return raw;
    }
    raw.sort_unstable_by_key(|(_, loc)| loc.global_offset);
    raw.chunks(window)
        .filter_map(|chunk| chunk.iter().min_by_key(|(v, _)| *v).copied())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sequence::Sequence;

    fn block_of(seqs: &[&[u8]]) -> Block {
        let mut b = Block::new();
        for (i, s) in seqs.iter().enumerate() {
            b.push(&Sequence::from_ascii(s), i as u32);
        }
        b
    }

    #[test]
    fn short_sequence_contributes_no_seeds() {
        let block = block_of(&[b"MK"]);
        let shape = Shape::contiguous(4);
        let arr = SeedIndex::build(&block, &shape, 4, 0, None);
        assert_eq!(arr.partition_sizes().iter().sum::<usize>(), 0);
    }

    #[test]
    fn identical_seeds_land_in_the_same_partition() {
        let block = block_of(&[b"MKTMKT"]);
        let shape = Shape::contiguous(3);
        let arr = SeedIndex::build(&block, &shape, 4, 0, None);
        let total: usize = arr.partition_sizes().iter().sum();
        assert_eq!(total, 4); // positions 0,1,2,3 each yield one seed
    }

    #[test]
    fn complexity_cut_filters_low_diversity_windows() {
        let block = block_of(&[b"AAAAAAAA"]);
        let shape = Shape::contiguous(4);
        let arr = SeedIndex::build(&block, &shape, 4, 2, None);
        assert_eq!(arr.partition_sizes().iter().sum::<usize>(), 0);
    }
}
