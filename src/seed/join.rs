//! Seed-join iterator: walks two partitioned seed arrays and yields the
//! buckets of locations sharing one seed value.
use super::index::{PackedLoc, SeedArray};
use super::SeedValue;

/// Forward iterator over matching `(query_bucket, target_bucket)` pairs.
/// Iteration order follows the partition order of the underlying arrays.
pub struct SeedJoinIterator<'a> {
    query: &'a SeedArray,
    target: &'a SeedArray,
    partition: usize,
    qi: usize,
    ti: usize,
}

/// One matched bucket: every location in `query` and `target` shares `seed`.
pub struct JoinBucket<'a> {
    pub seed: SeedValue,
    pub query: &'a [PackedLoc],
    pub target: &'a [PackedLoc],
}

impl<'a> SeedJoinIterator<'a> {
    pub fn new(query: &'a SeedArray, target: &'a SeedArray) -> Self {
        assert_eq!(
            query.partition_count(),
            target.partition_count(),
            "seed arrays must share a partition scheme to be joined"
        );
        SeedJoinIterator {
            query,
            target,
            partition: 0,
            qi: 0,
            ti: 0,
        }
    }

    fn advance_partition(&mut self) {
        self.partition += 1;
        self.qi = 0;
        self.ti = 0;
    }
}

impl<'a> Iterator for SeedJoinIterator<'a> {
    type Item = (SeedValue, Vec<PackedLoc>, Vec<PackedLoc>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.partition >= self.query.partition_count() {
                return None;
            }
            let qp = self.query.partition(self.partition);
            let tp = self.target.partition(self.partition);

            if self.qi >= qp.len() || self.ti >= tp.len() {
                self.advance_partition();
                continue;
            }

            let qv = qp[self.qi].0;
            let tv = tp[self.ti].0;

            if qv < tv {
                self.qi += 1;
                continue;
            }
            if tv < qv {
                self.ti += 1;
                continue;
            }

            // qv == tv: gather the full run of matching locations on both sides.
            let seed = qv;
            let q_start = self.qi;
            while self.qi < qp.len() && qp[self.qi].0 == seed {
                self.qi += 1;
            }
            let t_start = self.ti;
            while self.ti < tp.len() && tp[self.ti].0 == seed {
                self.ti += 1;
            }
            let query_locs: Vec<PackedLoc> =
                qp[q_start..self.qi].iter().map(|(_, l)| *l).collect();
            let target_locs: Vec<PackedLoc> =
                tp[t_start..self.ti].iter().map(|(_, l)| *l).collect();
            return Some((seed, query_locs, target_locs));
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::index::SeedIndex;
    use super::super::shape::Shape;
    use super::*;
    use crate::sequence::{Block, Sequence};

    fn block_of(seqs: &[&[u8]]) -> Block {
        let mut b = Block::new();
        for (i, s) in seqs.iter().enumerate() {
            b.push(&Sequence::from_ascii(s), i as u32);
        }
        b
    }

    #[test]
    fn empty_buckets_are_skipped() {
        let query = block_of(&[b"MKTMKT"]);
        let target = block_of(&[b"PPPPPP"]);
        let shape = Shape::contiguous(3);
        let qa = SeedIndex::build(&query, &shape, 4, 0, None);
        let ta = SeedIndex::build(&target, &shape, 4, 0, None);
        let matches: Vec<_> = SeedJoinIterator::new(&qa, &ta).collect();
        assert!(matches.is_empty());
    }

    #[test]
    fn shared_seed_joins_both_sides() {
        let query = block_of(&[b"MKTAAA"]);
        let target = block_of(&[b"ZZZMKTAAA"]);
        let shape = Shape::contiguous(3);
        let qa = SeedIndex::build(&query, &shape, 4, 0, None);
        let ta = SeedIndex::build(&target, &shape, 4, 0, None);
        let matches: Vec<_> = SeedJoinIterator::new(&qa, &ta).collect();
        assert!(!matches.is_empty());
        for (_, q, t) in &matches {
            assert!(!q.is_empty());
            assert!(!t.is_empty());
        }
    }
}
