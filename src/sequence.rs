//! Sequence storage: `Sequence`, `SequenceSet`, and `Block`.
use crate::alphabet;
use crate::scoring::CompositionBias;

pub type Loc = i32;
pub type OId = u32;

/// A single alphabet-encoded sequence. Immutable once built.
#[derive(Debug, Clone)]
pub struct Sequence {
    letters: Vec<u8>,
}

impl Sequence {
    pub fn from_ascii(raw: &[u8]) -> Self {
        Sequence {
            letters: raw.iter().map(|&b| alphabet::encode(b)).collect(),
        }
    }

    pub fn from_encoded(letters: Vec<u8>) -> Self {
        Sequence { letters }
    }

    #[inline]
    pub fn len(&self) -> Loc {
        self.letters.len() as Loc
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    #[inline]
    pub fn letters(&self) -> &[u8] {
        &self.letters
    }

    #[inline]
    pub fn get(&self, i: Loc) -> u8 {
        self.letters[i as usize]
    }
}

/// Many sequences concatenated with index offsets, giving O(1) random access
/// by block-local id.
#[derive(Debug, Clone, Default)]
pub struct SequenceSet {
    data: Vec<u8>,
    offsets: Vec<usize>,
}

impl SequenceSet {
    pub fn new() -> Self {
        SequenceSet {
            data: Vec::new(),
            offsets: vec![0],
        }
    }

    pub fn push(&mut self, seq: &Sequence) {
        self.data.extend_from_slice(seq.letters());
        self.offsets.push(self.data.len());
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, local_id: usize) -> &[u8] {
        &self.data[self.offsets[local_id]..self.offsets[local_id + 1]]
    }

    /// Global offset of the first letter of `local_id`.
    #[inline]
    pub fn offset_of(&self, local_id: usize) -> usize {
        self.offsets[local_id]
    }

    #[inline]
    pub fn letter_at(&self, global_offset: usize) -> u8 {
        self.data[global_offset]
    }

    pub fn total_letters(&self) -> usize {
        self.data.len()
    }

    /// Global offset of the seed at `global_offset`, surrounded by `radius`
    /// letters on each side, clipped at sequence boundaries found by binary
    /// search over `offsets`. Used by stage-1 fingerprint extraction.
    pub fn bounds_of(&self, global_offset: usize) -> (usize, usize) {
        let idx = match self.offsets.binary_search(&global_offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (self.offsets[idx], self.offsets[idx + 1])
    }
}

/// A query or target block: a `SequenceSet` plus per-sequence metadata.
#[derive(Debug, Clone)]
pub struct Block {
    pub seqs: SequenceSet,
    pub original_ids: Vec<OId>,
    pub composition_bias: Vec<Option<CompositionBias>>,
    pub self_score: Vec<Option<i64>>,
}

impl Block {
    pub fn new() -> Self {
        Block {
            seqs: SequenceSet::new(),
            original_ids: Vec::new(),
            composition_bias: Vec::new(),
            self_score: Vec::new(),
        }
    }

    pub fn push(&mut self, seq: &Sequence, oid: OId) {
        self.seqs.push(seq);
        self.original_ids.push(oid);
        self.composition_bias.push(None);
        self.self_score.push(None);
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn oid(&self, local_id: usize) -> OId {
        self.original_ids[local_id]
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sequence_set_round_trips() {
        let mut set = SequenceSet::new();
        set.push(&Sequence::from_ascii(b"MKT"));
        set.push(&Sequence::from_ascii(b"PPPPPP"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).len(), 3);
        assert_eq!(set.get(1).len(), 6);
    }

    #[test]
    fn block_tracks_original_ids() {
        let mut block = Block::new();
        block.push(&Sequence::from_ascii(b"MKT"), 42);
        assert_eq!(block.oid(0), 42);
        assert_eq!(block.len(), 1);
    }

    #[test]
    fn bounds_of_clips_to_owning_sequence() {
        let mut set = SequenceSet::new();
        set.push(&Sequence::from_ascii(b"MKT"));
        set.push(&Sequence::from_ascii(b"PPPPPP"));
        assert_eq!(set.bounds_of(4), (3, 9));
    }
}
