//! Reference database handle. The on-disk random-access index format itself
//! is a named non-goal; this models the database as a streaming handle that
//! yields [`Block`] values plus a side-table [`Dictionary`] of titles, rather
//! than tying sequence storage to the dictionary's lifetime.
use std::io::Read;
use std::path::Path;

use bio::io::fasta;
use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::sequence::{Block, OId, Sequence};
use crate::util::open_maybe_gz;

/// Title/accession side table indexed by original id. Deliberately decoupled
/// from `Block` so it can be serialized and reloaded independently of any one
/// block's lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dictionary {
    titles: Vec<String>,
}

impl Dictionary {
    pub fn push(&mut self, title: String) -> OId {
        let id = self.titles.len() as OId;
        self.titles.push(title);
        id
    }

    pub fn title(&self, id: OId) -> &str {
        &self.titles[id as usize]
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// A reference database: a FASTA source read lazily, chunk by chunk, into
/// fixed-letter-budget [`Block`]s (mirrors `get_references`'s per-taxid slicing,
/// generalized to arbitrary chunk boundaries instead of one block per taxon).
pub struct Database<R: Read> {
    records: fasta::Records<std::io::BufReader<R>>,
}

impl Database<Box<dyn Read + Send>> {
    pub fn open(path: &str) -> SearchResult<Self> {
        let reader = open_maybe_gz(path)?;
        Ok(Database {
            records: fasta::Reader::new(reader).records(),
        })
    }
}

impl<R: Read> Database<R> {
    /// Reads records until at least `chunk_letters` letters have been
    /// accumulated (or the source is exhausted), appending each record's
    /// title to `dict` and returning the resulting block. `None` once there
    /// are no more records at all.
    pub fn next_block(
        &mut self,
        chunk_letters: usize,
        dict: &mut Dictionary,
    ) -> SearchResult<Option<Block>> {
        let mut block = Block::new();
        let mut letters = 0usize;

        while letters < chunk_letters {
            match self.records.next() {
                Some(record) => {
                    let record = record?;
                    letters += push_record(&mut block, dict, &record);
                }
                None => break,
            }
        }

        if block.is_empty() {
            Ok(None)
        } else {
            Ok(Some(block))
        }
    }
}

fn push_record(block: &mut Block, dict: &mut Dictionary, record: &fasta::Record) -> usize {
    let seq = Sequence::from_ascii(record.seq());
    let letters = seq.len() as usize;
    let title = match record.desc() {
        Some(desc) => format!("{} {}", record.id(), desc),
        None => record.id().to_string(),
    };
    let oid = dict.push(title);
    block.push(&seq, oid);
    letters
}

/// Loads an entire FASTA file into one `Block` plus its `Dictionary`. Used by
/// `makedb` for reference sets small enough to fit in memory whole, and by
/// tests.
pub fn load_whole(path: &Path) -> SearchResult<(Block, Dictionary)> {
    let mut db = Database::open(path.to_str().ok_or_else(|| {
        crate::error::SearchError::Configuration(format!("non-UTF8 path: {}", path.display()))
    })?)?;
    let mut dict = Dictionary::default();
    let mut block = Block::new();
    while let Some(next) = db.next_block(usize::MAX, &mut dict)? {
        for i in 0..next.len() {
            block.push(&Sequence::from_encoded(next.seqs.get(i).to_vec()), next.oid(i));
        }
    }
    Ok((block, dict))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fasta_file(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_whole_fasta_with_titles() {
        let f = fasta_file(">seq1 first\nMKTAYIAKQR\n>seq2 second\nMKTGAAAKQR\n");
        let (block, dict) = load_whole(f.path()).unwrap();
        assert_eq!(block.len(), 2);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.title(block.oid(0)), "seq1 first");
        assert_eq!(dict.title(block.oid(1)), "seq2 second");
    }

    #[test]
    fn next_block_respects_chunk_budget() {
        let f = fasta_file(">a\nMKT\n>b\nMKT\n>c\nMKT\n");
        let mut db = Database::open(f.path().to_str().unwrap()).unwrap();
        let mut dict = Dictionary::default();
        let first = db.next_block(4, &mut dict).unwrap().unwrap();
        assert_eq!(first.len(), 2); // 3 + 3 letters >= budget of 4 after the second record
        let second = db.next_block(4, &mut dict).unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert!(db.next_block(4, &mut dict).unwrap().is_none());
    }
}
