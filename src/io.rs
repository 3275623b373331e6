//! Query source reading and result sinks: the per-HSP binary record sink and
//! the clustering TSV writer, plus gzip-transparent FASTA/FASTQ auto-detect
//! and a pair of bincode-to-file helpers.
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bio::io::{fasta, fastq};
use serde::{de::DeserializeOwned, Serialize};

use crate::cluster::{Edge, Mapping};
use crate::db::Dictionary;
use crate::error::{SearchError, SearchResult};
use crate::sequence::{OId, Sequence};
use crate::util::open_maybe_gz;

/// A query record independent of whether it came from FASTA or FASTQ.
pub struct QueryRecord {
    pub title: String,
    pub sequence: Sequence,
}

enum FastxReader {
    Fasta(fasta::Reader<std::io::BufReader<Box<dyn Read + Send>>>),
    Fastq(fastq::Reader<std::io::BufReader<Box<dyn Read + Send>>>),
}

/// Reads a query file, auto-detecting FASTA vs. FASTQ from the leading byte:
/// the leading `>` vs `@` is unambiguous, so a one-byte probe read suffices.
pub struct QuerySource {
    reader: FastxReader,
}

impl QuerySource {
    pub fn open(path: &str) -> SearchResult<Self> {
        let mut probe = open_maybe_gz(path)?;
        let mut first_byte = [0u8; 1];
        let n = probe.read(&mut first_byte)?;
        if n == 0 {
            return Err(SearchError::Configuration(format!("empty query file: {path}")));
        }

        let reader = open_maybe_gz(path)?;
        let reader = match first_byte[0] {
            b'>' => FastxReader::Fasta(fasta::Reader::new(reader)),
            b'@' => FastxReader::Fastq(fastq::Reader::new(reader)),
            other => {
                return Err(SearchError::Configuration(format!(
                    "unrecognized query file format (leading byte {other:#x})"
                )))
            }
        };
        Ok(QuerySource { reader })
    }

    /// Reads the next query record, or `None` at end of input.
    pub fn next_record(&mut self) -> SearchResult<Option<QueryRecord>> {
        match &mut self.reader {
            FastxReader::Fasta(r) => {
                let mut record = fasta::Record::new();
                r.read(&mut record)?;
                if record.is_empty() {
                    return Ok(None);
                }
                let title = match record.desc() {
                    Some(desc) => format!("{} {}", record.id(), desc),
                    None => record.id().to_string(),
                };
                Ok(Some(QueryRecord {
                    title,
                    sequence: Sequence::from_ascii(record.seq()),
                }))
            }
            FastxReader::Fastq(r) => {
                let mut record = fastq::Record::new();
                r.read(&mut record)?;
                if record.is_empty() {
                    return Ok(None);
                }
                let title = match record.desc() {
                    Some(desc) => format!("{} {}", record.id(), desc),
                    None => record.id().to_string(),
                };
                Ok(Some(QueryRecord {
                    title,
                    sequence: Sequence::from_ascii(record.seq()),
                }))
            }
        }
    }
}

/// Appends `edges` to a binary sink of fixed-size edge records.
pub fn write_edges<W: Write>(writer: &mut W, edges: &[Edge]) -> SearchResult<()> {
    for edge in edges {
        writer.write_all(&edge.to_bytes())?;
    }
    Ok(())
}

/// Reads a whole edge stream back out of a 24-byte-record binary sink.
pub fn read_edges<R: Read>(reader: &mut R) -> SearchResult<Vec<Edge>> {
    let mut edges = Vec::new();
    let mut buf = [0u8; Edge::WIRE_SIZE];
    loop {
        match reader.read_exact(&mut buf) {
            Ok(()) => edges.push(Edge::from_bytes(&buf)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(edges)
}

/// Writes a cascaded-clustering mapping as `centroid_acc \t member_acc` lines,
/// one line per member including the centroid's own self-referencing line.
pub fn write_clustering_tsv(path: &Path, mapping: &Mapping, dict: &Dictionary) -> SearchResult<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    for (member, &centroid) in mapping.iter().enumerate() {
        let member = member as OId;
        writeln!(out, "{}\t{}", dict.title(centroid), dict.title(member))?;
    }
    Ok(())
}

/// Deserializes an arbitrary bincode-encoded type from a file.
pub fn from_file<T: DeserializeOwned>(path: &str) -> SearchResult<T> {
    let f = File::open(Path::new(path))?;
    let mut reader = BufReader::new(f);
    bincode::deserialize_from(&mut reader).map_err(SearchError::Serialize)
}

/// Serializes an arbitrary type to a file with bincode.
pub fn write_to_file<T: Serialize>(value: &T, path: &str) -> SearchResult<()> {
    let f = File::create(Path::new(path))?;
    let mut writer = BufWriter::new(f);
    bincode::serialize_into(&mut writer, value).map_err(SearchError::Serialize)
}
