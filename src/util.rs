//! Small helpers shared by the binaries: logging setup and the gzip-sniffing
//! reader used by the query source collaborator.
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;
use log::LevelFilter;

use crate::error::{SearchError, SearchResult};

/// Initializes the global logger. Binaries call this once at startup, raising
/// the level to `Debug` behind a `-v` flag.
pub fn init_logging(level: LevelFilter) {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

/// Opens `path`, transparently wrapping it in a gzip decoder when the file
/// starts with the gzip magic number. Mirrors the sniff used by the legacy
/// binning tool's FASTA/FASTQ loader.
pub fn open_maybe_gz(path: &str) -> SearchResult<Box<dyn Read + Send>> {
    let mut file = File::open(Path::new(path))?;
    let mut magic = [0u8; 2];
    let read_len = file.read(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    if read_len == 2 && magic == [0x1f, 0x8b] {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Parses a positive integer option, producing a `SearchError::Configuration`
/// with the offending text on failure instead of panicking.
pub fn parse_positive(name: &str, value: &str) -> SearchResult<usize> {
    value
        .parse::<usize>()
        .map_err(|_| SearchError::Configuration(format!("invalid value for {name}: {value}")))
}
