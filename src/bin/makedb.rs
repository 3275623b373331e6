//! Builds the title dictionary for a reference FASTA. The sequence database
//! file format itself is a named non-goal, so this binary's only persisted
//! artifact is the accession/title side table that `search`, `cluster` and
//! `view` load back alongside the original FASTA.
use std::process::exit;

use clap::Parser;
use log::{debug, error, info, LevelFilter};

use protsearch::db::Database;
use protsearch::io::write_to_file;
use protsearch::util::init_logging;

#[derive(Parser, Debug)]
#[command(name = "makedb", version, about = "Build a reference database dictionary from FASTA")]
struct Args {
    /// Path to the reference FASTA file (gzip-compressed files are detected automatically).
    #[arg(short, long)]
    fasta: String,

    /// Output path for the serialized title dictionary.
    #[arg(short, long)]
    out: String,

    /// Bytes of sequence read per streamed chunk while scanning the FASTA.
    #[arg(long, default_value_t = 4 * 1024 * 1024)]
    chunk_size: usize,

    /// Include this flag to trigger debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let exit_code = match build(&args) {
        Ok(count) => {
            info!("Done building database dictionary: {count} sequences.");
            0
        }
        Err(why) => {
            error!("Error building database: {why}");
            1
        }
    };
    exit(exit_code);
}

fn build(args: &Args) -> protsearch::error::SearchResult<usize> {
    debug!("Opening FASTA database file...");
    let mut db = Database::open(&args.fasta)?;
    let mut dict = protsearch::db::Dictionary::default();
    while db.next_block(args.chunk_size, &mut dict)?.is_some() {}
    write_to_file(&dict, &args.out)?;
    Ok(dict.len())
}
