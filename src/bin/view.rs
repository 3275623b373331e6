//! Dumps a binary edge stream as TSV for inspection.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::exit;

use clap::Parser;
use log::{error, info, LevelFilter};

use protsearch::db::Dictionary;
use protsearch::error::SearchResult;
use protsearch::io::{from_file, read_edges};
use protsearch::util::init_logging;

#[derive(Parser, Debug)]
#[command(name = "view", version, about = "Dump a binary edge stream as TSV")]
struct Args {
    /// Path to a binary edge stream produced by `search`.
    #[arg(short, long)]
    edges: String,

    /// Output TSV path (defaults to stdout).
    #[arg(short, long)]
    out: Option<String>,

    /// Optional title dictionary (from `makedb`); resolves ids to accessions
    /// instead of printing raw numeric ids.
    #[arg(long)]
    dict: Option<String>,

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

    let exit_code = match run(&args) {
        Ok(n) => {
            info!("Wrote {n} edges.");
            0
        }
        Err(why) => {
            error!("View failed: {why}");
            1
        }
    };
    exit(exit_code);
}

fn run(args: &Args) -> SearchResult<usize> {
    let dict: Option<Dictionary> = args.dict.as_deref().map(from_file::<Dictionary>).transpose()?;

    let mut file = File::open(&args.edges)?;
    let edges = read_edges(&mut file)?;

    let mut out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };

    for edge in &edges {
        let (query, target) = match &dict {
            Some(d) => (d.title(edge.query).to_string(), d.title(edge.target).to_string()),
            None => (edge.query.to_string(), edge.target.to_string()),
        };
        writeln!(
            out,
            "{query}\t{target}\t{:.1}\t{:.1}\t{:.3e}",
            edge.qcovhsp, edge.scovhsp, edge.evalue
        )?;
    }
    Ok(edges.len())
}
