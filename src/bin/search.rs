//! Runs the seed/filter/DP search pipeline, emitting the binary edge stream
//! that `cluster` consumes. Gzip-transparent query reading, logging and exit
//! codes follow the same pattern as the other binaries in this crate.
use std::fs::File;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use log::{error, info, LevelFilter};

use protsearch::cluster::Edge;
use protsearch::config::{Config, Sensitivity};
use protsearch::db;
use protsearch::dp::Hsp;
use protsearch::error::SearchResult;
use protsearch::io::{write_edges, QuerySource};
use protsearch::pipeline::run_round;
use protsearch::seed::Shape;
use protsearch::sequence::Block;
use protsearch::util::init_logging;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SensitivityArg {
    Fast,
    Default,
    Sensitive,
    VerySensitive,
    UltraSensitive,
}

impl From<SensitivityArg> for Sensitivity {
    fn from(s: SensitivityArg) -> Self {
        match s {
            SensitivityArg::Fast => Sensitivity::Fast,
            SensitivityArg::Default => Sensitivity::Default,
            SensitivityArg::Sensitive => Sensitivity::Sensitive,
            SensitivityArg::VerySensitive => Sensitivity::VerySensitive,
            SensitivityArg::UltraSensitive => Sensitivity::UltraSensitive,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "search", version, about = "Search query sequences against a reference database")]
struct Args {
    /// Path to the query FASTA or FASTQ file.
    #[arg(short, long)]
    query: String,

    /// Path to the reference FASTA database.
    #[arg(short, long)]
    db: String,

    /// Output path for the binary edge stream.
    #[arg(short, long)]
    out: String,

    #[arg(long, value_enum, default_value_t = SensitivityArg::Default)]
    sensitivity: SensitivityArg,

    #[arg(long, default_value_t = 0.001)]
    max_evalue: f64,

    #[arg(long, default_value_t = 40)]
    hamming_filter_id: u32,

    /// Number of worker threads (defaults to the number of logical CPUs).
    #[arg(long)]
    threads: Option<usize>,

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

    if let Some(threads) = args.threads {
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global();
    }

    let exit_code = match run(&args) {
        Ok(n) => {
            info!("Wrote {n} edges to {}.", args.out);
            0
        }
        Err(why) => {
            error!("Search failed: {why}");
            1
        }
    };
    exit(exit_code);
}

fn run(args: &Args) -> SearchResult<usize> {
    let config = Config {
        sensitivity: args.sensitivity.into(),
        max_evalue: args.max_evalue,
        hamming_filter_id: args.hamming_filter_id,
        num_threads: args.threads.unwrap_or_else(num_cpus::get),
        ..Config::default()
    };
    config.validate()?;

    let mut query_block = Block::new();
    let mut source = QuerySource::open(&args.query)?;
    let mut oid = 0u32;
    while let Some(record) = source.next_record()? {
        query_block.push(&record.sequence, oid);
        oid += 1;
    }
    info!("Loaded {} query sequences.", query_block.len());

    let (target_block, _dict) = db::load_whole(Path::new(&args.db))?;
    info!("Loaded {} reference sequences.", target_block.len());

    let shapes = Shape::default_set(config.sensitivity.shape_count());
    let mut satisfied = vec![false; query_block.len()];
    let mut all_hits: Vec<(usize, Vec<Hsp>)> = Vec::new();
    for shape in &shapes {
        let results = run_round(&query_block, &target_block, shape, &config, &mut satisfied)?;
        all_hits.extend(results);
        if satisfied.iter().all(|&s| s) {
            break;
        }
    }

    let edges = to_edges(&query_block, &target_block, &all_hits);
    let mut out = File::create(&args.out)?;
    write_edges(&mut out, &edges)?;
    Ok(edges.len())
}

fn to_edges(query: &Block, target: &Block, hits: &[(usize, Vec<Hsp>)]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for (query_id, hsps) in hits {
        let qlen = query.seqs.get(*query_id).len() as f64;
        for hsp in hsps {
            let target_id = hsp.target_idx as usize;
            let tlen = target.seqs.get(target_id).len() as f64;
            edges.push(Edge {
                query: query.oid(*query_id),
                target: target.oid(target_id),
                qcovhsp: (hsp.query_range.len() as f64 / qlen * 100.0) as f32,
                scovhsp: (hsp.subject_range.len() as f64 / tlen * 100.0) as f32,
                evalue: hsp.evalue,
            });
        }
    }
    edges
}
