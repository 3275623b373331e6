//! Runs cascaded clustering over precomputed self-alignment edge streams, one
//! binary edge file per configured round, and writes one merged result.
use std::fs::File;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use log::{error, info, LevelFilter};

use protsearch::cluster::cascaded;
use protsearch::config::{Config, Sensitivity};
use protsearch::db::Dictionary;
use protsearch::error::SearchResult;
use protsearch::io::{from_file, read_edges, write_clustering_tsv};
use protsearch::util::init_logging;

#[derive(Parser, Debug)]
#[command(name = "cluster", version, about = "Cascaded clustering over precomputed self-alignment edges")]
struct Args {
    /// Path to the database's title dictionary (from `makedb`).
    #[arg(long)]
    dict: String,

    /// One binary edge-stream path per configured clustering round, in
    /// increasing-sensitivity order (produce each with the `search` binary
    /// run query=db against db=db at that round's sensitivity).
    #[arg(long, num_args = 1.., required = true)]
    edges: Vec<String>,

    /// Output path for the `centroid_acc \t member_acc` TSV.
    #[arg(short, long)]
    out: String,

    #[arg(long, default_value_t = 80.0)]
    member_cover: f64,

    #[arg(long, default_value_t = 0)]
    connected_component_depth: u32,

    #[arg(short, long)]
    verbose: bool,
}

fn cluster_steps_for(rounds: usize) -> Vec<Sensitivity> {
    use Sensitivity::*;
    let ladder = [Fast, Default, Sensitive, VerySensitive, UltraSensitive];
    (0..rounds).map(|i| ladder[i.min(ladder.len() - 1)]).collect()
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
            info!("Wrote clustering for {n} sequences.");
            0
        }
        Err(why) => {
            error!("Clustering failed: {why}");
            1
        }
    };
    exit(exit_code);
}

fn run(args: &Args) -> SearchResult<usize> {
    let dict: Dictionary = from_file(&args.dict)?;
    let n = dict.len();
    let rounds = args.edges.len();

    let config = Config {
        member_cover: args.member_cover,
        connected_component_depth: args.connected_component_depth,
        cluster_steps: cluster_steps_for(rounds),
        round_coverage: vec![args.member_cover; rounds],
        round_approx_id: vec![0.0; rounds],
        ..Config::default()
    };
    config.validate()?;

    let mut remaining = args.edges.iter();
    let mapping = cascaded(n, &config, |_sensitivity, _active| {
        let path = remaining
            .next()
            .expect("cascaded() called cluster_steps.len() rounds by construction");
        let mut file = File::open(path).expect("opening round edge file");
        read_edges(&mut file).expect("reading round edge file")
    });

    write_clustering_tsv(Path::new(&args.out), &mapping, &dict)?;
    Ok(n)
}
