//! Binary that reads a graph from a file, computes a minimum odd cycle transversal and writes a
//! status line and the transversal to standard out.
//!
//! SIGTERM and SIGINT stop the computation; the transversal found so far is still written.

use std::error;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;
use std::time::Duration;

use cpu_time::ProcessTime;
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing::info;
use tracing_subscriber::EnvFilter;

use odd_cover::checkpoint::{write_report, CancelToken};
use odd_cover::compression::IterativeCompression;
use odd_cover::config::{Preprocessing, SolverConfig, Strategy};
use odd_cover::cust_error::ProcessingError;
use odd_cover::graph::Graph;
use odd_cover::occ_problem::is_occ;

const USAGE: &str = "occ: Calculate minimum odd cycle transversal\n\
    \x20 -f <file>  Compute the transversal of this graph file\n\
    \x20 -p <0|1|2> Preprocessing level {0: None, 1: Bipartite, 2: Bipartite + Density Sort}\n\
    \x20 -s <seed>  Seed for heuristics and vertex order\n\
    \x20 -t <ms>    Time for the heuristics in milliseconds\n\
    \x20 -g         Enumerate colorings in Gray code order\n\
    \x20 -v         Print progress to stderr\n\
    \x20 -h         Display this list of options\n";

struct Args {
    file: String,
    config: SolverConfig,
    verbose: bool,
}

/// Returns the value following the flag at `args[i]`.
fn value<'a>(args: &'a [String], i: usize) -> Result<&'a str, ProcessingError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| ProcessingError::InvalidParameter(format!("{} needs a value", args[i])))
}

fn number<T: std::str::FromStr>(args: &[String], i: usize) -> Result<T, ProcessingError> {
    let v = value(args, i)?;
    v.parse()
        .map_err(|_| ProcessingError::InvalidParameter(format!("{} {} is not a number", args[i], v)))
}

/// Parses the command line. Returns `None` if help was requested.
fn parse_args(args: &[String]) -> Result<Option<Args>, ProcessingError> {
    let mut file = None;
    let mut config = SolverConfig::default();
    let mut verbose = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-f" => {
                file = Some(value(args, i)?.to_owned());
                i += 2;
            },
            "-p" => {
                config.preprocessing = Preprocessing::from_level(number(args, i)?)?;
                i += 2;
            },
            "-s" => {
                config.seed = number(args, i)?;
                i += 2;
            },
            "-t" => {
                config.heuristic_budget = Duration::from_millis(number(args, i)?);
                i += 2;
            },
            "-g" => {
                config.strategy = Strategy::GrayCode;
                i += 1;
            },
            "-v" => {
                verbose = true;
                i += 1;
            },
            "-h" => return Ok(None),
            other => return Err(ProcessingError::InvalidParameter(format!("unknown option {}", other))),
        }
    }
    let file = file.ok_or_else(|| ProcessingError::InvalidParameter("no graph file given (-f)".to_owned()))?;
    Ok(Some(Args { file, config, verbose }))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn error::Error>> {
    let cancel = CancelToken::new();
    signal_hook::flag::register(SIGTERM, cancel.flag())?;
    signal_hook::flag::register(SIGINT, cancel.flag())?;

    let input = match File::open(&args.file) {
        Ok(input) => input,
        Err(_) => {
            eprintln!("File '{}' could not be read.", args.file);
            process::exit(1);
        },
    };
    let (graph, labels) = Graph::read_graph(BufReader::new(input))?;
    info!(vertices = graph.num_vertices(), edges = graph.num_edges(), "graph read");

    let solution = IterativeCompression::new(&graph, args.config, cancel).run();

    // Validate
    if !is_occ(&graph, &solution.snapshot.to_bitset()) {
        return Err(Box::new(ProcessingError::InvalidSolution(format!(
            "{} leaves an odd cycle",
            solution.snapshot.to_bitset()
        ))));
    }

    let cpu_seconds = ProcessTime::now().as_duration().as_secs_f64();
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    write_report(
        &mut stdout,
        graph.size(),
        graph.num_edges(),
        &solution.snapshot,
        cpu_seconds,
        solution.augmentations,
        &labels,
    )?;
    Ok(())
}

pub fn main() {
    let args: Vec<String> = std::env::args().collect();
    let args = match parse_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print!("{}", USAGE);
            return
        },
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            process::exit(1);
        },
    };
    init_logging(args.verbose);
    if let Err(e) = run(args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
