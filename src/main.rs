use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use warpseek_dtw::TimeSeries;
use warpseek_index::{
    BestMatch, DEFAULT_MIN_LEAF_SIZE, IndexConfig, IndexError, Representation,
    brute_force_best_match, brute_force_best_match_banded, classify_1nn, find_best_match,
    find_best_match_banded,
};
use warpseek_io::{ExperimentName, LabeledDataset, ResultWriter, UcrReader};

#[derive(Parser)]
#[command(name = "warpseek")]
#[command(about = "Lower-bound pruned time series similarity search under DTW")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Inputs, representation parameters and output location shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct SearchArgs {
    /// Path to the training (database) file in UCR format
    #[arg(long)]
    train: PathBuf,

    /// Path to the test (query) file in UCR format
    #[arg(long)]
    test: PathBuf,

    /// Envelope half-width; also the DTW band radius of `nearest --banded`
    #[arg(long, default_value_t = 3)]
    window: usize,

    /// Number of PAA segments
    #[arg(long, default_value_t = 8)]
    segments: usize,

    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Approximate top-K search through the MBR tree (PAA bound only, no DTW)
    Knn {
        #[command(flatten)]
        search: SearchArgs,

        /// Row of the test file to use as the query
        #[arg(long, default_value_t = 0)]
        query_index: usize,

        /// Number of neighbours to return
        #[arg(long, default_value_t = 5)]
        k: usize,

        /// Largest node that is kept as a leaf
        #[arg(long, default_value_t = DEFAULT_MIN_LEAF_SIZE)]
        min_leaf_size: usize,
    },

    /// Nearest neighbour by LB_Keogh cascade and DTW
    Nearest {
        #[command(flatten)]
        search: SearchArgs,

        /// Row of the test file to use as the query
        #[arg(long, default_value_t = 0)]
        query_index: usize,

        /// Restrict DTW to a Sakoe-Chiba band of radius `--window`
        #[arg(long, default_value_t = false)]
        banded: bool,

        /// Cross-check the answer against an unpruned DTW scan
        #[arg(long, default_value_t = false)]
        verify: bool,
    },

    /// 1-NN classify every test series and report the error rate
    Classify {
        #[command(flatten)]
        search: SearchArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct KnnOutput {
    experiment: String,
    n_train: usize,
    query_index: usize,
    query_label: String,
    k: usize,
    neighbors: Vec<usize>,
    neighbor_labels: Vec<String>,
    tree_nodes: usize,
    tree_depth: usize,
    artifact: PathBuf,
}

#[derive(Serialize)]
struct NearestOutput {
    experiment: String,
    n_train: usize,
    query_index: usize,
    query_label: String,
    banded: bool,
    index: Option<usize>,
    label: Option<String>,
    distance: Option<f64>,
    verified: Option<bool>,
    pruned_by_keogh: usize,
    abandoned: usize,
    dtw_computed: usize,
    artifact: PathBuf,
}

#[derive(Serialize)]
struct ClassifyOutput {
    experiment: String,
    n_train: usize,
    n_test: usize,
    n_correct: usize,
    error_rate: f64,
    pruned_by_keogh: usize,
    dtw_computed: usize,
    artifact: PathBuf,
}

/// Shared shape of the cascade and its brute-force reference.
type SearchFn = fn(&Representation, &[TimeSeries]) -> Result<BestMatch, IndexError>;

fn load(path: &Path, role: &str) -> Result<LabeledDataset> {
    UcrReader::new(path)
        .read()
        .with_context(|| format!("failed to read {role} file {}", path.display()))
}

fn query_at(test: &LabeledDataset, query_index: usize) -> Result<&TimeSeries> {
    test.series.get(query_index).with_context(|| {
        format!(
            "query index {query_index} out of range (test file has {} series)",
            test.len()
        )
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Knn {
            search,
            query_index,
            k,
            min_leaf_size,
        } => {
            let experiment_name = ExperimentName::new(search.experiment.clone())?;
            let train = load(&search.train, "training")?;
            let test = load(&search.test, "test")?;
            let query = query_at(&test, query_index)?;

            let config = IndexConfig::new(search.window, search.segments)?
                .with_min_leaf_size(min_leaf_size);
            let tree = config
                .build_tree(&train.series)
                .context("failed to build index")?;
            let result = tree
                .search_series(query, k)
                .context("top-K search failed")?;

            // Write JSON artifact
            let writer = ResultWriter::new(&search.output_dir, experiment_name)?;
            let artifact = writer.write_knn(&config, query_index, k, &result, &train.labels)?;

            let output = KnnOutput {
                experiment: search.experiment,
                n_train: train.len(),
                query_index,
                query_label: test.labels[query_index].to_string(),
                k,
                neighbors: result.indices(),
                neighbor_labels: result
                    .neighbors
                    .iter()
                    .map(|n| train.labels[n.index].to_string())
                    .collect(),
                tree_nodes: tree.node_count(),
                tree_depth: tree.depth(),
                artifact,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Nearest {
            search,
            query_index,
            banded,
            verify,
        } => {
            let experiment_name = ExperimentName::new(search.experiment.clone())?;
            let train = load(&search.train, "training")?;
            let test = load(&search.test, "test")?;

            let config = IndexConfig::new(search.window, search.segments)?;
            let query = config
                .represent(query_at(&test, query_index)?.clone())
                .context("failed to prepare query")?;
            let (search_fn, reference_fn) = if banded {
                (find_best_match_banded as SearchFn, brute_force_best_match_banded as SearchFn)
            } else {
                (find_best_match as SearchFn, brute_force_best_match as SearchFn)
            };
            let best = search_fn(&query, &train.series).context("nearest search failed")?;

            let verified = if verify {
                let reference = reference_fn(&query, &train.series)?;
                let agrees = reference.index == best.index;
                if !agrees {
                    warn!(
                        cascade = ?best.index,
                        brute_force = ?reference.index,
                        "cascade disagrees with brute-force scan"
                    );
                }
                Some(agrees)
            } else {
                None
            };

            // Write JSON artifact
            let writer = ResultWriter::new(&search.output_dir, experiment_name)?;
            let artifact = writer.write_nearest(&config, query_index, &best, &train.labels, verified)?;

            let output = NearestOutput {
                experiment: search.experiment,
                n_train: train.len(),
                query_index,
                query_label: test.labels[query_index].to_string(),
                banded,
                index: best.index,
                label: best.index.map(|i| train.labels[i].to_string()),
                distance: best.distance.is_finite().then(|| best.distance.value()),
                verified,
                pruned_by_keogh: best.stats.pruned_by_keogh,
                abandoned: best.stats.abandoned,
                dtw_computed: best.stats.dtw_computed,
                artifact,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Classify { search } => {
            let experiment_name = ExperimentName::new(search.experiment.clone())?;
            let train = load(&search.train, "training")?;
            let test = load(&search.test, "test")?;

            let config = IndexConfig::new(search.window, search.segments)?;
            let result = classify_1nn(&train.labels, &train.series, &test.labels, &test.series, &config)
                .context("classification failed")?;

            // Write JSON artifact
            let writer = ResultWriter::new(&search.output_dir, experiment_name)?;
            let artifact = writer.write_classify(&config, train.len(), &result, &test.labels)?;

            let output = ClassifyOutput {
                experiment: search.experiment,
                n_train: train.len(),
                n_test: test.len(),
                n_correct: result.n_correct,
                error_rate: result.error_rate,
                pruned_by_keogh: result.stats.pruned_by_keogh,
                dtw_computed: result.stats.dtw_computed,
                artifact,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
