//! callmap CLI
//!
//! 1. File Discovery: find Go files respecting .gitignore and callmap.toml
//! 2. Parsing: tree-sitter, in parallel; any syntax error aborts the run
//! 3. Collection: one node per struct, interface, function and method
//! 4. Resolution: one edge per call, using type facts when supplied
//! 5. Output: the nodes/call_relationships JSON document

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use callmap::discovery::collect_inputs;
use callmap::{Config, Pipeline, PipelineStats, TypeFacts};

/// Extract symbols and call edges from Go source
///
/// Walks the given paths, parses every Go file and prints a JSON document
/// with one node per struct, interface, function and method and one
/// relationship per call expression.
///
/// Examples:
///   callmap                                # Analyze the current directory
///   callmap --root repo internal           # Only files under repo/internal
///   callmap --facts facts.json -o out.json # Type-checked resolution
#[derive(Parser, Debug)]
#[command(name = "callmap")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Files or directories to analyze
    ///
    /// Relative paths are taken from the project root. If empty, the whole
    /// root is scanned. Explicit files bypass the include/exclude filters.
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Project root directory
    ///
    /// Ids and relative paths are computed against it, and callmap.toml is
    /// looked up from here upwards.
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Type facts JSON produced by a Go type-checker
    ///
    /// Files with facts resolve calls through the declaring object; files
    /// without fall back to name heuristics.
    #[arg(long, value_name = "FILE")]
    pub facts: Option<PathBuf>,

    /// Write the JSON document to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,

    /// Print resolution statistics to stderr
    #[arg(long)]
    pub stats: bool,

    /// Analyze _test.go files
    #[arg(long)]
    pub include_tests: bool,

    /// Analyze files marked as generated
    #[arg(long)]
    pub include_generated: bool,

    /// Verbose logging (debug level; RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(&cli)
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("callmap=debug")
        } else {
            EnvFilter::new("callmap=info")
        }
    });

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}

fn run(cli: &Cli) -> Result<()> {
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Failed to resolve root path '{}'", cli.root.display()))?;

    let mut config = Config::load(&root);
    config.include_tests |= cli.include_tests;
    config.include_generated |= cli.include_generated;
    info!(root = %root.display(), "{}", config.display_summary().replace('\n', "; "));

    let inputs: Vec<PathBuf> = if cli.paths.is_empty() {
        vec![root.clone()]
    } else {
        cli.paths.iter().map(|p| absolutize(&root, p)).collect()
    };
    let files = collect_inputs(&inputs, &root, &config)?;
    info!(files = files.len(), "discovered");

    let facts = match &cli.facts {
        Some(path) => {
            let facts = TypeFacts::load(path, &root)?;
            info!(files = facts.len(), "type facts loaded");
            facts
        }
        None => TypeFacts::default(),
    };

    let (result, stats) = Pipeline::new()
        .with_facts(facts)
        .analyze_paths(&files, &root)?;

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_json(BufWriter::new(file), &result, cli.compact)?;
        }
        None => write_json(io::stdout().lock(), &result, cli.compact)?,
    }

    if cli.stats {
        print_stats(&stats);
    }
    Ok(())
}

/// Relative CLI paths are taken from the root. Existing paths are
/// canonicalized so they share the root's prefix.
fn absolutize(root: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    joined.canonicalize().unwrap_or(joined)
}

fn write_json<W: Write, T: serde::Serialize>(mut out: W, value: &T, compact: bool) -> Result<()> {
    if compact {
        serde_json::to_writer(&mut out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut out, value)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn print_stats(stats: &PipelineStats) {
    eprintln!(
        "{} files ({} with type facts), {} symbols",
        stats.files, stats.files_with_facts, stats.symbols
    );
    eprintln!("{}", stats.resolution);
}
