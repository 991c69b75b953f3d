//! CCTM runner
//!
//! Command-line front end for the generation pipeline.
//!
//! ## Commands
//!
//! - `generate`: classification-tree XML to test cases
//! - `diff`: compare two tree versions
//! - `merge`: merge an upload into a stored tree
//! - `partitions`: show the partitions built for a tree
//! - `fault`: fault-pattern XML to nodes, edges and fault test cases
//! - `report`: human-readable summary of a generation run

use anyhow::{bail, Context, Result};
use cctm_core::ClassificationTree;
use cctm_parser::ParseError;
use cctm_testgen::{
    compare, init_tracing, merge, partition, Baseline, ErrorResponse, GenerationConfig,
    ReportGenerator, TestGenError, TestGenerator, TreeBuilder,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "cctm-runner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Classification-tree test case generator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate test cases from classification-tree XML
    Generate(GenerateArgs),

    /// Compare two versions of a tree
    Diff {
        /// New version (XML or JSON snapshot)
        new: PathBuf,

        /// Old version; when omitted, the last two versions of `new` are compared
        #[arg(long)]
        old: Option<PathBuf>,
    },

    /// Merge an incoming tree into an existing one
    Merge {
        /// Existing tree (XML or JSON snapshot)
        existing: PathBuf,

        /// Incoming tree (XML or JSON snapshot)
        incoming: PathBuf,
    },

    /// Show generation partitions for a tree
    Partitions {
        input: PathBuf,

        /// Include underflow/overflow/None buckets
        #[arg(long)]
        display: bool,
    },

    /// Extract fault scenarios from fault-pattern XML
    Fault { input: PathBuf },

    /// Generate and print a human-readable summary
    Report(GenerateArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Classification-tree XML
    input: PathBuf,

    /// Previously stored tree snapshot (JSON)
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// JSON file with generation settings
    #[arg(long, env = "CCTM_CONFIG")]
    config: Option<PathBuf>,

    /// Largest product generated in full
    #[arg(long)]
    threshold: Option<usize>,

    /// Seed for the sampling branch
    #[arg(long)]
    seed: Option<u64>,

    /// Keep only cases touching added or modified classes
    #[arg(long)]
    focus_on_changes: bool,

    /// Append underflow/overflow/None cases
    #[arg(long)]
    boundary_cases: bool,

    /// Write the merged tree here for the next run's --baseline
    #[arg(long)]
    snapshot_out: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json_logs, level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let response = error_response(&err);
            match serde_json::to_string_pretty(&response) {
                Ok(json) => println!("{}", json),
                Err(_) => eprintln!("{:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Generate(args) => {
            let outcome = generate(args)?;
            emit(cli.output.as_deref(), &outcome)
        }
        Commands::Report(args) => {
            let outcome = generate(args)?;
            write_text(cli.output.as_deref(), &ReportGenerator::generate(&outcome))
        }
        Commands::Diff { new, old } => {
            let (old_tree, new_tree) = match old {
                Some(old) => (load_tree(old)?, load_tree(new)?),
                None => {
                    let xml = read(new)?;
                    let mut versions = cctm_parser::parse_versions(&xml).map_err(TestGenError::from)?;
                    if versions.len() < 2 {
                        bail!(TestGenError::DiffComputation(format!(
                            "{} holds {} version(s); pass --old to compare against another file",
                            new.display(),
                            versions.len()
                        )));
                    }
                    let newest = versions.pop().unwrap_or_default();
                    let previous = versions.pop().unwrap_or_default();
                    (previous, newest)
                }
            };
            let builder = TreeBuilder::new();
            emit(
                cli.output.as_deref(),
                &compare(&builder.build(&old_tree), &builder.build(&new_tree)),
            )
        }
        Commands::Merge { existing, incoming } => {
            let builder = TreeBuilder::new();
            let outcome = merge(
                &builder.build(&load_tree(existing)?),
                &builder.build(&load_tree(incoming)?),
            );
            #[derive(Serialize)]
            struct MergeOutput<'a> {
                merged: &'a ClassificationTree,
                warnings: &'a [cctm_testgen::MergeConflict],
            }
            emit(
                cli.output.as_deref(),
                &MergeOutput {
                    merged: &outcome.merged,
                    warnings: &outcome.warnings,
                },
            )
        }
        Commands::Partitions { input, display } => {
            let tree = TreeBuilder::new().build(&load_tree(input)?);
            let partitions = if *display {
                partition::build_display(&tree)
            } else {
                partition::build(&tree.variables)
            };
            emit(cli.output.as_deref(), &partitions)
        }
        Commands::Fault { input } => {
            let xml = read(input)?;
            let extraction = cctm_fault::parse_fault_tree(&xml).map_err(TestGenError::from)?;
            emit(cli.output.as_deref(), &extraction)
        }
    }
}

fn generate(args: &GenerateArgs) -> Result<cctm_testgen::GenerationOutcome> {
    let mut config = match &args.config {
        Some(path) => {
            let text = read(path)?;
            serde_json::from_str::<GenerationConfig>(&text)
                .map_err(|e| TestGenError::Config(format!("{}: {}", path.display(), e)))?
        }
        None => GenerationConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config = config.with_threshold(threshold);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.focus_on_changes {
        config = config.with_focus_on_changes(true);
    }
    if args.boundary_cases {
        config = config.with_boundary_cases(true);
    }

    let baseline = match &args.baseline {
        Some(path) => Baseline::Serialized(read(path)?),
        None => Baseline::None,
    };
    let xml = read(&args.input)?;
    let outcome = TestGenerator::new(config).generate(&xml, baseline)?;

    if let Some(path) = &args.snapshot_out {
        let snapshot = serde_json::to_string_pretty(&outcome.tree).map_err(TestGenError::from)?;
        std::fs::write(path, snapshot)
            .map_err(TestGenError::from)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote tree snapshot");
    }
    Ok(outcome)
}

/// XML documents are parsed; anything starting with `{` is a JSON snapshot.
fn load_tree(path: &Path) -> Result<ClassificationTree> {
    let text = read(path)?;
    if text.trim_start().starts_with('{') {
        let tree = serde_json::from_str(&text).map_err(TestGenError::from)?;
        Ok(tree)
    } else {
        Ok(cctm_parser::parse(&text).map_err(TestGenError::from)?)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(TestGenError::from)
        .with_context(|| format!("reading {}", path.display()))
}

fn emit<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    write_text(output, &json)
}

fn write_text(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .map_err(TestGenError::from)
            .with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

fn error_response(err: &anyhow::Error) -> ErrorResponse {
    match err.downcast_ref::<TestGenError>() {
        Some(inner) => {
            let mut response = ErrorResponse::from(inner);
            response.detail = Some(format!("{:#}", err));
            response
        }
        None => match err.downcast_ref::<ParseError>() {
            Some(parse) => ErrorResponse::new("ParseError", Some(parse.to_string())),
            None => ErrorResponse::new("Error", Some(format!("{:#}", err))),
        },
    }
}
