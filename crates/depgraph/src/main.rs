//! Depgraph CLI - dependency graphs from the command line.
//!
//! Builds an entity-level dependency graph of a TypeScript project and answers
//! dependency, diff and change-impact questions against it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use depgraph::RiskLevel;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{ListFormat, QueryFormat, ReportFormat};

/// Depgraph: build, query, diff and score entity-level dependency graphs.
#[derive(Parser)]
#[command(name = "depgraph")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan sources, rebuild the graph and save it
    Update {
        /// Build from a JSON array of parsed-file facts instead of scanning
        #[arg(long, value_name = "FILE")]
        facts: Option<PathBuf>,
    },

    /// Show what an entity depends on, or what depends on it
    Query {
        /// Entity ID (e.g. "src/user.ts", "src/user.ts::UserService::find")
        entity_id: String,

        /// Show dependents instead of dependencies
        #[arg(long)]
        dependents: bool,

        /// Follow indirect relations too
        #[arg(long)]
        transitive: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = QueryFormat::Tree)]
        format: QueryFormat,
    },

    /// Score the impact of files changed since a base reference
    Impact {
        /// Base git reference; changes are measured against the working tree
        #[arg(long, default_value = "HEAD")]
        base: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Report)]
        format: ReportFormat,

        /// Only report if the risk level is at least this (LOW, MEDIUM, HIGH, CRITICAL)
        #[arg(long)]
        threshold: Option<RiskLevel>,
    },

    /// Compare the graphs of two references ("working" = the saved graph)
    Diff {
        /// Older reference
        ref1: String,

        /// Newer reference
        ref2: String,

        /// Only print the summary counters
        #[arg(long)]
        summary: bool,

        /// Only show node changes
        #[arg(long, conflicts_with = "edges_only")]
        nodes_only: bool,

        /// Only show edge changes
        #[arg(long)]
        edges_only: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Report)]
        format: ReportFormat,
    },

    /// Detect dependency cycles
    Cycles {
        /// Output format
        #[arg(long, value_enum, default_value_t = ListFormat::List)]
        format: ListFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = match cli.root {
        Some(r) => r,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("{}: failed to get current directory: {e}", "error".red().bold());
                return ExitCode::FAILURE;
            }
        },
    };

    let result = match cli.command {
        Commands::Update { facts } => cli::update::run(&root, facts.as_deref()),
        Commands::Query {
            entity_id,
            dependents,
            transitive,
            format,
        } => cli::query::run(&root, &entity_id, dependents, transitive, format),
        Commands::Impact {
            base,
            format,
            threshold,
        } => cli::impact::run(&root, &base, format, threshold),
        Commands::Diff {
            ref1,
            ref2,
            summary,
            nodes_only,
            edges_only,
            format,
        } => cli::diff::run(
            &root,
            &ref1,
            &ref2,
            cli::diff::DiffView {
                summary,
                nodes_only,
                edges_only,
            },
            format,
        ),
        Commands::Cycles { format } => cli::cycles::run(&root, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {cause}", "caused by".dimmed());
            }
            ExitCode::FAILURE
        }
    }
}
