//! `depgraph update` command implementation.

use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use depgraph::{ParsedFile, Project};

/// Errors listed before truncating.
const MAX_ERRORS_SHOWN: usize = 5;

/// Run the update command.
pub fn run(root: &Path, facts: Option<&Path>) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    println!("{} {}...", "Updating".cyan().bold(), project.root().display());

    let stats = match facts {
        Some(path) => {
            let content =
                std::fs::read(path).with_context(|| format!("failed to read facts file {}", path.display()))?;
            let parsed: Vec<ParsedFile> = serde_json::from_slice(&content)
                .with_context(|| format!("invalid facts file {}", path.display()))?;
            project.update_from_facts(&parsed)?
        }
        None => project.update()?,
    };

    println!();
    println!(
        "{} {} files: {} nodes, {} edges",
        "Parsed".green().bold(),
        stats.files_parsed,
        stats.nodes,
        stats.edges
    );
    match &stats.branch {
        Some(branch) => println!("{}: {} ({branch})", "Commit".dimmed(), stats.commit_hash),
        None => println!("{}: {}", "Commit".dimmed(), stats.commit_hash),
    }
    println!("{}: {}", "Saved to".dimmed(), project.store().path().display());
    println!("{}: {:.2?}", "Duration".dimmed(), stats.duration);

    if !stats.directories_skipped.is_empty() {
        println!(
            "{}: {} directories (unreadable)",
            "Skipped".yellow(),
            stats.directories_skipped.len()
        );
    }

    if !stats.orphaned.is_empty() {
        println!(
            "{}: {} imports of {} files outside the parsed set",
            "Skipped".yellow(),
            stats.orphaned.occurrence_count(),
            stats.orphaned.target_count()
        );
    }

    if !stats.errors.is_empty() {
        println!();
        println!("{} ({}):", "Errors".red().bold(), stats.errors.len());
        for err in stats.errors.iter().take(MAX_ERRORS_SHOWN) {
            let label = if err.kind.is_internal_error() {
                "read".red()
            } else {
                "source".yellow()
            };
            println!("  {} [{label}] {}: {}", "•".red(), err.path.display(), err.message);
        }
        if stats.errors.len() > MAX_ERRORS_SHOWN {
            println!("  ... and {} more", stats.errors.len() - MAX_ERRORS_SHOWN);
        }
    }

    if stats.unresolved_imports > 0 {
        println!();
        println!(
            "{}: {} (likely external packages)",
            "Unresolved imports".dimmed(),
            stats.unresolved_imports
        );
    }

    Ok(())
}
