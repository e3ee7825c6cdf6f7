//! `depgraph diff` command implementation.

use std::path::Path;

use colored::Colorize;
use depgraph::{GraphDiff, Project};

use super::display::{MAX_DISPLAY_ITEMS, print_overflow};
use super::{ReportFormat, print_json};

/// Which parts of the diff to show.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffView {
    /// Counters only
    pub summary: bool,
    /// Hide edge changes
    pub nodes_only: bool,
    /// Hide node changes
    pub edges_only: bool,
}

/// Run the diff command.
pub fn run(root: &Path, ref1: &str, ref2: &str, view: DiffView, format: ReportFormat) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let mut diff = project.diff(ref1, ref2)?;

    if view.nodes_only {
        diff.added_edges.clear();
        diff.removed_edges.clear();
    }
    if view.edges_only {
        diff.added_nodes.clear();
        diff.removed_nodes.clear();
        diff.modified_nodes.clear();
    }

    if format == ReportFormat::Json {
        return if view.summary {
            print_json(&diff.summary)
        } else {
            print_json(&diff)
        };
    }

    println!(
        "{} {} ({}) {} {} ({})",
        "Comparing".cyan().bold(),
        ref1,
        diff.from_commit.dimmed(),
        "→".dimmed(),
        ref2,
        diff.to_commit.dimmed()
    );
    println!();

    if diff.is_identical() {
        println!("{}", "Graphs are identical.".green());
        return Ok(());
    }

    print_summary(&diff, view);
    if view.summary {
        return Ok(());
    }

    if !view.edges_only {
        print_section("Added nodes", "+", diff.added_nodes.iter().map(String::as_str));
        print_section("Removed nodes", "-", diff.removed_nodes.iter().map(String::as_str));
        let modified: Vec<String> = diff
            .modified_nodes
            .iter()
            .map(|m| {
                let fields = m.changes.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                format!("{} ({fields})", m.entity_id)
            })
            .collect();
        print_section("Modified nodes", "~", modified.iter().map(String::as_str));
    }

    if !view.nodes_only {
        let render = |e: &depgraph::Edge| format!("{} --{}--> {}", e.source, e.relationship, e.target);
        let added: Vec<String> = diff.added_edges.iter().map(render).collect();
        let removed: Vec<String> = diff.removed_edges.iter().map(render).collect();
        print_section("Added edges", "+", added.iter().map(String::as_str));
        print_section("Removed edges", "-", removed.iter().map(String::as_str));
    }

    Ok(())
}

fn print_summary(diff: &GraphDiff, view: DiffView) {
    let s = &diff.summary;
    if !view.edges_only {
        println!(
            "  {}: {} added, {} removed, {} modified",
            "Nodes".bold(),
            s.nodes_added.to_string().green(),
            s.nodes_removed.to_string().red(),
            s.nodes_modified.to_string().yellow()
        );
    }
    if !view.nodes_only {
        println!(
            "  {}: {} added, {} removed",
            "Edges".bold(),
            s.edges_added.to_string().green(),
            s.edges_removed.to_string().red()
        );
    }
}

fn print_section<'a>(title: &str, marker: &str, items: impl ExactSizeIterator<Item = &'a str>) {
    let total = items.len();
    if total == 0 {
        return;
    }
    println!();
    println!("  {} ({total}):", title.white().bold());
    let marker = match marker {
        "+" => marker.green(),
        "-" => marker.red(),
        _ => marker.yellow(),
    };
    for item in items.take(MAX_DISPLAY_ITEMS) {
        println!("    {marker} {item}");
    }
    print_overflow("    ", total);
}
