//! `depgraph query` command implementation.

use std::path::Path;

use colored::Colorize;
use depgraph::{Direction, Project, parse_entity_id};

use super::display::{MAX_DISPLAY_ITEMS, entity_label, print_overflow};
use super::{QueryFormat, print_json};

/// Run the query command.
pub fn run(root: &Path, entity_id: &str, dependents: bool, transitive: bool, format: QueryFormat) -> anyhow::Result<()> {
    parse_entity_id(entity_id)?;
    let project = Project::open(root)?;
    let direction = if dependents {
        Direction::Reverse
    } else {
        Direction::Forward
    };

    let result = project.query(entity_id, direction, transitive)?;

    match format {
        QueryFormat::Json => return print_json(&result),
        QueryFormat::List => {
            for dep in &result.results {
                println!("{}", dep.entity_id);
            }
            return Ok(());
        }
        QueryFormat::Tree => {}
    }

    let heading = match (direction, transitive) {
        (Direction::Forward, false) => "Direct dependencies of",
        (Direction::Forward, true) => "All dependencies of",
        (Direction::Reverse, false) => "Direct dependents of",
        (Direction::Reverse, true) => "All dependents of",
    };
    println!("{} {}", heading.cyan().bold(), entity_label(&result.entity_id, &result.node));
    println!();

    if result.results.is_empty() {
        println!("  {}", "(none)".dimmed());
        return Ok(());
    }

    // Sorting by path puts every entity right after the one it was reached from.
    let mut ordered: Vec<_> = result.results.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    for dep in ordered.iter().take(MAX_DISPLAY_ITEMS) {
        let indent = "  ".repeat(dep.depth);
        let relationship = dep
            .relationship
            .map(|r| format!(" ({r})").dimmed().to_string())
            .unwrap_or_default();
        println!("{indent}{} {}{relationship}", "└─".dimmed(), entity_label(&dep.entity_id, &dep.node));
    }
    print_overflow("  ", ordered.len());

    println!();
    println!(
        "{} entities in {} files",
        result.total_count.to_string().bold(),
        result.file_count.to_string().bold()
    );
    Ok(())
}
