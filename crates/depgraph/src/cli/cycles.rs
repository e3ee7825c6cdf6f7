//! `depgraph cycles` command implementation.

use std::path::Path;

use colored::Colorize;
use depgraph::Project;

use super::{ListFormat, print_json};

/// Run the cycles command.
pub fn run(root: &Path, format: ListFormat) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let cycles = project.cycles()?;

    if format == ListFormat::Json {
        return print_json(&cycles);
    }

    if cycles.is_empty() {
        println!("{}", "No circular dependencies detected.".green());
        return Ok(());
    }

    println!("Found {} circular dependencies:", cycles.len().to_string().red().bold());
    println!();

    for (i, cycle) in cycles.iter().enumerate() {
        if cycle.is_self_loop() {
            println!("  {} {} {}:", "Cycle".yellow().bold(), i + 1, "(self-reference)".dimmed());
        } else {
            println!("  {} {}:", "Cycle".yellow().bold(), i + 1);
        }

        // Display cycle as: a → b → c → a
        let mut path_str = cycle.entities.join(" → ");
        if let Some(first) = cycle.entities.first() {
            path_str.push_str(" → ");
            path_str.push_str(first);
        }

        println!("    {}", path_str.dimmed());
    }

    Ok(())
}
