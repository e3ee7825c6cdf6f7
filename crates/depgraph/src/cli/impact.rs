//! `depgraph impact` command implementation.

use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;
use depgraph::{AffectedEntity, Project, RiskLevel, filter_by_threshold};

use super::display::{MAX_DISPLAY_ITEMS, entity_label, print_overflow, risk_label};
use super::{ReportFormat, print_json};

/// Run the impact command.
pub fn run(root: &Path, base: &str, format: ReportFormat, threshold: Option<RiskLevel>) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let mut report = project.impact(base)?;
    if let Some(level) = threshold {
        report = filter_by_threshold(report, level);
    }

    if format == ReportFormat::Json {
        return print_json(&report);
    }

    if report.changed_files.is_empty() {
        match threshold {
            Some(level) => println!("{}", format!("No changes at or above {level} risk.").green()),
            None => println!("{}", format!("No source files changed since {base}.").green()),
        }
        return Ok(());
    }

    println!(
        "{} {} (score {})",
        "Risk:".bold(),
        risk_label(report.risk_level),
        report.risk_score
    );
    println!();

    let metrics = &report.metrics;
    println!("  {}: {}", "Changed files".dimmed(), metrics.changed_files_count);
    println!("  {}: {}", "Affected records".dimmed(), metrics.affected_entities_count);
    println!("  {}: {}", "Affected files".dimmed(), metrics.affected_files_count);
    println!("  {}: {}", "Max depth".dimmed(), metrics.max_depth);
    if !metrics.affected_by_type.is_empty() {
        let by_type = metrics
            .affected_by_type
            .iter()
            .map(|(t, n)| format!("{t}={n}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {}: {by_type}", "By type".dimmed());
    }

    let mut by_file: BTreeMap<&str, Vec<&AffectedEntity>> = BTreeMap::new();
    for record in &report.affected_entities {
        by_file.entry(record.changed_by.as_str()).or_default().push(record);
    }

    for file in &report.changed_files {
        println!();
        println!("  {}:", file.white().bold());
        let records = by_file.get(file.as_str()).map_or(&[][..], Vec::as_slice);
        if records.is_empty() {
            println!("    {}", "no dependents".dimmed());
            continue;
        }
        for record in records.iter().take(MAX_DISPLAY_ITEMS) {
            println!(
                "    {} {} {}",
                "•".dimmed(),
                entity_label(&record.entity_id, &record.node),
                format!("(depth {}, {})", record.depth, record.reason).dimmed()
            );
        }
        print_overflow("    ", records.len());
    }

    Ok(())
}
