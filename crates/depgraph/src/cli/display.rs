//! Common display utilities for CLI commands.

use colored::{ColoredString, Colorize};
use depgraph::{Node, NodeType, RiskLevel};

/// Maximum items printed per section before truncating.
pub const MAX_DISPLAY_ITEMS: usize = 20;

/// Entity ID with its kind tag, e.g. `[method] src/a.ts::A::run`.
#[must_use]
pub fn entity_label(entity_id: &str, node: &Node) -> String {
    format!("{} {}", kind_tag(node.node_type), entity_id)
}

/// Short coloured tag for a node type.
#[must_use]
pub fn kind_tag(node_type: NodeType) -> ColoredString {
    let tag = format!("[{node_type}]");
    match node_type {
        NodeType::File => tag.blue(),
        NodeType::Class | NodeType::Interface => tag.magenta(),
        NodeType::Method | NodeType::Function => tag.cyan(),
    }
}

/// Risk level coloured by severity.
#[must_use]
pub fn risk_label(level: RiskLevel) -> ColoredString {
    match level {
        RiskLevel::Low => level.as_str().green().bold(),
        RiskLevel::Medium => level.as_str().yellow().bold(),
        RiskLevel::High => level.as_str().red().bold(),
        RiskLevel::Critical => level.as_str().on_red().white().bold(),
    }
}

/// Print "... and N more" when `total` exceeds what was shown.
pub fn print_overflow(indent: &str, total: usize) {
    if total > MAX_DISPLAY_ITEMS {
        println!("{indent}{} ... and {} more", "•".dimmed(), total - MAX_DISPLAY_ITEMS);
    }
}
