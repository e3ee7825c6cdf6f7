//! CLI command implementations.

mod display;

pub mod cycles;
pub mod diff;
pub mod impact;
pub mod query;
pub mod update;

use clap::ValueEnum;
use serde::Serialize;

/// Output of `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryFormat {
    /// Pretty-printed JSON
    Json,
    /// Indented by depth
    Tree,
    /// One entity per line
    List,
}

/// Output of `impact` and `diff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Pretty-printed JSON
    Json,
    /// Human-readable report
    Report,
}

/// Output of `cycles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Pretty-printed JSON
    Json,
    /// One cycle per line
    List,
}

/// Print `value` as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
