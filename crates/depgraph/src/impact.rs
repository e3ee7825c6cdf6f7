//! Change-impact analysis and risk scoring.
//!
//! For every entity declared in a changed file, each transitive dependent is
//! recorded once per triggering entity. The same dependent can therefore be
//! recorded several times; the record count measures attribution, not the
//! size of the unique affected set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::query::GraphQuery;
use crate::types::{Graph, Node, NodeType};

/// Points per distinct affected file.
pub const FILE_WEIGHT: u64 = 10;
/// Points per affected-entity record.
pub const RECORD_WEIGHT: u64 = 2;
/// Points per level of maximum depth.
pub const DEPTH_WEIGHT: u64 = 5;

/// Ordinal risk classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Score below 20
    #[default]
    Low,
    /// Score below 50
    Medium,
    /// Score below 100
    High,
    /// Everything else
    Critical,
}

impl RiskLevel {
    /// All levels, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Uppercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Level for a risk score.
    #[must_use]
    pub fn classify(score: u64) -> Self {
        match score {
            0..20 => Self::Low,
            20..50 => Self::Medium,
            50..100 => Self::High,
            _ => Self::Critical,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("unknown risk level '{s}' (expected LOW, MEDIUM, HIGH or CRITICAL)")))
    }
}

/// One attribution of a dependent to a changed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedEntity {
    /// The dependent entity
    pub entity_id: String,
    /// Its node
    pub node: Node,
    /// Which changed entity pulled it in
    pub reason: String,
    /// Hops from the changed entity
    pub depth: usize,
    /// The changed file the chain starts in
    pub changed_by: String,
}

/// Aggregate counters of an [`ImpactReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMetrics {
    /// Number of changed files analyzed
    pub changed_files_count: usize,
    /// Number of affected-entity records (not deduplicated)
    pub affected_entities_count: usize,
    /// Number of distinct files among affected entities
    pub affected_files_count: usize,
    /// Record count per node type
    pub affected_by_type: BTreeMap<NodeType, usize>,
    /// Deepest record
    pub max_depth: usize,
}

/// Result of [`analyze_impact`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    /// Files the analysis started from
    pub changed_files: Vec<String>,
    /// Every attribution record
    pub affected_entities: Vec<AffectedEntity>,
    /// Aggregates over the records
    pub metrics: ImpactMetrics,
    /// Score the level was derived from
    pub risk_score: u64,
    /// Classified risk
    pub risk_level: RiskLevel,
}

impl ImpactReport {
    /// The canonical empty report: no files, zeroed metrics, LOW risk.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Analyze the impact of changing `changed_files` in `graph`.
///
/// Changed files with no entities in the graph contribute nothing.
#[must_use]
pub fn analyze_impact(graph: &Graph, changed_files: &[String]) -> ImpactReport {
    let query = GraphQuery::new(graph);
    let mut affected = Vec::new();

    for changed_file in changed_files {
        for (entity_id, _) in graph.entities_in_file(changed_file) {
            let Ok(dependents) = query.dependents(entity_id, true) else {
                continue;
            };
            affected.extend(dependents.into_iter().map(|dep| AffectedEntity {
                reason: format!("depends on {entity_id}"),
                entity_id: dep.entity_id,
                node: dep.node,
                depth: dep.depth,
                changed_by: changed_file.clone(),
            }));
        }
    }

    let metrics = metrics_for(changed_files.len(), &affected);
    let risk_score = risk_score(&metrics);

    ImpactReport {
        changed_files: changed_files.to_vec(),
        affected_entities: affected,
        risk_level: RiskLevel::classify(risk_score),
        risk_score,
        metrics,
    }
}

/// `10 × distinct affected files + 2 × records + 5 × max depth`.
#[must_use]
pub fn risk_score(metrics: &ImpactMetrics) -> u64 {
    FILE_WEIGHT * metrics.affected_files_count as u64
        + RECORD_WEIGHT * metrics.affected_entities_count as u64
        + DEPTH_WEIGHT * metrics.max_depth as u64
}

/// Keep `report` if its level reaches `threshold`, otherwise return the empty
/// report. Individual records are never filtered.
#[must_use]
pub fn filter_by_threshold(report: ImpactReport, threshold: RiskLevel) -> ImpactReport {
    if report.risk_level >= threshold {
        report
    } else {
        ImpactReport::empty()
    }
}

fn metrics_for(changed_files_count: usize, affected: &[AffectedEntity]) -> ImpactMetrics {
    let mut affected_by_type = BTreeMap::new();
    for record in affected {
        *affected_by_type.entry(record.node.node_type).or_insert(0) += 1;
    }

    ImpactMetrics {
        changed_files_count,
        affected_entities_count: affected.len(),
        affected_files_count: affected
            .iter()
            .map(|r| r.node.location(&r.entity_id))
            .collect::<HashSet<_>>()
            .len(),
        affected_by_type,
        max_depth: affected.iter().map(|r| r.depth).max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, Relationship};
    use rstest::rstest;

    /// ```text
    /// src/a.ts --imports--> src/core.ts
    /// src/b.ts --imports--> src/a.ts
    /// src/a.ts::helper --calls--> src/core.ts::run
    /// src/b.ts::main --calls--> src/a.ts::helper
    /// src/b.ts::Widget::render --calls--> src/b.ts::main
    /// ```
    fn layered() -> Graph {
        let mut graph = Graph::empty("abc1234", "2024-01-01T00:00:00.000Z");
        for file in ["src/core.ts", "src/a.ts", "src/b.ts"] {
            graph.nodes.insert(file.into(), Node::file());
        }
        graph.nodes.insert(
            "src/core.ts::run".into(),
            Node::declared(NodeType::Function, "src/core.ts", 1, 5),
        );
        graph.nodes.insert(
            "src/a.ts::helper".into(),
            Node::declared(NodeType::Function, "src/a.ts", 3, 7),
        );
        graph.nodes.insert(
            "src/b.ts::main".into(),
            Node::declared(NodeType::Function, "src/b.ts", 3, 9),
        );
        graph.nodes.insert(
            "src/b.ts::Widget".into(),
            Node::declared(NodeType::Class, "src/b.ts", 11, 20),
        );
        graph.nodes.insert(
            "src/b.ts::Widget::render".into(),
            Node::declared(NodeType::Method, "src/b.ts", 12, 15),
        );
        graph.edges = vec![
            Edge::new("src/a.ts", Relationship::Imports, "src/core.ts"),
            Edge::new("src/b.ts", Relationship::Imports, "src/a.ts"),
            Edge::new("src/a.ts::helper", Relationship::Calls, "src/core.ts::run"),
            Edge::new("src/b.ts::main", Relationship::Calls, "src/a.ts::helper"),
            Edge::new("src/b.ts::Widget::render", Relationship::Calls, "src/b.ts::main"),
        ];
        graph
    }

    #[test]
    fn scores_layered_change_as_medium() {
        let graph = layered();
        let report = analyze_impact(&graph, &["src/core.ts".to_string()]);

        assert_eq!(report.metrics.changed_files_count, 1);
        assert_eq!(report.metrics.affected_entities_count, 5);
        assert_eq!(report.metrics.affected_files_count, 2);
        assert_eq!(report.metrics.max_depth, 3);
        assert_eq!(report.risk_score, 45);
        assert_eq!(report.risk_level, RiskLevel::Medium);
        assert_eq!(report.metrics.affected_by_type[&NodeType::File], 2);
        assert_eq!(report.metrics.affected_by_type[&NodeType::Method], 1);
        assert!(report.affected_entities.iter().all(|r| r.changed_by == "src/core.ts"));
    }

    #[test]
    fn records_are_not_deduplicated_across_triggers() {
        let graph = layered();
        let report = analyze_impact(&graph, &["src/core.ts".to_string(), "src/a.ts".to_string()]);

        let main_records = report
            .affected_entities
            .iter()
            .filter(|r| r.entity_id == "src/b.ts::main")
            .count();
        assert_eq!(main_records, 2);
    }

    #[test]
    fn unknown_file_yields_zeroed_metrics() {
        let graph = layered();
        let report = analyze_impact(&graph, &["src/ghost.ts".to_string()]);

        assert!(report.affected_entities.is_empty());
        assert_eq!(report.metrics.changed_files_count, 1);
        assert_eq!(report.risk_score, 0);
        assert_eq!(report.risk_level, RiskLevel::Low);
    }

    #[rstest]
    #[case(0, RiskLevel::Low)]
    #[case(19, RiskLevel::Low)]
    #[case(20, RiskLevel::Medium)]
    #[case(49, RiskLevel::Medium)]
    #[case(50, RiskLevel::High)]
    #[case(99, RiskLevel::High)]
    #[case(100, RiskLevel::Critical)]
    #[case(10_000, RiskLevel::Critical)]
    fn classify_thresholds(#[case] score: u64, #[case] expected: RiskLevel) {
        assert_eq!(RiskLevel::classify(score), expected);
    }

    #[test]
    fn low_report_filtered_at_high_is_empty() {
        let graph = layered();
        let report = analyze_impact(&graph, &["src/b.ts".to_string()]);
        assert_eq!(report.risk_level, RiskLevel::Low);

        let filtered = filter_by_threshold(report, RiskLevel::High);

        assert_eq!(filtered, ImpactReport::empty());
        assert!(filtered.changed_files.is_empty());
    }

    #[test]
    fn report_at_threshold_is_kept() {
        let graph = layered();
        let report = analyze_impact(&graph, &["src/core.ts".to_string()]);

        let kept = filter_by_threshold(report.clone(), RiskLevel::Medium);
        assert_eq!(kept, report);
    }

    #[rstest]
    #[case("low", RiskLevel::Low)]
    #[case("MEDIUM", RiskLevel::Medium)]
    #[case("High", RiskLevel::High)]
    #[case("critical", RiskLevel::Critical)]
    fn parses_levels_case_insensitively(#[case] raw: &str, #[case] expected: RiskLevel) {
        assert_eq!(raw.parse::<RiskLevel>().expect("valid level"), expected);
    }

    #[test]
    fn rejects_unknown_level() {
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn report_serializes_uppercase_level() {
        let json = serde_json::to_value(ImpactReport::empty()).expect("serialize");
        assert_eq!(json["riskLevel"], "LOW");
        assert_eq!(json["riskScore"], 0);
        assert_eq!(json["metrics"]["affectedEntitiesCount"], 0);
    }
}
