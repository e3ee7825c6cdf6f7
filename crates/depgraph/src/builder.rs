//! Graph construction from parsed-file facts.
//!
//! Building runs in two passes, in this order:
//!
//! 1. **Node pass**: every file contributes a file node plus one node per
//!    class, method, function and interface.
//! 2. **Edge pass**: imports are resolved and turned into `imports` edges;
//!    calls and inheritance go through a [`ResolutionStrategy`].
//!
//! The node pass finishes for all files before any edge is created, so an edge
//! is only ever emitted when its target node exists. An import that resolves to
//! a real file which was not part of the parsed set is recorded as an
//! *orphaned edge* instead.

use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, trace};

use crate::entity::{
    format_class_id, format_file_id, format_function_id, format_interface_id, format_method_id,
};
use crate::resolver::ImportResolver;
use crate::types::{
    Edge, Graph, Node, NodeType, ParsedClass, ParsedFile, Relationship, GRAPH_FORMAT_VERSION,
};

/// Number of referencing sources shown per orphaned target in summaries.
pub const ORPHAN_SOURCES_SHOWN: usize = 3;

/// A call expression awaiting resolution.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    /// File entity ID containing the call
    pub file: &'a str,
    /// Enclosing class, for calls made inside a method
    pub class: Option<&'a str>,
    /// Entity ID of the calling function or method
    pub caller: &'a str,
    /// Raw callee text (`helper`, `this.save`, `api.fetch`)
    pub callee: &'a str,
}

/// Decides which entity a call or heritage clause refers to.
///
/// The builder only emits an edge when the returned ID is a known node.
pub trait ResolutionStrategy: Send + Sync {
    /// Target entity of a call expression.
    fn resolve_call(&self, site: &CallSite<'_>, nodes: &BTreeMap<String, Node>) -> Option<String>;

    /// Target entity of an `extends` or `implements` clause.
    fn resolve_heritage(
        &self,
        file: &str,
        class: &ParsedClass,
        name: &str,
        relationship: Relationship,
        nodes: &BTreeMap<String, Node>,
    ) -> Option<String>;
}

/// Resolves same-file function calls and `this.<method>` calls only.
///
/// Qualified calls, cross-file symbols and heritage clauses stay unresolved.
#[derive(Debug, Default, Clone, Copy)]
pub struct SameFileStrategy;

impl ResolutionStrategy for SameFileStrategy {
    fn resolve_call(&self, site: &CallSite<'_>, nodes: &BTreeMap<String, Node>) -> Option<String> {
        let callee = site.callee.split('(').next().unwrap_or_default().trim();

        let candidate = if let Some(member) = callee.strip_prefix("this.") {
            let class = site.class?;
            if !is_identifier(member) {
                return None;
            }
            format_method_id(site.file, class, member)
        } else if is_identifier(callee) {
            format_function_id(site.file, callee)
        } else {
            return None;
        };

        nodes.contains_key(&candidate).then_some(candidate)
    }

    fn resolve_heritage(
        &self,
        _file: &str,
        _class: &ParsedClass,
        _name: &str,
        _relationship: Relationship,
        _nodes: &BTreeMap<String, Node>,
    ) -> Option<String> {
        None
    }
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Imports that resolved to a file with no node, grouped by target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanedEdges {
    by_target: BTreeMap<String, Vec<String>>,
}

impl OrphanedEdges {
    /// Record that `source` reaches `target`. Repeats of the same pair are ignored.
    pub fn record(&mut self, target: impl Into<String>, source: impl Into<String>) {
        let source = source.into();
        let sources = self.by_target.entry(target.into()).or_default();
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }

    /// Number of distinct missing targets.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.by_target.len()
    }

    /// Total number of skipped edges, one per distinct source and target.
    #[must_use]
    pub fn occurrence_count(&self) -> usize {
        self.by_target.values().map(Vec::len).sum()
    }

    /// Missing targets with the files that referenced them.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.by_target.iter().map(|(t, s)| (t.as_str(), s.as_slice()))
    }

    /// One line per target, listing up to `max_sources` referencing files.
    #[must_use]
    pub fn summary_lines(&self, max_sources: usize) -> Vec<String> {
        self.iter()
            .map(|(target, sources)| {
                let shown = sources.iter().take(max_sources).cloned().collect::<Vec<_>>().join(", ");
                let hidden = sources.len().saturating_sub(max_sources);
                if hidden > 0 {
                    format!("{target} <- {shown} (+{hidden} more)")
                } else {
                    format!("{target} <- {shown}")
                }
            })
            .collect()
    }
}

/// Result of a build: the snapshot plus diagnostics for the caller.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The built snapshot
    pub graph: Graph,
    /// Imports whose target file exists but has no node
    pub orphaned: OrphanedEdges,
    /// Imports that resolved to nothing (external packages, missing files)
    pub unresolved_imports: usize,
}

/// Builds graph snapshots from parsed facts.
pub struct GraphBuilder<'r> {
    resolver: &'r ImportResolver,
    strategy: Box<dyn ResolutionStrategy>,
}

impl std::fmt::Debug for GraphBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl<'r> GraphBuilder<'r> {
    /// Builder using the same-file resolution strategy.
    #[must_use]
    pub fn new(resolver: &'r ImportResolver) -> Self {
        Self {
            resolver,
            strategy: Box::new(SameFileStrategy),
        }
    }

    /// Replace the call/heritage resolution strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn ResolutionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Build a snapshot from a complete set of parsed files.
    #[must_use]
    pub fn build(&self, parsed: &[ParsedFile], commit_hash: &str, project_root: &Path) -> BuildOutput {
        let nodes = collect_nodes(parsed);

        let aliases = self.resolver.alias_config(project_root);
        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        let mut orphaned = OrphanedEdges::default();
        let mut unresolved_imports = 0;

        let mut push = |edge: Edge| {
            if seen.insert(edge.clone()) {
                edges.push(edge);
            }
        };

        for file in parsed {
            let file_id = format_file_id(&file.file_path);

            for import in file.imports.iter().filter(|i| !i.is_type_only) {
                match self
                    .resolver
                    .resolve(&import.from, &file_id, project_root, aliases.as_deref())
                {
                    Some(target) if nodes.contains_key(&target) => {
                        push(Edge::new(file_id.clone(), Relationship::Imports, target));
                    }
                    Some(target) => {
                        trace!(source = %file_id, target = %target, "Import target has no node");
                        orphaned.record(target, file_id.clone());
                    }
                    None => {
                        debug!(source = %file_id, specifier = %import.from, "Unresolved import");
                        unresolved_imports += 1;
                    }
                }
            }

            for class in &file.classes {
                let class_id = format_class_id(&file_id, &class.name);
                let heritage = class
                    .extends
                    .iter()
                    .map(|name| (name, Relationship::Extends))
                    .chain(class.implements.iter().map(|name| (name, Relationship::Implements)));
                for (name, relationship) in heritage {
                    if let Some(target) =
                        self.strategy
                            .resolve_heritage(&file_id, class, name, relationship, &nodes)
                            .filter(|t| nodes.contains_key(t))
                    {
                        push(Edge::new(class_id.clone(), relationship, target));
                    }
                }

                for method in &class.methods {
                    let caller = format_method_id(&file_id, &class.name, &method.name);
                    for callee in &method.calls {
                        let site = CallSite {
                            file: &file_id,
                            class: Some(&class.name),
                            caller: &caller,
                            callee,
                        };
                        if let Some(target) = self.resolve_call(&site, &nodes) {
                            push(Edge::new(caller.clone(), Relationship::Calls, target));
                        }
                    }
                }
            }

            for function in &file.functions {
                let caller = format_function_id(&file_id, &function.name);
                for callee in &function.calls {
                    let site = CallSite {
                        file: &file_id,
                        class: None,
                        caller: &caller,
                        callee,
                    };
                    if let Some(target) = self.resolve_call(&site, &nodes) {
                        push(Edge::new(caller.clone(), Relationship::Calls, target));
                    }
                }
            }
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            orphaned = orphaned.occurrence_count(),
            unresolved = unresolved_imports,
            "Graph built"
        );

        BuildOutput {
            graph: Graph {
                version: GRAPH_FORMAT_VERSION.to_string(),
                commit_hash: commit_hash.to_string(),
                timestamp: now_timestamp(),
                nodes,
                edges,
            },
            orphaned,
            unresolved_imports,
        }
    }

    fn resolve_call(&self, site: &CallSite<'_>, nodes: &BTreeMap<String, Node>) -> Option<String> {
        self.strategy
            .resolve_call(site, nodes)
            .filter(|target| nodes.contains_key(target))
    }
}

/// Build a snapshot with a file-system resolver and the default strategy.
#[must_use]
pub fn build_graph(parsed: &[ParsedFile], commit_hash: &str, project_root: &Path) -> BuildOutput {
    let resolver = ImportResolver::default();
    GraphBuilder::new(&resolver).build(parsed, commit_hash, project_root)
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn collect_nodes(parsed: &[ParsedFile]) -> BTreeMap<String, Node> {
    let mut nodes = BTreeMap::new();

    for file in parsed {
        let file_id = format_file_id(&file.file_path);
        nodes.insert(file_id.clone(), Node::file());

        for class in &file.classes {
            nodes.insert(
                format_class_id(&file_id, &class.name),
                Node::declared(NodeType::Class, &file_id, class.line, class.end_line),
            );
            for method in &class.methods {
                nodes.insert(
                    format_method_id(&file_id, &class.name, &method.name),
                    Node::declared(NodeType::Method, &file_id, method.line, method.end_line),
                );
            }
        }

        for function in &file.functions {
            nodes.insert(
                format_function_id(&file_id, &function.name),
                Node::declared(NodeType::Function, &file_id, function.line, function.end_line),
            );
        }

        for interface in &file.interfaces {
            nodes.insert(
                format_interface_id(&file_id, &interface.name),
                Node::declared(NodeType::Interface, &file_id, interface.line, interface.end_line),
            );
        }
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FileSet;
    use crate::types::{ParsedFunction, ParsedImport, ParsedInterface};
    use std::sync::Arc;

    const ROOT: &str = "/project";

    fn resolver(files: &[&str]) -> ImportResolver {
        ImportResolver::new(Arc::new(FileSet::new(Path::new(ROOT), files.iter().copied())))
    }

    fn function(name: &str, line: u32, calls: &[&str]) -> ParsedFunction {
        ParsedFunction {
            name: name.to_string(),
            line,
            end_line: line + 2,
            calls: calls.iter().map(ToString::to_string).collect(),
        }
    }

    fn build(parsed: &[ParsedFile], on_disk: &[&str]) -> BuildOutput {
        let resolver = resolver(on_disk);
        resolver.cache().insert(Path::new(ROOT), None);
        GraphBuilder::new(&resolver).build(parsed, "abc1234", Path::new(ROOT))
    }

    #[test]
    fn node_pass_emits_every_entity() {
        let mut file = ParsedFile::new("src/user.ts");
        file.classes.push(ParsedClass {
            name: "User".into(),
            line: 3,
            end_line: 20,
            methods: vec![function("save", 5, &[])],
            ..ParsedClass::default()
        });
        file.functions.push(function("createUser", 22, &[]));
        file.interfaces.push(ParsedInterface {
            name: "IUser".into(),
            line: 1,
            end_line: 2,
        });

        let graph = build(&[file], &["src/user.ts"]).graph;

        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.nodes["src/user.ts"], Node::file());
        assert_eq!(
            graph.nodes["src/user.ts::User::save"],
            Node::declared(NodeType::Method, "src/user.ts", 5, 7)
        );
        assert_eq!(graph.nodes["src/user.ts::IUser"].node_type, NodeType::Interface);
        assert_eq!(graph.commit_hash, "abc1234");
        assert_eq!(graph.version, GRAPH_FORMAT_VERSION);
    }

    #[test]
    fn imports_resolve_to_files_declared_later() {
        let mut a = ParsedFile::new("src/a.ts");
        a.imports.push(ParsedImport::value("./b"));
        let b = ParsedFile::new("src/b.ts");

        let graph = build(&[a, b], &["src/a.ts", "src/b.ts"]).graph;

        assert_eq!(
            graph.edges,
            vec![Edge::new("src/a.ts", Relationship::Imports, "src/b.ts")]
        );
    }

    #[test]
    fn import_of_unparsed_file_is_orphaned_not_dangling() {
        let mut a = ParsedFile::new("src/a.ts");
        a.imports.push(ParsedImport::value("./missing"));

        let output = build(&[a], &["src/a.ts", "src/missing.ts"]);

        assert_eq!(output.graph.nodes.len(), 1);
        assert!(!output.graph.contains("src/missing.ts"));
        assert!(output.graph.edges.is_empty());
        assert_eq!(output.orphaned.target_count(), 1);
        let (target, sources) = output.orphaned.iter().next().expect("one orphan");
        assert_eq!(target, "src/missing.ts");
        assert_eq!(sources, ["src/a.ts".to_string()]);
    }

    #[test]
    fn repeated_import_of_unparsed_file_is_one_orphan() {
        let mut a = ParsedFile::new("src/a.ts");
        a.imports.push(ParsedImport::value("./missing"));
        a.imports.push(ParsedImport::value("./missing.ts"));
        let mut b = ParsedFile::new("src/b.ts");
        b.imports.push(ParsedImport::value("./missing"));

        let output = build(&[a, b], &["src/a.ts", "src/b.ts", "src/missing.ts"]);

        assert_eq!(output.orphaned.target_count(), 1);
        assert_eq!(output.orphaned.occurrence_count(), 2);
        let (_, sources) = output.orphaned.iter().next().expect("one orphan");
        assert_eq!(sources, ["src/a.ts".to_string(), "src/b.ts".to_string()]);
    }

    #[test]
    fn type_only_imports_are_skipped_silently() {
        let mut a = ParsedFile::new("src/a.ts");
        a.imports.push(ParsedImport::type_only("./types"));
        a.imports.push(ParsedImport::type_only("./missing"));
        let types = ParsedFile::new("src/types.ts");

        let output = build(&[a, types], &["src/a.ts", "src/types.ts", "src/missing.ts"]);

        assert!(output.graph.edges.is_empty());
        assert!(output.orphaned.is_empty());
        assert_eq!(output.unresolved_imports, 0);
    }

    #[test]
    fn external_imports_count_as_unresolved() {
        let mut a = ParsedFile::new("src/a.ts");
        a.imports.push(ParsedImport::value("react"));

        let output = build(&[a], &["src/a.ts"]);
        assert_eq!(output.unresolved_imports, 1);
        assert!(output.orphaned.is_empty());
    }

    #[test]
    fn same_file_and_this_calls_resolve() {
        let mut file = ParsedFile::new("src/svc.ts");
        file.functions.push(function("helper", 1, &[]));
        file.functions.push(function("main", 5, &["helper", "console.log", "other"]));
        file.classes.push(ParsedClass {
            name: "Svc".into(),
            line: 10,
            end_line: 30,
            methods: vec![
                function("run", 11, &["this.validate", "helper", "this.missing", "api.fetch"]),
                function("validate", 20, &[]),
            ],
            extends: Some("Base".into()),
            implements: vec!["Runner".into()],
        });

        let graph = build(&[file], &["src/svc.ts"]).graph;

        assert_eq!(
            graph.edges,
            vec![
                Edge::new("src/svc.ts::Svc::run", Relationship::Calls, "src/svc.ts::Svc::validate"),
                Edge::new("src/svc.ts::Svc::run", Relationship::Calls, "src/svc.ts::helper"),
                Edge::new("src/svc.ts::main", Relationship::Calls, "src/svc.ts::helper"),
            ]
        );
    }

    #[test]
    fn this_call_outside_class_is_unresolved() {
        let mut file = ParsedFile::new("src/f.ts");
        file.functions.push(function("go", 1, &["this.go"]));

        let graph = build(&[file], &["src/f.ts"]).graph;
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn repeated_calls_produce_one_edge() {
        let mut file = ParsedFile::new("src/f.ts");
        file.functions.push(function("a", 1, &["b", "b", "b()"]));
        file.functions.push(function("b", 5, &[]));

        let graph = build(&[file], &["src/f.ts"]).graph;
        assert_eq!(graph.edges.len(), 1);
    }

    struct HeritageByName;

    impl ResolutionStrategy for HeritageByName {
        fn resolve_call(&self, site: &CallSite<'_>, nodes: &BTreeMap<String, Node>) -> Option<String> {
            SameFileStrategy.resolve_call(site, nodes)
        }

        fn resolve_heritage(
            &self,
            file: &str,
            _class: &ParsedClass,
            name: &str,
            _relationship: Relationship,
            _nodes: &BTreeMap<String, Node>,
        ) -> Option<String> {
            Some(format_class_id(file, name))
        }
    }

    #[test]
    fn substituted_strategy_can_emit_heritage_edges() {
        let mut file = ParsedFile::new("src/m.ts");
        for (name, extends) in [("Base", None), ("Child", Some("Base")), ("Orphan", Some("Nowhere"))] {
            file.classes.push(ParsedClass {
                name: name.into(),
                line: 1,
                end_line: 2,
                extends: extends.map(Into::into),
                ..ParsedClass::default()
            });
        }

        let resolver = resolver(&["src/m.ts"]);
        resolver.cache().insert(Path::new(ROOT), None);
        let graph = GraphBuilder::new(&resolver)
            .with_strategy(Box::new(HeritageByName))
            .build(&[file], "x", Path::new(ROOT))
            .graph;

        assert_eq!(
            graph.edges,
            vec![Edge::new("src/m.ts::Child", Relationship::Extends, "src/m.ts::Base")]
        );
    }

    #[test]
    fn orphan_summary_truncates_sources() {
        let mut orphans = OrphanedEdges::default();
        for source in ["a.ts", "b.ts", "c.ts", "d.ts"] {
            orphans.record("gone.ts", source);
        }

        assert_eq!(orphans.occurrence_count(), 4);
        assert_eq!(
            orphans.summary_lines(2),
            vec!["gone.ts <- a.ts, b.ts (+2 more)".to_string()]
        );
    }

    #[test]
    fn timestamp_is_iso8601_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
