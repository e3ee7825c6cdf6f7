//! TypeScript and TSX front end.
//!
//! Extracts, per file:
//!
//! | Fact | Source construct |
//! |------|------------------|
//! | imports | `import ... from '...'`, `import x = require('...')`, `export ... from '...'` |
//! | classes | `class` / `abstract class` declarations, with heritage and methods |
//! | functions | `function` declarations, `const f = () => ...`, `const f = function ...` |
//! | interfaces | `interface` declarations |
//!
//! Only top-level (optionally `export`ed) declarations are collected. Calls are
//! the raw callee text of every call expression inside a function or method
//! body, in source order.

use tracing::debug;
use tree_sitter::{Node, Parser};

use super::tree_sitter_utils::{field_text, node_lines, node_text, unquote};
use super::Language;
use crate::error::{Error, Result};
use crate::types::{ParsedClass, ParsedFile, ParsedFunction, ParsedImport, ParsedInterface};

/// Node kinds of the tree-sitter-typescript grammar.
mod node_kinds {
    pub const IMPORT_STATEMENT: &str = "import_statement";
    pub const IMPORT_REQUIRE_CLAUSE: &str = "import_require_clause";
    pub const EXPORT_STATEMENT: &str = "export_statement";

    pub const CLASS_DECLARATION: &str = "class_declaration";
    pub const ABSTRACT_CLASS_DECLARATION: &str = "abstract_class_declaration";
    pub const CLASS: &str = "class";
    pub const CLASS_HERITAGE: &str = "class_heritage";
    pub const EXTENDS_CLAUSE: &str = "extends_clause";
    pub const IMPLEMENTS_CLAUSE: &str = "implements_clause";
    pub const GENERIC_TYPE: &str = "generic_type";
    pub const METHOD_DEFINITION: &str = "method_definition";

    pub const FUNCTION_DECLARATION: &str = "function_declaration";
    pub const GENERATOR_FUNCTION_DECLARATION: &str = "generator_function_declaration";
    pub const LEXICAL_DECLARATION: &str = "lexical_declaration";
    pub const VARIABLE_DECLARATION: &str = "variable_declaration";
    pub const VARIABLE_DECLARATOR: &str = "variable_declarator";
    pub const FUNCTION_VALUES: [&str; 4] = [
        "arrow_function",
        "function_expression",
        "function",
        "generator_function",
    ];

    pub const INTERFACE_DECLARATION: &str = "interface_declaration";

    pub const CALL_EXPRESSION: &str = "call_expression";

    /// Anonymous keyword in `import type` / `export type`
    pub const TYPE_KEYWORD: &str = "type";
}

use node_kinds as kinds;

/// Reusable parsers for `.ts` and `.tsx` sources.
///
/// Holds one tree-sitter parser per grammar; create one per worker thread.
pub struct TypeScriptParser {
    typescript: Parser,
    tsx: Parser,
}

impl std::fmt::Debug for TypeScriptParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeScriptParser").finish_non_exhaustive()
    }
}

impl TypeScriptParser {
    /// Create parsers for both grammars.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parser`] if a grammar is incompatible with the linked
    /// tree-sitter runtime.
    pub fn new() -> Result<Self> {
        Ok(Self {
            typescript: parser_for(Language::TypeScript)?,
            tsx: parser_for(Language::Tsx)?,
        })
    }

    /// Parse `content` as `language`, recording facts under `file_path`.
    ///
    /// Syntax errors are tolerated: tree-sitter recovers and whatever
    /// declarations it still recognises are extracted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parser`] if tree-sitter produced no tree.
    pub fn parse(&mut self, language: Language, file_path: &str, content: &[u8]) -> Result<ParsedFile> {
        let parser = match language {
            Language::TypeScript => &mut self.typescript,
            Language::Tsx => &mut self.tsx,
        };
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| Error::Parser(format!("tree-sitter returned no tree for {file_path}")))?;

        let root = tree.root_node();
        if root.has_error() {
            debug!(file = %file_path, "Syntax errors present, extracting what parsed");
        }

        Ok(extract(root, content, file_path))
    }
}

fn parser_for(language: Language) -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.tree_sitter_language())
        .map_err(|e| Error::Parser(format!("failed to load {language:?} grammar: {e}")))?;
    Ok(parser)
}

/// Extract facts from a parsed `program` node.
#[must_use]
pub fn extract(root: Node, content: &[u8], file_path: &str) -> ParsedFile {
    let mut parsed = ParsedFile::new(file_path);
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        visit_top_level(child, content, &mut parsed);
    }
    parsed
}

fn visit_top_level(node: Node, content: &[u8], out: &mut ParsedFile) {
    match node.kind() {
        kinds::IMPORT_STATEMENT => {
            if let Some(import) = import_of(node, content) {
                out.imports.push(import);
            }
        }
        kinds::EXPORT_STATEMENT => {
            // Re-exports depend on their source module.
            if let Some(source) = field_text(&node, "source", content) {
                out.imports.push(ParsedImport {
                    from: unquote(source).to_string(),
                    is_type_only: has_type_keyword(node),
                });
            }
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                visit_declaration(child, content, out);
            }
        }
        _ => visit_declaration(node, content, out),
    }
}

fn visit_declaration(node: Node, content: &[u8], out: &mut ParsedFile) {
    match node.kind() {
        kinds::CLASS_DECLARATION | kinds::ABSTRACT_CLASS_DECLARATION | kinds::CLASS => {
            if let Some(class) = class_of(node, content) {
                out.classes.push(class);
            }
        }
        kinds::FUNCTION_DECLARATION | kinds::GENERATOR_FUNCTION_DECLARATION => {
            if let Some(name) = field_text(&node, "name", content) {
                out.functions.push(function_of(name, node, node.child_by_field_name("body"), content));
            }
        }
        kinds::LEXICAL_DECLARATION | kinds::VARIABLE_DECLARATION => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != kinds::VARIABLE_DECLARATOR {
                    continue;
                }
                let Some(value) = declarator.child_by_field_name("value") else {
                    continue;
                };
                if !kinds::FUNCTION_VALUES.contains(&value.kind()) {
                    continue;
                }
                if let Some(name) = field_text(&declarator, "name", content) {
                    out.functions.push(function_of(name, node, value.child_by_field_name("body"), content));
                }
            }
        }
        kinds::INTERFACE_DECLARATION => {
            if let Some(name) = field_text(&node, "name", content) {
                let (line, end_line) = node_lines(&node);
                out.interfaces.push(ParsedInterface {
                    name: name.to_string(),
                    line,
                    end_line,
                });
            }
        }
        _ => {}
    }
}

fn import_of(node: Node, content: &[u8]) -> Option<ParsedImport> {
    let source = field_text(&node, "source", content).or_else(|| {
        let mut cursor = node.walk();
        let clause = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == kinds::IMPORT_REQUIRE_CLAUSE)?;
        field_text(&clause, "source", content)
    })?;

    Some(ParsedImport {
        from: unquote(source).to_string(),
        is_type_only: has_type_keyword(node),
    })
}

/// Whether the statement itself is `import type` / `export type`.
///
/// Inline `import { type X }` specifiers do not make the statement type-only.
fn has_type_keyword(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == kinds::TYPE_KEYWORD)
}

fn class_of(node: Node, content: &[u8]) -> Option<ParsedClass> {
    let name = field_text(&node, "name", content)?;
    let (line, end_line) = node_lines(&node);
    let mut class = ParsedClass {
        name: name.to_string(),
        line,
        end_line,
        ..ParsedClass::default()
    };

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == kinds::CLASS_HERITAGE {
            read_heritage(child, content, &mut class);
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() != kinds::METHOD_DEFINITION {
                continue;
            }
            if let Some(method_name) = field_text(&member, "name", content) {
                class
                    .methods
                    .push(function_of(method_name, member, member.child_by_field_name("body"), content));
            }
        }
    }

    Some(class)
}

fn read_heritage(heritage: Node, content: &[u8], class: &mut ParsedClass) {
    let mut cursor = heritage.walk();
    for clause in heritage.named_children(&mut cursor) {
        match clause.kind() {
            kinds::EXTENDS_CLAUSE => {
                let value = clause.child_by_field_name("value").or_else(|| clause.named_child(0));
                class.extends = value
                    .and_then(|v| node_text(&v, content))
                    .map(ToString::to_string);
            }
            kinds::IMPLEMENTS_CLAUSE => {
                let mut inner = clause.walk();
                for ty in clause.named_children(&mut inner) {
                    let name = if ty.kind() == kinds::GENERIC_TYPE {
                        field_text(&ty, "name", content)
                    } else {
                        node_text(&ty, content)
                    };
                    if let Some(name) = name {
                        class.implements.push(name.to_string());
                    }
                }
            }
            _ => {}
        }
    }
}

fn function_of(name: &str, span: Node, body: Option<Node>, content: &[u8]) -> ParsedFunction {
    let (line, end_line) = node_lines(&span);
    let mut calls = Vec::new();
    if let Some(body) = body {
        collect_calls(body, content, &mut calls);
    }
    ParsedFunction {
        name: name.to_string(),
        line,
        end_line,
        calls,
    }
}

/// Callee text of every call expression under `node`, in source order.
fn collect_calls(node: Node, content: &[u8], calls: &mut Vec<String>) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == kinds::CALL_EXPRESSION {
            if let Some(callee) = field_text(&current, "function", content) {
                calls.push(callee.to_string());
            }
        }
        let mut cursor = current.walk();
        let children: Vec<Node> = current.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ts(source: &str) -> ParsedFile {
        TypeScriptParser::new()
            .expect("grammars load")
            .parse(Language::TypeScript, "src/sample.ts", source.as_bytes())
            .expect("parses")
    }

    #[test]
    fn extracts_value_and_type_imports() {
        let parsed = parse_ts(
            r"
import { UserService } from './services/user';
import type { Config } from '../config';
import * as path from 'path';
import './polyfills';
import legacy = require('./legacy');
export { helper } from './helpers';
",
        );

        let imports: Vec<(&str, bool)> = parsed
            .imports
            .iter()
            .map(|i| (i.from.as_str(), i.is_type_only))
            .collect();
        assert_eq!(
            imports,
            vec![
                ("./services/user", false),
                ("../config", true),
                ("path", false),
                ("./polyfills", false),
                ("./legacy", false),
                ("./helpers", false),
            ]
        );
    }

    #[test]
    fn inline_type_specifier_is_a_value_import() {
        let parsed = parse_ts("import { type A, b } from './mixed';\n");
        assert_eq!(parsed.imports, vec![ParsedImport::value("./mixed")]);
    }

    #[test]
    fn extracts_class_with_heritage_and_methods() {
        let parsed = parse_ts(
            r"
export class UserService extends BaseService implements Repo<User>, Disposable {
  find(id: string) {
    this.validate(id);
    return lookup(id);
  }

  validate(id: string) {
    assertId(id);
  }
}
",
        );

        assert_eq!(parsed.classes.len(), 1);
        let class = &parsed.classes[0];
        assert_eq!(class.name, "UserService");
        assert_eq!(class.line, 2);
        assert_eq!(class.end_line, 11);
        assert_eq!(class.extends.as_deref(), Some("BaseService"));
        assert_eq!(class.implements, vec!["Repo", "Disposable"]);

        let methods: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["find", "validate"]);
        assert_eq!(class.methods[0].calls, vec!["this.validate", "lookup"]);
        assert_eq!(class.methods[1].calls, vec!["assertId"]);
    }

    #[test]
    fn abstract_classes_are_classes() {
        let parsed = parse_ts("export abstract class Shape {\n  area() { return 0; }\n}\n");
        assert_eq!(parsed.classes.len(), 1);
        assert_eq!(parsed.classes[0].name, "Shape");
        assert_eq!(parsed.classes[0].methods.len(), 1);
    }

    #[test]
    fn extracts_function_forms() {
        let parsed = parse_ts(
            r"
function main() {
  run(parse(args()));
}

export const helper = (x: number) => format(x);

const legacy = function () {
  main();
};

const notAFunction = 42;
",
        );

        let names: Vec<&str> = parsed.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["main", "helper", "legacy"]);
        assert_eq!(parsed.functions[0].calls, vec!["run", "parse", "args"]);
        assert_eq!(parsed.functions[0].line, 2);
        assert_eq!(parsed.functions[0].end_line, 4);
        assert_eq!(parsed.functions[1].calls, vec!["format"]);
        assert_eq!(parsed.functions[2].calls, vec!["main"]);
    }

    #[test]
    fn extracts_interfaces() {
        let parsed = parse_ts("export interface Repo<T> {\n  find(id: string): T;\n}\n");
        assert_eq!(
            parsed.interfaces,
            vec![ParsedInterface {
                name: "Repo".into(),
                line: 1,
                end_line: 3,
            }]
        );
    }

    #[test]
    fn nested_declarations_are_not_top_level() {
        let parsed = parse_ts("function outer() {\n  function inner() {}\n  inner();\n}\n");
        let names: Vec<&str> = parsed.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["outer"]);
        assert_eq!(parsed.functions[0].calls, vec!["inner"]);
    }

    #[test]
    fn tsx_components_parse() {
        let parsed = TypeScriptParser::new()
            .expect("grammars load")
            .parse(
                Language::Tsx,
                "src/App.tsx",
                b"import { render } from './render';\nexport function App() {\n  return <div>{render()}</div>;\n}\n",
            )
            .expect("parses");

        assert_eq!(parsed.file_path, "src/App.tsx");
        assert_eq!(parsed.imports.len(), 1);
        assert_eq!(parsed.functions[0].name, "App");
        assert_eq!(parsed.functions[0].calls, vec!["render"]);
    }
}
