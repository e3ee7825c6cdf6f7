//! Loader for `tsconfig.json` / `jsconfig.json` path mappings.
//!
//! Only `compilerOptions.baseUrl` and `compilerOptions.paths` are read. Pattern
//! order is preserved because it breaks specificity ties during resolution.
//! Comments and trailing commas are accepted, as `tsc` accepts them.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::resolver::AliasConfig;

/// Config files probed at the project root, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["tsconfig.json", "jsconfig.json"];

#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "compilerOptions")]
    compiler_options: Option<CompilerOptions>,
}

#[derive(Deserialize)]
struct CompilerOptions {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    paths: Option<IndexMap<String, Vec<String>>>,
}

/// Load the alias configuration for a project root.
///
/// Returns `None` when no config file exists, it cannot be parsed, or it
/// declares neither `baseUrl` nor `paths`.
#[must_use]
pub fn load(root: &Path) -> Option<AliasConfig> {
    CONFIG_FILE_NAMES.iter().find_map(|name| {
        let path = root.join(name);
        let content = std::fs::read_to_string(&path).ok()?;
        let parsed = parse_content(&content);
        if parsed.is_none() {
            debug!(file = %path.display(), "No usable path aliases");
        }
        parsed
    })
}

/// Parse the text of a tsconfig-style file.
#[must_use]
pub fn parse_content(content: &str) -> Option<AliasConfig> {
    let clean = strip_trailing_commas(&strip_json_comments(content));
    let raw: RawConfig = match serde_json::from_str(&clean) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "tsconfig is not valid JSON, path aliases ignored");
            return None;
        }
    };
    let opts = raw.compiler_options?;
    if opts.base_url.is_none() && opts.paths.is_none() {
        return None;
    }

    Some(AliasConfig {
        base_url: opts.base_url,
        paths: opts.paths.unwrap_or_default(),
    })
}

/// Strip `//` and `/* */` comments from JSON, leaving string contents alone.
fn strip_json_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                while let Some(ch) = chars.next() {
                    if ch == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => result.push(c),
        }
    }
    result
}

/// Drop commas that directly precede a closing `}` or `]`.
///
/// Expects comments to be stripped already.
fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut result = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            result.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    result.push(next);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            result.push(c);
        } else if c == ',' {
            let closes = chars[i + 1..]
                .iter()
                .find(|ch| !ch.is_whitespace())
                .is_some_and(|&ch| ch == '}' || ch == ']');
            if !closes {
                result.push(c);
            }
        } else {
            result.push(c);
        }
        i += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_outside_strings() {
        let input = r#"{ // comment
            "baseUrl": "./src", /* inline */ "x": "http://keep.me" }"#;
        let clean = strip_json_comments(input);
        assert!(!clean.contains("// comment"));
        assert!(!clean.contains("/*"));
        assert!(clean.contains("http://keep.me"));
    }

    #[test]
    fn parses_paths_in_declaration_order() {
        let config = parse_content(
            r#"{
                // project aliases
                "compilerOptions": {
                    "baseUrl": "./src",
                    "paths": {
                        "@/*": ["./*"],
                        "@api/*": ["core/api/*"]
                    }
                }
            }"#,
        )
        .expect("config with paths");

        assert_eq!(config.base_url.as_deref(), Some("./src"));
        let patterns: Vec<_> = config.paths.keys().map(String::as_str).collect();
        assert_eq!(patterns, vec!["@/*", "@api/*"]);
    }

    #[test]
    fn trailing_commas_are_accepted() {
        let config = parse_content(
            r#"{
                "compilerOptions": {
                    "baseUrl": ".",
                    "paths": {
                        "@/*": ["src/*",],
                        "@lib/*": ["lib/*"], // shared code
                    },
                },
            }"#,
        )
        .expect("config with trailing commas");

        assert_eq!(config.base_url.as_deref(), Some("."));
        let patterns: Vec<_> = config.paths.keys().map(String::as_str).collect();
        assert_eq!(patterns, vec!["@/*", "@lib/*"]);
        assert_eq!(config.paths["@/*"], vec!["src/*".to_string()]);
    }

    #[test]
    fn commas_inside_strings_are_kept() {
        assert_eq!(strip_trailing_commas(r#"{"a": ",}", }"#), r#"{"a": ",}" }"#);
        assert_eq!(strip_trailing_commas("[1, 2]"), "[1, 2]");
    }

    #[test]
    fn missing_compiler_options_yields_none() {
        assert!(parse_content(r#"{ "include": ["src"] }"#).is_none());
        assert!(parse_content(r#"{ "compilerOptions": { "strict": true } }"#).is_none());
        assert!(parse_content("not json").is_none());
    }

    #[test]
    fn load_falls_back_to_jsconfig() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join("jsconfig.json"),
            r#"{ "compilerOptions": { "paths": { "~/*": ["lib/*"] } } }"#,
        )
        .expect("write jsconfig");

        let config = load(dir.path()).expect("jsconfig should load");
        assert!(config.base_url.is_none());
        assert_eq!(config.paths["~/*"], vec!["lib/*".to_string()]);
    }
}
