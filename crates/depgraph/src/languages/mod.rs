//! Source language front ends.
//!
//! A front end turns one source file into a [`ParsedFile`](crate::types::ParsedFile):
//! the declarations it contains and the raw text of every import and call.
//! Resolving those strings to entities is the builder's job, not the parser's.

pub mod tree_sitter_utils;
pub mod typescript;

use std::path::Path;

/// Languages the scanner recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// `.ts`
    TypeScript,
    /// `.tsx`
    Tsx,
}

impl Language {
    /// Language for a file extension (without the dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    /// Language for a path, or `None` for unsupported files and declaration
    /// files (`*.d.ts`).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if is_declaration_file(name) {
            return None;
        }
        Self::from_extension(path.extension()?.to_str()?)
    }

    /// Tree-sitter grammar for this language.
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

fn is_declaration_file(name: &str) -> bool {
    name.ends_with(".d.ts")
}
