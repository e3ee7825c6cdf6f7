//! Import specifier resolution.
//!
//! Maps an import specifier written in one file to the entity ID of the file it
//! refers to. Relative specifiers (`./user`, `../lib`) resolve against the
//! importing file's directory; anything else is matched against the project's
//! path aliases (`@api/*`). External packages simply don't resolve.
//!
//! Every candidate is probed through a [`FileOracle`] so resolution can be
//! tested without touching the disk.

use indexmap::IndexMap;
use path_clean::PathClean;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::entity::relative_posix;
use crate::tsconfig;

/// Suffixes tried, in order, after a bare specifier.
const PROBE_SUFFIXES: [&str; 4] = [".ts", ".tsx", "/index.ts", "/index.tsx"];

/// Answers "does this file exist?" for the resolver.
pub trait FileOracle: Send + Sync {
    /// Whether `path` (absolute, or relative to the process) names a file.
    fn is_file(&self, path: &Path) -> bool;
}

/// Oracle backed by the real file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOracle;

impl FileOracle for FsOracle {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Oracle over a fixed set of paths.
#[derive(Debug, Default, Clone)]
pub struct FileSet {
    files: HashSet<PathBuf>,
}

impl FileSet {
    /// Build from project-relative paths under `root`.
    #[must_use]
    pub fn new<I, S>(root: &Path, relative_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            files: relative_paths
                .into_iter()
                .map(|p| root.join(p.as_ref()))
                .collect(),
        }
    }
}

impl FileOracle for FileSet {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }
}

/// Path alias configuration (`baseUrl` + `paths`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasConfig {
    /// Directory alias targets are relative to, itself relative to the project root
    pub base_url: Option<String>,
    /// Pattern to replacement templates, in declaration order
    pub paths: IndexMap<String, Vec<String>>,
}

impl AliasConfig {
    /// Build from `(pattern, templates)` pairs.
    #[must_use]
    pub fn new<P, T>(base_url: Option<&str>, paths: impl IntoIterator<Item = (P, Vec<T>)>) -> Self
    where
        P: Into<String>,
        T: Into<String>,
    {
        Self {
            base_url: base_url.map(str::to_string),
            paths: paths
                .into_iter()
                .map(|(p, ts)| (p.into(), ts.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// The pattern that governs `specifier`, with its wildcard capture.
    ///
    /// Patterns are ranked by specificity (length without `*`), highest first.
    /// Equal specificity keeps declaration order. Only the winner is returned;
    /// lower-ranked patterns are never consulted.
    #[must_use]
    pub fn best_match<'a>(&'a self, specifier: &'a str) -> Option<(&'a str, &'a [String], &'a str)> {
        let mut ranked: Vec<(&String, &Vec<String>)> = self.paths.iter().collect();
        ranked.sort_by_key(|(pattern, _)| std::cmp::Reverse(specificity(pattern)));

        ranked.into_iter().find_map(|(pattern, templates)| {
            match_pattern(pattern, specifier).map(|capture| (pattern.as_str(), templates.as_slice(), capture))
        })
    }
}

/// Character count of a pattern with wildcards removed.
#[must_use]
pub fn specificity(pattern: &str) -> usize {
    pattern.chars().filter(|c| *c != '*').count()
}

/// Match `specifier` against `pattern`, returning the wildcard capture.
///
/// Exact patterns capture the empty string.
fn match_pattern<'a>(pattern: &str, specifier: &'a str) -> Option<&'a str> {
    let Some((prefix, suffix)) = pattern.split_once('*') else {
        return (pattern == specifier).then_some("");
    };
    if specifier.len() < prefix.len() + suffix.len() {
        return None;
    }
    specifier.strip_prefix(prefix)?.strip_suffix(suffix)
}

/// Memoised alias configurations, keyed by project root.
///
/// Owned by an [`ImportResolver`]; `clear` resets it between tests or after
/// the config file changes.
#[derive(Debug, Default)]
pub struct AliasConfigCache {
    entries: Mutex<HashMap<PathBuf, Option<Arc<AliasConfig>>>>,
}

impl AliasConfigCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached config for `root`, loading it from disk on first use.
    #[must_use]
    pub fn get_or_load(&self, root: &Path) -> Option<Arc<AliasConfig>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(root.to_path_buf())
            .or_insert_with(|| tsconfig::load(root).map(Arc::new))
            .clone()
    }

    /// Seed the cache for `root`, bypassing the loader.
    pub fn insert(&self, root: &Path, config: Option<AliasConfig>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root.to_path_buf(), config.map(Arc::new));
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached roots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves import specifiers to file entity IDs.
pub struct ImportResolver {
    oracle: Arc<dyn FileOracle>,
    cache: AliasConfigCache,
}

impl std::fmt::Debug for ImportResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Default for ImportResolver {
    fn default() -> Self {
        Self::new(Arc::new(FsOracle))
    }
}

impl ImportResolver {
    /// Create a resolver probing candidates through `oracle`.
    #[must_use]
    pub fn new(oracle: Arc<dyn FileOracle>) -> Self {
        Self {
            oracle,
            cache: AliasConfigCache::new(),
        }
    }

    /// The alias-configuration cache owned by this resolver.
    #[must_use]
    pub fn cache(&self) -> &AliasConfigCache {
        &self.cache
    }

    /// Alias configuration for `project_root`, cached after the first call.
    #[must_use]
    pub fn alias_config(&self, project_root: &Path) -> Option<Arc<AliasConfig>> {
        self.cache.get_or_load(project_root)
    }

    /// Resolve `specifier` as written in `importing_file`.
    ///
    /// Returns the project-relative POSIX path of the target file, or `None`
    /// when nothing matches. An unresolved import is a normal outcome.
    #[must_use]
    pub fn resolve(
        &self,
        specifier: &str,
        importing_file: &str,
        project_root: &Path,
        aliases: Option<&AliasConfig>,
    ) -> Option<String> {
        if specifier.starts_with('.') {
            let dir = Path::new(importing_file).parent().unwrap_or(Path::new(""));
            return self.probe(project_root, &dir.join(specifier).clean());
        }
        self.resolve_alias(specifier, project_root, aliases?)
    }

    fn resolve_alias(&self, specifier: &str, project_root: &Path, aliases: &AliasConfig) -> Option<String> {
        let (pattern, templates, capture) = aliases.best_match(specifier)?;
        let base = aliases
            .base_url
            .as_deref()
            .map_or_else(PathBuf::new, |b| PathBuf::from(b).clean());

        let resolved = templates.iter().find_map(|template| {
            let replaced = template.replace('*', capture);
            self.probe(project_root, &base.join(replaced).clean())
        });
        if resolved.is_none() {
            tracing::trace!(specifier, pattern, "Alias matched but no template resolved");
        }
        resolved
    }

    /// Try the bare path, then each probe suffix, returning the first file.
    fn probe(&self, project_root: &Path, candidate: &Path) -> Option<String> {
        let bare = candidate.to_string_lossy();
        std::iter::once(candidate.to_path_buf())
            .chain(PROBE_SUFFIXES.iter().map(|s| PathBuf::from(format!("{bare}{s}")).clean()))
            .find(|c| self.oracle.is_file(&project_root.join(c)))
            .and_then(|found| {
                if found.is_absolute() {
                    relative_posix(project_root, &found)
                } else {
                    Some(posix(&found))
                }
            })
    }
}

/// Render a relative path with `/` separators.
fn posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
