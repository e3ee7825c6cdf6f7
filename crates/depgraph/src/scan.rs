//! Source discovery and parallel parsing.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Phase 1 (sequential): walk source roots      │
//! │ Phase 2 (parallel):   rayon parse per file   │
//! │ Phase 3 (sequential): sort by path           │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Unreadable directories and files that fail to parse are recorded and
//! skipped; a scan never aborts because of a single bad input.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ProjectConfig;
use crate::entity::relative_posix;
use crate::error::{Error, ScanError};
use crate::languages::typescript::TypeScriptParser;
use crate::languages::Language;
use crate::types::ParsedFile;

/// Everything a scan produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Parsed files, sorted by path
    pub files: Vec<ParsedFile>,
    /// Files that could not be read or parsed
    pub errors: Vec<ScanError>,
    /// Directories that could not be read, with the reason
    pub directories_skipped: Vec<(PathBuf, String)>,
}

/// Finds and parses the source files of one project.
#[derive(Debug)]
pub struct Scanner<'c> {
    root: PathBuf,
    config: &'c ProjectConfig,
}

impl<'c> Scanner<'c> {
    /// Scanner for the project at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: &'c ProjectConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Discover and parse every source file.
    #[must_use]
    pub fn scan(&self) -> ScanOutcome {
        let mut directories_skipped = Vec::new();
        let paths = self.discover(&mut directories_skipped);

        let results: Vec<Result<ParsedFile, ScanError>> = paths
            .par_iter()
            .map_init(TypeScriptParser::new, |parser, path| match parser {
                Ok(parser) => self.parse_file(parser, path),
                Err(e) => Err(ScanError::parse_failed(path.clone(), e.to_string())),
            })
            .collect();

        let mut outcome = ScanOutcome {
            directories_skipped,
            ..ScanOutcome::default()
        };
        for result in results {
            match result {
                Ok(parsed) => outcome.files.push(parsed),
                Err(e) => {
                    warn!(file = %e.path.display(), error = %e.message, kind = %e.kind, "Skipping file");
                    outcome.errors.push(e);
                }
            }
        }
        outcome.files.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        info!(
            parsed = outcome.files.len(),
            failed = outcome.errors.len(),
            directories_skipped = outcome.directories_skipped.len(),
            "Scan complete"
        );
        outcome
    }

    /// Source files under the configured roots, sorted.
    ///
    /// Symlinked directories are not followed.
    #[must_use]
    pub fn discover(&self, directories_skipped: &mut Vec<(PathBuf, String)>) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for source_root in &self.config.source_roots {
            let dir = self.root.join(source_root);
            self.walk_dir(&dir, &mut files, directories_skipped);
        }
        files.sort();
        files.dedup();
        files
    }

    /// Recursively collect source files.
    ///
    /// Directories that cannot be read are recorded in `directories_skipped`.
    fn walk_dir(&self, dir: &Path, files: &mut Vec<PathBuf>, directories_skipped: &mut Vec<(PathBuf, String)>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(
                    directory = %dir.display(),
                    error = %e,
                    "Cannot read directory, skipping"
                );
                directories_skipped.push((dir.to_path_buf(), e.to_string()));
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(
                        directory = %dir.display(),
                        error = %e,
                        "Failed to read directory entry, skipping"
                    );
                    continue;
                }
            };

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read file type, skipping"
                    );
                    continue;
                }
            };
            // Linked directories can point back at an ancestor.
            if file_type.is_symlink() && path.is_dir() {
                debug!(directory = %path.display(), "Skipping symlinked directory");
                continue;
            }

            if file_type.is_dir() {
                let excluded = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| self.config.is_excluded(name));
                if !excluded {
                    self.walk_dir(&path, files, directories_skipped);
                }
            } else if path.is_file() && Language::from_path(&path).is_some() {
                files.push(path);
            }
        }
    }

    fn parse_file(&self, parser: &mut TypeScriptParser, path: &Path) -> Result<ParsedFile, ScanError> {
        let language = Language::from_path(path)
            .ok_or_else(|| ScanError::parse_failed(path.to_path_buf(), "unsupported file type"))?;
        let relative = relative_posix(&self.root, path)
            .ok_or_else(|| ScanError::parse_failed(path.to_path_buf(), "file is outside the project root"))?;

        let content = std::fs::read(path).map_err(|e| ScanError::io_error(path.to_path_buf(), &e))?;
        if std::str::from_utf8(&content).is_err() {
            return Err(ScanError::encoding_error(path.to_path_buf()));
        }

        parser.parse(language, &relative, &content).map_err(|e| match e {
            Error::Parser(message) => ScanError::parse_failed(path.to_path_buf(), message),
            other => ScanError::parse_failed(path.to_path_buf(), other.to_string()),
        })
    }
}
