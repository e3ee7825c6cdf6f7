//! Error types for depgraph operations.
//!
//! Errors are split into two groups:
//!
//! - **`Error`**: failures surfaced to the caller (unknown entity, malformed ID,
//!   snapshot that cannot be loaded, infrastructure problems)
//! - **`ScanError`**: per-file problems found while scanning sources; these are
//!   collected and reported, never thrown
//!
//! Unresolved imports and orphaned edges are neither: they are normal outcomes
//! of building a graph and are reported through the builder's output.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for depgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for depgraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The root entity of a query or traversal is not in the graph.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// An entity ID did not split into 1 to 3 `::` segments.
    #[error("malformed entity id '{id}': expected 1-3 segments, found {segments}")]
    MalformedEntityId {
        /// The offending ID.
        id: String,
        /// Number of segments found.
        segments: usize,
    },

    /// A graph snapshot could not be read or decoded.
    #[error("failed to load graph from {origin}")]
    GraphLoad {
        /// Where the snapshot was expected (a path or `ref:path`).
        origin: String,
        /// The underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tree-sitter parsing infrastructure failed
    #[error("parser error: {0}")]
    Parser(String),

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),

    /// Version control query failed
    #[error("version control error: {0}")]
    Vcs(String),
}

impl Error {
    /// Build a [`Error::GraphLoad`] from any error cause.
    #[must_use]
    pub fn graph_load(
        origin: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::GraphLoad {
            origin: origin.into(),
            source: source.into(),
        }
    }
}

/// Error encountered while scanning a specific file.
///
/// These errors are collected during scanning but don't halt the build.
#[derive(Debug, Clone)]
pub struct ScanError {
    /// Path to the file that failed
    pub path: PathBuf,
    /// Category of the error
    pub kind: ScanErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.path.display(),
            self.message,
            self.kind
        )
    }
}

impl std::error::Error for ScanError {}

/// Categorization of scan errors.
///
/// Input problems are issues with the source files; internal problems are
/// issues reading them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    // === Input problems ===
    /// Tree-sitter could not produce a syntax tree
    ParseFailed,

    /// File content is not valid UTF-8
    EncodingError,

    // === Internal problems ===
    /// Could not read the file from disk
    IoError,
}

impl std::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFailed => write!(f, "parse failed"),
            Self::EncodingError => write!(f, "encoding error"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl ScanErrorKind {
    /// Returns `true` if this is a problem with the source file itself.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::ParseFailed | Self::EncodingError)
    }

    /// Returns `true` if this is a problem reading the file.
    #[must_use]
    pub fn is_internal_error(&self) -> bool {
        matches!(self, Self::IoError)
    }
}

impl ScanError {
    /// Create a new scan error.
    #[must_use]
    pub fn new(path: PathBuf, kind: ScanErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    /// Create a parse error for a file.
    #[must_use]
    pub fn parse_failed(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(path, ScanErrorKind::ParseFailed, message)
    }

    /// Create an encoding error for a file.
    #[must_use]
    pub fn encoding_error(path: PathBuf) -> Self {
        Self::new(path, ScanErrorKind::EncodingError, "file is not valid UTF-8")
    }

    /// Create an I/O error for a file.
    #[must_use]
    pub fn io_error(path: PathBuf, error: &std::io::Error) -> Self {
        Self::new(path, ScanErrorKind::IoError, error.to_string())
    }
}
