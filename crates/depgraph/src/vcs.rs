//! Version control access.
//!
//! [`VersionControl`] is the seam the rest of the crate talks to; [`GitCli`]
//! implements it by shelling out to the `git` binary in the project root.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::UNKNOWN_COMMIT;

/// Source extensions reported by [`VersionControl::changed_files`].
pub const TRACKED_EXTENSIONS: [&str; 2] = ["ts", "tsx"];

/// Operations needed from a version control system.
pub trait VersionControl: Send + Sync {
    /// Short hash of `HEAD`, or `"unknown"` if it cannot be determined.
    fn current_commit(&self) -> String;

    /// Name of the checked-out branch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vcs`] if the branch cannot be determined.
    fn current_branch(&self) -> Result<String>;

    /// Whether `reference` names an existing commit.
    fn commit_exists(&self, reference: &str) -> bool;

    /// Source files changed between `base` and `head`, or between `base` and
    /// the working tree when `head` is `None`. Paths are relative to the
    /// project root with `/` separators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vcs`] if the diff cannot be computed.
    fn changed_files(&self, base: &str, head: Option<&str>) -> Result<Vec<String>>;

    /// Contents of `path` (relative to the project root) as of `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Vcs`] if the file does not exist at that commit.
    fn file_at(&self, reference: &str, path: &str) -> Result<Vec<u8>>;
}

/// [`VersionControl`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Run git commands inside `workdir`.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        debug!(args = ?args, "Running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| Error::Vcs(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Vcs(format!("git {} failed: {}", args.join(" "), stderr.trim())));
        }
        Ok(output.stdout)
    }

    fn run_text(&self, args: &[&str]) -> Result<String> {
        let stdout = self.run(args)?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}

impl VersionControl for GitCli {
    fn current_commit(&self) -> String {
        match self.run_text(&["rev-parse", "--short", "HEAD"]) {
            Ok(hash) if !hash.is_empty() => hash,
            Ok(_) => UNKNOWN_COMMIT.to_string(),
            Err(e) => {
                debug!(error = %e, "No current commit");
                UNKNOWN_COMMIT.to_string()
            }
        }
    }

    fn current_branch(&self) -> Result<String> {
        self.run_text(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn commit_exists(&self, reference: &str) -> bool {
        let revision = format!("{reference}^{{commit}}");
        self.run(&["rev-parse", "--verify", "--quiet", &revision]).is_ok()
    }

    fn changed_files(&self, base: &str, head: Option<&str>) -> Result<Vec<String>> {
        let mut args = vec!["-c", "core.quotepath=off", "diff", "--name-only", "--relative", base];
        if let Some(head) = head {
            args.push(head);
        }
        let stdout = self.run_text(&args)?;
        Ok(filter_source_paths(stdout.lines()))
    }

    fn file_at(&self, reference: &str, path: &str) -> Result<Vec<u8>> {
        // `./` makes the path relative to the working directory, not the repository root.
        let object = format!("{reference}:./{path}");
        self.run(&["show", &object])
    }
}

/// Keep `.ts`/`.tsx` paths, normalised to `/` separators, in input order.
#[must_use]
pub fn filter_source_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    paths
        .into_iter()
        .map(str::trim)
        .filter(|p| {
            Path::new(p)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| TRACKED_EXTENSIONS.contains(&e))
        })
        .map(|p| p.replace('\\', "/"))
        .collect()
}
