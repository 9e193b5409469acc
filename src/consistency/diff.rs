// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Revision diff backends.
//!
//! The consistency checker only needs one primitive from version control:
//! the textual diff between the release revision and the main revision,
//! restricted to a single path. Two backends provide it. [`Git2Diff`] goes
//! through libgit2 and needs nothing installed. [`GitBinDiff`] shells out to
//! the Git binary, which is handy when the repository relies on features
//! libgit2 does not support, e.g., partial clones.
//!
//! Both backends treat paths literally. A unit named `drivers/kmod` is a
//! single path argument, never a glob.

use crate::consistency::RevisionPair;

use git2::{DiffFormat, DiffOptions, Oid, Repository};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, info, instrument};

/// Produce diffs between a fixed pair of revisions.
pub trait RevisionDiff {
    /// List every line of the diff from release to main restricted to `path`.
    ///
    /// An empty listing means the path is identical in both revisions,
    /// including the case where it exists in neither.
    fn diff_lines(&self, path: &Path) -> Result<Vec<String>>;
}

/// Revision diffs through libgit2.
pub struct Git2Diff {
    repository: Repository,
    release: Oid,
    main: Oid,
}

impl Git2Diff {
    /// Open repository containing `path`, and resolve both revisions.
    ///
    /// Searches upward from `path` for the repository, so any directory inside
    /// the working copy works.
    ///
    /// # Errors
    ///
    /// - Return [`DiffError::OpenRepository`] if no repository can be found.
    /// - Return [`DiffError::ResolveRevision`] if either revision does not
    ///   name a tree-ish object.
    #[instrument(skip(path), level = "debug")]
    pub fn open(path: impl AsRef<Path>, revisions: &RevisionPair) -> Result<Self> {
        debug!("open repository at {:?}", path.as_ref().display());
        let repository =
            Repository::discover(path.as_ref()).map_err(|err| DiffError::OpenRepository {
                source: err,
                path: path.as_ref().to_path_buf(),
            })?;
        let release = resolve_tree(&repository, &revisions.release)?;
        let main = resolve_tree(&repository, &revisions.main)?;
        info!("compare {} ({release}) to {} ({main})", revisions.release, revisions.main);

        Ok(Self {
            repository,
            release,
            main,
        })
    }
}

impl RevisionDiff for Git2Diff {
    #[instrument(skip(self), level = "debug")]
    fn diff_lines(&self, path: &Path) -> Result<Vec<String>> {
        let old_tree = self.repository.find_tree(self.release)?;
        let new_tree = self.repository.find_tree(self.main)?;
        let mut opts = DiffOptions::new();
        opts.pathspec(path).disable_pathspec_match(true);
        let diff = self
            .repository
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut opts))?;

        let mut lines = Vec::new();
        diff.print(DiffFormat::Patch, |_, _, line| {
            let content = String::from_utf8_lossy(line.content());
            match line.origin() {
                // INVARIANT: Keep origin marker on content lines like `git diff` does.
                origin @ ('+' | '-' | ' ') => {
                    lines.push(format!("{origin}{}", content.trim_end_matches(['\r', '\n'])));
                }
                _ => lines.extend(content.lines().map(str::to_owned)),
            }
            true
        })?;
        debug!("{} diff lines for {:?}", lines.len(), path.display());

        Ok(lines)
    }
}

fn resolve_tree(repository: &Repository, revision: &str) -> Result<Oid> {
    repository
        .revparse_single(revision)
        .and_then(|object| object.peel_to_tree())
        .map(|tree| tree.id())
        .map_err(|err| DiffError::ResolveRevision {
            source: err,
            revision: revision.into(),
        })
}

/// Revision diffs through the Git binary.
#[derive(Debug, Clone)]
pub struct GitBinDiff {
    toplevel: PathBuf,
    revisions: RevisionPair,
}

impl GitBinDiff {
    /// Locate top-level of working copy containing `path`, and verify both
    /// revisions.
    ///
    /// # Errors
    ///
    /// - Return [`DiffError::Syscall`] if Git cannot find a working copy.
    /// - Return [`DiffError::UnknownRevision`] if either revision does not
    ///   name a tree-ish object.
    #[instrument(skip(path), level = "debug")]
    pub fn open(path: impl AsRef<Path>, revisions: &RevisionPair) -> Result<Self> {
        let toplevel = syscall_non_interactive(
            "git",
            [
                OsStr::new("-C"),
                path.as_ref().as_os_str(),
                OsStr::new("rev-parse"),
                OsStr::new("--show-toplevel"),
            ],
        )?;
        let toplevel = PathBuf::from(toplevel.trim_end());
        debug!("working copy at {:?}", toplevel.display());

        for revision in [&revisions.release, &revisions.main] {
            let spec = format!("{revision}^{{tree}}");
            syscall_non_interactive(
                "git",
                [
                    OsStr::new("-C"),
                    toplevel.as_os_str(),
                    OsStr::new("rev-parse"),
                    OsStr::new("--verify"),
                    OsStr::new(&spec),
                ],
            )
            .map_err(|err| DiffError::UnknownRevision {
                revision: revision.clone(),
                message: err.to_string(),
            })?;
        }
        info!("compare {} to {} with git binary", revisions.release, revisions.main);

        Ok(Self {
            toplevel,
            revisions: revisions.clone(),
        })
    }

    fn expand_bin_args(&self, path: &Path) -> Vec<OsString> {
        vec![
            "--literal-pathspecs".into(),
            "-C".into(),
            self.toplevel.clone().into_os_string(),
            "diff".into(),
            "--no-color".into(),
            "--no-ext-diff".into(),
            self.revisions.release.clone().into(),
            self.revisions.main.clone().into(),
            "--".into(),
            path.as_os_str().to_os_string(),
        ]
    }
}

impl RevisionDiff for GitBinDiff {
    #[instrument(skip(self), level = "debug")]
    fn diff_lines(&self, path: &Path) -> Result<Vec<String>> {
        let output = syscall_non_interactive("git", self.expand_bin_args(path))?;
        Ok(output.lines().map(str::to_owned).collect())
    }
}

/// Run command to completion, and hand back its standard output.
fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let output = Command::new(cmd.as_ref()).args(args).output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(output.stderr.as_slice());
        return Err(DiffError::Syscall {
            command: cmd.as_ref().to_string_lossy().into_owned(),
            message: stderr.trim_end().to_string(),
        });
    }

    Ok(stdout)
}

/// Revision diff error types.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// No repository could be found.
    #[error("failed to open repository at {:?}", path.display())]
    OpenRepository {
        #[source]
        source: git2::Error,
        path: PathBuf,
    },

    /// Revision cannot be resolved through libgit2.
    #[error("failed to resolve revision {revision:?}")]
    ResolveRevision {
        #[source]
        source: git2::Error,
        revision: String,
    },

    /// Revision cannot be resolved through the Git binary.
    #[error("failed to resolve revision {revision:?}: {message}")]
    UnknownRevision { revision: String, message: String },

    /// External command exits with failure.
    #[error("command {command:?} failed:\n{message}")]
    Syscall { command: String, message: String },

    /// External command cannot be spawned.
    #[error(transparent)]
    Spawn(#[from] std::io::Error),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = DiffError> = std::result::Result<T, E>;
