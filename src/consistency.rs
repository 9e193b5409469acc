// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release consistency checking.
//!
//! A release is made out of many __units__. A unit is a component of the
//! release that lives in its own directory, and declares its own version in a
//! __manifest__ file, which is `<unit>/CMakeLists.txt` by default.
//!
//! # The Rule
//!
//! Every unit whose content differs between the release line and the main
//! line must also carry a version change in its manifest. In other words, if
//! the diff from the release revision to the main revision restricted to the
//! unit's path is non-empty, then the same diff restricted to the unit's
//! manifest must contain the version token (`VERSION` by default) somewhere.
//!
//! This is a coarse heuristic. Any diff line holding the token counts, be it
//! added, removed, or mere context. It never misses a touched version line,
//! but it can be fooled by a change near one.
//!
//! A unit whose manifest does not exist has an empty manifest diff. So a
//! changed unit without a manifest is always reported.
//!
//! # See Also
//!
//! 1. [`diff`] for the backends that produce revision diffs.

pub mod diff;

use crate::consistency::diff::{Git2Diff, RevisionDiff};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info};

/// Two revisions to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionPair {
    /// Revision of the development line.
    pub main: String,

    /// Revision of the release line.
    pub release: String,
}

impl RevisionPair {
    /// Construct new revision pair.
    pub fn new(main: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            release: release.into(),
        }
    }
}

impl Default for RevisionPair {
    fn default() -> Self {
        Self::new("origin/main", "origin/release")
    }
}

/// A named component of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    name: String,
    manifest: PathBuf,
}

impl Unit {
    /// Construct new unit whose manifest is `<name>/CMakeLists.txt`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_manifest_file(name, "CMakeLists.txt")
    }

    /// Construct new unit whose manifest is `<name>/<file_name>`.
    ///
    /// `.` components and trailing separators are dropped from the name, so
    /// `./imaging/` names the same unit as `imaging`.
    pub fn with_manifest_file(name: impl Into<String>, file_name: impl AsRef<Path>) -> Self {
        let path = normalize(Path::new(&name.into()));
        let manifest = normalize(&path.join(file_name.as_ref()));
        let name = path.to_string_lossy().into_owned();
        Self { name, manifest }
    }

    /// Use a different manifest path, relative to repository root.
    pub fn manifest(mut self, path: impl AsRef<Path>) -> Self {
        self.manifest = normalize(path.as_ref());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit's path from the repository root.
    pub fn path(&self) -> &Path {
        Path::new(&self.name)
    }

    pub fn manifest_path(&self) -> &Path {
        self.manifest.as_path()
    }
}

/// Drop `.` components from a repository relative path.
///
/// Pathspecs are literal, so `./imaging` would never match `imaging`.
fn normalize(path: &Path) -> PathBuf {
    let normal: PathBuf = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();

    if normal.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normal
    }
}

impl Display for Unit {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.name)
    }
}

/// Verdict for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub unit: Unit,

    /// Unit content differs between the two revisions.
    pub changed: bool,

    /// Manifest diff mentions the version token.
    pub version_bumped: bool,
}

impl UnitReport {
    /// Unit changed without bumping its version.
    pub fn is_violation(&self) -> bool {
        self.changed && !self.version_bumped
    }
}

impl Display for UnitReport {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        if self.is_violation() {
            write!(
                fmt,
                "{} has changes but no version bump in {}",
                self.unit,
                self.unit.manifest_path().display()
            )
        } else if self.changed {
            write!(fmt, "{} has changes and a version bump", self.unit)
        } else {
            write!(fmt, "{} is unchanged", self.unit)
        }
    }
}

/// Verdicts of a full checker run, in unit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub units: Vec<UnitReport>,
}

impl ConsistencyReport {
    /// Reports of units that changed without a version bump.
    pub fn violations(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|report| report.is_violation())
    }

    /// No unit violated the rule.
    pub fn passed(&self) -> bool {
        self.violations().next().is_none()
    }
}

/// Checks a set of units against a revision diff backend.
#[derive(Debug)]
pub struct ConsistencyChecker<D = Git2Diff>
where
    D: RevisionDiff,
{
    units: Vec<Unit>,
    version_token: String,
    diff: D,
}

impl<D> ConsistencyChecker<D>
where
    D: RevisionDiff,
{
    /// Construct new checker over an ordered set of units.
    pub fn new(diff: D, units: impl IntoIterator<Item = Unit>) -> Self {
        Self {
            units: units.into_iter().collect(),
            version_token: "VERSION".into(),
            diff,
        }
    }

    /// Use a different version token.
    pub fn version_token(mut self, token: impl Into<String>) -> Self {
        self.version_token = token.into();
        self
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Check a single unit.
    ///
    /// # Errors
    ///
    /// - Return [`ConsistencyError::Diff`] if the diff backend fails.
    pub fn check_unit(&self, unit: &Unit) -> Result<UnitReport> {
        let changed = !self.diff.diff_lines(unit.path())?.is_empty();
        let version_bumped = self
            .diff
            .diff_lines(unit.manifest_path())?
            .iter()
            .any(|line| line.contains(self.version_token.as_str()));
        debug!("{unit}: changed={changed} version_bumped={version_bumped}");

        Ok(UnitReport {
            unit: unit.clone(),
            changed,
            version_bumped,
        })
    }

    /// Check every unit in order.
    ///
    /// Violations do not stop the run. Backend failures do.
    ///
    /// # Errors
    ///
    /// - Return [`ConsistencyError::Diff`] if the diff backend fails.
    pub fn run(&self) -> Result<ConsistencyReport> {
        info!("check {} units", self.units.len());
        let units = self
            .units
            .iter()
            .map(|unit| self.check_unit(unit))
            .collect::<Result<Vec<_>>>()?;

        Ok(ConsistencyReport { units })
    }
}

/// Consistency checking error types.
#[derive(Debug, thiserror::Error)]
pub enum ConsistencyError {
    /// Diff backend fails.
    #[error(transparent)]
    Diff(#[from] crate::consistency::diff::DiffError),
}

/// Friendly result alias :3
pub type Result<T, E = ConsistencyError> = std::result::Result<T, E>;
