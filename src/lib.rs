// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release verification toolkit.
//!
//! Relkit bundles the small set of tools used to cut a software release that
//! is split into many independently versioned __units__:
//!
//! 1. [`consistency`]: make sure every unit whose content changed between the
//!    release line and the main line also bumped its declared version.
//! 2. [`checksum`]: generate and verify a checksum manifest for the packaged
//!    release artifacts.
//! 3. [`notes`]: compile per-package changelogs into one release notes
//!    document.
//!
//! Each tool has its own binary under `src/bin`. The library only performs
//! the work and hands back reports; deciding what to print and which exit
//! status to use is left to the binaries.

pub mod checksum;
pub mod config;
pub mod consistency;
pub mod logging;
pub mod notes;
pub mod path;

pub use checksum::{ChecksumTool, HashAlgorithm, Manifest, ManifestEntry, WriteMode};
pub use config::{CheckSettings, RevtoolConfig, UnitDefinition};
pub use consistency::{
    diff::{Git2Diff, GitBinDiff, RevisionDiff},
    ConsistencyChecker, ConsistencyReport, RevisionPair, Unit,
};
pub use notes::ReleaseNotes;
