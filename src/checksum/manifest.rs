// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Checksum manifest layout.
//!
//! A manifest lists one artifact per line as `|<hash> <file_name>|`. The pipe
//! characters frame the entry so that stray output mixed into the file never
//! gets mistaken for an entry. Older manifests were produced by wrapping the
//! output of `md5sum`, which separates hash and name with two spaces, so
//! parsing accepts any run of spaces between the two fields.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use tracing::warn;

/// Framing character around every manifest entry.
pub const FRAME: char = '|';

/// One artifact in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Hex encoded content hash.
    pub hash: String,

    /// Artifact file name relative to the manifest's directory.
    pub file_name: String,
}

impl ManifestEntry {
    /// Construct new manifest entry.
    pub fn new(hash: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            file_name: file_name.into(),
        }
    }
}

impl Display for ManifestEntry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{FRAME}{} {}{FRAME}", self.hash, self.file_name)
    }
}

impl FromStr for ManifestEntry {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let inner = line
            .trim_end()
            .strip_prefix(FRAME)
            .and_then(|rest| rest.strip_suffix(FRAME))
            .ok_or(ParseError::MissingFrame)?;
        let (hash, file_name) = inner.split_once(' ').ok_or(ParseError::MissingSeparator)?;
        let file_name = file_name.trim_start_matches(' ');

        if hash.is_empty() {
            return Err(ParseError::EmptyHash);
        }

        if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidHash(hash.into()));
        }

        if file_name.is_empty() {
            return Err(ParseError::EmptyFileName);
        }

        Ok(Self::new(hash, file_name))
    }
}

/// Ordered listing of manifest entries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Construct new empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse manifest content leniently.
    ///
    /// Blank lines are ignored. Malformed lines are logged, skipped, and
    /// handed back alongside the manifest so the caller can account for them.
    pub fn parse(content: &str) -> (Self, Vec<LineIssue>) {
        let mut manifest = Self::new();
        let mut issues = Vec::new();

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<ManifestEntry>() {
                Ok(entry) => manifest.push(entry),
                Err(error) => {
                    let issue = LineIssue {
                        line: index + 1,
                        content: line.into(),
                        error,
                    };
                    warn!("skip {issue}");
                    issues.push(issue);
                }
            }
        }

        (manifest, issues)
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if manifest lists an artifact.
    pub fn contains(&self, file_name: &str) -> bool {
        self.entries.iter().any(|entry| entry.file_name == file_name)
    }
}

impl Display for Manifest {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        for entry in &self.entries {
            writeln!(fmt, "{entry}")?;
        }

        Ok(())
    }
}

impl FromIterator<ManifestEntry> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Malformed manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIssue {
    /// One-based line number.
    pub line: usize,
    pub content: String,
    pub error: ParseError,
}

impl Display for LineIssue {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "line {} {:?}: {}", self.line, self.content, self.error)
    }
}

/// Manifest line parsing error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("entry is not framed by '{FRAME}'")]
    MissingFrame,

    #[error("no space between hash and file name")]
    MissingSeparator,

    #[error("hash is empty")]
    EmptyHash,

    #[error("hash {0:?} is not hexadecimal")]
    InvalidHash(String),

    #[error("file name is empty")]
    EmptyFileName,
}
