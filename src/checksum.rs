// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release artifact checksums.
//!
//! Packaged release artifacts travel through download servers, USB sticks,
//! and the occasional flaky network share before they get installed. A
//! __checksum manifest__ recorded right after packaging lets the installing
//! side detect any artifact that got corrupted on the way.
//!
//! # Modes
//!
//! The [`ChecksumTool`] works in one of two modes over a single directory:
//!
//! - __Generate__: hash every artifact matching a glob pattern (`*.rpm` by
//!   default), and record each hash in the manifest (`md5.txt` by default).
//! - __Check__: re-hash every artifact listed in the manifest, and compare
//!   the result against the recorded hash.
//!
//! MD5 is the default hash. It is only good enough to detect accidental
//! corruption, so SHA-256 is available for callers that want more. The
//! manifest layout does not change between algorithms.
//!
//! # See Also
//!
//! 1. [`manifest`] for the manifest line layout.

pub mod manifest;

pub use manifest::{LineIssue, Manifest, ManifestEntry, ParseError};

use indicatif::ProgressBar;
use md5::Md5;
use sha2::{Digest, Sha256};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read_dir, read_to_string, File, OpenOptions},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Default manifest file name.
pub const DEFAULT_MANIFEST_NAME: &str = "md5.txt";

/// Default glob pattern for artifacts to hash in generate mode.
pub const DEFAULT_ARTIFACT_PATTERN: &str = "*.rpm";

const CHUNK_SIZE: usize = 8192;

/// Content hash algorithm.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HashAlgorithm {
    /// MD5, compatible with `md5sum`.
    #[default]
    Md5,

    /// SHA-256, compatible with `sha256sum`.
    Sha256,
}

impl HashAlgorithm {
    /// Hash contents of file at `path` into lowercase hex.
    ///
    /// Reads the file in fixed size chunks, so large artifacts never have to
    /// fit into memory.
    pub fn digest_file(&self, path: impl AsRef<Path>) -> std::io::Result<String> {
        let file = File::open(path.as_ref())?;
        match self {
            Self::Md5 => digest_reader::<Md5>(file),
            Self::Sha256 => digest_reader::<Sha256>(file),
        }
    }

    /// Hash contents of byte slice into lowercase hex.
    pub fn digest_bytes(&self, bytes: impl AsRef<[u8]>) -> String {
        match self {
            Self::Md5 => hex::encode(Md5::digest(bytes.as_ref())),
            Self::Sha256 => hex::encode(Sha256::digest(bytes.as_ref())),
        }
    }
}

fn digest_reader<D: Digest>(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        hasher.update(&buffer[..count]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// How generate mode treats an existing manifest.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace existing manifest.
    #[default]
    Overwrite,

    /// Add new entries after existing ones.
    Append,
}

/// Outcome of checking one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Current hash matches recorded hash.
    Ok,

    /// Current hash differs from recorded hash.
    Mismatch { actual: String, expected: String },

    /// Listed artifact does not exist.
    Missing { expected: String },

    /// Listed artifact exists but cannot be read.
    Unreadable { expected: String, reason: String },

    /// Artifact exists but is not listed in manifest.
    Unlisted,
}

/// Verdict for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    pub file_name: String,
    pub verdict: Verdict,
}

impl EntryOutcome {
    pub fn is_ok(&self) -> bool {
        self.verdict == Verdict::Ok
    }
}

impl Display for EntryOutcome {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = &self.file_name;
        match &self.verdict {
            Verdict::Ok => write!(fmt, "OK {name}"),
            Verdict::Mismatch { actual, expected } => {
                write!(fmt, "MISMATCH {name} (actual {actual} expected {expected})")
            }
            Verdict::Missing { expected } => {
                write!(fmt, "MISMATCH {name} (actual <missing> expected {expected})")
            }
            Verdict::Unreadable { expected, .. } => {
                write!(fmt, "MISMATCH {name} (actual <unreadable> expected {expected})")
            }
            Verdict::Unlisted => write!(fmt, "UNLISTED {name}"),
        }
    }
}

/// Outcome of a full check run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// One outcome per manifest entry in manifest order, then unlisted
    /// artifacts in name order.
    pub outcomes: Vec<EntryOutcome>,

    /// Manifest lines that could not be parsed.
    pub skipped: Vec<LineIssue>,
}

impl CheckReport {
    /// Every outcome is OK.
    ///
    /// Skipped lines do not count against the run, they were never entries.
    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(EntryOutcome::is_ok)
    }

    /// Outcomes that are not OK.
    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_ok())
    }
}

/// Generate and check checksum manifests for a directory of artifacts.
#[derive(Debug, Clone)]
pub struct ChecksumTool {
    dir: PathBuf,
    manifest_name: String,
    pattern: String,
    algorithm: HashAlgorithm,
}

impl ChecksumTool {
    /// Construct new checksum tool over `dir` with default settings.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            manifest_name: DEFAULT_MANIFEST_NAME.into(),
            pattern: DEFAULT_ARTIFACT_PATTERN.into(),
            algorithm: HashAlgorithm::default(),
        }
    }

    /// Use a different manifest file name inside the directory.
    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// Use a different artifact glob pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Use a different hash algorithm.
    pub fn algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(&self.manifest_name)
    }

    /// List artifact file names matching the glob pattern, sorted.
    ///
    /// Only regular files directly inside the directory count. The manifest
    /// itself never counts, even if the pattern matches it.
    ///
    /// # Errors
    ///
    /// - Return [`ChecksumError::Pattern`] if glob pattern is invalid.
    /// - Return [`ChecksumError::ReadDir`] if directory cannot be listed.
    pub fn artifacts(&self) -> Result<Vec<String>> {
        let pattern = glob::Pattern::new(&self.pattern)?;
        let entries = read_dir(&self.dir).map_err(|err| ChecksumError::ReadDir {
            source: err,
            dir: self.dir.clone(),
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| ChecksumError::ReadDir {
                source: err,
                dir: self.dir.clone(),
            })?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!("skip non UTF-8 file name {:?}", entry.file_name());
                continue;
            };

            if name == self.manifest_name || !pattern.matches(&name) {
                continue;
            }

            if entry.path().is_file() {
                names.push(name);
            }
        }
        names.sort();

        Ok(names)
    }

    /// Hash every artifact, and record it in the manifest.
    ///
    /// Each recorded line is echoed to `out` as soon as it has been written.
    /// Progress goes to `bar`.
    ///
    /// # Errors
    ///
    /// - Return [`ChecksumError::Pattern`] if glob pattern is invalid.
    /// - Return [`ChecksumError::ReadDir`] if directory cannot be listed.
    /// - Return [`ChecksumError::Hash`] if an artifact cannot be hashed.
    /// - Return [`ChecksumError::WriteManifest`] if manifest cannot be
    ///   written.
    /// - Return [`ChecksumError::Output`] if echoing to `out` fails.
    #[instrument(skip(self, out, bar), level = "debug")]
    pub fn generate(
        &self,
        mode: WriteMode,
        out: &mut impl Write,
        bar: &ProgressBar,
    ) -> Result<Manifest> {
        let artifacts = self.artifacts()?;
        let manifest_path = self.manifest_path();
        if artifacts.is_empty() {
            warn!(
                "no artifacts match {:?} in {:?}",
                self.pattern,
                self.dir.display()
            );
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(mode == WriteMode::Append)
            .truncate(mode == WriteMode::Overwrite)
            .open(&manifest_path)
            .map_err(|err| ChecksumError::WriteManifest {
                source: err,
                manifest_path: manifest_path.clone(),
            })?;

        bar.set_length(artifacts.len() as u64);
        let mut manifest = Manifest::new();
        for name in artifacts {
            bar.set_message(name.clone());
            let path = self.dir.join(&name);
            let hash = self
                .algorithm
                .digest_file(&path)
                .map_err(|err| ChecksumError::Hash { source: err, path })?;

            let entry = ManifestEntry::new(hash, name);
            writeln!(file, "{entry}").map_err(|err| ChecksumError::WriteManifest {
                source: err,
                manifest_path: manifest_path.clone(),
            })?;
            bar.suspend(|| writeln!(out, "{entry}"))?;
            bar.inc(1);
            manifest.push(entry);
        }
        bar.finish_and_clear();
        info!(
            "recorded {} artifacts in {:?}",
            manifest.len(),
            manifest_path.display()
        );

        Ok(manifest)
    }

    /// Verify every artifact listed in the manifest.
    ///
    /// Each outcome is written to `out` as soon as it is known. With `strict`
    /// set, artifacts matching the glob pattern that the manifest does not
    /// list are reported as [`Verdict::Unlisted`].
    ///
    /// # Errors
    ///
    /// - Return [`ChecksumError::ReadManifest`] if manifest cannot be read.
    /// - Return [`ChecksumError::Pattern`] or [`ChecksumError::ReadDir`] in
    ///   strict mode if the directory cannot be listed.
    /// - Return [`ChecksumError::Output`] if writing to `out` fails.
    #[instrument(skip(self, out, bar), level = "debug")]
    pub fn check(&self, strict: bool, out: &mut impl Write, bar: &ProgressBar) -> Result<CheckReport> {
        let manifest_path = self.manifest_path();
        let content =
            read_to_string(&manifest_path).map_err(|err| ChecksumError::ReadManifest {
                source: err,
                manifest_path: manifest_path.clone(),
            })?;
        let (manifest, skipped) = Manifest::parse(&content);
        info!(
            "found {} entries in {:?}",
            manifest.len(),
            manifest_path.display()
        );
        if manifest.is_empty() {
            warn!("manifest {:?} lists no artifacts", manifest_path.display());
        }

        let mut report = CheckReport {
            outcomes: Vec::new(),
            skipped,
        };

        bar.set_length(manifest.len() as u64);
        for entry in manifest.entries() {
            bar.set_message(entry.file_name.clone());
            let outcome = self.check_entry(entry);
            bar.suspend(|| writeln!(out, "{outcome}"))?;
            bar.inc(1);
            report.outcomes.push(outcome);
        }
        bar.finish_and_clear();

        if strict {
            for name in self.artifacts()? {
                if manifest.contains(&name) {
                    continue;
                }

                let outcome = EntryOutcome {
                    file_name: name,
                    verdict: Verdict::Unlisted,
                };
                writeln!(out, "{outcome}")?;
                report.outcomes.push(outcome);
            }
        }

        Ok(report)
    }

    fn check_entry(&self, entry: &ManifestEntry) -> EntryOutcome {
        let path = self.dir.join(&entry.file_name);
        let expected = entry.hash.clone();
        let verdict = match self.algorithm.digest_file(&path) {
            Ok(actual) if actual == expected => Verdict::Ok,
            Ok(actual) => Verdict::Mismatch { actual, expected },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("listed artifact {:?} does not exist", path.display());
                Verdict::Missing { expected }
            }
            Err(err) => {
                warn!("cannot hash {:?}: {err}", path.display());
                Verdict::Unreadable {
                    expected,
                    reason: err.to_string(),
                }
            }
        };
        debug!("{}: {verdict:?}", entry.file_name);

        EntryOutcome {
            file_name: entry.file_name.clone(),
            verdict,
        }
    }
}

/// Checksum tool error types.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// Artifact glob pattern is invalid.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Artifact directory cannot be listed.
    #[error("failed to read directory {:?}", dir.display())]
    ReadDir {
        #[source]
        source: std::io::Error,
        dir: PathBuf,
    },

    /// Manifest cannot be read.
    #[error("failed to read manifest at {:?}", manifest_path.display())]
    ReadManifest {
        #[source]
        source: std::io::Error,
        manifest_path: PathBuf,
    },

    /// Manifest cannot be written.
    #[error("failed to write manifest at {:?}", manifest_path.display())]
    WriteManifest {
        #[source]
        source: std::io::Error,
        manifest_path: PathBuf,
    },

    /// Artifact cannot be hashed while generating.
    #[error("failed to hash {:?}", path.display())]
    Hash {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Report output cannot be written.
    #[error(transparent)]
    Output(#[from] std::io::Error),
}

/// Friendly result alias :3
pub type Result<T, E = ChecksumError> = std::result::Result<T, E>;
