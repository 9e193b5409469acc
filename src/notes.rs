// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Release notes compilation.
//!
//! Every package of a release keeps its own changelog in a file named
//! `release_notes.txt`, using the same entry layout as the `%changelog`
//! section of an RPM spec file:
//!
//! ```text
//! * Tue Mar 05 2024 Jane Doe <jdoe@example.com> - 1.4.0.2
//! - Fix motor homing timeout.
//! - Raise default log level.
//! ```
//!
//! The header line starts with `*`, and holds the date, the author, the
//! author's email, and the package version. Every line after it up to the
//! next line starting with `*` is the body of the entry.
//!
//! [`ReleaseNotes::collect`] gathers the changelog of every package below a
//! root directory, and renders them into one markdown document with the
//! newest entries first.

use chrono::NaiveDate;
use ignore::WalkBuilder;
use regex::Regex;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{create_dir_all, read_to_string, write},
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::{debug, info, warn};

/// File name of per-package changelogs.
pub const NOTES_FILE_NAME: &str = "release_notes.txt";

const DATE_FORMAT: &str = "%a %b %d %Y";

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\s+(\w+\s+\w+\s+\d+\s+\d+)\s+(.+?)\s+<([^<>\s]+)>\s*-\s*(\S+)\s*$")
        .expect("Invalid regex pattern for changelog header")
});

/// One changelog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub date: NaiveDate,
    pub author: String,
    pub email: String,
    pub version: String,
    pub body: String,
}

impl Display for ChangelogEntry {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        writeln!(fmt, "> {}", self.version)?;
        writeln!(fmt, "> {}", self.date.format(DATE_FORMAT))?;
        writeln!(fmt, "> {} <{}>", self.author, self.email)?;
        write!(fmt, "{}", self.body)
    }
}

/// Parse changelog entries in file order.
///
/// Header lines that do not follow the expected layout, or whose date cannot
/// be parsed, are skipped along with their body.
pub fn parse_changelog(content: &str) -> Vec<ChangelogEntry> {
    let mut entries = Vec::new();
    let mut current: Option<(ChangelogEntry, Vec<&str>)> = None;

    for line in content.lines() {
        if !line.starts_with('*') {
            if let Some((_, body)) = current.as_mut() {
                body.push(line);
            }
            continue;
        }

        if let Some((entry, body)) = current.take() {
            entries.push(finish_entry(entry, &body));
        }

        current = parse_header(line).map(|entry| (entry, Vec::new()));
    }

    if let Some((entry, body)) = current.take() {
        entries.push(finish_entry(entry, &body));
    }

    entries
}

fn parse_header(line: &str) -> Option<ChangelogEntry> {
    let Some(captures) = HEADER_REGEX.captures(line) else {
        warn!("skip malformed changelog header {line:?}");
        return None;
    };

    // INVARIANT: Normalize runs of whitespace so the date parser sees one space.
    let date_text = captures[1].split_whitespace().collect::<Vec<_>>().join(" ");
    let date = match NaiveDate::parse_from_str(&date_text, DATE_FORMAT) {
        Ok(date) => date,
        Err(err) => {
            warn!("skip changelog header with bad date {date_text:?}: {err}");
            return None;
        }
    };

    Some(ChangelogEntry {
        date,
        author: captures[2].into(),
        email: captures[3].into(),
        version: captures[4].into(),
        body: String::new(),
    })
}

fn finish_entry(mut entry: ChangelogEntry, body: &[&str]) -> ChangelogEntry {
    entry.body = body
        .join("\n")
        .trim_start_matches(['\r', '\n'])
        .trim_end()
        .to_string();
    entry
}

/// Changelog of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNotes {
    /// Name of directory holding the changelog.
    pub package: String,

    /// Entries, newest first.
    pub entries: Vec<ChangelogEntry>,
}

impl PackageNotes {
    /// Construct package notes, sorting entries newest first.
    ///
    /// Entries of the same date keep their file order.
    pub fn new(package: impl Into<String>, mut entries: Vec<ChangelogEntry>) -> Self {
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Self {
            package: package.into(),
            entries,
        }
    }
}

impl Display for PackageNotes {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        writeln!(fmt, "{}", self.package)?;
        writeln!(fmt, "{}", "-".repeat(16))?;
        for entry in &self.entries {
            write!(fmt, "{entry}\n\n")?;
        }

        Ok(())
    }
}

/// Release notes of every package in a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNotes {
    /// Cumulative release version shown in the title.
    pub version: String,
    pub packages: Vec<PackageNotes>,
}

impl ReleaseNotes {
    /// Gather changelogs of every package below `root`.
    ///
    /// Walks the whole tree, hidden directories and ignored files included.
    /// Packages are ordered by the path of their changelog.
    ///
    /// # Errors
    ///
    /// - Return [`NotesError::Root`] if `root` cannot be resolved.
    /// - Return [`NotesError::Walk`] if the tree cannot be walked.
    /// - Return [`NotesError::Read`] if a changelog cannot be read.
    pub fn collect(root: impl AsRef<Path>, version: impl Into<String>) -> Result<Self> {
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(|err| NotesError::Root {
                source: err,
                root: root.as_ref().to_path_buf(),
            })?;

        let mut paths = Vec::new();
        for entry in WalkBuilder::new(&root).standard_filters(false).build() {
            let entry = entry?;
            let is_file = entry.file_type().is_some_and(|kind| kind.is_file());
            if is_file && entry.file_name() == NOTES_FILE_NAME {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        let mut packages = Vec::new();
        for path in paths {
            let package = path
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            info!("translating {package}...");

            let content = read_to_string(&path).map_err(|err| NotesError::Read {
                source: err,
                path: path.clone(),
            })?;
            let entries = parse_changelog(&content);
            debug!("{} entries in {:?}", entries.len(), path.display());
            packages.push(PackageNotes::new(package, entries));
        }

        Ok(Self {
            version: version.into(),
            packages,
        })
    }

    /// Render release notes into file at `path`, replacing it.
    ///
    /// # Errors
    ///
    /// - Return [`NotesError::Write`] if the file or its parent directories
    ///   cannot be written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let to_error = |err| NotesError::Write {
            source: err,
            path: path.to_path_buf(),
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            create_dir_all(parent).map_err(to_error)?;
        }
        write(path, self.to_string()).map_err(to_error)?;

        Ok(())
    }
}

impl Display for ReleaseNotes {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "# v{} Release Notes\n\n", self.version)?;
        for package in &self.packages {
            write!(fmt, "{package}")?;
        }

        Ok(())
    }
}

/// Release notes error types.
#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    /// Root directory cannot be resolved.
    #[error("failed to resolve root directory {:?}", root.display())]
    Root {
        #[source]
        source: std::io::Error,
        root: PathBuf,
    },

    /// Directory tree cannot be walked.
    #[error(transparent)]
    Walk(#[from] ignore::Error),

    /// Changelog cannot be read.
    #[error("failed to read changelog at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Release notes cannot be written.
    #[error("failed to write release notes at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = NotesError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    const LOGGER_NOTES: &str = indoc! {"
        * Mon Jan 08 2024 Jane Doe <jdoe@example.com> - 1.0.0.1
        - Rotate logs daily.

        * Tue Mar 05 2024 John Smith <jsmith@example.com> - 1.1.0.0
        - Add syslog sink.
        - Drop legacy format.
    "};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn parse_changelog_entries() {
        let result = parse_changelog(LOGGER_NOTES);
        let expect = vec![
            ChangelogEntry {
                date: date(2024, 1, 8),
                author: "Jane Doe".into(),
                email: "jdoe@example.com".into(),
                version: "1.0.0.1".into(),
                body: "- Rotate logs daily.".into(),
            },
            ChangelogEntry {
                date: date(2024, 3, 5),
                author: "John Smith".into(),
                email: "jsmith@example.com".into(),
                version: "1.1.0.0".into(),
                body: "- Add syslog sink.\n- Drop legacy format.".into(),
            },
        ];
        assert_eq!(result, expect);
    }

    #[test]
    fn parse_changelog_skips_bad_headers() {
        let content = indoc! {"
            * sometime by someone
            - lost body
            * Fri Feb 30 2024 Jane Doe <jdoe@example.com> - 2.0.0.0
            - impossible date
            * Fri Mar 01 2024 Jane Doe <jdoe@example.com> - 2.0.0.1
            - kept
        "};

        let result = parse_changelog(content);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].version, "2.0.0.1");
        assert_eq!(result[0].body, "- kept");
    }

    #[test]
    fn package_notes_sort_newest_first() {
        let notes = PackageNotes::new("logger", parse_changelog(LOGGER_NOTES));
        let versions = notes
            .entries
            .iter()
            .map(|entry| entry.version.as_str())
            .collect::<Vec<_>>();
        assert_eq!(versions, vec!["1.1.0.0", "1.0.0.1"]);
    }

    #[test]
    fn render_release_notes() {
        let notes = ReleaseNotes {
            version: "4.2".into(),
            packages: vec![PackageNotes::new("logger", parse_changelog(LOGGER_NOTES))],
        };

        let expect = indoc! {"
            # v4.2 Release Notes

            logger
            ----------------
            > 1.1.0.0
            > Tue Mar 05 2024
            > John Smith <jsmith@example.com>
            - Add syslog sink.
            - Drop legacy format.

            > 1.0.0.1
            > Mon Jan 08 2024
            > Jane Doe <jdoe@example.com>
            - Rotate logs daily.

        "};
        assert_eq!(notes.to_string(), expect);
    }

    #[sealed_test]
    fn collect_every_package_in_path_order() -> anyhow::Result<()> {
        create_dir_all("release/logger")?;
        create_dir_all("release/.hidden/imaging")?;
        write("release/logger/release_notes.txt", LOGGER_NOTES)?;
        write(
            "release/.hidden/imaging/release_notes.txt",
            "* Wed Jan 03 2024 Jane Doe <jdoe@example.com> - 3.0.0.0\n- First cut.\n",
        )?;
        write("release/logger/other.txt", "* not a changelog")?;

        let notes = ReleaseNotes::collect("release", "4.2")?;
        let packages = notes
            .packages
            .iter()
            .map(|package| package.package.as_str())
            .collect::<Vec<_>>();
        assert_eq!(packages, vec!["imaging", "logger"]);
        assert_eq!(notes.packages[1].entries.len(), 2);

        notes.write_to("out/notes.md")?;
        let written = read_to_string("out/notes.md")?;
        assert!(written.starts_with("# v4.2 Release Notes\n\nimaging\n"));

        Ok(())
    }
}
