// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{git_available, RepoFixture};

use relkit::consistency::{
    diff::{DiffError, Git2Diff, GitBinDiff, RevisionDiff},
    ConsistencyChecker, RevisionPair, Unit,
};

use anyhow::Result;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::path::Path;

/// Build a release line, then a main line on top of it.
///
/// | unit           | main line change                | expected  |
/// |----------------|---------------------------------|-----------|
/// | `logger`       | source and VERSION bump         | ok        |
/// | `imaging`      | source only                     | violation |
/// | `drivers/kmod` | source only                     | violation |
/// | `tools`        | source, unit has no manifest    | violation |
/// | `recorder`     | none, sibling `recorder-cli` is | ok        |
/// | `mscp`         | manifest comment only           | ok        |
pub(crate) fn release_fixture(path: impl AsRef<Path>) -> Result<RepoFixture> {
    let repo = RepoFixture::new(path)?;
    repo.stage_and_commit("logger/CMakeLists.txt", "project(logger VERSION 1.0.0)\n")?;
    repo.stage_and_commit("logger/src/log.c", "int level = 1;\n")?;
    repo.stage_and_commit("imaging/CMakeLists.txt", "project(imaging VERSION 2.0.0)\n")?;
    repo.stage_and_commit("imaging/src/recon.c", "int slices = 64;\n")?;
    repo.stage_and_commit("drivers/kmod/CMakeLists.txt", "project(kmod VERSION 0.1.0)\n")?;
    repo.stage_and_commit("drivers/kmod/kmod.c", "int irq = 5;\n")?;
    repo.stage_and_commit("tools/run.sh", "echo start\n")?;
    repo.stage_and_commit("recorder/CMakeLists.txt", "project(recorder VERSION 3.0.0)\n")?;
    repo.stage_and_commit("recorder/rec.c", "int rate = 10;\n")?;
    repo.stage_and_commit("recorder-cli/main.c", "int main() { return 0; }\n")?;
    repo.stage_and_commit("mscp/CMakeLists.txt", "project(mscp VERSION 1.2.0)\n")?;
    repo.stage_and_commit("mscp/notes.txt", "old notes\n")?;
    repo.mark("origin/release")?;

    repo.stage_and_commit("logger/src/log.c", "int level = 2;\n")?;
    repo.stage_and_commit("logger/CMakeLists.txt", "project(logger VERSION 1.0.1)\n")?;
    repo.stage_and_commit("imaging/src/recon.c", "int slices = 128;\n")?;
    repo.stage_and_commit("drivers/kmod/kmod.c", "int irq = 7;\n")?;
    repo.stage_and_commit("tools/run.sh", "echo begin\n")?;
    repo.stage_and_commit("recorder-cli/main.c", "int main() { return 1; }\n")?;
    repo.remove_and_commit("mscp/notes.txt")?;
    repo.stage_and_commit(
        "mscp/CMakeLists.txt",
        "# release 4.2\nproject(mscp VERSION 1.2.0)\n",
    )?;
    repo.mark("origin/main")?;

    Ok(repo)
}

fn fixture_units() -> Vec<Unit> {
    ["logger", "imaging", "drivers/kmod", "tools", "recorder", "mscp"]
        .into_iter()
        .map(Unit::new)
        .collect()
}

fn violations_of(diff: impl RevisionDiff) -> Result<Vec<String>> {
    let report = ConsistencyChecker::new(diff, fixture_units()).run()?;
    assert_eq!(report.units.len(), 6);

    Ok(report
        .violations()
        .map(|report| report.unit.name().to_string())
        .collect())
}

#[sealed_test]
fn git2_backend_reports_unbumped_units() -> Result<()> {
    release_fixture(".")?;
    let diff = Git2Diff::open(".", &RevisionPair::default())?;

    let result = violations_of(diff)?;
    let expect = vec![
        "imaging".to_string(),
        "drivers/kmod".to_string(),
        "tools".to_string(),
    ];
    assert_eq!(result, expect);

    Ok(())
}

#[sealed_test]
fn git2_backend_scopes_diff_to_unit_path() -> Result<()> {
    release_fixture(".")?;
    let diff = Git2Diff::open(".", &RevisionPair::default())?;

    assert!(diff.diff_lines(Path::new("recorder"))?.is_empty());
    assert!(!diff.diff_lines(Path::new("recorder-cli"))?.is_empty());
    assert!(diff.diff_lines(Path::new("does/not/exist"))?.is_empty());

    let manifest = diff.diff_lines(Path::new("logger/CMakeLists.txt"))?;
    assert!(manifest.contains(&"-project(logger VERSION 1.0.0)".to_string()));
    assert!(manifest.contains(&"+project(logger VERSION 1.0.1)".to_string()));

    Ok(())
}

#[sealed_test]
fn same_revision_has_no_violations() -> Result<()> {
    release_fixture(".")?;
    let revisions = RevisionPair::new("origin/release", "origin/release");
    let diff = Git2Diff::open(".", &revisions)?;

    assert!(violations_of(diff)?.is_empty());

    Ok(())
}

#[sealed_test]
fn unknown_revision_is_fatal() -> Result<()> {
    release_fixture(".")?;
    let revisions = RevisionPair::new("origin/main", "origin/release-9.9");
    let result = Git2Diff::open(".", &revisions);

    match result {
        Err(DiffError::ResolveRevision { revision, .. }) => {
            assert_eq!(revision, "origin/release-9.9");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("revision should not resolve"),
    }

    Ok(())
}

#[sealed_test]
fn missing_repository_is_fatal() {
    let result = Git2Diff::open(".", &RevisionPair::default());
    assert!(matches!(result, Err(DiffError::OpenRepository { .. })));
}

#[sealed_test]
fn git_binary_backend_agrees_with_git2() -> Result<()> {
    if !git_available() {
        return Ok(());
    }

    release_fixture(".")?;
    let revisions = RevisionPair::default();
    let git2 = violations_of(Git2Diff::open(".", &revisions)?)?;
    let bin = violations_of(GitBinDiff::open(".", &revisions)?)?;
    assert_eq!(bin, git2);

    Ok(())
}

#[sealed_test]
fn dotted_unit_path_is_reported_by_both_backends() -> Result<()> {
    release_fixture(".")?;
    let revisions = RevisionPair::default();
    let units = || [Unit::new("./imaging"), Unit::new("./logger/")];

    let report = ConsistencyChecker::new(Git2Diff::open(".", &revisions)?, units()).run()?;
    let result = report
        .violations()
        .map(|report| report.unit.name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(result, vec!["imaging".to_string()]);

    if git_available() {
        let report = ConsistencyChecker::new(GitBinDiff::open(".", &revisions)?, units()).run()?;
        let bin = report
            .violations()
            .map(|report| report.unit.name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(bin, result);
    }

    Ok(())
}
