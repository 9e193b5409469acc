// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use relkit::{
    config::RevtoolConfig,
    consistency::{
        diff::{Git2Diff, GitBinDiff, RevisionDiff},
        ConsistencyChecker, ConsistencyReport, Unit,
    },
    logging,
    path::find_config,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::{fs::read_to_string, path::PathBuf, process::exit};
use tracing::{error, info};

/// Check that every changed unit also bumped its version.
#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "revtool [options] [unit]...",
    version
)]
struct Cli {
    /// Units to check instead of configured units.
    #[arg(value_name = "unit")]
    pub units: Vec<String>,

    /// Path to unit configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path to repository to inspect.
    #[arg(short, long, value_name = "path")]
    pub repo: Option<PathBuf>,

    /// Revision of the development line.
    #[arg(long, value_name = "rev")]
    pub main: Option<String>,

    /// Revision of the release line.
    #[arg(long, value_name = "rev")]
    pub release: Option<String>,

    /// Use Git binary instead of libgit2 to compute diffs.
    #[arg(long)]
    pub git_bin: bool,
}

fn main() {
    logging::init();

    match run() {
        Ok(true) => exit(0),
        Ok(false) => exit(1),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let opts = Cli::parse();
    let mut config = load_config(&opts)?;

    if let Some(main) = opts.main {
        config.settings.main = main;
    }

    if let Some(release) = opts.release {
        config.settings.release = release;
    }

    let units = if opts.units.is_empty() {
        config.units()
    } else {
        opts.units.iter().map(|name| config.unit(name)).collect()
    };

    if units.is_empty() {
        bail!("no units to check, list them in revtool.toml or on the command line");
    }

    let repo = opts
        .repo
        .or_else(|| config.settings.repository.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let revisions = config.revisions();
    let token = config.settings.version_token.clone();

    let report = if opts.git_bin {
        check(GitBinDiff::open(&repo, &revisions)?, units, token)?
    } else {
        check(Git2Diff::open(&repo, &revisions)?, units, token)?
    };

    for violation in report.violations() {
        println!("{violation}");
    }

    let count = report.violations().count();
    if count == 0 {
        info!("all {} units are consistent", report.units.len());
    } else {
        error!(
            "{count} of {} units changed without a version bump",
            report.units.len()
        );
    }

    Ok(report.passed())
}

fn check<D: RevisionDiff>(diff: D, units: Vec<Unit>, token: String) -> Result<ConsistencyReport> {
    Ok(ConsistencyChecker::new(diff, units)
        .version_token(token)
        .run()?)
}

fn load_config(opts: &Cli) -> Result<RevtoolConfig> {
    let path = match &opts.config {
        Some(path) => Some(path.clone()),
        None => find_config("."),
    };

    let Some(path) = path else {
        info!("no revtool.toml found, using default settings");
        return Ok(RevtoolConfig::default());
    };

    info!("load units from {:?}", path.display());
    let content = read_to_string(&path)
        .with_context(|| format!("failed to read config at {:?}", path.display()))?;
    let config = content
        .parse::<RevtoolConfig>()
        .with_context(|| format!("failed to parse config at {:?}", path.display()))?;

    Ok(config)
}
