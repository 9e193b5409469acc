// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use relkit::{
    checksum::{
        ChecksumTool, HashAlgorithm, WriteMode, DEFAULT_ARTIFACT_PATTERN, DEFAULT_MANIFEST_NAME,
    },
    logging,
};

use anyhow::Result;
use clap::{ArgGroup, CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::{io::stdout, path::PathBuf, process::exit, time::Duration};
use tracing::{error, info};

/// Generate or check checksum manifest of release artifacts.
#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "md5tool -g [options]\n       md5tool -c [options]",
    group(ArgGroup::new("mode").args(["generate", "check"])),
    version
)]
struct Cli {
    /// Hash artifacts and write manifest.
    #[arg(short, long)]
    pub generate: bool,

    /// Verify artifacts against manifest.
    #[arg(short, long)]
    pub check: bool,

    /// Directory holding artifacts and manifest.
    #[arg(short, long, value_name = "path", default_value = ".")]
    pub dir: PathBuf,

    /// Manifest file name inside directory.
    #[arg(short, long, value_name = "name", default_value = DEFAULT_MANIFEST_NAME)]
    pub file: String,

    /// Glob pattern of artifacts to hash.
    #[arg(short, long, value_name = "glob", default_value = DEFAULT_ARTIFACT_PATTERN)]
    pub pattern: String,

    /// Append to existing manifest instead of replacing it.
    #[arg(short, long, requires = "generate")]
    pub append: bool,

    /// Also fail on artifacts missing from manifest.
    #[arg(short, long, requires = "check")]
    pub strict: bool,

    /// Content hash algorithm.
    #[arg(long, value_enum, default_value_t = HashAlgorithm::Md5)]
    pub algorithm: HashAlgorithm,
}

fn main() {
    logging::init();

    let opts = match Cli::try_parse() {
        Ok(opts) => opts,
        Err(error) => {
            print!("{}", error.render());
            exit(error.exit_code());
        }
    };
    if !opts.generate && !opts.check {
        let _ = Cli::command().print_help();
        exit(2);
    }

    match run(opts) {
        Ok(true) => exit(0),
        Ok(false) => exit(1),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

fn run(opts: Cli) -> Result<bool> {
    let tool = ChecksumTool::new(&opts.dir)
        .manifest_name(&opts.file)
        .pattern(&opts.pattern)
        .algorithm(opts.algorithm);
    let bar = progress_bar()?;
    let mut out = stdout().lock();

    if opts.generate {
        let mode = if opts.append {
            WriteMode::Append
        } else {
            WriteMode::Overwrite
        };
        tool.generate(mode, &mut out, &bar)?;
        return Ok(true);
    }

    let report = tool.check(opts.strict, &mut out, &bar)?;
    if !report.skipped.is_empty() {
        info!("skipped {} malformed manifest lines", report.skipped.len());
    }

    let failures = report.failures().count();
    if failures == 0 {
        info!("all {} artifacts verified", report.outcomes.len());
    } else {
        error!(
            "{failures} of {} artifacts failed verification",
            report.outcomes.len()
        );
    }

    Ok(report.all_ok())
}

fn progress_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}] {pos}/{len}",
    )?
    .progress_chars("-Cco.");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));

    Ok(bar)
}
