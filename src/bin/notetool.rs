// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use relkit::{logging, notes::ReleaseNotes};

use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, process::exit};
use tracing::{error, info, warn};

/// Compile package changelogs into one release notes document.
#[derive(Debug, Clone, Parser)]
#[command(about, override_usage = "notetool [options] <version> [output]", version)]
struct Cli {
    /// Cumulative release version for the document title.
    #[arg(value_name = "version")]
    pub version: String,

    /// Markdown file to write release notes to.
    #[arg(value_name = "output", default_value = "release_notes.md")]
    pub output: PathBuf,

    /// Directory to search for package changelogs.
    #[arg(short, long, value_name = "path", default_value = ".")]
    pub root: PathBuf,
}

fn main() {
    logging::init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    let opts = Cli::parse();
    let notes = ReleaseNotes::collect(&opts.root, opts.version)?;
    if notes.packages.is_empty() {
        warn!("no release_notes.txt found below {:?}", opts.root.display());
    }

    notes.write_to(&opts.output)?;
    info!("done, check {:?}", opts.output.display());

    Ok(())
}
