// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where relkit should look for files it does not get told about
//! explicitly on the command line.

use std::path::{Path, PathBuf};

/// File name of the unit configuration for the consistency checker.
pub const REVTOOL_CONFIG_NAME: &str = "revtool.toml";

/// Determine default absolute path to the user-wide checker configuration.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/relkit/revtool.toml`. Does
/// not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoConfigDir`] if the configuration directory cannot be
///   determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("relkit").join(REVTOOL_CONFIG_NAME))
        .ok_or(NoConfigDir)
}

/// Locate checker configuration file.
///
/// Looks for `revtool.toml` inside `dir` first, then falls back to the
/// user-wide configuration from [`default_config_path`]. Returns `None` when
/// neither exists.
pub fn find_config(dir: impl AsRef<Path>) -> Option<PathBuf> {
    let local = dir.as_ref().join(REVTOOL_CONFIG_NAME);
    if local.is_file() {
        return Some(local);
    }

    default_config_path().ok().filter(|path| path.is_file())
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoConfigDir;

/// Friendly result alias :3
pub type Result<T, E = NoConfigDir> = std::result::Result<T, E>;
