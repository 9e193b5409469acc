// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of `revtool.toml`, the file that tells the consistency
//! checker which units make up a release, and which revisions to compare.
//! File I/O is left to the caller to figure out.

use crate::consistency::{RevisionPair, Unit};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Consistency checker configuration layout.
///
/// # General Layout
///
/// The configuration is composed of two parts: settings and units. The
/// settings section controls how revisions are compared. The unit section is
/// an ordered listing of every unit that must be checked. Units are checked
/// in the order they are listed.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct RevtoolConfig {
    /// Settings for the checker.
    #[serde(default)]
    pub settings: CheckSettings,

    /// Units to check.
    #[serde(rename = "unit", default)]
    pub units: Vec<UnitDefinition>,
}

impl RevtoolConfig {
    /// Revision pair to compare.
    pub fn revisions(&self) -> RevisionPair {
        RevisionPair::new(&self.settings.main, &self.settings.release)
    }

    /// Resolve unit definitions into units.
    ///
    /// Units without an explicit manifest get `<name>/<manifest_file>`.
    pub fn units(&self) -> Vec<Unit> {
        self.units
            .iter()
            .map(|definition| self.resolve(definition))
            .collect()
    }

    /// Resolve a unit named outside the configuration.
    ///
    /// A configured unit of the same name keeps its manifest. Any other unit
    /// gets `<name>/<manifest_file>`.
    pub fn unit(&self, name: &str) -> Unit {
        let unit = Unit::with_manifest_file(name, &self.settings.manifest_file);
        self.units
            .iter()
            .map(|definition| self.resolve(definition))
            .find(|configured| configured.name() == unit.name())
            .unwrap_or(unit)
    }

    fn resolve(&self, definition: &UnitDefinition) -> Unit {
        let unit = Unit::with_manifest_file(&definition.name, &self.settings.manifest_file);
        match &definition.manifest {
            Some(manifest) => unit.manifest(manifest),
            None => unit,
        }
    }
}

impl FromStr for RevtoolConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: RevtoolConfig =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on repository field.
        if let Some(repository) = &config.settings.repository {
            config.settings.repository = Some(PathBuf::from(
                shellexpand::full(repository.to_string_lossy().as_ref())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            ));
        }

        Ok(config)
    }
}

impl Display for RevtoolConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Checker settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckSettings {
    /// Revision holding the development line.
    pub main: String,

    /// Revision holding the release line.
    pub release: String,

    /// Literal token whose presence in a manifest diff counts as a version bump.
    pub version_token: String,

    /// Manifest file name used for units that do not name their own manifest.
    pub manifest_file: String,

    /// Repository to inspect, when not given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<PathBuf>,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            main: "origin/main".into(),
            release: "origin/release".into(),
            version_token: "VERSION".into(),
            manifest_file: "CMakeLists.txt".into(),
            repository: None,
        }
    }
}

/// Unit listing entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct UnitDefinition {
    /// Name of the unit, which is also its path from the repository root.
    pub name: String,

    /// Path to the version-declaring file of the unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
}

impl UnitDefinition {
    /// Construct new unit definition with default manifest.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manifest: None,
        }
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}
