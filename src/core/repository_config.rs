//! Repository declarations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::AssetError;

/// Which VCS driver a repository declaration asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// Pick the first driver that supports the URL
    Vcs,
    GitHub,
    Git,
}

impl DriverKind {
    pub const ALL: [DriverKind; 3] = [DriverKind::Vcs, DriverKind::GitHub, DriverKind::Git];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Vcs => "vcs",
            DriverKind::GitHub => "github",
            DriverKind::Git => "git",
        }
    }
}

impl FromStr for DriverKind {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vcs" => Ok(DriverKind::Vcs),
            "github" => Ok(DriverKind::GitHub),
            "git" => Ok(DriverKind::Git),
            other => Err(AssetError::configuration(format!(
                "unknown repository driver `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A VCS repository declaration: `{type: "<asset>-<driver>", url, name?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfig {
    /// Composite type key (`bower-vcs`, `npm-github`, ...)
    #[serde(rename = "type")]
    pub repo_type: String,

    pub url: String,

    /// Ecosystem package name, when known up front
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Skip the hosting API and use plain git
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_api: bool,
}

impl RepositoryConfig {
    pub fn new(repo_type: impl Into<String>, url: impl Into<String>) -> Self {
        RepositoryConfig {
            repo_type: repo_type.into(),
            url: url.into(),
            name: None,
            no_api: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Split the type key into its asset and driver halves.
    pub fn type_parts(&self) -> Result<(&str, DriverKind), AssetError> {
        let (asset, driver) = self.repo_type.split_once('-').ok_or_else(|| {
            AssetError::configuration(format!(
                "repository type `{}` must be of the form <asset>-<driver>",
                self.repo_type
            ))
        })?;
        Ok((asset, driver.parse()?))
    }
}
