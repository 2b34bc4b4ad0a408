//! Error types for asset resolution.

use thiserror::Error;

/// Fatal errors raised while resolving assets.
///
/// Per-version problems (a tag that does not parse, a ref without a
/// manifest) are not represented here: they are skipped where they occur.
#[derive(Debug, Error)]
pub enum AssetError {
    /// A repository declaration is missing or malformed.
    #[error("invalid repository configuration: {0}")]
    Configuration(String),

    /// No VCS driver accepts the repository URL.
    #[error("no driver found to handle asset VCS repository {url}")]
    DriverUnavailable { url: String },

    /// Not a single tag or branch carried a usable manifest.
    #[error(
        "no valid {filename} was found in any branch or tag of {url}, could not load a package from it"
    )]
    NoValidManifest { filename: String, url: String },

    /// A manifest lacks a key the host schema requires.
    #[error("cannot convert manifest: missing required key `{key}`")]
    Conversion { key: String },

    /// A registry answered with a descriptor we cannot turn into a repository.
    #[error("invalid registry data for `{package}`: {message}")]
    InvalidRegistryData { package: String, message: String },
}

impl AssetError {
    /// Shorthand for a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        AssetError::Configuration(message.into())
    }

    /// Shorthand for a conversion error on `key`.
    pub fn missing_key(key: impl Into<String>) -> Self {
        AssetError::Conversion { key: key.into() }
    }
}
