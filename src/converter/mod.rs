//! Manifest conversion.
//!
//! Converters turn an ecosystem manifest (`bower.json`, `package.json`) into
//! a host package map. Each ecosystem describes its conversion with a
//! [`ConversionTable`]; [`convert_with_table`] applies it. Dependencies that
//! point at a VCS location instead of a version are reported through the
//! `vcs_repos` out list so the caller can register those repositories.

mod bower;
mod npm;
mod semver;

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde_json::{Map, Value};

use crate::core::{AssetError, AssetType, RepositoryConfig};

pub use bower::BowerConverter;
pub use npm::NpmConverter;
pub use self::semver::SemverConverter;

static GITHUB_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:github:)?[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+$").expect("shorthand pattern")
});

static BRANCH_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_./-]*$").expect("branch word pattern"));

static VERSION_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[vV]\d").expect("version prefix pattern"));

/// Ecosystem manifest to host package map.
pub trait ManifestConverter {
    /// Convert `manifest`, appending VCS dependencies to `vcs_repos`.
    ///
    /// Fails with [`AssetError::Conversion`] when `name` or `version` is
    /// missing.
    fn convert(
        &self,
        asset: &AssetType,
        manifest: &Map<String, Value>,
        vcs_repos: &mut Vec<RepositoryConfig>,
    ) -> Result<Map<String, Value>>;
}

/// Declarative field mapping of one ecosystem.
#[derive(Debug)]
pub struct ConversionTable {
    /// Keys copied verbatim
    pub keys: &'static [&'static str],

    /// Dependency maps and the host section they land in
    pub dependencies: &'static [(&'static str, &'static str)],

    /// Fields kept under `extra`, with their host key
    pub extras: &'static [(&'static str, &'static str)],
}

/// Apply `table` to `manifest`.
pub fn convert_with_table(
    asset: &AssetType,
    manifest: &Map<String, Value>,
    table: &ConversionTable,
    vcs_repos: &mut Vec<RepositoryConfig>,
) -> Result<Map<String, Value>> {
    let name = required_str(manifest, "name")?;
    let version = required_str(manifest, "version")?;

    let mut out = Map::new();
    out.insert("name".into(), asset.format_package_name(name).into());
    out.insert("type".into(), asset.package_type().into());
    out.insert(
        "version".into(),
        asset.version_converter().convert_version(version).into(),
    );
    if let Some(normalized) = manifest.get("version_normalized").and_then(Value::as_str) {
        out.insert("version_normalized".into(), normalized.into());
    }

    for key in table.keys {
        if let Some(value) = copy_field(key, manifest.get(*key)) {
            out.insert((*key).to_string(), value);
        }
    }

    for (from, to) in table.dependencies {
        let Some(Value::Object(deps)) = manifest.get(*from) else {
            continue;
        };
        let mut section = Map::new();
        for (dep_name, constraint) in deps {
            let Some(constraint) = constraint.as_str() else {
                continue;
            };
            let (package, constraint) = convert_dependency(asset, dep_name, constraint, vcs_repos);
            section.insert(package, constraint.into());
        }
        if !section.is_empty() {
            out.insert((*to).to_string(), Value::Object(section));
        }
    }

    let mut extra = Map::new();
    for (from, to) in table.extras {
        match manifest.get(*from) {
            None | Some(Value::Null) => {}
            Some(value) => {
                extra.insert((*to).to_string(), value.clone());
            }
        }
    }
    if !extra.is_empty() {
        out.insert("extra".into(), Value::Object(extra));
    }

    Ok(out)
}

fn required_str<'a>(manifest: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    match manifest.get(key).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AssetError::missing_key(key).into()),
    }
}

fn copy_field(key: &str, value: Option<&Value>) -> Option<Value> {
    let value = value?;
    match (key, value) {
        (_, Value::Null) => None,
        ("keywords", Value::Array(items)) => {
            let words: Vec<Value> = items.iter().filter(|v| v.is_string()).cloned().collect();
            Some(Value::Array(words))
        }
        ("keywords", _) => None,
        ("description" | "homepage" | "time", Value::String(_)) => Some(value.clone()),
        ("description" | "homepage" | "time", _) => None,
        _ => Some(value.clone()),
    }
}

/// Convert one dependency entry into a `(host package, constraint)` pair.
pub fn convert_dependency(
    asset: &AssetType,
    name: &str,
    value: &str,
    vcs_repos: &mut Vec<RepositoryConfig>,
) -> (String, String) {
    let package = asset.format_package_name(name);
    let value = value.trim().trim_matches('#').trim();

    let constraint = match vcs_location(value) {
        Some((url, fragment)) => {
            vcs_repos.push(
                RepositoryConfig::new(format!("{}-vcs", asset.name()), url).with_name(name),
            );
            fragment.map_or_else(|| "*".to_string(), |f| convert_constraint(asset, f))
        }
        None => convert_constraint(asset, value),
    };

    (package, constraint)
}

fn convert_constraint(asset: &AssetType, value: &str) -> String {
    if value.is_empty() || value == "latest" {
        return "*".to_string();
    }
    if BRANCH_WORD.is_match(value) && !VERSION_LIKE.is_match(value) && !is_wildcard(value) {
        return format!("dev-{}", value);
    }
    asset.version_converter().convert_range(value)
}

/// `x`, `X.x`, `x.x.x`: every component is a wildcard.
fn is_wildcard(value: &str) -> bool {
    value.split('.').all(|part| matches!(part, "x" | "X" | "*"))
}

/// Split a dependency value into a VCS URL and its `#fragment`.
fn vcs_location(value: &str) -> Option<(String, Option<&str>)> {
    let (location, fragment) = match value.split_once('#') {
        Some((location, fragment)) => (location, Some(fragment).filter(|f| !f.is_empty())),
        None => (value, None),
    };

    if location.contains("://") || location.starts_with("git@") {
        return Some((location.to_string(), fragment));
    }
    if GITHUB_SHORTHAND.is_match(location) {
        let path = location.trim_start_matches("github:");
        return Some((format!("https://github.com/{}", path), fragment));
    }
    None
}
