//! Version string normalization.
//!
//! Normalized versions always have four numeric components and an optional
//! stability suffix (`1.2` -> `1.2.0.0`, `v2.0-rc.1` -> `2.0.0.0-RC1`).
//! Branches normalize to `dev-<name>` or, for numeric branches, to a
//! `9999999` padded form ending in `-dev`.

use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::Regex;

/// Normalized form of the master-like branches.
pub const DEFAULT_BRANCH_VERSION: &str = "9999999-dev";

const MODIFIER: &str =
    r"[._-]?(?:(stable|beta|b|RC|alpha|a|patch|pl|p)((?:[.-]?\d+)*)?)?([.-]?dev)?";

static CLASSICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^v?(\d{{1,5}})(\.\d+)?(\.\d+)?(\.\d+)?{}$",
        MODIFIER
    ))
    .expect("classical version pattern")
});

static DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^v?(\d{{4}}(?:[.:-]?\d{{2}}){{1,6}}(?:[.:-]?\d{{1,3}})?){}$",
        MODIFIER
    ))
    .expect("datetime version pattern")
});

static NUMERIC_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^v?(\d+)(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?$")
        .expect("numeric branch pattern")
});

static ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^,\s]+) +as +[^,\s]+$").expect("alias pattern"));

static DEV_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*?)[.-]?dev$").expect("dev suffix pattern"));

/// Returns true for the branch names that mean "the default branch".
pub fn is_master_like(name: &str) -> bool {
    matches!(name, "master" | "trunk" | "default")
}

/// Normalize a version string.
///
/// Fails for anything that is neither a classical, date based, nor dev
/// version.
pub fn normalize(version: &str) -> Result<String> {
    let original = version;
    let mut version = version.trim();

    if let Some(caps) = ALIAS.captures(version) {
        version = caps.get(1).map_or(version, |m| m.as_str());
    }

    // build metadata is not part of the version
    if let Some((base, _)) = version.split_once('+') {
        if !base.is_empty() && !base.contains(char::is_whitespace) {
            version = base;
        }
    }

    let lower = version.to_ascii_lowercase();
    if is_master_like(lower.trim_start_matches("dev-")) {
        return Ok(DEFAULT_BRANCH_VERSION.to_string());
    }
    if lower.starts_with("dev-") {
        return Ok(format!("dev-{}", &version[4..]));
    }

    if let Some(caps) = CLASSICAL.captures(version) {
        let mut normalized = caps[1].to_string();
        for i in 2..=4 {
            normalized.push_str(caps.get(i).map_or(".0", |m| m.as_str()));
        }
        return Ok(append_modifiers(normalized, &caps, 5));
    }

    if let Some(caps) = DATETIME.captures(version) {
        let normalized: String = caps[1]
            .chars()
            .map(|c| if c.is_ascii_digit() { c } else { '.' })
            .collect();
        return Ok(append_modifiers(normalized, &caps, 2));
    }

    if let Some(caps) = DEV_SUFFIX.captures(version) {
        let branch = &caps[1];
        if !branch.is_empty() {
            return Ok(normalize_branch(branch));
        }
    }

    bail!("invalid version string \"{}\"", original)
}

fn append_modifiers(mut version: String, caps: &regex::Captures<'_>, index: usize) -> String {
    if let Some(stability) = caps.get(index) {
        let stability = stability.as_str();
        if stability.eq_ignore_ascii_case("stable") {
            return version;
        }
        version.push('-');
        version.push_str(&expand_stability(stability));
        if let Some(number) = caps.get(index + 1) {
            version.push_str(number.as_str().trim_start_matches(['.', '-']));
        }
    }
    if caps.get(index + 2).is_some() {
        version.push_str("-dev");
    }
    version
}

fn expand_stability(stability: &str) -> String {
    let lower = stability.to_ascii_lowercase();
    match lower.as_str() {
        "a" => "alpha".to_string(),
        "b" => "beta".to_string(),
        "p" | "pl" => "patch".to_string(),
        "rc" => "RC".to_string(),
        _ => lower,
    }
}

/// Normalize a branch name. Never fails.
pub fn normalize_branch(name: &str) -> String {
    let name = name.trim();

    if is_master_like(name) {
        return DEFAULT_BRANCH_VERSION.to_string();
    }

    if let Some(caps) = NUMERIC_BRANCH.captures(name) {
        let mut version = String::new();
        for i in 1..=4 {
            match caps.get(i) {
                Some(m) => version.push_str(&m.as_str().replace(['*', 'X'], "x")),
                None => version.push_str(".x"),
            }
        }
        return format!("{}-dev", version.replace('x', "9999999"));
    }

    format!("dev-{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_classical() {
        assert_eq!(normalize("1.0.0").unwrap(), "1.0.0.0");
        assert_eq!(normalize("v1.2").unwrap(), "1.2.0.0");
        assert_eq!(normalize("1.2.3.4").unwrap(), "1.2.3.4");
        assert_eq!(normalize("1.0.0+build.7").unwrap(), "1.0.0.0");
    }

    #[test]
    fn test_normalize_stability() {
        assert_eq!(normalize("1.0.0-beta1").unwrap(), "1.0.0.0-beta1");
        assert_eq!(normalize("1.0.0-b2").unwrap(), "1.0.0.0-beta2");
        assert_eq!(normalize("2.0-rc.1").unwrap(), "2.0.0.0-RC1");
        assert_eq!(normalize("1.0.0-stable").unwrap(), "1.0.0.0");
        assert_eq!(normalize("1.0.0-dev").unwrap(), "1.0.0.0-dev");
        assert_eq!(normalize("1.0.0-alpha3-dev").unwrap(), "1.0.0.0-alpha3-dev");
    }

    #[test]
    fn test_normalize_datetime() {
        assert_eq!(normalize("20140115").unwrap(), "20140115");
        assert_eq!(normalize("2014-01-15").unwrap(), "2014.01.15");
    }

    #[test]
    fn test_normalize_dev_versions() {
        assert_eq!(normalize("dev-master").unwrap(), DEFAULT_BRANCH_VERSION);
        assert_eq!(normalize("master").unwrap(), DEFAULT_BRANCH_VERSION);
        assert_eq!(normalize("dev-feature/x").unwrap(), "dev-feature/x");
        assert_eq!(normalize("1.x-dev").unwrap(), "1.9999999.9999999.9999999-dev");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize("v2.0.0-invalid!tag").is_err());
        assert!(normalize("not a version").is_err());
        assert!(normalize("").is_err());
    }

    #[test]
    fn test_normalize_branch() {
        assert_eq!(normalize_branch("master"), DEFAULT_BRANCH_VERSION);
        assert_eq!(normalize_branch("trunk"), DEFAULT_BRANCH_VERSION);
        assert_eq!(normalize_branch("1.x"), "1.9999999.9999999.9999999-dev");
        assert_eq!(normalize_branch("v2.1"), "2.1.9999999.9999999-dev");
        assert_eq!(normalize_branch("feature/3.2-foo"), "dev-feature/3.2-foo");
    }
}
