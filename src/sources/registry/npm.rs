//! npm registry.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde_json::Value;

use super::RegistrySource;
use crate::core::{AssetError, AssetType, RepositoryConfig};

static SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<host>github|gitlab|bitbucket):)?(?P<path>[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+)$")
        .expect("repository shorthand pattern")
});

/// `registry.npmjs.org` and compatible registries.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    asset_type: AssetType,
}

impl NpmRegistry {
    pub fn new() -> Self {
        NpmRegistry {
            asset_type: AssetType::NPM,
        }
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrySource for NpmRegistry {
    fn asset_type(&self) -> &AssetType {
        &self.asset_type
    }

    fn default_url(&self) -> &'static str {
        "https://registry.npmjs.org"
    }

    fn package_url(&self, base: &str, name: &str) -> String {
        // scoped packages keep their `@` but not their `/`
        format!("{}/{}", base, name.replacen('/', "%2F", 1))
    }

    fn search_url(&self, base: &str, query: &str) -> String {
        format!("{}/-/v1/search?text={}", base, query)
    }

    fn create_vcs_config(&self, data: &Value, name: &str) -> Result<RepositoryConfig> {
        let repository = match data.get("repository") {
            Some(Value::String(url)) => Some(url.as_str()),
            Some(Value::Object(object)) => object.get("url").and_then(Value::as_str),
            _ => None,
        };
        let url = repository
            .map(repository_url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AssetError::InvalidRegistryData {
                package: name.to_string(),
                message: "the package has no repository".to_string(),
            })?;

        Ok(RepositoryConfig::new("npm-vcs", url).with_name(name))
    }

    fn search_names(&self, data: &Value) -> Vec<String> {
        data.get("objects")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|object| object.pointer("/package/name").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

/// Cloneable URL of an npm `repository` value.
pub fn repository_url(value: &str) -> String {
    let value = value.trim();
    if let Some(caps) = SHORTHAND.captures(value) {
        let host = match caps.name("host").map(|m| m.as_str()) {
            Some("gitlab") => "gitlab.com",
            Some("bitbucket") => "bitbucket.org",
            _ => "github.com",
        };
        return format!("https://{}/{}", host, &caps["path"]);
    }

    let value = value.strip_prefix("git+").unwrap_or(value);
    let value = value.split(|c: char| c == '?' || c == '#').next().unwrap_or(value);
    value.to_string()
}
