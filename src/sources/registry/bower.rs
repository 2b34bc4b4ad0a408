//! Bower registry.

use anyhow::Result;
use serde_json::Value;

use super::RegistrySource;
use crate::core::{AssetError, AssetType, RepositoryConfig};

/// `registry.bower.io` and compatible registries.
#[derive(Debug, Clone)]
pub struct BowerRegistry {
    asset_type: AssetType,
}

impl BowerRegistry {
    pub fn new() -> Self {
        BowerRegistry {
            asset_type: AssetType::BOWER,
        }
    }
}

impl Default for BowerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrySource for BowerRegistry {
    fn asset_type(&self) -> &AssetType {
        &self.asset_type
    }

    fn default_url(&self) -> &'static str {
        "https://registry.bower.io"
    }

    fn package_url(&self, base: &str, name: &str) -> String {
        format!("{}/packages/{}", base, name)
    }

    fn search_url(&self, base: &str, query: &str) -> String {
        format!("{}/packages/search/{}", base, query)
    }

    fn create_vcs_config(&self, data: &Value, name: &str) -> Result<RepositoryConfig> {
        let url = data
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AssetError::InvalidRegistryData {
                package: name.to_string(),
                message: "the descriptor has no `url`".to_string(),
            })?;

        Ok(RepositoryConfig::new("bower-vcs", url).with_name(name))
    }

    fn search_names(&self, data: &Value) -> Vec<String> {
        data.as_array()
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}
