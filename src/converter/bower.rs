//! `bower.json` conversion.

use anyhow::Result;
use serde_json::{Map, Value};

use super::{convert_with_table, ConversionTable, ManifestConverter};
use crate::core::{AssetType, RepositoryConfig};

const BOWER_TABLE: ConversionTable = ConversionTable {
    keys: &["description", "keywords", "license", "bin", "time"],
    dependencies: &[("dependencies", "require"), ("devDependencies", "require-dev")],
    extras: &[
        ("main", "bower-asset-main"),
        ("ignore", "bower-asset-ignore"),
        ("private", "bower-asset-private"),
    ],
};

/// Converter for Bower manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct BowerConverter;

impl ManifestConverter for BowerConverter {
    fn convert(
        &self,
        asset: &AssetType,
        manifest: &Map<String, Value>,
        vcs_repos: &mut Vec<RepositoryConfig>,
    ) -> Result<Map<String, Value>> {
        convert_with_table(asset, manifest, &BOWER_TABLE, vcs_repos)
    }
}
