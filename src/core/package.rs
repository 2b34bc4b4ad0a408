//! Host package records.
//!
//! A [`PackageRecord`] is the host-schema representation of one resolvable
//! version of an asset. Records are produced by the manifest converters as a
//! JSON map and deserialized into this struct, so the serde names below are
//! the host schema keys.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where to fetch the sources of a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    /// VCS kind (`git`)
    #[serde(rename = "type")]
    pub kind: String,

    /// Clone URL
    pub url: String,

    /// Commit or ref to check out
    pub reference: String,
}

/// Where to download an archive of a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistReference {
    /// Archive kind (`zip`)
    #[serde(rename = "type")]
    pub kind: String,

    /// Download URL
    pub url: String,

    /// Commit the archive was built from
    pub reference: String,
}

/// A package author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// One version of a package, in host schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Vendor prefixed name (`bower-asset/jquery`)
    pub name: String,

    /// Pretty version as shown to users
    pub version: String,

    /// Normalized, comparable version
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version_normalized: String,

    /// Host package type
    #[serde(rename = "type")]
    pub package_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Either a single identifier or a list of them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<Value>,

    /// Release date of the version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub require: IndexMap<String, String>,

    #[serde(
        default,
        rename = "require-dev",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub require_dev: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<DistReference>,

    /// Ecosystem specific fields (`bower-asset-main`, ...)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl PackageRecord {
    /// A stub carrying only the descriptor known at discovery time.
    pub fn stub(
        name: impl Into<String>,
        version: impl Into<String>,
        version_normalized: impl Into<String>,
        package_type: impl Into<String>,
    ) -> Self {
        PackageRecord {
            name: name.into(),
            version: version.into(),
            version_normalized: version_normalized.into(),
            package_type: package_type.into(),
            ..Default::default()
        }
    }

    /// Build a record from a converted host map.
    pub fn from_map(map: Map<String, Value>) -> Result<Self> {
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();
        serde_json::from_value(Value::Object(map))
            .with_context(|| format!("converted package `{}` is not a valid record", name))
    }

    /// Serialize back to a host map.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// True for branch versions.
    pub fn is_dev(&self) -> bool {
        self.version.starts_with("dev-")
            || self.version.ends_with("-dev")
            || self.version_normalized.starts_with("dev-")
            || self.version_normalized.ends_with("-dev")
    }

    /// An ecosystem extra field, if present.
    pub fn extra_field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
