//! `package.json` conversion.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde_json::{Map, Value};

use super::{convert_with_table, ConversionTable, ManifestConverter};
use crate::core::{AssetType, RepositoryConfig};

const NPM_TABLE: ConversionTable = ConversionTable {
    keys: &["description", "keywords", "license", "homepage", "bin", "time"],
    dependencies: &[("dependencies", "require"), ("devDependencies", "require-dev")],
    extras: &[
        ("main", "npm-asset-main"),
        ("bugs", "npm-asset-bugs"),
        ("files", "npm-asset-files"),
        ("man", "npm-asset-man"),
        ("directories", "npm-asset-directories"),
        ("repository", "npm-asset-repository"),
        ("scripts", "npm-asset-scripts"),
        ("config", "npm-asset-config"),
        ("bundledDependencies", "npm-asset-bundled-dependencies"),
        ("optionalDependencies", "npm-asset-optional-dependencies"),
        ("engines", "npm-asset-engines"),
        ("os", "npm-asset-os"),
        ("cpu", "npm-asset-cpu"),
        ("private", "npm-asset-private"),
    ],
};

// "Name <email> (url)", every part but the name optional
static PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<name>[^<(]*?)\s*(?:<(?P<email>[^>]*)>)?\s*(?:\((?P<url>[^)]*)\))?\s*$")
        .expect("person pattern")
});

/// Converter for npm manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpmConverter;

impl ManifestConverter for NpmConverter {
    fn convert(
        &self,
        asset: &AssetType,
        manifest: &Map<String, Value>,
        vcs_repos: &mut Vec<RepositoryConfig>,
    ) -> Result<Map<String, Value>> {
        let mut out = convert_with_table(asset, manifest, &NPM_TABLE, vcs_repos)?;

        let mut authors: Vec<Value> = Vec::new();
        if let Some(author) = manifest.get("author").and_then(convert_person) {
            authors.push(author);
        }
        if let Some(Value::Array(contributors)) = manifest.get("contributors") {
            authors.extend(contributors.iter().filter_map(convert_person));
        }
        if !authors.is_empty() {
            out.insert("authors".into(), Value::Array(authors));
        }

        Ok(out)
    }
}

/// npm person (string or object) to a host author object.
fn convert_person(value: &Value) -> Option<Value> {
    let (name, email, homepage) = match value {
        Value::String(s) => {
            let caps = PERSON.captures(s)?;
            let part = |key: &str| {
                caps.name(key)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|s| !s.is_empty())
            };
            (part("name")?, part("email"), part("url"))
        }
        Value::Object(map) => {
            let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
            (field("name")?, field("email"), field("url"))
        }
        _ => return None,
    };

    let mut author = Map::new();
    author.insert("name".into(), name.into());
    if let Some(email) = email {
        author.insert("email".into(), email.into());
    }
    if let Some(homepage) = homepage {
        author.insert("homepage".into(), homepage.into());
    }
    Some(Value::Object(author))
}
