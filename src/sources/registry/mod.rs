//! Registry repositories - package names resolved through an asset registry.
//!
//! A registry does not serve versions itself. Looking a package up yields
//! the VCS repository that holds it, which is registered with the
//! [`RepositoryRegistry`]; versions come from that repository later.
//!
//! # Lookup
//!
//! ```text
//! bower-asset/jquery
//!   -> GET https://registry.bower.io/packages/jquery
//!   -> {"name": "jquery", "url": "https://github.com/jquery/jquery-dist.git"}
//!   -> register bower-vcs https://github.com/jquery/jquery-dist.git
//! ```
//!
//! A 404 triggers one search for the name; a case-insensitive exact match
//! is looked up instead.

pub mod bower;
pub mod npm;

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::core::{AssetType, PackageRecord, RepositoryConfig};
use crate::sources::registration::RepositoryRegistry;
use crate::util::context::SessionContext;
use crate::util::hash::sha256_str;
use crate::util::http::{http_status, TransportError};

pub use bower::BowerRegistry;
pub use npm::NpmRegistry;

/// What differs between asset registries.
pub trait RegistrySource {
    fn asset_type(&self) -> &AssetType;

    /// Root URL used when no `<type>-url` option is set.
    fn default_url(&self) -> &'static str;

    /// Descriptor URL of a registry package name.
    fn package_url(&self, base: &str, name: &str) -> String;

    /// Search URL of an already encoded query.
    fn search_url(&self, base: &str, query: &str) -> String;

    /// VCS repository declaration of a package descriptor.
    fn create_vcs_config(&self, data: &Value, name: &str) -> Result<RepositoryConfig>;

    /// Registry package names of a search response.
    fn search_names(&self, data: &Value) -> Vec<String>;
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub description: Option<String>,
}

/// Whether a lookup may still fall back to a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    Normal,
    InFallback,
}

/// Registry repository over one [`RegistrySource`].
pub struct AssetsRepository {
    source: Box<dyn RegistrySource>,
    context: SessionContext,
    base_url: String,
    searchable: bool,

    /// Lookup results by requested name
    providers: HashMap<String, Vec<PackageRecord>>,

    /// Registered repository name by requested name
    resolved: HashMap<String, String>,
}

impl AssetsRepository {
    pub fn new(source: Box<dyn RegistrySource>, ctx: &SessionContext) -> Self {
        let options = ctx.config().registry_options(source.asset_type().name());
        let base_url = options
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or(source.default_url())
            .trim_end_matches('/')
            .to_string();
        let searchable = options
            .get("searchable")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        AssetsRepository {
            source,
            context: ctx.clone(),
            base_url,
            searchable,
            providers: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    pub fn asset_type(&self) -> &AssetType {
        self.source.asset_type()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Name the repository providing `name` was registered under, once
    /// looked up. Differs from `name` when a search corrected its case.
    pub fn resolved_name(&self, name: &str) -> Option<&str> {
        self.resolved.get(name).map(String::as_str)
    }

    /// Look `name` up and register the repository that provides it.
    ///
    /// Names outside this registry's vendor namespace are not looked up.
    /// The returned list is empty: versions come from the registered
    /// repository.
    pub fn what_provides(
        &mut self,
        name: &str,
        registry: &mut RepositoryRegistry,
    ) -> Result<Vec<PackageRecord>> {
        self.what_provides_in(name, registry, FallbackState::Normal)
    }

    fn what_provides_in(
        &mut self,
        name: &str,
        registry: &mut RepositoryRegistry,
        state: FallbackState,
    ) -> Result<Vec<PackageRecord>> {
        let asset = self.source.asset_type().clone();
        if !name.starts_with(&asset.vendor_prefix()) {
            return Ok(Vec::new());
        }
        if let Some(providers) = self.providers.get(name) {
            return Ok(providers.clone());
        }

        let repo_name = strip_alias(name);
        let package = self.clean_name(repo_name);
        let url = self
            .source
            .package_url(&self.base_url, &asset.registry_package_name(&package));
        let cache_key = format!("{}-{}-package.json", package, sha256_str(&package));

        let providers = match self.fetch_descriptor(&url, &cache_key) {
            Ok(data) => {
                let config = self.source.create_vcs_config(&data, &package)?;
                registry.add_repository(repo_name, config, &self.context)?;
                self.resolved.insert(name.to_string(), repo_name.to_string());
                Vec::new()
            }
            Err(err) if http_status(&err) == Some(404) => match state {
                FallbackState::Normal => self.fallback(name, repo_name, registry)?,
                FallbackState::InFallback => Vec::new(),
            },
            Err(err) => return Err(err),
        };

        self.providers.insert(name.to_string(), providers.clone());
        Ok(providers)
    }

    /// One search for a name the registry does not know as spelled.
    fn fallback(
        &mut self,
        name: &str,
        repo_name: &str,
        registry: &mut RepositoryRegistry,
    ) -> Result<Vec<PackageRecord>> {
        tracing::debug!("Package {} not found, searching the registry", repo_name);
        let wanted = repo_name.to_lowercase();
        let found = self
            .search(repo_name)?
            .into_iter()
            .find(|item| item.name.to_lowercase() == wanted);

        let Some(item) = found else {
            return Ok(Vec::new());
        };
        let providers = self.what_provides_in(&item.name, registry, FallbackState::InFallback)?;
        if let Some(resolved) = self.resolved.get(&item.name).cloned() {
            self.resolved.insert(name.to_string(), resolved);
        }
        Ok(providers)
    }

    /// Search the registry. Non-searchable registries find nothing.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        if !self.searchable {
            return Ok(Vec::new());
        }

        let query = self.clean_name(strip_alias(query));
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let url = self.source.search_url(&self.base_url, &encoded);

        let data: Value = self.context.transport().get(&url, &[])?.json(&url)?;
        let asset = self.source.asset_type();
        Ok(self
            .source
            .search_names(&data)
            .into_iter()
            .map(|name| SearchResult {
                name: asset.format_package_name(&name),
                description: None,
            })
            .collect())
    }

    fn clean_name(&self, name: &str) -> String {
        let prefix = self.source.asset_type().vendor_prefix();
        name.strip_prefix(&prefix).unwrap_or(name).to_string()
    }

    /// Registry descriptor, from the cache when the registry is unreachable.
    fn fetch_descriptor(&self, url: &str, cache_key: &str) -> Result<Value> {
        tracing::info!("Looking up {}", url);
        let store = self.context.cache_store();

        match self.context.transport().get(url, &[]) {
            Ok(response) => {
                let data: Value = response.json(url)?;
                if let Err(err) = store.write(cache_key, &response.body) {
                    tracing::debug!("Could not cache {}: {:#}", url, err);
                }
                Ok(data)
            }
            Err(err @ TransportError::Network { .. }) => match store.read(cache_key) {
                Some(cached) => {
                    tracing::warn!("{}, using the cached copy", err);
                    serde_json::from_slice(&cached)
                        .with_context(|| format!("corrupt cache entry {}", cache_key))
                }
                None => Err(err.into()),
            },
            Err(err) => Err(err.into()),
        }
    }
}

/// Drop an alias suffix: `foo[bar]` is looked up as `foo`.
pub fn strip_alias(name: &str) -> &str {
    match (name.rfind('['), name.ends_with(']')) {
        (Some(open), true) => &name[..open],
        _ => name,
    }
}
