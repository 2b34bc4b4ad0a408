//! Repository manager.
//!
//! The entry point of a session: one registry repository per ecosystem,
//! the VCS repositories registered so far and the queue of repositories
//! discovered in converted manifests.

use anyhow::Result;
use serde_json::Value;

use crate::core::{AssetError, AssetKind, AssetType, DriverKind, LazyPackage, PackageRecord, RepositoryConfig};
use crate::sources::registration::RepositoryRegistry;
use crate::sources::registry::{strip_alias, AssetsRepository, BowerRegistry, NpmRegistry, RegistrySource, SearchResult};
use crate::util::context::SessionContext;

/// Manages the repositories of a session.
pub struct RepositoryManager {
    context: SessionContext,

    /// Registry repositories, one per ecosystem
    registries: Vec<AssetsRepository>,

    /// VCS repositories by canonical key
    repositories: RepositoryRegistry,
}

impl RepositoryManager {
    /// Create the manager and register the repositories declared in config.
    pub fn new(ctx: &SessionContext) -> Result<Self> {
        let registries = ctx
            .ecosystems()
            .iter()
            .map(|asset| AssetsRepository::new(registry_source(asset), ctx))
            .collect();

        let mut manager = RepositoryManager {
            context: ctx.clone(),
            registries,
            repositories: RepositoryRegistry::new(),
        };

        let declared = ctx.config().repositories.clone();
        if !declared.is_empty() {
            let created = manager.add_repositories(&declared)?;
            tracing::debug!("Registered {} configured repositories", created);
        }
        Ok(manager)
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn repositories(&self) -> &RepositoryRegistry {
        &self.repositories
    }

    /// Validate and register repository declarations. Returns how many
    /// repositories were created.
    pub fn add_repositories(&mut self, declarations: &[Value]) -> Result<usize> {
        let configs = declarations
            .iter()
            .enumerate()
            .map(|(index, declaration)| self.parse_declaration(index, declaration))
            .collect::<Result<Vec<_>, _>>()?;

        let mut created = 0;
        for (name, config) in configs {
            if self.repositories.add_repository(&name, config, &self.context)? {
                created += 1;
            }
        }
        Ok(created)
    }

    fn parse_declaration(
        &self,
        index: usize,
        declaration: &Value,
    ) -> Result<(String, RepositoryConfig), AssetError> {
        let invalid = |message: String| {
            AssetError::configuration(format!("repository {}: {}", index, message))
        };

        let object = declaration
            .as_object()
            .ok_or_else(|| invalid("expected a table".to_string()))?;

        let repo_type = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing `type`".to_string()))?;
        let (asset, driver) = repo_type.split_once('-').ok_or_else(|| {
            invalid(format!(
                "type `{}` must be of the form <asset>-<driver>",
                repo_type
            ))
        })?;
        if self.context.ecosystems().get(asset).is_none() {
            return Err(invalid(format!("unknown asset type `{}`", asset)));
        }
        if driver.parse::<DriverKind>().is_err() {
            return Err(invalid(format!("unknown repository driver `{}`", driver)));
        }

        let url = object
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| invalid("missing `url`".to_string()))?;

        let mut config = RepositoryConfig::new(repo_type, url);
        config.name = object.get("name").and_then(Value::as_str).map(str::to_string);
        config.no_api = object
            .get("no-api")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let name = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url)
            .to_string();
        Ok((name, config))
    }

    /// Composite repository type keys (`bower-vcs`, `npm-github`, ...).
    pub fn repository_types(&self) -> Vec<String> {
        self.context
            .ecosystems()
            .iter()
            .flat_map(|asset| {
                DriverKind::ALL
                    .iter()
                    .map(move |driver| format!("{}-{}", asset.name(), driver))
            })
            .collect()
    }

    /// Ask every registry for `name`.
    pub fn what_provides(&mut self, name: &str) -> Result<Vec<PackageRecord>> {
        let mut providers = Vec::new();
        for registry in &mut self.registries {
            providers.extend(registry.what_provides(name, &mut self.repositories)?);
        }
        Ok(providers)
    }

    /// Search every registry.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let mut results = Vec::new();
        for registry in &self.registries {
            results.extend(registry.search(query)?);
        }
        Ok(results)
    }

    /// The lazy packages of `name` across every repository that may hold it.
    ///
    /// Packages are matched under the name the registry resolved `name`
    /// to, which may differ in case. Repositories registered under another
    /// name are skipped with a warning when they fail to initialize.
    pub fn packages_for(&mut self, name: &str) -> Result<Vec<LazyPackage>> {
        self.what_provides(name)?;
        self.register_discovered()?;

        let wanted = self.resolved_name(name);
        let wanted = wanted.as_str();
        let Some(asset) = self.context.ecosystems().for_package(wanted).cloned() else {
            return Ok(Vec::new());
        };

        let mut packages = Vec::new();
        for entry in self.repositories.iter_mut() {
            if entry.repository.asset_type() != &asset {
                continue;
            }
            match entry.repository.find_packages(wanted) {
                Ok(found) => packages.extend(found),
                Err(err) if entry.name != wanted => {
                    tracing::warn!("Skipped repository {}: {:#}", entry.repository.url(), err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(packages)
    }

    fn resolved_name(&self, name: &str) -> String {
        self.registries
            .iter()
            .find_map(|registry| registry.resolved_name(name))
            .unwrap_or_else(|| strip_alias(name))
            .to_string()
    }

    /// Register the VCS repositories found in converted manifests.
    pub fn register_discovered(&mut self) -> Result<usize> {
        let mut created = 0;
        for config in self.context.take_discovered() {
            let name = match (config.type_parts(), &config.name) {
                (Ok((asset, _)), Some(name)) => match self.context.ecosystems().get(asset) {
                    Some(asset) => asset.format_package_name(name),
                    None => name.clone(),
                },
                _ => config.url.clone(),
            };
            if self.repositories.add_repository(&name, config, &self.context)? {
                created += 1;
            }
        }
        Ok(created)
    }
}

fn registry_source(asset: &AssetType) -> Box<dyn RegistrySource> {
    match asset.kind() {
        AssetKind::Bower => Box::new(BowerRegistry::new()),
        AssetKind::Npm => Box::new(NpmRegistry::new()),
    }
}
