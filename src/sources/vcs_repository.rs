//! VCS repository - the versions of one asset repository.
//!
//! Initialization enumerates tags and branches through a driver and turns
//! each usable ref into lazy packages. Manifests are only read when a
//! package is loaded.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Result};
use serde_json::{Map, Value};

use crate::core::lazy::DeferredRecord;
use crate::core::{
    AssetError, AssetType, DriverKind, LazyPackage, ManifestLoader, PackageRecord,
    RepositoryConfig, SharedRecord,
};
use crate::sources::vcs::{DriverSettings, SharedDriver};
use crate::util::context::SessionContext;
use crate::version::{branch_version, validate_tag};

enum RepositoryState {
    Uninitialized,
    Populated(Vec<LazyPackage>),
    /// Message of the error the first initialization failed with
    Failed(String),
}

/// A repository of asset versions read from a VCS.
pub struct VcsRepository {
    config: RepositoryConfig,
    asset_type: AssetType,
    driver_kind: DriverKind,
    context: SessionContext,
    state: RepositoryState,
}

impl VcsRepository {
    /// Create an uninitialized repository. Fails on malformed types.
    pub fn new(config: RepositoryConfig, ctx: &SessionContext) -> Result<Self> {
        let (asset, driver_kind) = config.type_parts()?;
        let asset_type = ctx
            .ecosystems()
            .get(asset)
            .cloned()
            .ok_or_else(|| AssetError::configuration(format!("unknown asset type `{}`", asset)))?;

        Ok(VcsRepository {
            config,
            asset_type,
            driver_kind,
            context: ctx.clone(),
            state: RepositoryState::Uninitialized,
        })
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn asset_type(&self) -> &AssetType {
        &self.asset_type
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self.state, RepositoryState::Uninitialized)
    }

    /// Enumerate the repository. Runs once, a failure is remembered.
    pub fn initialize(&mut self) -> Result<()> {
        match &self.state {
            RepositoryState::Populated(_) => return Ok(()),
            RepositoryState::Failed(message) => bail!("{}", message),
            RepositoryState::Uninitialized => {}
        }

        match self.populate() {
            Ok(packages) => {
                self.state = RepositoryState::Populated(packages);
                Ok(())
            }
            Err(err) => {
                self.state = RepositoryState::Failed(format!("{:#}", err));
                Err(err)
            }
        }
    }

    /// All lazy packages, initializing first if needed.
    pub fn packages(&mut self) -> Result<Vec<LazyPackage>> {
        self.initialize()?;
        match &self.state {
            RepositoryState::Populated(packages) => Ok(packages.clone()),
            _ => Ok(Vec::new()),
        }
    }

    /// Lazy packages named `name`.
    pub fn find_packages(&mut self, name: &str) -> Result<Vec<LazyPackage>> {
        Ok(self
            .packages()?
            .into_iter()
            .filter(|package| package.name() == name)
            .collect())
    }

    fn populate(&self) -> Result<Vec<LazyPackage>> {
        let settings = DriverSettings {
            url: self.config.url.clone(),
            asset_type: self.asset_type.clone(),
            no_api: self.config.no_api,
        };
        let mut driver = self
            .context
            .drivers()
            .create(self.driver_kind, settings, &self.context)?;
        driver.initialize()?;
        let driver: SharedDriver = Rc::new(RefCell::new(driver));

        let name = self.package_name(&driver);
        let package_type = self.asset_type.package_type();
        let mut packages = Vec::new();

        let tags = driver.borrow_mut().tags()?;
        for (tag, identifier) in tags {
            let Some(version) = validate_tag(&tag, &self.asset_type) else {
                tracing::warn!("Skipped tag {}, invalid tag name", tag);
                continue;
            };

            let stub = PackageRecord::stub(&name, &version.pretty, &version.normalized, package_type);
            let alias = PackageRecord::stub(
                &name,
                &version.normalized,
                &version.normalized,
                package_type,
            );
            let record = self.deferred(&stub, &driver, identifier);
            packages.push(LazyPackage::new(stub, Rc::clone(&record)));
            packages.push(LazyPackage::alias(alias, record));
        }

        let branches = driver.borrow_mut().branches()?;
        for (branch, identifier) in branches {
            let version = branch_version(&branch);
            let stub = PackageRecord::stub(&name, &version.pretty, &version.normalized, package_type);
            let record = self.deferred(&stub, &driver, identifier);
            packages.push(LazyPackage::new(stub, record));
        }

        driver.borrow_mut().cleanup()?;

        if packages.is_empty() {
            return Err(AssetError::NoValidManifest {
                filename: self.asset_type.filename().to_string(),
                url: self.config.url.clone(),
            }
            .into());
        }

        tracing::debug!("Found {} versions of {} in {}", packages.len(), name, self.config.url);
        Ok(packages)
    }

    fn deferred(&self, stub: &PackageRecord, driver: &SharedDriver, identifier: String) -> SharedRecord {
        let loader = Rc::new(VcsManifestLoader {
            driver: Rc::clone(driver),
            identifier,
            asset_type: self.asset_type.clone(),
            context: self.context.clone(),
        });
        Rc::new(RefCell::new(DeferredRecord::pending(stub.clone(), loader)))
    }

    /// Host package name: config, then root manifest, then the URL.
    fn package_name(&self, driver: &SharedDriver) -> String {
        let name = match &self.config.name {
            Some(name) => name.clone(),
            None => match root_manifest_name(driver) {
                Ok(Some(name)) => name,
                Ok(None) => url_package_name(&self.config.url),
                Err(err) => {
                    tracing::warn!("Could not read the root manifest of {}: {:#}", self.config.url, err);
                    url_package_name(&self.config.url)
                }
            },
        };
        self.asset_type.format_package_name(&name)
    }
}

fn root_manifest_name(driver: &SharedDriver) -> Result<Option<String>> {
    let mut driver = driver.borrow_mut();
    let root = driver.root_identifier()?;
    let manifest = driver.manifest_info(&root)?.into_manifest();
    Ok(manifest
        .as_ref()
        .and_then(|manifest| manifest.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Last path segment of a repository URL, without `.git`.
fn url_package_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let segment = trimmed
        .rsplit(|c: char| c == '/' || c == ':')
        .next()
        .unwrap_or(trimmed);
    segment.strip_suffix(".git").unwrap_or(segment).to_string()
}

/// Loads the manifest of one ref and converts it.
struct VcsManifestLoader {
    driver: SharedDriver,
    identifier: String,
    asset_type: AssetType,
    context: SessionContext,
}

impl ManifestLoader for VcsManifestLoader {
    fn load(&self, stub: &PackageRecord) -> Result<Option<PackageRecord>> {
        let mut driver = self.driver.borrow_mut();
        let Some(mut manifest) = driver.manifest_info(&self.identifier)?.into_manifest() else {
            tracing::debug!(
                "Skipped {} {}, no {} found",
                stub.name,
                stub.version,
                self.asset_type.filename()
            );
            return Ok(None);
        };

        let bare_name = stub
            .name
            .strip_prefix(&self.asset_type.vendor_prefix())
            .unwrap_or(&stub.name)
            .to_string();
        manifest
            .entry("name")
            .or_insert_with(|| Value::from(bare_name));
        manifest.insert("version".into(), stub.version.clone().into());

        let mut vcs_repos = Vec::new();
        let mut converted = self
            .asset_type
            .manifest_converter()
            .convert(&self.asset_type, &manifest, &mut vcs_repos)?;
        merge_stub(&mut converted, stub);

        let mut record = PackageRecord::from_map(converted)?;
        record.source = Some(driver.source(&self.identifier)?);
        record.dist = driver.dist(&self.identifier)?;

        self.context.push_discovered(vcs_repos);
        Ok(Some(record))
    }
}

fn merge_stub(converted: &mut Map<String, Value>, stub: &PackageRecord) {
    converted.insert("name".into(), stub.name.clone().into());
    converted.insert("version".into(), stub.version.clone().into());
    converted.insert(
        "version_normalized".into(),
        stub.version_normalized.clone().into(),
    );
    converted.insert("type".into(), stub.package_type.clone().into());
}
