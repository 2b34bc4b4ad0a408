//! VCS drivers.
//!
//! A driver lists the tags and branches of one repository and reads the
//! asset manifest at any of their commits. Drivers are chosen through a
//! [`DriverRegistry`] of (matcher, factory) entries tried in priority order.

pub mod git;
pub mod github;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::core::{AssetError, AssetType, DistReference, DriverKind, SourceReference};
use crate::util::context::SessionContext;

pub use git::GitDriver;
pub use github::GitHubDriver;

/// Manifest lookup result at one ref.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestInfo {
    Found(Map<String, Value>),
    /// The ref exists but has no manifest file
    Missing,
}

impl ManifestInfo {
    pub fn is_found(&self) -> bool {
        matches!(self, ManifestInfo::Found(_))
    }

    pub fn into_manifest(self) -> Option<Map<String, Value>> {
        match self {
            ManifestInfo::Found(manifest) => Some(manifest),
            ManifestInfo::Missing => None,
        }
    }
}

/// Access to one VCS repository.
///
/// Tag and branch maps go from ref name to commit identifier, in the
/// driver's enumeration order.
pub trait VcsDriver {
    /// Connect, fetch top level metadata, mirror if needed.
    fn initialize(&mut self) -> Result<()>;

    /// Name of the default branch.
    fn root_identifier(&mut self) -> Result<String>;

    fn tags(&mut self) -> Result<IndexMap<String, String>>;

    fn branches(&mut self) -> Result<IndexMap<String, String>>;

    /// Manifest at `identifier`. A missing file is not an error.
    fn manifest_info(&mut self, identifier: &str) -> Result<ManifestInfo>;

    fn has_manifest(&mut self, identifier: &str) -> Result<bool> {
        Ok(self.manifest_info(identifier)?.is_found())
    }

    /// Archive download of `identifier`, if the host offers one.
    fn dist(&mut self, identifier: &str) -> Result<Option<DistReference>>;

    fn source(&mut self, identifier: &str) -> Result<SourceReference>;

    /// URL of the repository.
    fn url(&self) -> &str;

    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A driver shared between a repository and its lazy loaders.
pub type SharedDriver = Rc<RefCell<Box<dyn VcsDriver>>>;

/// What a driver is created for.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub url: String,
    pub asset_type: AssetType,
    /// Do not use the hosting API
    pub no_api: bool,
}

type Matcher = Box<dyn Fn(&str, &SessionContext) -> bool>;
type Factory = Box<dyn Fn(DriverSettings, &SessionContext) -> Result<Box<dyn VcsDriver>>>;

/// One driver implementation.
pub struct DriverEntry {
    kind: DriverKind,
    supports: Matcher,
    create: Factory,
}

impl DriverEntry {
    pub fn new(
        kind: DriverKind,
        supports: impl Fn(&str, &SessionContext) -> bool + 'static,
        create: impl Fn(DriverSettings, &SessionContext) -> Result<Box<dyn VcsDriver>> + 'static,
    ) -> Self {
        DriverEntry {
            kind,
            supports: Box::new(supports),
            create: Box::new(create),
        }
    }
}

/// Driver entries in priority order.
pub struct DriverRegistry {
    entries: Vec<DriverEntry>,
}

impl DriverRegistry {
    pub fn new(entries: Vec<DriverEntry>) -> Self {
        DriverRegistry { entries }
    }

    /// GitHub first, then plain git.
    pub fn builtin() -> Self {
        Self::new(vec![
            DriverEntry::new(DriverKind::GitHub, GitHubDriver::supports, |settings, ctx| {
                Ok(Box::new(GitHubDriver::new(settings, ctx)?))
            }),
            DriverEntry::new(DriverKind::Git, GitDriver::supports, |settings, ctx| {
                Ok(Box::new(GitDriver::new(settings, ctx)))
            }),
        ])
    }

    /// Create a driver for `settings.url`.
    ///
    /// `DriverKind::Vcs` takes the first entry supporting the URL, any other
    /// kind only considers entries of that kind.
    pub fn create(
        &self,
        kind: DriverKind,
        settings: DriverSettings,
        ctx: &SessionContext,
    ) -> Result<Box<dyn VcsDriver>> {
        let entry = self.entries.iter().find(|entry| {
            (kind == DriverKind::Vcs || entry.kind == kind) && (entry.supports)(&settings.url, ctx)
        });

        match entry {
            Some(entry) => (entry.create)(settings, ctx),
            None => Err(AssetError::DriverUnavailable { url: settings.url }.into()),
        }
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
