//! Session context.
//!
//! Provides centralized access to configuration, paths and the capabilities
//! (transport, cache store, IO) that the repositories and drivers of one
//! resolution session share.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::core::{EcosystemRegistry, RepositoryConfig};
use crate::sources::cache::{CacheStore, FsCacheStore, MetadataCache};
use crate::sources::vcs::DriverRegistry;
use crate::util::config::Config;
use crate::util::http::{ReqwestTransport, Transport};
use crate::util::io::{Io, NullIo};

/// State shared by every component of a session.
///
/// Cloning is cheap; clones share the same capabilities and the same queue
/// of discovered repositories.
#[derive(Clone)]
pub struct SessionContext {
    config: Rc<Config>,
    cache_dir: PathBuf,
    transport: Rc<dyn Transport>,
    cache_store: Rc<dyn CacheStore>,
    io: Rc<dyn Io>,
    ecosystems: Rc<EcosystemRegistry>,
    drivers: Rc<DriverRegistry>,
    discovered: Rc<RefCell<Vec<RepositoryConfig>>>,
}

impl SessionContext {
    /// Create a production context: HTTP through reqwest, cache on disk.
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => default_cache_dir()?,
        };
        let transport = Rc::new(ReqwestTransport::new(config.net.timeout())?);
        let cache_store = Rc::new(FsCacheStore::new(cache_dir.join("metadata")));

        Ok(Self::with_parts(
            config,
            cache_dir,
            transport,
            cache_store,
            Rc::new(NullIo::new()),
        ))
    }

    /// Create a context from explicit capabilities.
    pub fn with_parts(
        config: Config,
        cache_dir: PathBuf,
        transport: Rc<dyn Transport>,
        cache_store: Rc<dyn CacheStore>,
        io: Rc<dyn Io>,
    ) -> Self {
        SessionContext {
            config: Rc::new(config),
            cache_dir,
            transport,
            cache_store,
            io,
            ecosystems: Rc::new(EcosystemRegistry::builtin()),
            drivers: Rc::new(DriverRegistry::builtin()),
            discovered: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Replace the IO capability.
    pub fn with_io(mut self, io: Rc<dyn Io>) -> Self {
        self.io = io;
        self
    }

    /// Replace the VCS driver registry.
    pub fn with_drivers(mut self, drivers: DriverRegistry) -> Self {
        self.drivers = Rc::new(drivers);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Root cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory holding git mirrors.
    pub fn git_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("vcs")
    }

    pub fn transport(&self) -> Rc<dyn Transport> {
        Rc::clone(&self.transport)
    }

    pub fn cache_store(&self) -> Rc<dyn CacheStore> {
        Rc::clone(&self.cache_store)
    }

    /// Manifest cache over the session store.
    pub fn metadata_cache(&self) -> MetadataCache {
        MetadataCache::new(self.cache_store())
    }

    pub fn io(&self) -> Rc<dyn Io> {
        Rc::clone(&self.io)
    }

    pub fn ecosystems(&self) -> &EcosystemRegistry {
        &self.ecosystems
    }

    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    /// Queue repositories found in converted manifests.
    pub fn push_discovered(&self, repositories: impl IntoIterator<Item = RepositoryConfig>) {
        self.discovered.borrow_mut().extend(repositories);
    }

    /// Drain the queue of discovered repositories.
    pub fn take_discovered(&self) -> Vec<RepositoryConfig> {
        std::mem::take(&mut *self.discovered.borrow_mut())
    }
}

/// Platform cache directory (`~/.cache/asset-bridge` on Linux).
pub fn default_cache_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "asset-bridge")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .context("could not determine a cache directory, set `cache-dir` in the config")
}
