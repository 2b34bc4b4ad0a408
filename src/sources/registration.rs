//! Repository registration.
//!
//! Registry lookups and VCS dependencies found in manifests both register
//! repositories. Registrations are keyed by a canonical form of the URL so
//! that `http://x.com/a` and `HTTP://X.COM/a/` end up as one repository.

use std::sync::LazyLock;

use anyhow::Result;
use indexmap::IndexMap;
use regex::Regex;

use crate::core::RepositoryConfig;
use crate::sources::vcs_repository::VcsRepository;
use crate::util::context::SessionContext;

static SCP_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[^@/:]+@)?([^/:]+):(.+)$").expect("scp url pattern"));

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9+.-]*://").expect("url scheme pattern"));

/// Canonical key of a repository: `<asset-type>:<normalized url>`.
pub fn canonical_key(asset_type: &str, url: &str) -> String {
    let url = url.trim().to_ascii_lowercase();

    let location = if let Some(rest) = SCHEME.find(&url).map(|m| &url[m.end()..]) {
        // drop the user part of the authority
        match rest.split_once('/') {
            Some((authority, path)) => {
                let host = authority.rsplit('@').next().unwrap_or(authority);
                format!("{}/{}", host, path)
            }
            None => rest.rsplit('@').next().unwrap_or(rest).to_string(),
        }
    } else if let Some(caps) = SCP_LIKE.captures(&url) {
        format!("{}/{}", &caps[1], caps[2].trim_start_matches('/'))
    } else {
        url.clone()
    };

    let location = location.trim_end_matches('/');
    let location = location.strip_suffix(".git").unwrap_or(location);
    format!("{}:{}", asset_type, location.trim_end_matches('/'))
}

/// A registered repository and the name it was registered under.
pub struct RegisteredRepository {
    pub name: String,
    pub repository: VcsRepository,
}

/// Repositories of a session, at most one per canonical key.
#[derive(Default)]
pub struct RepositoryRegistry {
    repositories: IndexMap<String, RegisteredRepository>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository unless its key is taken. Returns whether a
    /// repository was created.
    pub fn add_repository(
        &mut self,
        name: &str,
        config: RepositoryConfig,
        ctx: &SessionContext,
    ) -> Result<bool> {
        let (asset, _) = config.type_parts()?;
        let key = canonical_key(asset, &config.url);
        if self.repositories.contains_key(&key) {
            tracing::debug!("Repository {} already registered", key);
            return Ok(false);
        }

        let repository = VcsRepository::new(config, ctx)?;
        tracing::debug!("Registered repository {} as {}", key, name);
        self.repositories.insert(
            key,
            RegisteredRepository {
                name: name.to_string(),
                repository,
            },
        );
        Ok(true)
    }

    pub fn contains(&self, asset_type: &str, url: &str) -> bool {
        self.repositories
            .contains_key(&canonical_key(asset_type, url))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RegisteredRepository> {
        self.repositories.get_mut(key)
    }

    /// Canonical keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredRepository> {
        self.repositories.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RegisteredRepository> {
        self.repositories.values_mut()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}
