//! Metadata cache.
//!
//! Manifests fetched at a commit never change, so they are kept in a
//! key-value [`CacheStore`] under `<asset-type>-<commit>`. Mutable refs such
//! as branch names are never cached.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::{Map, Value};

static SHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-f0-9]{40}$").expect("sha pattern"));

/// True for a full 40 character commit hash.
pub fn is_sha(identifier: &str) -> bool {
    SHA.is_match(identifier)
}

/// Opaque key-value storage.
pub trait CacheStore {
    fn read(&self, key: &str) -> Option<Vec<u8>>;
    fn write(&self, key: &str, data: &[u8]) -> Result<()>;
}

/// One file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsCacheStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .to_ascii_lowercase()
            .chars()
            .map(|c| match c {
                'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
                _ => '-',
            })
            .collect();
        self.root.join(file)
    }
}

impl CacheStore for FsCacheStore {
    fn read(&self, key: &str) -> Option<Vec<u8>> {
        std::fs::read(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.root).with_context(|| {
            format!("failed to create cache directory: {}", self.root.display())
        })?;
        let path = self.path_for(key);
        std::fs::write(&path, data)
            .with_context(|| format!("failed to write cache entry: {}", path.display()))
    }
}

/// In-memory store, lives as long as the session.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    fn read(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.borrow().get(key).cloned()
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

/// Manifest cache keyed by asset type and commit.
#[derive(Clone)]
pub struct MetadataCache {
    store: Rc<dyn CacheStore>,
}

impl MetadataCache {
    pub fn new(store: Rc<dyn CacheStore>) -> Self {
        MetadataCache { store }
    }

    /// Cached manifest of `identifier`, only for commit hashes.
    pub fn read(&self, asset_type: &str, identifier: &str) -> Option<Map<String, Value>> {
        if !is_sha(identifier) {
            return None;
        }
        let key = cache_key(asset_type, identifier);
        let data = self.store.read(&key)?;
        match serde_json::from_slice(&data) {
            Ok(Value::Object(manifest)) => {
                tracing::debug!("Using cached manifest {}", key);
                Some(manifest)
            }
            _ => {
                tracing::debug!("Ignoring corrupt cache entry {}", key);
                None
            }
        }
    }

    /// Store the manifest of `identifier`. A no-op for anything but commit hashes.
    pub fn write(
        &self,
        asset_type: &str,
        identifier: &str,
        manifest: &Map<String, Value>,
    ) -> Result<()> {
        if !is_sha(identifier) {
            return Ok(());
        }
        let data = serde_json::to_vec(manifest)?;
        self.store.write(&cache_key(asset_type, identifier), &data)
    }
}

fn cache_key(asset_type: &str, identifier: &str) -> String {
    format!("{}-{}", asset_type, identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn manifest() -> Map<String, Value> {
        match json!({"name": "foo", "version": "1.0.0"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_is_sha() {
        assert!(is_sha(SHA));
        assert!(is_sha(&SHA.to_uppercase()));
        assert!(!is_sha("master"));
        assert!(!is_sha(&SHA[..39]));
        assert!(!is_sha(&format!("refs/{}", SHA)));
    }

    #[test]
    fn test_cache_only_stores_commit_hashes() {
        let store = Rc::new(MemoryCacheStore::new());
        let cache = MetadataCache::new(store.clone());

        cache.write("npm", SHA, &manifest()).unwrap();
        assert_eq!(cache.read("npm", SHA), Some(manifest()));

        cache.write("npm", "master", &manifest()).unwrap();
        assert_eq!(cache.read("npm", "master"), None);
        assert_eq!(store.len(), 1);

        // entries are per asset type
        assert_eq!(cache.read("bower", SHA), None);
    }

    #[test]
    fn test_fs_store() {
        let tmp = TempDir::new().unwrap();
        let store = FsCacheStore::new(tmp.path().join("metadata"));
        store.write("Foo/Bar-package.json", b"{}").unwrap();

        assert_eq!(store.read("Foo/Bar-package.json"), Some(b"{}".to_vec()));
        assert!(tmp.path().join("metadata").join("foo-bar-package.json").exists());
        assert_eq!(store.read("missing"), None);
    }
}
