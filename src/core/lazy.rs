//! Lazily loaded package records.
//!
//! Discovering a repository yields one stub per ref. The full manifest for
//! a ref is only fetched and converted when [`LazyPackage::load`] is first
//! called; the result is memoized in a [`DeferredRecord`] that the
//! canonical record of a tag and its alias share.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::core::package::PackageRecord;

/// Produces the complete record for a stub.
///
/// `Ok(None)` means the ref carries no manifest and the version should be
/// skipped.
pub trait ManifestLoader {
    fn load(&self, stub: &PackageRecord) -> Result<Option<PackageRecord>>;
}

/// A pending load: the canonical stub plus the loader that completes it.
#[derive(Clone)]
pub struct PendingLoad {
    stub: PackageRecord,
    loader: Rc<dyn ManifestLoader>,
}

/// `Pending` until the first successful load, then `Resolved` forever.
#[derive(Clone)]
pub enum DeferredRecord {
    Pending(PendingLoad),
    Resolved(Option<PackageRecord>),
}

impl DeferredRecord {
    pub fn pending(stub: PackageRecord, loader: Rc<dyn ManifestLoader>) -> Self {
        DeferredRecord::Pending(PendingLoad { stub, loader })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, DeferredRecord::Resolved(_))
    }
}

/// Shared handle to a deferred record.
pub type SharedRecord = Rc<RefCell<DeferredRecord>>;

/// Run the pending load once. Errors leave the record pending.
pub fn resolve(record: &SharedRecord) -> Result<Option<PackageRecord>> {
    let pending = match &*record.borrow() {
        DeferredRecord::Resolved(resolved) => return Ok(resolved.clone()),
        DeferredRecord::Pending(pending) => pending.clone(),
    };

    let loaded = pending.loader.load(&pending.stub)?;
    *record.borrow_mut() = DeferredRecord::Resolved(loaded.clone());
    Ok(loaded)
}

/// A package version whose full metadata is loaded on demand.
#[derive(Clone)]
pub struct LazyPackage {
    stub: PackageRecord,
    alias: bool,
    record: SharedRecord,
}

impl LazyPackage {
    /// The canonical package of a ref.
    pub fn new(stub: PackageRecord, record: SharedRecord) -> Self {
        LazyPackage {
            stub,
            alias: false,
            record,
        }
    }

    /// An alias sharing the loader of a canonical package.
    pub fn alias(stub: PackageRecord, record: SharedRecord) -> Self {
        LazyPackage {
            stub,
            alias: true,
            record,
        }
    }

    /// Descriptor known without loading.
    pub fn stub(&self) -> &PackageRecord {
        &self.stub
    }

    pub fn name(&self) -> &str {
        &self.stub.name
    }

    pub fn version(&self) -> &str {
        &self.stub.version
    }

    pub fn is_alias(&self) -> bool {
        self.alias
    }

    pub fn is_loaded(&self) -> bool {
        self.record.borrow().is_resolved()
    }

    /// Load the complete record.
    ///
    /// Aliases report their own pretty version on top of the shared record.
    pub fn load(&self) -> Result<Option<PackageRecord>> {
        let loaded = resolve(&self.record)?;
        Ok(loaded.map(|mut record| {
            if self.alias {
                record.version = self.stub.version.clone();
            }
            record
        }))
    }
}

impl std::fmt::Debug for LazyPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyPackage")
            .field("name", &self.stub.name)
            .field("version", &self.stub.version)
            .field("alias", &self.alias)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use anyhow::bail;

    struct CountingLoader {
        calls: Cell<usize>,
        fail_first: Cell<bool>,
    }

    impl ManifestLoader for CountingLoader {
        fn load(&self, stub: &PackageRecord) -> Result<Option<PackageRecord>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_first.replace(false) {
                bail!("transport failure");
            }
            let mut record = stub.clone();
            record.description = Some("loaded".into());
            Ok(Some(record))
        }
    }

    fn stub(version: &str) -> PackageRecord {
        PackageRecord::stub("bower-asset/foo", version, "1.0.0.0", "bower-asset-library")
    }

    #[test]
    fn test_load_is_memoized_across_alias() {
        let loader = Rc::new(CountingLoader {
            calls: Cell::new(0),
            fail_first: Cell::new(false),
        });
        let record = Rc::new(RefCell::new(DeferredRecord::pending(
            stub("v1.0.0"),
            loader.clone(),
        )));
        let canonical = LazyPackage::new(stub("v1.0.0"), record.clone());
        let alias = LazyPackage::alias(stub("1.0.0.0"), record);

        assert!(!canonical.is_loaded());
        let full = canonical.load().unwrap().unwrap();
        assert_eq!(full.description.as_deref(), Some("loaded"));
        assert_eq!(full.version, "v1.0.0");

        // the alias shares the resolved record and keeps its own version
        assert!(alias.is_loaded());
        let aliased = alias.load().unwrap().unwrap();
        assert_eq!(aliased.version, "1.0.0.0");
        assert_eq!(loader.calls.get(), 1);
    }

    #[test]
    fn test_failed_load_stays_pending() {
        let loader = Rc::new(CountingLoader {
            calls: Cell::new(0),
            fail_first: Cell::new(true),
        });
        let record = Rc::new(RefCell::new(DeferredRecord::pending(stub("v1.0.0"), loader.clone())));
        let package = LazyPackage::new(stub("v1.0.0"), record);

        assert!(package.load().is_err());
        assert!(!package.is_loaded());
        assert!(package.load().unwrap().is_some());
        assert_eq!(loader.calls.get(), 2);
    }
}
