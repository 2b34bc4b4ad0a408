//! asset-bridge - Bower and npm packages as host packages
//!
//! This crate provides the library behind the `asset-bridge` tool:
//! manifest conversion, version normalization, registry lookups and
//! VCS repositories that expose asset versions lazily.

pub mod converter;
pub mod core;
pub mod sources;
pub mod util;
pub mod version;

/// Test utilities and mocks for asset-bridge unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations for HTTP, user
/// interaction and VCS drivers.
#[cfg(test)]
pub mod test_support;

pub use core::{AssetError, AssetType, LazyPackage, PackageRecord, RepositoryConfig};
pub use sources::RepositoryManager;
pub use util::context::SessionContext;
