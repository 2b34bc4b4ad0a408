//! Package sources.
//!
//! Sources turn asset repositories into host packages:
//! registries resolve names to VCS repositories, VCS repositories
//! enumerate versions through drivers.

pub mod cache;
pub mod manager;
pub mod registration;
pub mod registry;
pub mod vcs;
pub mod vcs_repository;

pub use cache::{CacheStore, FsCacheStore, MemoryCacheStore, MetadataCache};
pub use manager::RepositoryManager;
pub use registration::RepositoryRegistry;
pub use registry::{AssetsRepository, SearchResult};
pub use vcs::{DriverRegistry, VcsDriver};
pub use vcs_repository::VcsRepository;
