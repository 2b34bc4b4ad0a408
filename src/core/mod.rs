//! Core data structures.
//!
//! - Asset types and the ecosystem registry
//! - Host package records, lazy and complete
//! - Repository declarations
//! - Error types

pub mod asset_type;
pub mod error;
pub mod lazy;
pub mod package;
pub mod repository_config;

pub use asset_type::{AssetKind, AssetType, EcosystemRegistry};
pub use error::AssetError;
pub use lazy::{DeferredRecord, LazyPackage, ManifestLoader, SharedRecord};
pub use package::{Author, DistReference, PackageRecord, SourceReference};
pub use repository_config::{DriverKind, RepositoryConfig};
