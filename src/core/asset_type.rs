//! Supported asset ecosystems.
//!
//! An [`AssetType`] describes one foreign ecosystem: which manifest file it
//! reads, which vendor namespace its packages live under and which
//! converters turn its data into host records. The set of known types is an
//! explicit [`EcosystemRegistry`] value built once per session.

use std::fmt;

use crate::converter::{BowerConverter, ManifestConverter, NpmConverter, SemverConverter};

/// Ecosystem discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Bower,
    Npm,
}

/// Immutable descriptor for one asset ecosystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetType {
    kind: AssetKind,
    name: &'static str,
    filename: &'static str,
    package_type: &'static str,
    vendor: &'static str,
}

impl AssetType {
    /// The Bower ecosystem (`bower.json`).
    pub const BOWER: AssetType = AssetType {
        kind: AssetKind::Bower,
        name: "bower",
        filename: "bower.json",
        package_type: "bower-asset-library",
        vendor: "bower-asset",
    };

    /// The npm ecosystem (`package.json`).
    pub const NPM: AssetType = AssetType {
        kind: AssetKind::Npm,
        name: "npm",
        filename: "package.json",
        package_type: "npm-asset-library",
        vendor: "npm-asset",
    };

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Ecosystem name, also the prefix of repository type keys.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Manifest filename read from each ref.
    pub fn filename(&self) -> &'static str {
        self.filename
    }

    /// Host package type written into converted records.
    pub fn package_type(&self) -> &'static str {
        self.package_type
    }

    /// Host vendor namespace (`bower-asset`, `npm-asset`).
    pub fn vendor(&self) -> &'static str {
        self.vendor
    }

    /// Vendor namespace followed by `/`.
    pub fn vendor_prefix(&self) -> String {
        format!("{}/", self.vendor)
    }

    /// Format an ecosystem package name as a host package name.
    ///
    /// npm scopes cannot contain `/` on the host side, so `@scope/name`
    /// becomes `npm-asset/scope--name`.
    pub fn format_package_name(&self, name: &str) -> String {
        match self.kind {
            AssetKind::Npm => match name.strip_prefix('@').and_then(|n| n.split_once('/')) {
                Some((scope, package)) => format!("{}/{}--{}", self.vendor, scope, package),
                None => format!("{}/{}", self.vendor, name),
            },
            AssetKind::Bower => format!("{}/{}", self.vendor, name),
        }
    }

    /// Reverse of the scope mangling done by [`format_package_name`] for a
    /// name that already had its vendor prefix stripped.
    ///
    /// [`format_package_name`]: AssetType::format_package_name
    pub fn registry_package_name(&self, name: &str) -> String {
        match self.kind {
            AssetKind::Npm => match name.split_once("--") {
                Some((scope, package)) if !scope.is_empty() => format!("@{}/{}", scope, package),
                _ => name.to_string(),
            },
            AssetKind::Bower => name.to_string(),
        }
    }

    /// Converter from this ecosystem's manifest to a host record map.
    pub fn manifest_converter(&self) -> &'static dyn ManifestConverter {
        match self.kind {
            AssetKind::Bower => &BowerConverter,
            AssetKind::Npm => &NpmConverter,
        }
    }

    /// Converter for version labels and ranges.
    pub fn version_converter(&self) -> &'static SemverConverter {
        &SemverConverter
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The asset types known to a session.
#[derive(Debug, Clone)]
pub struct EcosystemRegistry {
    types: Vec<AssetType>,
}

impl EcosystemRegistry {
    /// Registry with Bower and npm.
    pub fn builtin() -> Self {
        EcosystemRegistry {
            types: vec![AssetType::BOWER, AssetType::NPM],
        }
    }

    /// Look up an asset type by ecosystem name.
    pub fn get(&self, name: &str) -> Option<&AssetType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Find the asset type owning a host package name by its vendor prefix.
    pub fn for_package(&self, package: &str) -> Option<&AssetType> {
        self.types
            .iter()
            .find(|t| package.starts_with(&t.vendor_prefix()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetType> {
        self.types.iter()
    }
}

impl Default for EcosystemRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_package_name() {
        assert_eq!(
            AssetType::BOWER.format_package_name("jquery"),
            "bower-asset/jquery"
        );
        assert_eq!(AssetType::NPM.format_package_name("react"), "npm-asset/react");
        assert_eq!(
            AssetType::NPM.format_package_name("@angular/core"),
            "npm-asset/angular--core"
        );
    }

    #[test]
    fn test_registry_package_name_restores_scope() {
        assert_eq!(
            AssetType::NPM.registry_package_name("angular--core"),
            "@angular/core"
        );
        assert_eq!(AssetType::NPM.registry_package_name("react"), "react");
        // bower names are passed through untouched
        assert_eq!(
            AssetType::BOWER.registry_package_name("foo--bar"),
            "foo--bar"
        );
    }

    #[test]
    fn test_registry_lookup() {
        let registry = EcosystemRegistry::builtin();
        assert_eq!(registry.get("npm"), Some(&AssetType::NPM));
        assert!(registry.get("pip").is_none());
        assert_eq!(
            registry.for_package("bower-asset/jquery"),
            Some(&AssetType::BOWER)
        );
        assert!(registry.for_package("acme/jquery").is_none());
    }
}
