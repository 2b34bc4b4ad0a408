//! `asset-bridge convert` command

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use asset_bridge::converter::ManifestConverter;
use asset_bridge::core::EcosystemRegistry;

use crate::cli::ConvertArgs;

pub fn execute(args: ConvertArgs) -> Result<()> {
    let asset_name = match args.asset_type {
        Some(asset) => asset.name(),
        None => guess_asset_type(&args.file)?,
    };
    let ecosystems = EcosystemRegistry::builtin();
    let Some(asset) = ecosystems.get(asset_name) else {
        bail!("unknown asset type `{}`", asset_name);
    };

    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let manifest: Map<String, Value> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    let mut repositories = Vec::new();
    let package = asset
        .manifest_converter()
        .convert(asset, &manifest, &mut repositories)
        .with_context(|| format!("failed to convert {}", args.file.display()))?;

    println!("{}", serde_json::to_string_pretty(&Value::Object(package))?);

    for repository in &repositories {
        eprintln!("Discovered repository {} {}", repository.repo_type, repository.url);
    }
    Ok(())
}

fn guess_asset_type(path: &Path) -> Result<&'static str> {
    match path.file_name().and_then(|name| name.to_str()) {
        Some("bower.json" | ".bower.json") => Ok("bower"),
        Some("package.json") => Ok("npm"),
        _ => bail!(
            "cannot tell the asset type of {}\n\
             hint: pass --type bower or --type npm",
            path.display()
        ),
    }
}
