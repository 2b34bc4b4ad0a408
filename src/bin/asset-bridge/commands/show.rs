//! `asset-bridge show` command

use anyhow::{bail, Result};
use serde_json::Value;

use asset_bridge::sources::RepositoryManager;

use crate::cli::{GlobalOptions, ShowArgs};

pub fn execute(args: ShowArgs, global: &GlobalOptions) -> Result<()> {
    let ctx = super::create_session(global)?;
    let mut manager = RepositoryManager::new(&ctx)?;

    let pb = super::spinner(global, format!("Resolving {}", args.package));
    let packages = manager.packages_for(&args.package);
    pb.finish_and_clear();
    let packages = packages?;

    if packages.is_empty() {
        bail!("package `{}` was not found in any repository", args.package);
    }

    if !args.full {
        println!("{}", args.package);
        for package in &packages {
            let alias = if package.is_alias() { " (alias)" } else { "" };
            println!("  {}{}", package.version(), alias);
        }
        return Ok(());
    }

    let pb = super::spinner(global, format!("Loading {} versions", packages.len()));
    let mut records = Vec::new();
    for package in packages.iter().filter(|p| !p.is_alias()) {
        match package.load() {
            Ok(Some(record)) => records.push(Value::Object(record.to_map())),
            Ok(None) => {
                tracing::debug!("No manifest for {} {}", package.name(), package.version());
            }
            Err(err) => {
                pb.finish_and_clear();
                return Err(err);
            }
        }
    }
    pb.finish_and_clear();

    // loaded manifests may name more repositories
    let discovered = manager.register_discovered()?;
    if discovered > 0 {
        tracing::info!("Discovered {} dependency repositories", discovered);
    }

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
