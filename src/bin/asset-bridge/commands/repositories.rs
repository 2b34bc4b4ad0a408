//! `asset-bridge repositories` command

use anyhow::Result;

use asset_bridge::sources::RepositoryManager;

use crate::cli::GlobalOptions;

pub fn execute(global: &GlobalOptions) -> Result<()> {
    let ctx = super::create_session(global)?;
    let manager = RepositoryManager::new(&ctx)?;

    for repo_type in manager.repository_types() {
        println!("{}", repo_type);
    }

    let configured = manager.repositories();
    if !configured.is_empty() {
        println!("\nConfigured repositories:");
        for entry in configured.iter() {
            println!("  {} ({})", entry.name, entry.repository.config().repo_type);
        }
    }
    Ok(())
}
