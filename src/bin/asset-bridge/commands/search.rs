//! `asset-bridge search` command

use anyhow::Result;

use asset_bridge::sources::RepositoryManager;

use crate::cli::{GlobalOptions, SearchArgs};

pub fn execute(args: SearchArgs, global: &GlobalOptions) -> Result<()> {
    let ctx = super::create_session(global)?;
    let manager = RepositoryManager::new(&ctx)?;

    let pb = super::spinner(global, format!("Searching for {}", args.query));
    let results = manager.search(&args.query);
    pb.finish_and_clear();
    let results = results?;

    if results.is_empty() {
        println!("No packages found matching '{}'", args.query);
        return Ok(());
    }

    println!(
        "Found {} package{} matching '{}':\n",
        results.len(),
        if results.len() == 1 { "" } else { "s" },
        args.query
    );

    for result in &results {
        match &result.description {
            Some(description) => println!("  {} - {}", result.name, description),
            None => println!("  {}", result.name),
        }
    }

    Ok(())
}
