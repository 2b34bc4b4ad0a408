//! Command implementations

pub mod convert;
pub mod repositories;
pub mod search;
pub mod show;

use std::io::IsTerminal;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use asset_bridge::util::config::{auth_config_path, global_config_path, load_config, project_config_path, Config};
use asset_bridge::util::context::SessionContext;

use crate::cli::GlobalOptions;
use crate::console::ConsoleIo;

/// Merged configuration: `--config` (or the global file), then the project.
pub fn load_session_config(global: &GlobalOptions) -> Result<Config> {
    let cwd = std::env::current_dir()?;
    let global_path = global.config.clone().or_else(global_config_path);

    let mut config = load_config(global_path.as_deref(), &project_config_path(&cwd));
    if global.no_interaction {
        config.interactive = Some(false);
    }
    Ok(config)
}

/// Session with network access and terminal interaction.
pub fn create_session(global: &GlobalOptions) -> Result<SessionContext> {
    let config = load_session_config(global)?;
    let io = ConsoleIo::new(config.is_interactive(), auth_config_path());
    Ok(SessionContext::new(config)?.with_io(Rc::new(io)))
}

/// Spinner on stderr, hidden in verbose mode and off a terminal.
pub fn spinner(global: &GlobalOptions, message: impl Into<String>) -> ProgressBar {
    if global.verbose || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
