//! Terminal user interaction.

use std::cell::RefCell;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use asset_bridge::util::config::AuthConfig;
use asset_bridge::util::io::{Credentials, Io};

/// Prompts on the terminal and keeps credentials in `auth.toml`.
pub struct ConsoleIo {
    interactive: bool,
    auth_path: Option<PathBuf>,
    auth: RefCell<AuthConfig>,
}

impl ConsoleIo {
    pub fn new(interactive: bool, auth_path: Option<PathBuf>) -> Self {
        let auth = auth_path
            .as_deref()
            .map(AuthConfig::load_or_default)
            .unwrap_or_default();

        ConsoleIo {
            interactive: interactive && io::stdin().is_terminal(),
            auth_path,
            auth: RefCell::new(auth),
        }
    }
}

impl Io for ConsoleIo {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn credentials(&self, host: &str) -> Option<Credentials> {
        self.auth.borrow().http_basic.get(host).cloned()
    }

    fn ask_credentials(&self, host: &str) -> Result<Option<Credentials>> {
        if !self.interactive {
            return Ok(None);
        }

        eprintln!("Authentication required ({})", host);
        let username = prompt("Username or token: ")?;
        if username.is_empty() {
            return Ok(None);
        }
        let password = prompt("Password (empty for a token): ")?;

        Ok(Some(if password.is_empty() {
            Credentials::oauth_token(username)
        } else {
            Credentials::new(username, password)
        }))
    }

    fn store_credentials(&self, host: &str, credentials: &Credentials) -> Result<()> {
        let mut auth = self.auth.borrow_mut();
        auth.http_basic
            .insert(host.to_string(), credentials.clone());

        if let Some(path) = &self.auth_path {
            auth.save(path)?;
            tracing::debug!("Stored credentials for {} in {}", host, path.display());
        }
        Ok(())
    }
}

fn prompt(label: &str) -> Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", label)?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from the terminal")?;
    Ok(line.trim().to_string())
}
