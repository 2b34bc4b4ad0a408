//! User interaction.
//!
//! Drivers ask for credentials through [`Io`] when a hosting API refuses an
//! anonymous request. Non-interactive sessions never prompt.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Username and password (or token) for a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Password used with OAuth tokens passed as usernames.
    pub const OAUTH_PASSWORD: &'static str = "x-oauth-basic";

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn oauth_token(token: impl Into<String>) -> Self {
        Self::new(token, Self::OAUTH_PASSWORD)
    }

    pub fn is_oauth_token(&self) -> bool {
        self.password == Self::OAUTH_PASSWORD
    }
}

/// Interaction capability handed to drivers.
pub trait Io {
    fn is_interactive(&self) -> bool;

    /// Known credentials for `host`.
    fn credentials(&self, host: &str) -> Option<Credentials>;

    /// Prompt for credentials. `None` when the user gave none.
    fn ask_credentials(&self, host: &str) -> Result<Option<Credentials>>;

    /// Remember credentials for the rest of the session and beyond.
    fn store_credentials(&self, host: &str, credentials: &Credentials) -> Result<()>;
}

/// Non-interactive IO, remembering credentials in memory only.
#[derive(Debug, Default)]
pub struct NullIo {
    known: RefCell<HashMap<String, Credentials>>,
}

impl NullIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed known credentials.
    pub fn with_credentials(self, host: &str, credentials: Credentials) -> Self {
        self.known.borrow_mut().insert(host.to_string(), credentials);
        self
    }
}

impl Io for NullIo {
    fn is_interactive(&self) -> bool {
        false
    }

    fn credentials(&self, host: &str) -> Option<Credentials> {
        self.known.borrow().get(host).cloned()
    }

    fn ask_credentials(&self, _host: &str) -> Result<Option<Credentials>> {
        Ok(None)
    }

    fn store_credentials(&self, host: &str, credentials: &Credentials) -> Result<()> {
        self.known
            .borrow_mut()
            .insert(host.to_string(), credentials.clone());
        Ok(())
    }
}
