//! Shared utilities

pub mod config;
pub mod context;
pub mod hash;
pub mod http;
pub mod io;

pub use config::Config;
pub use context::SessionContext;
