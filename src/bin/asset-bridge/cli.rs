//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// asset-bridge - Resolve Bower and npm assets into host packages
#[derive(Parser)]
#[command(name = "asset-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Never prompt for credentials
    #[arg(short = 'n', long, global = true)]
    pub no_interaction: bool,

    /// Configuration file used instead of the global one
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            verbose: self.verbose,
            no_interaction: self.no_interaction,
            config: self.config.clone(),
        }
    }
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub verbose: bool,
    pub no_interaction: bool,
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the versions of an asset package
    Show(ShowArgs),

    /// Search the asset registries
    Search(SearchArgs),

    /// Convert a bower.json or package.json into a host package
    Convert(ConvertArgs),

    /// List the repository types that may be declared
    Repositories,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Host package name (bower-asset/jquery, npm-asset/lodash)
    pub package: String,

    /// Load the complete metadata of every version
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    pub query: String,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Manifest file
    pub file: PathBuf,

    /// Ecosystem of the manifest (guessed from the file name if omitted)
    #[arg(long = "type", value_enum)]
    pub asset_type: Option<AssetTypeArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AssetTypeArg {
    Bower,
    Npm,
}

impl AssetTypeArg {
    pub fn name(&self) -> &'static str {
        match self {
            AssetTypeArg::Bower => "bower",
            AssetTypeArg::Npm => "npm",
        }
    }
}
