//! CLI argument definitions using clap derive

use crate::cache::Backend;
use crate::value::Dtype;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// memocache - persistent memoization cache
///
/// Inspect and edit a chunked on-disk cache directory.
#[derive(Parser, Debug)]
#[command(name = "memocache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MEMOCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache directory (overrides the configured one)
    #[arg(short, long, global = true, env = "MEMOCACHE_DIR")]
    pub dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether a chunk of an entry exists
    Has(HasArgs),

    /// Print a cached value as JSON
    Get(GetArgs),

    /// Store a JSON value
    Set(SetArgs),

    /// List cached entries
    List(ListArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the has command
#[derive(Parser, Debug)]
pub struct HasArgs {
    /// Cache key
    pub key: String,

    /// Chunk index to check
    #[arg(short, long, default_value = "0")]
    pub index: usize,

    /// Backend (name or extension; default from config)
    #[arg(short, long)]
    pub backend: Option<Backend>,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Cache key
    pub key: String,

    /// Backend (name or extension; default from config)
    #[arg(short, long)]
    pub backend: Option<Backend>,

    /// Chunk count for entries written without a manifest
    #[arg(long)]
    pub chunks: Option<NonZeroUsize>,

    /// Element type of raw numeric data
    #[arg(long, requires = "length")]
    pub dtype: Option<Dtype>,

    /// Elements per array of raw numeric data
    #[arg(long, requires = "dtype")]
    pub length: Option<NonZeroUsize>,
}

/// Arguments for the set command
#[derive(Parser, Debug)]
pub struct SetArgs {
    /// Cache key
    pub key: String,

    /// Value as a JSON document
    pub json: String,

    /// Backend (name or extension; default from config)
    #[arg(short, long)]
    pub backend: Option<Backend>,

    /// Number of chunks to split sequences into
    #[arg(long)]
    pub chunks: Option<NonZeroUsize>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
