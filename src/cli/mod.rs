use crate::core::DEFAULT_RELATIVES_DEPTH;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "notequery")]
#[command(about = "Query logseq-style note corpora")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file (defaults to ./notequery.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a {{query ...}} against a corpus and print the result as CSV
    Query(QueryArgs),

    /// List the pages extracted from a corpus
    Pages(PagesArgs),

    /// Save the pages of a corpus to the page store
    Sync(SyncArgs),

    /// Show pages reachable from a page over references
    Relatives(RelativesArgs),

    /// List the titles in the page store
    Titles(TitlesArgs),
}

#[derive(Args)]
pub struct QueryArgs {
    /// Corpus root directory
    pub root: PathBuf,

    /// Query text (read from --file or stdin when omitted)
    #[arg(conflicts_with = "file")]
    pub query: Option<String>,

    /// Read the query text from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct PagesArgs {
    /// Corpus root directory
    pub root: PathBuf,

    /// Print pages as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Corpus root directory
    pub root: PathBuf,

    /// Page store directory (overrides the config)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct RelativesArgs {
    /// Page title
    pub title: String,

    /// Maximum number of reference hops
    #[arg(short, long, default_value_t = DEFAULT_RELATIVES_DEPTH)]
    pub depth: usize,

    /// Page store directory (overrides the config)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct TitlesArgs {
    /// Page store directory (overrides the config)
    #[arg(long)]
    pub store: Option<PathBuf>,
}
