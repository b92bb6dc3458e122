use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sift", version, about = "Search a vector index and get grounded answers")]
pub struct Cli {
    /// Config file (defaults to $SIFT_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Retrieve passages for a question, optionally with a generated answer
    Ask(AskArgs),
}

#[derive(Debug, clap::Args)]
pub struct AskArgs {
    pub query: String,

    /// Number of passages to retrieve (defaults to retrieval.top_k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Only search passages from this source; repeatable
    #[arg(short, long = "source", value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Generate an answer from the retrieved passages
    #[arg(short, long)]
    pub answer: bool,

    /// Show the passage that follows each match
    #[arg(short, long)]
    pub expand: bool,
}
