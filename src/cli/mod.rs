//! CLI module for ragkit
//!
//! Provides command-line interface parsing and handling for the `ragkit` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ragkit - embed, index and query a document collection
#[derive(Parser, Debug)]
#[command(
    name = "ragkit",
    version,
    about = "ragkit - retrieval-augmented generation over a local vector store",
    long_about = "Embed texts into a vector collection, retrieve the passages most similar\n\
                  to a question and answer it with a local Ollama model.",
    after_help = "EXAMPLES:\n    \
                  ragkit init                              # Create the configured collection\n    \
                  ragkit ingest --file notes.txt           # One document per non-empty line\n    \
                  ragkit query \"what is hnsw?\" -k 5        # Ranked passages with scores\n    \
                  ragkit ask \"what is hnsw?\"               # Answer from retrieved context\n    \
                  ragkit --config my.toml stats            # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "ragkit.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Create the configured collection
    Init,

    /// Embed and store documents
    ///
    /// Every TEXT argument is one document; with --file every non-empty line
    /// is one document. All documents are stored as a single batch.
    Ingest {
        /// Documents to ingest
        texts: Vec<String>,

        /// Read documents from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Build the HNSW index with the configured parameters
    Index,

    /// Show the passages most similar to a question
    Query {
        /// Question text
        question: String,

        /// Number of passages (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Answer a question from retrieved context
    Ask {
        /// Question text
        question: String,

        /// Number of passages (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Show collection statistics
    Stats,

    /// Drop the configured collection and its data
    Drop {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
