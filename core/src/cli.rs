//! Command-line interface for dlr-rs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run compiled deep-learning models through the DLR runtime.
#[derive(Parser, Debug)]
#[command(name = "dlr-rs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one inference over JSON tensor input.
    Infer {
        /// Path to the model artifact directory.
        #[arg(short, long)]
        model_dir: PathBuf,

        /// Device to run on (cpu, cuda:0, cuda:1, etc).
        #[arg(short, long, default_value = "cpu")]
        device: String,

        /// Path to input data file (JSON with tensor data).
        #[arg(short, long)]
        input: PathBuf,

        /// Output format (json, pretty).
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Path to optional YAML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Load a model and print what the runtime reports about it.
    Info {
        /// Path to the model artifact directory.
        #[arg(short, long)]
        model_dir: PathBuf,

        /// Device to load on (cpu, cuda:0, cuda:1, etc).
        #[arg(short, long, default_value = "cpu")]
        device: String,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
