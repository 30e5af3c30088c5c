//! CLI parse: clap types for truss-patch. No behavior; definitions only.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// truss-patch - live-patch deployed model code from a recorded signature
#[derive(Parser)]
#[command(name = "truss-patch")]
#[command(about = "Calculate and apply model code patches for a truss directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Truss root directory
    #[arg(long, default_value = ".")]
    pub truss: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

/// Where the previous signature comes from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SignatureSource {
    /// Signature JSON file
    #[arg(long)]
    pub signature: Option<PathBuf>,

    /// Key of a signature in the signature store
    #[arg(long)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the signature of the truss directory
    Signature {
        /// Write the signature to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compute the signature and record it in the signature store
    Record {
        /// Deployment key to record under
        #[arg(long)]
        key: String,
    },
    /// Show paths changed since a signature
    Diff {
        #[command(flatten)]
        source: SignatureSource,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Calculate model code patches since a signature
    Patch {
        #[command(flatten)]
        source: SignatureSource,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Record the signature the printed patches describe under --key.
        /// Recording happens at calculation time, so apply the patches before
        /// the next run against the same key.
        #[arg(long, requires = "key")]
        commit: bool,
    },
    /// Apply a patch file to a model code directory
    Apply {
        /// JSON file with a list of patches
        #[arg(long)]
        patches: PathBuf,

        /// Model code directory to patch
        #[arg(long)]
        target: PathBuf,
    },
    /// Manage recorded signatures
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum StoreCommands {
    /// List recorded signature keys
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Remove a recorded signature
    Remove {
        /// Deployment key
        key: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration to the truss-local config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}
