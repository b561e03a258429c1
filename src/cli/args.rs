//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Inspect and normalize Sozi presentations: SVG layers, frames and selection
#[derive(Parser, Debug)]
#[command(name = "sozi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Directory holding a local .sozi.toml (default: the document's directory)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List layers in document order
    Layers {
        /// SVG document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show layers and their members as a tree
    Tree {
        /// SVG document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print the layer map and frame sequence as TOML
    Export {
        /// SVG document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Add a frame with this title (repeatable)
        #[arg(short, long = "frame")]
        frames: Vec<String>,
    },

    /// Write the document with its top level regrouped into layers
    Normalize {
        /// SVG document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
