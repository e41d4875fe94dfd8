pub mod format;
pub mod toml_config;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mdlstyle", version, about = "Load and validate markdownlint style files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved rule configuration
    Show {
        /// Style file to load (overrides the one named in the settings file)
        #[arg(short, long)]
        style: Option<PathBuf>,

        /// Path to mdlstyle.toml
        #[arg(short, long, default_value = "mdlstyle.toml")]
        config: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Pretty)]
        format: ShowFormat,

        /// List every known rule, not just the ones the style file mentions
        #[arg(long)]
        all: bool,
    },
    /// Validate every style file found under the given paths
    Check {
        /// Files or directories to search
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Path to mdlstyle.toml (for discovery patterns)
        #[arg(short, long, default_value = "mdlstyle.toml")]
        config: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Pretty,
    Json,
    Toml,
}
