//! CLI parse: clap types for Aletheia. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Aletheia CLI - progressive codex synthesis
#[derive(Parser, Debug)]
#[command(name = "aletheia")]
#[command(about = "Scaffold and write the Aletheia codex with a generative model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate fragment titles for every chapter (skipped if already scaffolded)
    Scaffold {
        /// Regenerate one section (zero-based index), replacing its fragments
        #[arg(long)]
        section: Option<usize>,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Write fragment text for every chapter that still has empty fragments
    Synthesize {
        /// Rewrite a single chapter instead, addressed as "section-chapter"
        #[arg(long)]
        chapter: Option<String>,
    },
    /// Show codex progress
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show a chapter ("s-c") or fragment ("s-c-p")
    Show {
        path: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Replace the text of one fragment
    Edit {
        /// Fragment path "section-chapter-page"
        path: String,
        /// New content
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,
        /// Read new content from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Render the codex as a single HTML document
    Export {
        /// Output file (default: Aletheia_Engine_Codex.html in the workspace)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Discard all fragments and start from the built-in template
    Reset {
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}
