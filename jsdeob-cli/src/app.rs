use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// jsdeob - JavaScript AST deobfuscation over ESTree JSON
#[derive(Debug, Parser)]
#[command(name = "jsdeob", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Layout of printed JavaScript.
#[derive(Debug, Args)]
pub struct LayoutOptions {
    /// Spaces per indentation level.
    #[arg(long, default_value_t = 2)]
    pub indent: usize,

    /// Indent with tabs.
    #[arg(long, conflicts_with = "indent")]
    pub tabs: bool,

    /// Escape every non-ASCII character in string literals.
    #[arg(long)]
    pub ascii: bool,
}

/// Format of a deobfuscated output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// ESTree JSON, readable by any ESTree tool.
    Json,
    /// JavaScript source.
    Js,
}

impl Emit {
    /// File extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Emit::Json => "json",
            Emit::Js => "js",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report which obfuscation patterns an ESTree program contains.
    Detect {
        /// Path to the ESTree JSON file (or directory with --recursive).
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Recursively scan directory for .json files.
        #[arg(short, long)]
        recursive: bool,
    },

    /// Deobfuscate an ESTree program.
    Deobfuscate {
        /// Path to the ESTree JSON file (or directory with --recursive).
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Output file or directory.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output filename suffix (default: ".deobf").
        #[arg(long, default_value = ".deobf")]
        suffix: String,

        /// Recursively process directory for .json files.
        #[arg(short, long)]
        recursive: bool,

        /// Output format.
        #[arg(long, value_enum, default_value = "js")]
        emit: Emit,

        /// Skip string table decoding.
        #[arg(long)]
        no_strings: bool,

        /// Skip dictionary inlining.
        #[arg(long)]
        no_dictionaries: bool,

        /// Skip control-flow unflattening.
        #[arg(long)]
        no_unflatten: bool,

        /// Rebuild `while (true)` loops whose exit is a trailing `break`.
        #[arg(long)]
        loops: bool,

        /// Keep `obj["name"]` member accesses computed.
        #[arg(long)]
        no_normalize: bool,

        /// Maximum unflattening rounds (one nesting level per round).
        #[arg(long, value_name = "N")]
        rounds: Option<usize>,

        /// Show per-pass statistics.
        #[arg(long)]
        stats: bool,

        /// Write detailed JSON report.
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutOptions,
    },

    /// Print an ESTree program as JavaScript without deobfuscating it.
    Generate {
        /// Path to the ESTree JSON file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Output file (default: stdout).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutOptions,
    },
}
