//! Clap derive structures for the `bldr-state` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. This
//! file is also compiled by `build.rs` for man pages, so it may only use
//! clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bldr-state -- inspect the Builder dashboard state tree
#[derive(Debug, Parser)]
#[command(
    name = "bldr-state",
    version,
    about = "Inspect and exercise the Builder dashboard state tree",
    long_about = "Inspect and exercise the Builder dashboard state tree.\n\n\
        Builds the dashboard's initial state from the declared schema and your\n\
        configuration, then lets you read paths, apply updates through the store,\n\
        and replay build logs through a live log stream.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to read instead of the platform default
    #[arg(long, env = "BLDR_STATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Cookie header to take the session token from (overrides config)
    #[arg(long, env = "BLDR_STATE_COOKIE", global = true, hide_env_values = true)]
    pub cookie: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List declared state paths with their kinds and defaults
    Schema(SchemaArgs),

    /// Read paths from the initial (configured) state tree
    Get(GetArgs),

    /// Apply updates through the store and print the result
    Set(SetArgs),

    /// Replay lines through the selected build's log stream
    Log(LogArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Only list fields at or beneath this path (e.g. "origins.current")
    pub prefix: Option<String>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Dot-separated paths (e.g. "users.current.isSignedIn")
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Updates as PATH=VALUE; VALUE is JSON, or a plain string if it isn't
    #[arg(required = true, value_name = "PATH=VALUE")]
    pub assignments: Vec<String>,

    /// Paths to print afterwards [default: the updated paths]
    #[arg(long, short = 's')]
    pub show: Vec<String>,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// File to read log lines from [default: stdin]
    pub file: Option<PathBuf>,

    /// Lines appended per push
    #[arg(
        long,
        short = 'n',
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub chunk: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display current resolved configuration (secrets masked)
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long, short = 'f')]
        force: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
