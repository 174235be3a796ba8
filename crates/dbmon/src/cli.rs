//! Clap derive structures for the `dbmon` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dbmon -- database instance monitoring from the command line
#[derive(Debug, Parser)]
#[command(
    name = "dbmon",
    version,
    about = "Monitor database instances and their capacity from the command line",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "DBMON_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, short = 'u', env = "DBMON_URL", global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DBMON_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DBMON_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "DBMON_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// Show instance counters
    Stats(StatsArgs),

    /// List monitored instances
    #[command(alias = "ls", alias = "i")]
    Instances(InstancesArgs),

    /// Trigger account or capacity synchronisation
    Sync(SyncArgs),

    /// Delete instances
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Bulk-create instances from a CSV or spreadsheet
    Create(CreateArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Stats ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Keep refreshing until interrupted
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Seconds between refreshes (overrides profile)
    #[arg(long, requires = "watch")]
    pub interval: Option<u64>,
}

// ── Instances ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InstancesArgs {
    /// Match against name or host
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Database type (mysql, postgresql, sqlserver, oracle, ...)
    #[arg(long, short = 't')]
    pub db_type: Option<String>,

    /// Instance status (active, inactive)
    #[arg(long)]
    pub status: Option<String>,
}

// ── Sync ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommand,
}

#[derive(Debug, Subcommand)]
pub enum SyncCommand {
    /// Sync database accounts for one instance
    Accounts {
        /// Instance ID
        id: i64,
    },

    /// Collect capacity for one instance
    Capacity {
        /// Instance ID
        id: i64,
    },

    /// Sync accounts on every instance
    All,
}

// ── Delete ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Instance IDs to delete
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<i64>,
}

// ── Create ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// File with one instance per row
    pub file: PathBuf,

    /// MIME type to send (guessed from the extension otherwise)
    #[arg(long)]
    pub content_type: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
