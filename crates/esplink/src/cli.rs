//! Clap derive structures for the `esplink` CLI.
//!
//! Defines the command tree, global flags, and shared value types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use esplink_core::config::DEFAULT_HISTORY_LIMIT;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// esplink -- watch and drive an ESP32 output from the command line
#[derive(Debug, Parser)]
#[command(
    name = "esplink",
    version,
    about = "Monitor and control an ESP32 device through its HTTP gateway",
    long_about = "Polls the device gateway for link and run status, reads the binary\n\
        output, and switches it with optimistic updates that roll back when the\n\
        gateway refuses.",
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
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "ESPLINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Gateway API root, e.g. http://10.1.95.252:5000/api (overrides profile)
    #[arg(long, short = 's', env = "ESPLINK_SERVER", global = true)]
    pub server: Option<String>,

    /// Poll interval, e.g. 5s or 500ms (overrides profile)
    #[arg(long, env = "ESPLINK_INTERVAL", value_parser = humantime::parse_duration, global = true)]
    pub interval: Option<Duration>,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ESPLINK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ESPLINK_OUTPUT",
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
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable (default, interactive)
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

/// Target state for the binary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    #[value(alias = "true", alias = "1")]
    On,
    #[value(alias = "false", alias = "0")]
    Off,
}

impl Switch {
    pub fn as_bool(self) -> bool {
        matches!(self, Self::On)
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the gateway once and show device status
    #[command(alias = "st")]
    Status,

    /// Keep polling and print every change until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Switch the output on or off
    Set(SetArgs),

    /// Test the connection to the gateway
    #[command(alias = "ping")]
    Test,

    /// Show recent analog input samples
    #[command(alias = "ad")]
    History(HistoryArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Desired output state
    pub state: Switch,

    /// How long to wait for the gateway to acknowledge
    #[arg(long, default_value = "15s", value_parser = humantime::parse_duration)]
    pub wait: Duration,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Number of most recent samples to fetch
    #[arg(long, short = 'l', default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: u32,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Create or update a profile
    Init(ConfigInitArgs),

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct ConfigInitArgs {
    /// Profile name
    #[arg(long, default_value = "default")]
    pub name: String,

    /// Gateway API root for the profile (defaults to --server, then the built-in address)
    #[arg(long)]
    pub url: Option<String>,

    /// Overwrite an existing profile
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
