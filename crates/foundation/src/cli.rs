//! Clap derive structures for the `foundation` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// foundation -- read configuration, environment, and variables
#[derive(Debug, Parser)]
#[command(
    name = "foundation",
    version,
    about = "Query a Foundation configuration service from the command line",
    long_about = "Reads configuration, environment metadata, and variables from a\n\
        Foundation service, and watches the realtime channel for changes.",
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
    /// Profile from the config file
    #[arg(long, short = 'p', env = "FOUNDATION_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service base URL (overrides profile)
    #[arg(long, short = 'u', env = "FOUNDATION_URL", global = true)]
    pub url: Option<String>,

    /// API key (overrides profile)
    #[arg(long, env = "FOUNDATION_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FOUNDATION_OUTPUT",
        default_value = "json",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "FOUNDATION_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: none)
    #[arg(long, env = "FOUNDATION_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Strings unquoted, everything else as compact JSON
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show environment metadata
    #[command(alias = "env")]
    Environment,

    /// Show the published configuration
    #[command(alias = "config")]
    Configuration,

    /// Resolve a single variable
    #[command(alias = "var")]
    Variable(VariableArgs),

    /// Stream realtime change notifications until interrupted
    Watch(WatchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct VariableArgs {
    /// Variable name
    pub name: String,

    /// User id for targeting (overrides the profile's uid)
    #[arg(long, env = "FOUNDATION_UID")]
    pub uid: Option<String>,

    /// JSON value to print when the variable does not exist
    #[arg(long, value_name = "JSON")]
    pub fallback: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after this many notifications
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
