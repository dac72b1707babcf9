//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use conductor::reasoner_anthropic::DEFAULT_MODEL;

/// Run step-chained agentic workflows.
#[derive(Debug, Parser)]
#[command(name = "conductor", version, about = "Run step-chained agentic workflows")]
pub struct Cli {
    /// Log filter such as `debug` or `conductor_exec=trace`. Takes
    /// precedence over RUST_LOG; the default is `info`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the built-in analytics → summary → action plan → email workflow
    Demo(DemoArgs),

    /// Run a workflow file
    Run(RunArgs),

    /// Check a workflow file's wiring without running it
    Check(CheckArgs),
}

/// Reasoner selection, shared by `demo` and `run`.
#[derive(Debug, Clone, Args)]
pub struct ReasonerArgs {
    /// Anthropic API key; without one, reasoning runs offline
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Anthropic model
    #[arg(long, env = "CONDUCTOR_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Anthropic API base URL (proxies, tests)
    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    pub base_url: Option<String>,
}

/// Arguments of `conductor demo`.
#[derive(Debug, Clone, Args)]
pub struct DemoArgs {
    /// Write the whole trace to this JSON file
    #[arg(long, default_value = "trace.json")]
    pub trace: PathBuf,

    /// Also stream trace entries to this JSON Lines file
    #[arg(long)]
    pub jsonl: Option<PathBuf>,

    /// Use the offline reasoner even when an API key is set
    #[arg(long)]
    pub offline: bool,

    #[command(flatten)]
    pub reasoner: ReasonerArgs,
}

/// Arguments of `conductor run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Workflow file (JSON)
    #[arg(long)]
    pub workflow: PathBuf,

    /// Initial context (a JSON object)
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Write the whole trace to this JSON file
    #[arg(long)]
    pub trace: Option<PathBuf>,

    /// Stream trace entries to this JSON Lines file
    #[arg(long)]
    pub jsonl: Option<PathBuf>,

    /// Register an HTTP connector, e.g. `--http crm=https://crm.internal/lookup`
    #[arg(long = "http", value_name = "NAME=URL", value_parser = parse_endpoint)]
    pub http: Vec<(String, String)>,

    /// Use the offline reasoner, which only answers the daily-summary prompt
    #[arg(long)]
    pub offline: bool,

    /// Bearer token sent by every HTTP connector
    #[arg(long, env = "CONDUCTOR_HTTP_TOKEN", hide_env_values = true)]
    pub http_token: Option<String>,

    #[command(flatten)]
    pub reasoner: ReasonerArgs,
}

/// Arguments of `conductor check`.
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Workflow file (JSON)
    #[arg(long)]
    pub workflow: PathBuf,

    /// Initial context (a JSON object); only its keys matter
    #[arg(long)]
    pub seed: Option<PathBuf>,
}

fn parse_endpoint(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, url)) if !name.is_empty() && !url.is_empty() => {
            Ok((name.to_owned(), url.to_owned()))
        }
        _ => Err(format!("expected NAME=URL, got {s}")),
    }
}
