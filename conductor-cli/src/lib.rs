//! The `conductor` command-line tool.
//!
//! ```text
//! conductor demo [--trace trace.json] [--jsonl trace.jsonl] [--offline]
//! conductor run --workflow wf.json [--seed seed.json] [--trace out.json] [--jsonl out.jsonl]
//! conductor check --workflow wf.json [--seed seed.json]
//! ```
//!
//! Exit codes: 0 when the run completed (or the check is clean), 1 when it
//! failed (or the check found issues), 2 on usage or configuration errors.

pub mod cli;
pub mod commands;
pub mod demo;
pub mod offline;
pub mod report;

use cli::Command;
use commands::Verdict;
use tokio_util::sync::CancellationToken;

/// Run one subcommand.
pub async fn dispatch(command: Command, cancel: CancellationToken) -> anyhow::Result<Verdict> {
    match command {
        Command::Demo(args) => commands::demo(args, cancel).await,
        Command::Run(args) => commands::run(args, cancel).await,
        Command::Check(args) => commands::check(args).await,
    }
}
