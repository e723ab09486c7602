//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `group.rs`: immediate install/uninstall `run` commands.
//! - `schedules.rs`: list/create/delete/update/next for content schedules.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate HTTP to `bindings` and rendering to `services/*`.
//! - Keep behavior and output schema stable.
//!
//! Handlers return `Ok(true)` when the operation succeeded, `Ok(false)` when
//! it ran but the outcome should exit non-zero (failed task, unknown consumer).

pub mod group;
pub mod schedules;

pub use group::handle_group_commands;

use crate::bindings::PulpServer;
use crate::cli::{Cli, Commands};
use crate::services::config::Settings;
use crate::services::output::{print_json_error, Prompt};
use crate::services::spinner::Spinner;
use std::io::{self, Write};

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArgs(String),
}

/// What every handler needs: the server client, resolved settings and the
/// output mode.
pub struct Context {
    pub server: PulpServer,
    pub settings: Settings,
    pub json: bool,
}

impl Context {
    pub fn new(server: PulpServer, settings: Settings, json: bool) -> Self {
        Self {
            server,
            settings,
            json,
        }
    }

    /// Prompt on stdout, or a sink when `--json` owns stdout.
    pub fn prompt(&self) -> Prompt<Box<dyn Write>> {
        if self.json {
            Prompt::new(Box::new(io::sink()))
        } else {
            Prompt::new(Box::new(io::stdout()))
        }
    }

    pub fn spinner(&self) -> Spinner {
        Spinner::new(!self.json)
    }
}

pub fn handle_commands(cli: &Cli, ctx: &Context) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::PackageGroup { command } => handle_group_commands(command, ctx),
    }
}

pub(crate) fn consumer_not_found<W: Write>(
    ctx: &Context,
    prompt: &mut Prompt<W>,
    consumer_id: &str,
) -> anyhow::Result<bool> {
    let msg = format!("Consumer [{}] not found", consumer_id);
    prompt.write(&msg, "not-found")?;
    if ctx.json {
        print_json_error("CONSUMER_NOT_FOUND", &msg)?;
    }
    Ok(false)
}
