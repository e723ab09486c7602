use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod bindings;
mod cli;
mod commands;
mod domain;
mod services;

use bindings::{ClientError, PulpServer};
use cli::Cli;
use commands::{handle_commands, CommandError, Context};
use services::config::{config_path, load_config, resolve_settings, ConfigError, Overrides};
use services::output::print_json_error;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            if cli.json {
                if print_json_error(error_code(&e), &format!("{:#}", e)).is_err() {
                    eprintln!("error: {:#}", e);
                }
            } else {
                eprintln!("error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let path = config_path(cli.config.as_deref())?;
    let file = load_config(&path)?;
    let settings = resolve_settings(
        file,
        Overrides {
            server: cli.server.clone(),
            username: cli.username.clone(),
            password: cli.password.clone(),
        },
    )?;
    let server = PulpServer::connect(&settings.connection)?;
    tracing::debug!(base = %server.base_url(), "using server");
    let ctx = Context::new(server, settings, cli.json);
    handle_commands(cli, &ctx)
}

/// Stable code for the `--json` error envelope.
fn error_code(e: &anyhow::Error) -> &'static str {
    if let Some(err) = e.downcast_ref::<ClientError>() {
        return match err {
            ClientError::NotFound { .. } => "NOT_FOUND",
            ClientError::Server { .. } => "SERVER_ERROR",
            ClientError::Decode { .. } | ClientError::NoTask(_) => "SERVER_ERROR",
            ClientError::Transport { .. } => "TRANSPORT",
            ClientError::InvalidUrl(_) => "CONFIG",
        };
    }
    if e.downcast_ref::<ConfigError>().is_some() {
        return "CONFIG";
    }
    if e.downcast_ref::<CommandError>().is_some() {
        return "INVALID_ARGS";
    }
    "ERROR"
}
