use crate::bindings::{ClientError, TaskSource};
use crate::cli::{GroupCommands, InstallCommands, TargetArgs, UninstallCommands};
use crate::commands::{consumer_not_found, schedules::handle_schedule_commands, Context};
use crate::domain::constants::{PACKAGE_FIELDS, TYPE_ID_PKG_GROUP};
use crate::domain::models::{
    package_group_units, ContentAction, ContentOptions, ContentReport, ContentRequest,
    RunOutcome, RunReport, Task, TaskState,
};
use crate::services::output::{print_json, Prompt};
use crate::services::polling::{render_cancelled, render_failed, track, Tracked};
use std::io::{self, Write};
use tracing::{debug, info};

/// User-facing wording that differs between install and uninstall.
struct ActionText {
    verb: &'static str,
    failed: &'static str,
    succeeded: &'static str,
    resolved_title: &'static str,
    nothing_resolved: &'static str,
    deps_title: &'static str,
}

const INSTALL_TEXT: ActionText = ActionText {
    verb: "Install",
    failed: "Install Failed",
    succeeded: "Install Succeeded",
    resolved_title: "Installed",
    nothing_resolved: "Packages for groups already installed",
    deps_title: "Installed for dependency",
};

const UNINSTALL_TEXT: ActionText = ActionText {
    verb: "Uninstall",
    failed: "Uninstall Failed",
    succeeded: "Uninstall Succeeded",
    resolved_title: "Uninstalled",
    nothing_resolved: "No matching packages found to uninstall",
    deps_title: "Uninstalled for dependency",
};

impl ActionText {
    fn for_action(action: ContentAction) -> &'static ActionText {
        match action {
            ContentAction::Install => &INSTALL_TEXT,
            ContentAction::Uninstall => &UNINSTALL_TEXT,
        }
    }
}

pub fn handle_group_commands(command: &GroupCommands, ctx: &Context) -> anyhow::Result<bool> {
    match command {
        GroupCommands::Install { command } => match command {
            InstallCommands::Run(args) => {
                let options = ContentOptions {
                    apply: !args.no_commit,
                    importkeys: Some(args.import_keys),
                    reboot: args.reboot,
                };
                run_content_action(ctx, ContentAction::Install, &args.target, options)
            }
            InstallCommands::Schedules { command } => {
                handle_schedule_commands(ctx, ContentAction::Install, command)
            }
        },
        GroupCommands::Uninstall { command } => match command {
            UninstallCommands::Run(args) => {
                let options = ContentOptions {
                    apply: !args.no_commit,
                    importkeys: None,
                    reboot: args.reboot,
                };
                run_content_action(ctx, ContentAction::Uninstall, &args.target, options)
            }
            UninstallCommands::Schedules { command } => {
                handle_schedule_commands(ctx, ContentAction::Uninstall, command)
            }
        },
    }
}

fn run_content_action(
    ctx: &Context,
    action: ContentAction,
    target: &TargetArgs,
    options: ContentOptions,
) -> anyhow::Result<bool> {
    let text = ActionText::for_action(action);
    let mut prompt = ctx.prompt();
    let consumer_id = target.consumer_id.as_str();
    let request = ContentRequest {
        units: package_group_units(&target.names),
        options,
    };

    info!(
        consumer = consumer_id,
        action = action.as_str(),
        groups = ?target.names,
        "requesting content action"
    );
    let created = match ctx.server.content_action(consumer_id, action, &request) {
        Ok(task) => task,
        Err(ClientError::NotFound { .. }) => {
            return consumer_not_found(ctx, &mut prompt, consumer_id);
        }
        Err(e) => return Err(e.into()),
    };
    prompt.render_success_message(&format!(
        "{} task created with id [{}]",
        text.verb, created.task_id
    ))?;

    let task = ctx.server.get_task(&created.task_id)?;
    let mut spinner = ctx.spinner();
    let tracked = track(
        &mut prompt,
        &ctx.server,
        task,
        ctx.settings.poll_interval,
        &mut spinner,
    )?;

    let (outcome, task) = match tracked {
        Tracked::Rejected(task) => (RunOutcome::Rejected, task),
        Tracked::Postponed(task) => (RunOutcome::Postponed, task),
        Tracked::Completed(task) => {
            let outcome = render_completed(&mut prompt, text, &task)?;
            (outcome, task)
        }
    };
    info!(task_id = %task.task_id, outcome = ?outcome, "content action done");
    debug!(rendered = ?prompt.tags(), "prompt output");

    if ctx.json {
        print_json(outcome.is_ok(), run_report(consumer_id, action, &task, outcome))?;
    }
    Ok(outcome.is_ok())
}

fn render_completed<W: Write>(
    prompt: &mut Prompt<W>,
    text: &ActionText,
    task: &Task,
) -> io::Result<RunOutcome> {
    if task.state.was_successful() {
        let ok = render_succeeded(prompt, text, task)?;
        return Ok(if ok {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed
        });
    }
    if task.state.was_failure() {
        render_failed(prompt, task)?;
        return Ok(RunOutcome::Failed);
    }
    render_cancelled(prompt)?;
    Ok(RunOutcome::Cancelled)
}

/// Render the agent report of a finished task. Returns the reported status.
fn render_succeeded<W: Write>(
    prompt: &mut Prompt<W>,
    text: &ActionText,
    task: &Task,
) -> io::Result<bool> {
    let report = ContentReport::from_result(task.result.as_ref());
    let details = report.type_details(TYPE_ID_PKG_GROUP);

    if !report.status {
        prompt.render_failure_message(text.failed)?;
        let message = details
            .message
            .unwrap_or_else(|| "No details were reported by the consumer".to_string());
        prompt.render_failure_message(&message)?;
        return Ok(false);
    }

    prompt.render_success_message(text.succeeded)?;
    let resolved = details.resolved.unwrap_or_default();
    if resolved.is_empty() {
        prompt.render_success_message(text.nothing_resolved)?;
    } else {
        prompt.render_title(text.resolved_title)?;
        prompt.render_document_list(&resolved, &PACKAGE_FIELDS)?;
    }
    let deps = details.deps.unwrap_or_default();
    if !deps.is_empty() {
        prompt.render_title(text.deps_title)?;
        prompt.render_document_list(&deps, &PACKAGE_FIELDS)?;
    }
    Ok(true)
}

fn run_report(
    consumer_id: &str,
    action: ContentAction,
    task: &Task,
    outcome: RunOutcome,
) -> RunReport {
    let report = ContentReport::from_result(task.result.as_ref());
    let details = report.type_details(TYPE_ID_PKG_GROUP);
    let message = match task.state {
        TaskState::Finished => details.message,
        _ => task.exception_text(),
    };
    RunReport {
        consumer_id: consumer_id.to_string(),
        action: action.as_str().to_string(),
        task_id: task.task_id.clone(),
        outcome,
        state: task.state,
        resolved: details.resolved.unwrap_or_default(),
        deps: details.deps.unwrap_or_default(),
        message,
    }
}
