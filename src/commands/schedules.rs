use crate::bindings::ClientError;
use crate::cli::ScheduleCommands;
use crate::commands::{consumer_not_found, CommandError, Context};
use crate::domain::constants::{SCHEDULE_DETAIL_FIELDS, SCHEDULE_SUMMARY_FIELDS};
use crate::domain::models::{
    package_group_units, ContentAction, NextRunReport, Schedule, ScheduleCreate, ScheduleUpdate,
};
use crate::services::output::{print_json, print_json_error, Prompt};
use serde_json::{json, Map, Value};
use std::io::Write;
use tracing::info;

const NO_SCHEDULES: &str = "There are no schedules defined for this operation.";

pub fn handle_schedule_commands(
    ctx: &Context,
    action: ContentAction,
    command: &ScheduleCommands,
) -> anyhow::Result<bool> {
    let mut prompt = ctx.prompt();
    match command {
        ScheduleCommands::List {
            consumer_id,
            details,
        } => {
            let schedules = match ctx.server.list_schedules(consumer_id, action) {
                Ok(s) => s,
                Err(e) => return not_found_or(ctx, &mut prompt, consumer_id, None, e),
            };
            if ctx.json {
                print_json(true, &schedules)?;
            }
            render_schedule_list(&mut prompt, &schedules, *details)?;
        }
        ScheduleCommands::Create {
            target,
            schedule,
            failure_threshold,
        } => {
            if schedule.trim().is_empty() {
                return Err(
                    CommandError::InvalidArgs("--schedule must not be empty".into()).into(),
                );
            }
            let request = ScheduleCreate {
                schedule: schedule.clone(),
                units: package_group_units(&target.names),
                options: Map::new(),
                failure_threshold: *failure_threshold,
                enabled: true,
            };
            let created = match ctx
                .server
                .create_schedule(&target.consumer_id, action, &request)
            {
                Ok(s) => s,
                Err(e) => return not_found_or(ctx, &mut prompt, &target.consumer_id, None, e),
            };
            info!(consumer = %target.consumer_id, schedule_id = %created.id, "schedule created");
            if ctx.json {
                print_json(true, &created)?;
            }
            prompt.render_success_message("Schedule successfully created")?;
        }
        ScheduleCommands::Delete {
            consumer_id,
            schedule_id,
        } => {
            if let Err(e) = ctx.server.delete_schedule(consumer_id, action, schedule_id) {
                return not_found_or(ctx, &mut prompt, consumer_id, Some(schedule_id), e);
            }
            info!(consumer = %consumer_id, schedule_id = %schedule_id, "schedule deleted");
            if ctx.json {
                print_json(true, json!({ "schedule_id": schedule_id }))?;
            }
            prompt.render_success_message("Schedule successfully deleted")?;
        }
        ScheduleCommands::Update {
            consumer_id,
            schedule_id,
            schedule,
            failure_threshold,
            enabled,
        } => {
            let delta = ScheduleUpdate {
                schedule: schedule.clone(),
                failure_threshold: *failure_threshold,
                enabled: *enabled,
            };
            if delta.is_empty() {
                return Err(CommandError::InvalidArgs(
                    "at least one of --schedule, --failure-threshold or --enabled is required"
                        .into(),
                )
                .into());
            }
            let updated = match ctx
                .server
                .update_schedule(consumer_id, action, schedule_id, &delta)
            {
                Ok(s) => s,
                Err(e) => {
                    return not_found_or(ctx, &mut prompt, consumer_id, Some(schedule_id), e);
                }
            };
            if ctx.json {
                print_json(true, &updated)?;
            }
            prompt.render_success_message("Successfully updated schedule")?;
        }
        ScheduleCommands::Next { consumer_id, quiet } => {
            let schedules = match ctx.server.list_schedules(consumer_id, action) {
                Ok(s) => s,
                Err(e) => return not_found_or(ctx, &mut prompt, consumer_id, None, e),
            };
            let next = next_run(&schedules);
            if ctx.json {
                print_json(
                    true,
                    NextRunReport {
                        next_run: next.map(str::to_string),
                    },
                )?;
            }
            match (next, *quiet) {
                (Some(ts), true) => prompt.write(ts, "next-run")?,
                (Some(ts), false) => {
                    prompt.render_paragraph(&format!("The next scheduled run is at: {}", ts))?
                }
                (None, _) => prompt.render_paragraph(NO_SCHEDULES)?,
            }
        }
    }
    Ok(true)
}

/// Map a 404 to the matching user message; anything else propagates.
fn not_found_or<W: Write>(
    ctx: &Context,
    prompt: &mut Prompt<W>,
    consumer_id: &str,
    schedule_id: Option<&String>,
    err: ClientError,
) -> anyhow::Result<bool> {
    if !matches!(err, ClientError::NotFound { .. }) {
        return Err(err.into());
    }
    match schedule_id {
        Some(sid) if err.names_resource("schedule") => {
            let msg = format!("Schedule [{}] not found", sid);
            prompt.write(&msg, "not-found")?;
            if ctx.json {
                print_json_error("NOT_FOUND", &msg)?;
            }
            Ok(false)
        }
        _ => consumer_not_found(ctx, prompt, consumer_id),
    }
}

fn render_schedule_list<W: Write>(
    prompt: &mut Prompt<W>,
    schedules: &[Schedule],
    details: bool,
) -> anyhow::Result<()> {
    if schedules.is_empty() {
        prompt.render_paragraph(NO_SCHEDULES)?;
        return Ok(());
    }
    prompt.render_title("Schedules")?;
    let docs: Vec<Value> = schedules.iter().map(schedule_document).collect();
    if details {
        prompt.render_document_list(&docs, &SCHEDULE_DETAIL_FIELDS)?;
    } else {
        prompt.render_document_list(&docs, &SCHEDULE_SUMMARY_FIELDS)?;
    }
    Ok(())
}

fn schedule_document(s: &Schedule) -> Value {
    json!({
        "id": s.id,
        "schedule": s.schedule,
        "enabled": s.enabled,
        "failure_threshold": s.failure_threshold,
        "consecutive_failures": s.consecutive_failures,
        "remaining_runs": s.remaining_runs,
        "first_run": s.first_run,
        "last_run": s.last_run,
        "next_run": s.next_run,
        "groups": s.unit_names(),
    })
}

/// Earliest `next_run` among enabled schedules. Timestamps are ISO-8601 in a
/// single zone, so lexical order is chronological order.
fn next_run(schedules: &[Schedule]) -> Option<&str> {
    schedules
        .iter()
        .filter(|s| s.enabled)
        .filter_map(|s| s.next_run.as_deref())
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(id: &str, enabled: bool, next: Option<&str>) -> Schedule {
        serde_json::from_value(json!({
            "_id": id,
            "schedule": "2012-09-18T14:00Z/P1D",
            "enabled": enabled,
            "failure_threshold": 3,
            "consecutive_failures": 0,
            "remaining_runs": null,
            "first_run": "2012-09-18T14:00:00Z",
            "last_run": null,
            "next_run": next,
            "units": [{"type_id": "package_group", "unit_key": {"name": "web"}}],
            "options": {}
        }))
        .unwrap()
    }

    #[test]
    fn next_run_picks_earliest_enabled() {
        let schedules = vec![
            schedule("a", true, Some("2012-09-20T14:00:00Z")),
            schedule("b", false, Some("2012-09-19T14:00:00Z")),
            schedule("c", true, Some("2012-09-19T18:00:00Z")),
            schedule("d", true, None),
        ];
        assert_eq!(next_run(&schedules), Some("2012-09-19T18:00:00Z"));
    }

    #[test]
    fn next_run_is_none_without_enabled_schedules() {
        assert_eq!(next_run(&[]), None);
        let disabled = vec![schedule("a", false, Some("2012-09-20T14:00:00Z"))];
        assert_eq!(next_run(&disabled), None);
    }

    #[test]
    fn summary_list_shows_core_fields() {
        let mut prompt = Prompt::new(Vec::new());
        render_schedule_list(
            &mut prompt,
            &[schedule("s1", true, Some("2012-09-19T14:00:00Z"))],
            false,
        )
        .unwrap();
        let out = String::from_utf8(prompt.into_inner()).unwrap();
        assert_eq!(
            out,
            "Schedules\n---------\n\n\
             Id:       s1\n\
             Schedule: 2012-09-18T14:00Z/P1D\n\
             Enabled:  True\n\
             Next run: 2012-09-19T14:00:00Z\n\n"
        );
    }

    #[test]
    fn detailed_list_includes_groups_and_counters() {
        let mut prompt = Prompt::new(Vec::new());
        render_schedule_list(&mut prompt, &[schedule("s1", true, None)], true).unwrap();
        let out = String::from_utf8(prompt.into_inner()).unwrap();
        assert!(out.contains("Failure threshold:    3\n"));
        assert!(out.contains("Consecutive failures: 0\n"));
        assert!(out.contains("Last run:             None\n"));
        assert!(out.contains("Groups:               web\n"));
    }

    #[test]
    fn empty_list_says_so() {
        let mut prompt = Prompt::new(Vec::new());
        render_schedule_list(&mut prompt, &[], true).unwrap();
        assert_eq!(prompt.tags(), ["paragraph"]);
        let out = String::from_utf8(prompt.into_inner()).unwrap();
        assert_eq!(out, format!("{}\n\n", NO_SCHEDULES));
    }
}
