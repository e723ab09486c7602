use crate::bindings::{ClientError, TaskSource};
use crate::domain::models::{Task, TaskState};
use crate::services::output::Prompt;
use crate::services::spinner::Spinner;
use std::io::{self, Write};
use std::time::Duration;
use tracing::debug;

const REJECTED: &str = "The request was rejected by the server";
const REJECTED_HINT: &str = "This is likely due to an impending delete request for the consumer.";
const POSTPONED: &str = "The request to update content was accepted but was postponed due to \
one or more previous requests against the consumer. This request will take place at the \
earliest possible time.";
const DETACH_HINT: &str = "This command may be exited via ctrl+c without affecting the request.";

/// Where a call report ended up after [`track`].
#[derive(Debug)]
pub enum Tracked {
    Rejected(Task),
    Postponed(Task),
    Completed(Task),
}

pub fn rejected<W: Write>(prompt: &mut Prompt<W>, task: &Task) -> io::Result<bool> {
    if !task.is_rejected() {
        return Ok(false);
    }
    prompt.render_failure_message(REJECTED)?;
    prompt.render_failure_message(REJECTED_HINT)?;
    Ok(true)
}

pub fn postponed<W: Write>(prompt: &mut Prompt<W>, task: &Task) -> io::Result<bool> {
    if !task.is_postponed() {
        return Ok(false);
    }
    prompt.render_paragraph(POSTPONED)?;
    Ok(true)
}

/// Re-fetch the task every `interval` until it reaches a terminal state.
pub fn poll<S: TaskSource>(
    source: &S,
    mut task: Task,
    interval: Duration,
    spinner: &mut Spinner,
) -> Result<Task, ClientError> {
    let mut polls = 0u32;
    while !task.state.is_completed() {
        if task.state == TaskState::Waiting {
            spinner.tick(Some("Waiting to begin"));
        } else {
            spinner.tick(None);
        }
        std::thread::sleep(interval);
        task = source
            .get_task(&task.task_id)
            .inspect_err(|_| spinner.finish())?;
        polls += 1;
        debug!(task_id = %task.task_id, state = ?task.state, polls, "polled task");
    }
    spinner.finish();
    Ok(task)
}

/// Stop on rejection or postponement, otherwise follow the task to completion.
pub fn track<W: Write, S: TaskSource>(
    prompt: &mut Prompt<W>,
    source: &S,
    task: Task,
    interval: Duration,
    spinner: &mut Spinner,
) -> anyhow::Result<Tracked> {
    if rejected(prompt, &task)? {
        return Ok(Tracked::Rejected(task));
    }
    if postponed(prompt, &task)? {
        return Ok(Tracked::Postponed(task));
    }
    prompt.render_paragraph(DETACH_HINT)?;
    let task = poll(source, task, interval, spinner)?;
    Ok(Tracked::Completed(task))
}

pub fn render_failed<W: Write>(prompt: &mut Prompt<W>, task: &Task) -> io::Result<()> {
    prompt.render_failure_message("Request Failed")?;
    if let Some(exception) = task.exception_text() {
        prompt.render_failure_message(&exception)?;
    }
    if let Some(tb) = &task.traceback {
        debug!(task_id = %task.task_id, traceback = %tb, "task traceback");
    }
    Ok(())
}

pub fn render_cancelled<W: Write>(prompt: &mut Prompt<W>) -> io::Result<()> {
    prompt.render_failure_message("Request Cancelled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::spinner::tests::Shared;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct Scripted {
        replies: RefCell<VecDeque<Result<Task, ClientError>>>,
        calls: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(states: &[&str]) -> Self {
            Self {
                replies: RefCell::new(
                    states.iter().map(|s| Ok(task("t-1", None, s))).collect(),
                ),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TaskSource for Scripted {
        fn get_task(&self, task_id: &str) -> Result<Task, ClientError> {
            self.calls.borrow_mut().push(task_id.to_string());
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("poll past end of script")
        }
    }

    fn task(id: &str, response: Option<&str>, state: &str) -> Task {
        serde_json::from_value(json!({
            "task_id": id,
            "response": response,
            "state": state,
        }))
        .unwrap()
    }

    #[test]
    fn fetch_error_clears_spinner_before_returning() {
        let source = Scripted::new(&["running"]);
        source
            .replies
            .borrow_mut()
            .push_back(Err(ClientError::NoTask("t-1".to_string())));
        let buf = Shared::default();
        let mut spinner = Spinner::to_writer(Box::new(buf.clone()));
        let err = poll(
            &source,
            task("t-1", Some("accepted"), "running"),
            Duration::ZERO,
            &mut spinner,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::NoTask(_)));
        assert!(buf.text().ends_with("\r \r"));
        assert_eq!(source.calls.borrow().len(), 2);
    }

    fn quiet() -> Spinner {
        Spinner::new(false)
    }

    #[test]
    fn poll_stops_at_first_terminal_state() {
        let source = Scripted::new(&["running", "running", "finished", "error"]);
        let done = poll(
            &source,
            task("t-1", Some("accepted"), "waiting"),
            Duration::ZERO,
            &mut quiet(),
        )
        .unwrap();
        assert_eq!(done.state, TaskState::Finished);
        assert_eq!(source.calls.borrow().len(), 3);
        assert!(source.calls.borrow().iter().all(|id| id == "t-1"));
    }

    #[test]
    fn poll_does_not_fetch_completed_task() {
        let source = Scripted::new(&[]);
        let done = poll(
            &source,
            task("t-1", Some("accepted"), "canceled"),
            Duration::ZERO,
            &mut quiet(),
        )
        .unwrap();
        assert_eq!(done.state, TaskState::Canceled);
        assert!(source.calls.borrow().is_empty());
    }

    #[test]
    fn rejected_task_is_reported_and_not_polled() {
        let source = Scripted::new(&[]);
        let mut prompt = Prompt::new(Vec::new());
        let tracked = track(
            &mut prompt,
            &source,
            task("t-1", Some("rejected"), "waiting"),
            Duration::ZERO,
            &mut quiet(),
        )
        .unwrap();
        assert!(matches!(tracked, Tracked::Rejected(_)));
        assert_eq!(prompt.tags(), ["failure", "failure"]);
        let out = String::from_utf8(prompt.into_inner()).unwrap();
        assert!(out.contains("rejected by the server"));
        assert!(out.contains("impending delete request"));
    }

    #[test]
    fn postponed_task_is_reported_and_not_polled() {
        let source = Scripted::new(&[]);
        let mut prompt = Prompt::new(Vec::new());
        let tracked = track(
            &mut prompt,
            &source,
            task("t-1", Some("postponed"), "waiting"),
            Duration::ZERO,
            &mut quiet(),
        )
        .unwrap();
        assert!(matches!(tracked, Tracked::Postponed(_)));
        assert_eq!(prompt.tags(), ["paragraph"]);
        assert!(source.calls.borrow().is_empty());
    }

    #[test]
    fn accepted_task_is_followed_to_completion() {
        let source = Scripted::new(&["finished"]);
        let mut prompt = Prompt::new(Vec::new());
        let tracked = track(
            &mut prompt,
            &source,
            task("t-1", Some("accepted"), "running"),
            Duration::ZERO,
            &mut quiet(),
        )
        .unwrap();
        match tracked {
            Tracked::Completed(t) => assert_eq!(t.state, TaskState::Finished),
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(prompt.tags(), ["paragraph"]);
    }

    #[test]
    fn failed_task_shows_server_exception() {
        let mut prompt = Prompt::new(Vec::new());
        let t: Task = serde_json::from_value(json!({
            "task_id": "t-1",
            "state": "error",
            "exception": "ConnectionError: agent unreachable",
            "traceback": "Traceback (most recent call last): ..."
        }))
        .unwrap();
        render_failed(&mut prompt, &t).unwrap();
        let out = String::from_utf8(prompt.into_inner()).unwrap();
        assert_eq!(
            out,
            "Request Failed\n\nConnectionError: agent unreachable\n\n"
        );
    }
}
