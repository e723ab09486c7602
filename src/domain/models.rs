use crate::domain::constants::TYPE_ID_PKG_GROUP;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct JsonErr {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Which consumer content operation a command drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentAction {
    Install,
    Uninstall,
}

impl ContentAction {
    /// Path segment used by the server for this action.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentAction::Install => "install",
            ContentAction::Uninstall => "uninstall",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitKey {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    pub type_id: String,
    pub unit_key: UnitKey,
}

impl Unit {
    pub fn package_group(name: &str) -> Self {
        Self {
            type_id: TYPE_ID_PKG_GROUP.to_string(),
            unit_key: UnitKey {
                name: name.to_string(),
            },
        }
    }
}

/// One unit per group name, in the order the names were given.
pub fn package_group_units(names: &[String]) -> Vec<Unit> {
    names.iter().map(|n| Unit::package_group(n)).collect()
}

/// Options bag sent with an install or uninstall request.
///
/// `importkeys` is only meaningful for installs and is omitted from the
/// wire body when unset.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContentOptions {
    pub apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importkeys: Option<bool>,
    pub reboot: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentRequest {
    pub units: Vec<Unit>,
    pub options: ContentOptions,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskResponse {
    Accepted,
    Postponed,
    Rejected,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    #[default]
    Waiting,
    Running,
    Suspended,
    Finished,
    Error,
    Canceled,
    #[serde(rename = "timed out")]
    TimedOut,
    Skipped,
    #[serde(other)]
    Unknown,
}

impl TaskState {
    pub fn is_completed(self) -> bool {
        matches!(
            self,
            TaskState::Finished
                | TaskState::Error
                | TaskState::Canceled
                | TaskState::TimedOut
                | TaskState::Skipped
        )
    }

    pub fn was_successful(self) -> bool {
        self == TaskState::Finished
    }

    pub fn was_failure(self) -> bool {
        matches!(self, TaskState::Error | TaskState::TimedOut)
    }
}

/// Call report returned by the server for an asynchronous request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    #[serde(default)]
    pub response: Option<TaskResponse>,
    #[serde(default)]
    pub reasons: Vec<Value>,
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub exception: Option<Value>,
    #[serde(default)]
    pub traceback: Option<Value>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub finish_time: Option<String>,
}

impl Task {
    pub fn is_rejected(&self) -> bool {
        self.response == Some(TaskResponse::Rejected)
    }

    pub fn is_postponed(&self) -> bool {
        self.response == Some(TaskResponse::Postponed)
    }

    /// Exception text reported by the server, flattened to one string.
    pub fn exception_text(&self) -> Option<String> {
        match self.exception.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim_end().to_string()),
            Value::Array(lines) => {
                let joined = lines
                    .iter()
                    .map(|l| match l {
                        Value::String(s) => s.trim_end().to_string(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                (!joined.is_empty()).then_some(joined)
            }
            other => Some(other.to_string()),
        }
    }
}

/// Agent report carried in a finished task's `result`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ContentReport {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl ContentReport {
    /// Lenient parse: anything that is not an agent report becomes a failed,
    /// empty report.
    pub fn from_result(result: Option<&Value>) -> Self {
        result
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    pub fn type_details(&self, type_id: &str) -> TypeDetails {
        self.details
            .get(type_id)
            .and_then(|entry| entry.get("details"))
            .and_then(|d| serde_json::from_value(d.clone()).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TypeDetails {
    #[serde(default)]
    pub resolved: Option<Vec<Value>>,
    #[serde(default)]
    pub deps: Option<Vec<Value>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Succeeded,
    Failed,
    Cancelled,
    Rejected,
    Postponed,
}

impl RunOutcome {
    pub fn is_ok(self) -> bool {
        matches!(self, RunOutcome::Succeeded | RunOutcome::Postponed)
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub consumer_id: String,
    pub action: String,
    pub task_id: String,
    pub outcome: RunOutcome,
    pub state: TaskState,
    pub resolved: Vec<Value>,
    pub deps: Vec<Value>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub schedule: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub failure_threshold: Option<u32>,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub remaining_runs: Option<u32>,
    #[serde(default)]
    pub first_run: Option<String>,
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub next_run: Option<String>,
    #[serde(default)]
    pub units: Vec<Value>,
    #[serde(default)]
    pub options: Value,
}

impl Schedule {
    /// Names of the units scheduled, for display.
    pub fn unit_names(&self) -> Vec<String> {
        self.units
            .iter()
            .filter_map(|u| u.get("unit_key")?.get("name")?.as_str())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleCreate {
    pub schedule: String,
    pub units: Vec<Unit>,
    pub options: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u32>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ScheduleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl ScheduleUpdate {
    pub fn is_empty(&self) -> bool {
        self.schedule.is_none() && self.failure_threshold.is_none() && self.enabled.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct NextRunReport {
    pub next_run: Option<String>,
}
