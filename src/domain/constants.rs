/// Content type id of a package group unit on the server.
pub const TYPE_ID_PKG_GROUP: &str = "package_group";

/// Fields rendered for each package reported in a task result.
pub const PACKAGE_FIELDS: [&str; 4] = ["name", "version", "arch", "repoid"];

pub const SCHEDULE_SUMMARY_FIELDS: [&str; 4] = ["id", "schedule", "enabled", "next_run"];

pub const SCHEDULE_DETAIL_FIELDS: [&str; 10] = [
    "id",
    "schedule",
    "enabled",
    "failure_threshold",
    "consecutive_failures",
    "remaining_runs",
    "first_run",
    "last_run",
    "next_run",
    "groups",
];

pub const DEFAULT_SERVER_URL: &str = "https://localhost";
pub const DEFAULT_API_PREFIX: &str = "/pulp/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_FREQUENCY_SECS: f64 = 1.0;

pub const CONFIG_DIR: &str = ".config/rpm-consumer";
pub const CONFIG_FILE: &str = "admin.toml";
