#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::process::Output;
use tempfile::TempDir;
use wiremock::MockServer;

pub const API: &str = "/pulp/api/v2";

pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
}

impl TestEnv {
    /// Isolated HOME whose config points at `server` and polls without delay.
    pub fn new(server: &MockServer) -> Self {
        let env = Self::bare();
        env.write_config(&format!(
            r#"[server]
url = "{}"

[auth]
username = "admin"
password = "admin"

[output]
poll_frequency_in_seconds = 0.0
"#,
            server.uri()
        ));
        env
    }

    /// Isolated HOME without any config file.
    pub fn bare() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).expect("create isolated home");
        Self { _tmp: tmp, home }
    }

    pub fn write_config(&self, body: &str) {
        let path = self.home.join(".config/rpm-consumer/admin.toml");
        fs::create_dir_all(path.parent().expect("config parent")).expect("create config dir");
        fs::write(path, body).expect("write config");
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("rpm-consumer");
        cmd.env("HOME", &self.home).env_remove("RUST_LOG");
        cmd
    }

    /// Run the binary off the async runtime so the mock server keeps serving.
    pub async fn run(&self, args: &[&str]) -> Output {
        let mut cmd = self.cmd();
        cmd.args(args);
        tokio::task::spawn_blocking(move || cmd.output().expect("run rpm-consumer"))
            .await
            .expect("join cli process")
    }

    pub async fn run_json(&self, args: &[&str]) -> (Output, Value) {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let out = self.run(&full).await;
        let value = serde_json::from_slice(&out.stdout).expect("valid json output");
        (out, value)
    }
}

pub fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

pub fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

pub fn content_path(consumer: &str, action: &str) -> String {
    format!("{API}/consumers/{consumer}/actions/content/{action}/")
}

pub fn task_path(task_id: &str) -> String {
    format!("{API}/tasks/{task_id}/")
}

pub fn schedules_path(consumer: &str, action: &str) -> String {
    format!("{API}/consumers/{consumer}/schedules/content/{action}/")
}

pub fn call_report(task_id: &str, response: &str, state: &str, result: Value) -> Value {
    json!({
        "task_id": task_id,
        "task_group_id": null,
        "call_request_id": format!("call-{task_id}"),
        "call_request_tags": ["pulp:consumer:c1", "pulp:action:unit_install"],
        "principal_login": "admin",
        "response": response,
        "reasons": [],
        "state": state,
        "progress": {},
        "result": result,
        "exception": null,
        "traceback": null,
        "start_time": null,
        "finish_time": null,
        "_href": format!("/pulp/api/v2/tasks/{task_id}/")
    })
}

pub fn group_result(status: bool, resolved: Value, deps: Value) -> Value {
    json!({
        "status": status,
        "reboot_scheduled": false,
        "details": {
            "package_group": {
                "status": status,
                "details": {"resolved": resolved, "deps": deps}
            }
        }
    })
}

pub fn pkg(name: &str, version: &str, arch: &str) -> Value {
    json!({
        "name": name,
        "version": version,
        "release": "1.el6",
        "epoch": "0",
        "arch": arch,
        "repoid": "rhel-6-server"
    })
}

pub fn not_found_body(resource: &str, id: &str) -> Value {
    let mut resources = serde_json::Map::new();
    resources.insert(resource.to_string(), json!(id));
    json!({
        "http_status": 404,
        "error_message": format!("Missing resource(s): {resource}={id}"),
        "exception": null,
        "traceback": null,
        "resources": resources
    })
}

pub fn schedule_doc(id: &str, enabled: bool, next_run: Option<&str>) -> Value {
    json!({
        "_id": id,
        "_href": format!("/pulp/api/v2/consumers/c1/schedules/content/install/{id}/"),
        "schedule": "2012-09-18T14:00Z/P1D",
        "enabled": enabled,
        "failure_threshold": 3,
        "consecutive_failures": 0,
        "remaining_runs": null,
        "first_run": "2012-09-18T14:00:00Z",
        "last_run": null,
        "next_run": next_run,
        "units": [{"type_id": "package_group", "unit_key": {"name": "web-server"}}],
        "options": {}
    })
}
