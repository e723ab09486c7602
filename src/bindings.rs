use crate::domain::models::{
    ContentAction, ContentRequest, Schedule, ScheduleCreate, ScheduleUpdate, Task,
};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("not found: {message}")]
    NotFound {
        resources: BTreeMap<String, String>,
        message: String,
    },
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("server returned no task for {0}")]
    NoTask(String),
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Whether a not-found error names a resource of the given kind.
    pub fn names_resource(&self, kind: &str) -> bool {
        match self {
            ClientError::NotFound { resources, .. } => resources.keys().any(|k| k.contains(kind)),
            _ => false,
        }
    }
}

/// Error document the server attaches to non-2xx responses.
#[derive(Debug, Deserialize, Default)]
struct ServerErrorBody {
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    resources: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// Connection parameters for [`PulpServer::connect`].
#[derive(Debug, Clone)]
pub struct Connection {
    pub url: String,
    pub api_prefix: String,
    pub verify_ssl: bool,
    pub timeout: Duration,
    pub credentials: Option<Credentials>,
}

/// Source of call reports, so polling can run against a scripted server in tests.
pub trait TaskSource {
    fn get_task(&self, task_id: &str) -> Result<Task, ClientError>;
}

/// Thin blocking client for the v2 REST API.
pub struct PulpServer {
    client: Client,
    base: Url,
    credentials: Option<Credentials>,
}

/// The server answers content actions with one call report or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum CallReports {
    One(Task),
    Many(Vec<Task>),
}

impl PulpServer {
    pub fn connect(conn: &Connection) -> Result<Self, ClientError> {
        let base = api_base(&conn.url, &conn.api_prefix)?;
        let client = Client::builder()
            .timeout(conn.timeout)
            .danger_accept_invalid_certs(!conn.verify_ssl)
            .build()
            .map_err(|source| ClientError::Transport {
                url: base.to_string(),
                source,
            })?;
        debug!(base = %base, verify_ssl = conn.verify_ssl, "server client ready");
        Ok(Self {
            client,
            base,
            credentials: conn.credentials.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Request an immediate install or uninstall of units on a consumer.
    pub fn content_action(
        &self,
        consumer_id: &str,
        action: ContentAction,
        request: &ContentRequest,
    ) -> Result<Task, ClientError> {
        let url = self.url(&["consumers", consumer_id, "actions", "content", action.as_str()])?;
        let body = self.execute(Method::POST, &url, Some(request))?;
        match decode::<CallReports>(&url, &body)? {
            CallReports::One(task) => Ok(task),
            CallReports::Many(tasks) => tasks
                .into_iter()
                .next()
                .ok_or_else(|| ClientError::NoTask(url.to_string())),
        }
    }

    pub fn list_schedules(
        &self,
        consumer_id: &str,
        action: ContentAction,
    ) -> Result<Vec<Schedule>, ClientError> {
        let url = self.schedules_url(consumer_id, action, None)?;
        let body = self.execute(Method::GET, &url, None::<&()>)?;
        decode(&url, &body)
    }

    pub fn create_schedule(
        &self,
        consumer_id: &str,
        action: ContentAction,
        request: &ScheduleCreate,
    ) -> Result<Schedule, ClientError> {
        let url = self.schedules_url(consumer_id, action, None)?;
        let body = self.execute(Method::POST, &url, Some(request))?;
        decode(&url, &body)
    }

    pub fn update_schedule(
        &self,
        consumer_id: &str,
        action: ContentAction,
        schedule_id: &str,
        delta: &ScheduleUpdate,
    ) -> Result<Schedule, ClientError> {
        let url = self.schedules_url(consumer_id, action, Some(schedule_id))?;
        let body = self.execute(Method::PUT, &url, Some(delta))?;
        decode(&url, &body)
    }

    pub fn delete_schedule(
        &self,
        consumer_id: &str,
        action: ContentAction,
        schedule_id: &str,
    ) -> Result<(), ClientError> {
        let url = self.schedules_url(consumer_id, action, Some(schedule_id))?;
        self.execute(Method::DELETE, &url, None::<&()>)?;
        Ok(())
    }

    fn schedules_url(
        &self,
        consumer_id: &str,
        action: ContentAction,
        schedule_id: Option<&str>,
    ) -> Result<Url, ClientError> {
        let mut segments = vec!["consumers", consumer_id, "schedules", "content", action.as_str()];
        if let Some(id) = schedule_id {
            segments.push(id);
        }
        self.url(&segments)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        join_segments(&self.base, segments)
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let builder = self.client.request(method, url.clone());
        match &self.credentials {
            Some(c) => builder.basic_auth(&c.username, c.password.as_deref()),
            None => builder,
        }
    }

    fn execute<B: Serialize>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&B>,
    ) -> Result<String, ClientError> {
        debug!(%method, %url, "sending request");
        let mut builder = self.request(method, url);
        if let Some(b) = body {
            builder = builder.json(b);
        }
        let transport = |source| ClientError::Transport {
            url: url.to_string(),
            source,
        };
        let resp = builder.send().map_err(transport)?;
        let status = resp.status();
        let text = resp.text().map_err(transport)?;
        debug!(%url, status = status.as_u16(), "response received");
        if status.is_success() {
            Ok(text)
        } else {
            Err(error_from_response(status, &text))
        }
    }
}

impl TaskSource for PulpServer {
    fn get_task(&self, task_id: &str) -> Result<Task, ClientError> {
        let url = self.url(&["tasks", task_id])?;
        let body = self.execute(Method::GET, &url, None::<&()>)?;
        decode(&url, &body)
    }
}

fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}

/// `<url>/<api_prefix>/v2`, tolerant of stray slashes on either part.
pub fn api_base(url: &str, api_prefix: &str) -> Result<Url, ClientError> {
    let base = Url::parse(url).map_err(|_| ClientError::InvalidUrl(url.to_string()))?;
    let mut segments: Vec<&str> = api_prefix.split('/').filter(|s| !s.is_empty()).collect();
    segments.push("v2");
    let mut joined = join_segments(&base, &segments)?;
    // the base itself carries no trailing slash; endpoints add their own
    joined
        .path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(url.to_string()))?
        .pop_if_empty();
    Ok(joined)
}

/// Append percent-encoded path segments plus the trailing slash the API expects.
fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments)
        .push("");
    Ok(url)
}

fn error_from_response(status: StatusCode, body: &str) -> ClientError {
    let parsed: ServerErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    if status == StatusCode::NOT_FOUND {
        let resources = parsed
            .resources
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect();
        return ClientError::NotFound { resources, message };
    }
    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}
