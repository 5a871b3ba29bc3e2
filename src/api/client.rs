use async_trait::async_trait;
use std::time::Duration;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::TrackingApi;
use crate::{
    error::{RemoteError, Result},
    models::{
        CurrentSession, LoginResponse, Project, Screenshot, ScreenshotSubmission,
        StartSessionRequest, Task, TimeLog, TimeLogList,
    },
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed client for the tracking service.
#[derive(Clone)]
pub struct HttpTrackingApi {
    /// API root without trailing slash, e.g. `http://localhost:3001/api`.
    base_url: String,
    client: Client,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct StopSessionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeLogEnvelope {
    #[serde(default)]
    time_log: Option<TimeLog>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentSessionWire {
    #[serde(default)]
    active: bool,
    #[serde(default)]
    time_log: Option<TimeLog>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScreenshotListWire {
    Bare(Vec<Screenshot>),
    Wrapped { screenshots: Vec<Screenshot> },
}

impl HttpTrackingApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(RemoteError::transport)?;
        let status = response.status();
        let body = response.text().await.map_err(RemoteError::transport)?;

        if status.is_success() {
            Ok(body)
        } else {
            log::debug!("API error {}: {}", status, body);
            Err(RemoteError::from_response(status.as_u16(), &body).into())
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::malformed(e).into())
    }

    async fn fetch_time_log(&self, request: RequestBuilder) -> Result<TimeLog> {
        let envelope: TimeLogEnvelope = self.fetch(request).await?;
        envelope
            .time_log
            .ok_or_else(|| RemoteError::malformed("missing timeLog").into())
    }
}

#[async_trait]
impl TrackingApi for HttpTrackingApi {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest { email, password });
        self.fetch(request).await
    }

    async fn start_session(&self, token: &str, request: &StartSessionRequest) -> Result<TimeLog> {
        let request = self
            .client
            .post(self.url("/time-tracking/start"))
            .bearer_auth(token)
            .json(request);
        self.fetch_time_log(request).await
    }

    async fn stop_session(
        &self,
        token: &str,
        session_id: &str,
        notes: Option<&str>,
    ) -> Result<TimeLog> {
        let request = self
            .client
            .put(self.url(&format!("/time-tracking/stop/{session_id}")))
            .bearer_auth(token)
            .json(&StopSessionRequest { notes });
        self.fetch_time_log(request).await
    }

    async fn current_session(&self, token: &str) -> Result<CurrentSession> {
        let request = self
            .client
            .get(self.url("/time-tracking/current"))
            .bearer_auth(token);
        let wire: CurrentSessionWire = self.fetch(request).await?;

        if wire.active && wire.time_log.is_none() {
            return Err(RemoteError::malformed("active session without timeLog").into());
        }
        Ok(CurrentSession {
            active: wire.active,
            time_log: wire.time_log,
        })
    }

    async fn list_time_logs(
        &self,
        token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TimeLogList> {
        let request = self
            .client
            .get(self.url("/time-tracking/logs"))
            .bearer_auth(token)
            .query(&[
                ("startDate", start_date.format("%Y-%m-%d").to_string()),
                ("endDate", end_date.format("%Y-%m-%d").to_string()),
            ]);
        self.fetch(request).await
    }

    async fn submit_screenshot(
        &self,
        token: &str,
        submission: &ScreenshotSubmission,
    ) -> Result<()> {
        let request = self
            .client
            .post(self.url("/screenshots"))
            .bearer_auth(token)
            .json(submission);
        self.execute(request).await.map(|_| ())
    }

    async fn list_screenshots(&self, token: &str, session_id: &str) -> Result<Vec<Screenshot>> {
        let request = self
            .client
            .get(self.url(&format!("/screenshots/time-log/{session_id}")))
            .bearer_auth(token);
        let wire: ScreenshotListWire = self.fetch(request).await?;
        Ok(match wire {
            ScreenshotListWire::Bare(list) => list,
            ScreenshotListWire::Wrapped { screenshots } => screenshots,
        })
    }

    async fn list_projects(&self, token: &str) -> Result<Vec<Project>> {
        let request = self
            .client
            .get(self.url("/projects/employee/me"))
            .bearer_auth(token);
        self.fetch(request).await
    }

    async fn list_tasks(&self, token: &str, project_id: &str) -> Result<Vec<Task>> {
        let request = self
            .client
            .get(self.url(&format!("/tasks/project/{project_id}")))
            .bearer_auth(token);
        self.fetch(request).await
    }
}
