//! Remote tracking service boundary.
//!
//! The Session Core only talks to [`TrackingApi`]; [`HttpTrackingApi`] is the
//! production implementation. Every call is a single request: failures are
//! reported to the caller, never retried here.

mod client;

pub use client::HttpTrackingApi;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    error::Result,
    models::{
        CurrentSession, LoginResponse, Project, Screenshot, ScreenshotSubmission,
        StartSessionRequest, Task, TimeLog, TimeLogList,
    },
};

#[async_trait]
pub trait TrackingApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;

    async fn start_session(&self, token: &str, request: &StartSessionRequest) -> Result<TimeLog>;

    async fn stop_session(
        &self,
        token: &str,
        session_id: &str,
        notes: Option<&str>,
    ) -> Result<TimeLog>;

    async fn current_session(&self, token: &str) -> Result<CurrentSession>;

    async fn list_time_logs(
        &self,
        token: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TimeLogList>;

    async fn submit_screenshot(&self, token: &str, submission: &ScreenshotSubmission)
        -> Result<()>;

    async fn list_screenshots(&self, token: &str, session_id: &str) -> Result<Vec<Screenshot>>;

    async fn list_projects(&self, token: &str) -> Result<Vec<Project>>;

    async fn list_tasks(&self, token: &str, project_id: &str) -> Result<Vec<Task>>;
}
