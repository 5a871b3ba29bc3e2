//! Read-only lookups against the tracking service on behalf of the
//! presentation layer. None of these touch session state.

use chrono::NaiveDate;

use super::SessionCore;
use crate::{
    error::Result,
    models::{CurrentSession, Project, Screenshot, Task, TimeLogList},
};

impl SessionCore {
    /// The server's view of the open session, without adopting it.
    pub async fn remote_session(&self) -> Result<CurrentSession> {
        let token = self.require_token()?;
        self.api().current_session(&token).await
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        let token = self.require_token()?;
        self.api().list_projects(&token).await
    }

    pub async fn tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        let token = self.require_token()?;
        self.api().list_tasks(&token, project_id).await
    }

    pub async fn time_logs(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<TimeLogList> {
        let token = self.require_token()?;
        let (start_date, end_date) = if start_date <= end_date {
            (start_date, end_date)
        } else {
            (end_date, start_date)
        };
        self.api().list_time_logs(&token, start_date, end_date).await
    }

    pub async fn screenshots(&self, session_id: &str) -> Result<Vec<Screenshot>> {
        let token = self.require_token()?;
        self.api().list_screenshots(&token, session_id).await
    }
}
