//! Presentation-facing command surface. Every command resolves to a
//! [`CommandResult`]; errors never cross this boundary as `Err`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    error::Result,
    models::{CurrentSession, LoginResponse, Project, Screenshot, Task, TimeLog, TimeLogList, UserData},
    AppState,
};

use super::{SessionCore, SessionSnapshot};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    fn from_result(result: Result<T>, fallback: &str) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::fail(err.user_message(fallback)),
        }
    }
}

fn core_from_state(state: &AppState) -> &SessionCore {
    &state.core
}

pub async fn login(state: &AppState, email: &str, password: &str) -> CommandResult<LoginResponse> {
    let core = core_from_state(state);
    CommandResult::from_result(core.login(email, password).await, "Login failed")
}

pub async fn logout(state: &AppState) -> CommandResult<()> {
    let core = core_from_state(state);
    CommandResult::from_result(core.logout().await, "Error during logout")
}

pub async fn get_user_data(state: &AppState) -> CommandResult<UserData> {
    CommandResult::ok(core_from_state(state).user_data())
}

pub async fn get_projects(state: &AppState) -> CommandResult<Vec<Project>> {
    let core = core_from_state(state);
    CommandResult::from_result(core.projects().await, "Failed to fetch projects")
}

pub async fn get_tasks(state: &AppState, project_id: &str) -> CommandResult<Vec<Task>> {
    let core = core_from_state(state);
    CommandResult::from_result(core.tasks(project_id).await, "Failed to fetch tasks")
}

/// Reconciles with the server, adopting an open session if there is one.
pub async fn get_current_session(state: &AppState) -> CommandResult<CurrentSession> {
    let core = core_from_state(state);
    CommandResult::from_result(core.resume().await, "Failed to fetch current time log")
}

/// Local view only; no request is made.
pub async fn get_session_snapshot(state: &AppState) -> CommandResult<SessionSnapshot> {
    CommandResult::ok(core_from_state(state).snapshot().await)
}

pub async fn start_tracking(
    state: &AppState,
    task_id: &str,
    notes: Option<&str>,
) -> CommandResult<TimeLog> {
    let core = core_from_state(state);
    CommandResult::from_result(core.start(task_id, notes).await, "Failed to start time tracking")
}

pub async fn stop_tracking(state: &AppState, notes: Option<&str>) -> CommandResult<TimeLog> {
    let core = core_from_state(state);
    CommandResult::from_result(core.stop(notes).await, "Failed to stop time tracking")
}

pub async fn get_time_logs(
    state: &AppState,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> CommandResult<TimeLogList> {
    let core = core_from_state(state);
    CommandResult::from_result(
        core.time_logs(start_date, end_date).await,
        "Failed to fetch time logs",
    )
}

pub async fn get_screenshots(state: &AppState, session_id: &str) -> CommandResult<Vec<Screenshot>> {
    let core = core_from_state(state);
    CommandResult::from_result(core.screenshots(session_id).await, "Failed to fetch screenshots")
}
