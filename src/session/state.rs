use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TimeLog;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    Active,
    /// Checking the remote service for an already-open session.
    Reconciling,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub task_id: Option<String>,
    pub notes: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session id while a session is open. During reconciliation the id of
    /// the session held before it started is still reported.
    pub fn active_session_id(&self) -> Option<&str> {
        match self.status {
            SessionStatus::Idle => None,
            SessionStatus::Active | SessionStatus::Reconciling => self.session_id.as_deref(),
        }
    }

    pub fn begin_session(&mut self, time_log: &TimeLog, task_id: &str, notes: Option<&str>) {
        *self = Self {
            status: SessionStatus::Active,
            session_id: Some(time_log.id.clone()),
            task_id: time_log.task_id.clone().or_else(|| Some(task_id.to_string())),
            notes: time_log.notes.clone().or_else(|| notes.map(str::to_string)),
            start_time: Some(time_log.start_time),
        };
    }

    /// Take over a session the remote service reports as open.
    pub fn adopt(&mut self, time_log: &TimeLog) {
        *self = Self {
            status: SessionStatus::Active,
            session_id: Some(time_log.id.clone()),
            task_id: time_log
                .task_id
                .clone()
                .or_else(|| time_log.task.as_ref().map(|task| task.id.clone())),
            notes: time_log.notes.clone(),
            start_time: Some(time_log.start_time),
        };
    }

    /// Enter `Reconciling`, returning the status to restore if it fails.
    pub fn begin_reconcile(&mut self) -> SessionStatus {
        let previous = match self.status {
            SessionStatus::Reconciling if self.session_id.is_some() => SessionStatus::Active,
            SessionStatus::Reconciling => SessionStatus::Idle,
            other => other,
        };
        self.status = SessionStatus::Reconciling;
        previous
    }

    pub fn abort_reconcile(&mut self, previous: SessionStatus) {
        if self.status == SessionStatus::Reconciling {
            self.status = previous;
        }
    }

    pub fn finish(&mut self) {
        *self = Self::default();
    }

    /// Time since the session started, for display.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        match (self.status, self.start_time) {
            (SessionStatus::Active, Some(start)) => Some((now - start).num_seconds().max(0)),
            _ => None,
        }
    }
}
