//! Tracking sessions ("time logs" on the wire).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_optional_id};

/// One tracked work interval as the remote service reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeLog {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds, when the server computes it.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub project: Option<NamedRef>,
    #[serde(default)]
    pub task: Option<NamedRef>,
}

impl TimeLog {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Embedded `{id, name}` reference to a project or task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedRef {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub mac_address: String,
}

/// Answer to "is a session open for this identity".
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSession {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_log: Option<TimeLog>,
}

impl CurrentSession {
    pub fn inactive() -> Self {
        Self {
            active: false,
            time_log: None,
        }
    }

    /// The open session, if the server says there is one.
    pub fn active_log(&self) -> Option<&TimeLog> {
        if self.active {
            self.time_log.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogList {
    pub time_logs: Vec<TimeLog>,
    /// Seconds across `time_logs`.
    #[serde(default)]
    pub total_duration: i64,
}
