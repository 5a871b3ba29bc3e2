//! Error types for the tracking client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// No credential stored, or the stored one was rejected.
    #[error("Authentication error")]
    Auth,

    #[error("No active time tracking session")]
    NoActiveSession,

    #[error("Time tracking session {0} is already active")]
    AlreadyActive(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Screen capture permission not granted")]
    Permission,

    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("Screenshot upload failed: {0}")]
    Upload(String),

    /// Reading or writing local state failed.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl TrackerError {
    /// Text shown to the user. Remote failures pass the server's own message
    /// through; when the server gave none, `fallback` is used instead.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            TrackerError::Remote(remote) => remote
                .server_message
                .clone()
                .unwrap_or_else(|| fallback.to_string()),
            other => other.to_string(),
        }
    }
}

/// Network or service failure talking to the tracking API.
#[derive(Error, Debug, Clone)]
#[error("{detail}")]
pub struct RemoteError {
    /// HTTP status, absent for transport failures.
    pub status: Option<u16>,
    /// `message` field from the server's error body, if it sent one.
    pub server_message: Option<String>,
    detail: String,
}

impl RemoteError {
    pub fn from_response(status: u16, body: &str) -> Self {
        let server_message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|message| message.as_str())
                    .map(str::to_string)
            });

        Self {
            status: Some(status),
            detail: match &server_message {
                Some(message) => format!("API error {status}: {message}"),
                None => format!("API error {status}"),
            },
            server_message,
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self {
            status: None,
            server_message: None,
            detail: format!("request failed: {err}"),
        }
    }

    /// A 2xx response whose body did not have the expected shape.
    pub fn malformed(what: impl std::fmt::Display) -> Self {
        Self {
            status: None,
            server_message: None,
            detail: format!("malformed response: {what}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_passed_through() {
        let err = TrackerError::from(RemoteError::from_response(
            409,
            r#"{"message":"Task is closed"}"#,
        ));
        assert_eq!(err.user_message("Failed to start time tracking"), "Task is closed");
        assert_eq!(err.to_string(), "API error 409: Task is closed");
    }

    #[test]
    fn fallback_used_without_server_message() {
        let err = TrackerError::from(RemoteError::from_response(502, "<html>bad gateway</html>"));
        assert_eq!(
            err.user_message("Failed to stop time tracking"),
            "Failed to stop time tracking"
        );

        let err = TrackerError::from(RemoteError::transport("connection refused"));
        assert_eq!(err.user_message("Login failed"), "Login failed");
    }

    #[test]
    fn local_errors_use_their_own_text() {
        assert_eq!(
            TrackerError::NoActiveSession.user_message("ignored"),
            "No active time tracking session"
        );
        assert_eq!(TrackerError::Auth.user_message("ignored"), "Authentication error");
    }
}
