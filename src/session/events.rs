use serde::Serialize;

use super::SessionSnapshot;

/// Notifications for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SessionEvent {
    StateChanged {
        snapshot: SessionSnapshot,
    },
    /// Sent on every stop attempt that reached the remote service, whether or
    /// not it succeeded. Local state is cleared either way.
    SessionStopped {
        session_id: String,
        success: bool,
        message: Option<String>,
    },
    LoggedOut,
}
