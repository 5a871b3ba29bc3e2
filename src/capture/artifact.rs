use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// A captured screen image on local disk.
///
/// The file is deleted when the artifact is dropped, whichever way the
/// upload went. Upload providers take ownership, so the local copy is gone
/// once `upload` returns (or its future is dropped).
#[derive(Debug)]
pub struct ScreenshotArtifact {
    path: PathBuf,
    session_id: String,
    captured_at: DateTime<Utc>,
}

impl ScreenshotArtifact {
    pub fn new(path: PathBuf, session_id: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            path,
            session_id: session_id.into(),
            captured_at,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "screenshot.png".into())
    }
}

impl Drop for ScreenshotArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed local screenshot {}", self.path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => log::error!(
                "Error deleting local screenshot file {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}
