//! Screen capture: producing a local image file on demand.

mod artifact;
mod command;

pub use artifact::ScreenshotArtifact;
pub use command::ScreenCommandCapture;

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Capture the screen for `session_id`.
    ///
    /// Returns [`TrackerError::Permission`](crate::error::TrackerError::Permission)
    /// when the OS refused (or silently blanked) the capture.
    async fn capture(&self, session_id: &str) -> Result<ScreenshotArtifact>;
}
