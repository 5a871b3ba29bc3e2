//! Hosting captured images somewhere the tracking service can link to.

mod image_host;

pub use image_host::ImageHostUploader;

use async_trait::async_trait;

use crate::{capture::ScreenshotArtifact, error::Result};

#[async_trait]
pub trait UploadProvider: Send + Sync {
    /// Upload the artifact and return its durable URL.
    ///
    /// The artifact is consumed: its local file is removed when this returns,
    /// on success and on failure alike.
    async fn upload(&self, artifact: ScreenshotArtifact) -> Result<String>;
}
