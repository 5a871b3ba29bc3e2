use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use uuid::Uuid;

use super::{CaptureProvider, ScreenshotArtifact};
use crate::{
    config::CaptureConfig,
    error::{Result, TrackerError},
};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "capture";

use crate::{log_debug, log_warn};

const PATH_PLACEHOLDER: &str = "{path}";

/// Captures the whole screen by running the platform screenshot tool
/// (`screencapture` on macOS, `grim` on Wayland, ImageMagick `import` on X11)
/// or a configured command.
pub struct ScreenCommandCapture {
    output_dir: PathBuf,
    command: Option<Vec<String>>,
    min_bytes: u64,
}

impl ScreenCommandCapture {
    pub fn new(output_dir: PathBuf, command: Option<Vec<String>>, min_bytes: u64) -> Self {
        Self {
            output_dir,
            command,
            min_bytes,
        }
    }

    pub fn from_config(config: &CaptureConfig, output_dir: PathBuf) -> Self {
        Self::new(output_dir, config.command.clone(), config.min_bytes)
    }

    fn next_path(&self) -> PathBuf {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
        self.output_dir
            .join(format!("screenshot-{}-{}.png", timestamp, Uuid::new_v4()))
    }

    fn command_for(&self, path: &Path) -> Result<Vec<String>> {
        let path = path.to_string_lossy().into_owned();
        match &self.command {
            Some(template) if !template.is_empty() => Ok(template
                .iter()
                .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
                .collect()),
            Some(_) => Err(TrackerError::Capture("capture command is empty".into())),
            None => platform_command(path),
        }
    }
}

#[cfg(target_os = "macos")]
fn platform_command(path: String) -> Result<Vec<String>> {
    Ok(vec![
        "screencapture".into(),
        "-x".into(),
        "-t".into(),
        "png".into(),
        path,
    ])
}

#[cfg(all(unix, not(target_os = "macos")))]
fn platform_command(path: String) -> Result<Vec<String>> {
    if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        Ok(vec!["grim".into(), path])
    } else {
        Ok(vec!["import".into(), "-window".into(), "root".into(), path])
    }
}

#[cfg(not(unix))]
fn platform_command(_path: String) -> Result<Vec<String>> {
    Err(TrackerError::Capture(
        "no screenshot tool known for this platform; set capture.command".into(),
    ))
}

/// Checks a capture on disk. A file that is too small or has no pixels is
/// what the OS hands back when screen recording is not allowed.
pub(crate) fn validate_capture(path: &Path, min_bytes: u64) -> Result<(u32, u32)> {
    let size = std::fs::metadata(path)
        .map_err(|err| TrackerError::Capture(format!("no capture written: {err}")))?
        .len();
    if size < min_bytes {
        return Err(TrackerError::Permission);
    }

    let (width, height) = image::image_dimensions(path)
        .map_err(|err| TrackerError::Capture(format!("unreadable capture: {err}")))?;
    if width == 0 || height == 0 {
        return Err(TrackerError::Permission);
    }
    Ok((width, height))
}

fn looks_like_permission_denial(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    ["permission", "not authorized", "not permitted", "denied"]
        .iter()
        .any(|needle| stderr.contains(needle))
}

#[async_trait]
impl CaptureProvider for ScreenCommandCapture {
    async fn capture(&self, session_id: &str) -> Result<ScreenshotArtifact> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|err| {
                TrackerError::Storage(anyhow!(
                    "failed to create {}: {}",
                    self.output_dir.display(),
                    err
                ))
            })?;

        let path = self.next_path();
        // Owning the path up front means a partial file is removed on every
        // early return below.
        let artifact = ScreenshotArtifact::new(path.clone(), session_id, Utc::now());

        let argv = self.command_for(&path)?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| TrackerError::Capture("capture command is empty".into()))?;

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| TrackerError::Capture(format!("failed to run {program}: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if looks_like_permission_denial(&stderr) {
                log_warn!("No screen recording permission: {}", stderr.trim());
                return Err(TrackerError::Permission);
            }
            return Err(TrackerError::Capture(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        let min_bytes = self.min_bytes;
        let (width, height) =
            tokio::task::spawn_blocking(move || validate_capture(&path, min_bytes))
                .await
                .map_err(|err| TrackerError::Capture(format!("capture check failed: {err}")))??;

        log_debug!(
            "Screenshot saved to {} ({}x{})",
            artifact.path().display(),
            width,
            height
        );
        Ok(artifact)
    }
}
