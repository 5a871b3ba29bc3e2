use chrono::Utc;
use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    api::TrackingApi,
    capture::CaptureProvider,
    error::TrackerError,
    models::ScreenshotSubmission,
    store::StateStore,
    upload::UploadProvider,
};

// Set to false to silence per-cycle logging
const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "cadence";

use crate::{log_debug, log_error, log_info, log_warn};

/// Everything a cycle needs, shared with the Session Core.
#[derive(Clone)]
pub struct CycleContext {
    pub api: Arc<dyn TrackingApi>,
    pub store: Arc<StateStore>,
    pub capture: Arc<dyn CaptureProvider>,
    pub uploader: Arc<dyn UploadProvider>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoCredential,
    PermissionDenied,
    CaptureFailed,
    UploadFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Submitted,
    Skipped(SkipReason),
    /// The ticket was canceled while the cycle was running; nothing was sent.
    Discarded,
    SubmitFailed,
}

/// Runs one cycle immediately, then one per `period`, until `cancel_token`
/// fires. No cycle failure ends the loop.
pub async fn cadence_loop(
    session_id: String,
    ctx: CycleContext,
    period: Duration,
    cycle_timeout: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!(
        "Starting screenshot cadence for session {} every {}s",
        session_id,
        period.as_secs()
    );

    loop {
        tokio::select! {
            // Cancellation wins over a tick that became ready at the same time.
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("Screenshot cadence for session {} stopped", session_id);
                break;
            }
            _ = ticker.tick() => {
                let fut = perform_cycle(&session_id, &ctx, &cancel_token);
                match tokio::time::timeout(cycle_timeout, fut).await {
                    Ok(outcome) => log_debug!("cycle for session {} finished: {:?}", session_id, outcome),
                    Err(_) => log_warn!(
                        "screenshot cycle timeout (> {}s) session {}",
                        cycle_timeout.as_secs(),
                        session_id
                    ),
                }
            }
        }
    }
}

/// One capture, upload and submit pass. Every failure is logged and folded
/// into the returned outcome.
pub async fn perform_cycle(
    session_id: &str,
    ctx: &CycleContext,
    cancel_token: &CancellationToken,
) -> CycleOutcome {
    if cancel_token.is_cancelled() {
        return CycleOutcome::Discarded;
    }

    let Some(token) = ctx.store.token() else {
        log_error!("No auth token found, skipping screenshot for session {}", session_id);
        return CycleOutcome::Skipped(SkipReason::NoCredential);
    };

    let artifact = match ctx.capture.capture(session_id).await {
        Ok(artifact) => artifact,
        Err(TrackerError::Permission) => {
            log_warn!("No screen recording permission, skipping screenshot for session {}", session_id);
            return CycleOutcome::Skipped(SkipReason::PermissionDenied);
        }
        Err(err) => {
            log_error!("Failed to capture screenshot for session {}: {}", session_id, err);
            return CycleOutcome::Skipped(SkipReason::CaptureFailed);
        }
    };

    let captured_at = artifact.captured_at();

    let image_url = match ctx.uploader.upload(artifact).await {
        Ok(url) => url,
        Err(err) => {
            log_error!("Failed to upload screenshot for session {}: {}", session_id, err);
            return CycleOutcome::Skipped(SkipReason::UploadFailed);
        }
    };

    if cancel_token.is_cancelled() {
        log_info!(
            "Session {} ended while uploading; discarding {}",
            session_id,
            image_url
        );
        return CycleOutcome::Discarded;
    }

    let submission = ScreenshotSubmission {
        time_log_id: session_id.to_string(),
        image_url,
        timestamp: captured_at,
        // A denied capture never yields an artifact.
        has_permission: true,
    };

    match ctx.api.submit_screenshot(&token, &submission).await {
        Ok(()) => {
            log_info!(
                "Screenshot uploaded for session {} ({}s after capture)",
                session_id,
                (Utc::now() - captured_at).num_seconds()
            );
            CycleOutcome::Submitted
        }
        Err(err) => {
            log_error!("Failed to submit screenshot for session {}: {}", session_id, err);
            CycleOutcome::SubmitFailed
        }
    }
}
