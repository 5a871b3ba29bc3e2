use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::{
    api::TrackingApi,
    cadence::{CadenceController, CadenceSettings, CycleContext},
    capture::CaptureProvider,
    error::{Result, TrackerError},
    models::{
        Credential, CurrentSession, LoginResponse, StartSessionRequest, TimeLog, UserData,
    },
    store::StateStore,
    upload::UploadProvider,
    utils::MachineIdentity,
};

use super::{SessionEvent, SessionState};

/// How long `teardown` waits for an in-flight screenshot cycle.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Upper bound on the stop request sent while quitting.
const TEARDOWN_STOP_DEADLINE: Duration = Duration::from_secs(10);

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub cadence_active: bool,
    pub elapsed_secs: Option<i64>,
}

/// The external capabilities the core drives.
pub struct Collaborators {
    pub api: Arc<dyn TrackingApi>,
    pub capture: Arc<dyn CaptureProvider>,
    pub uploader: Arc<dyn UploadProvider>,
    pub identity: Arc<dyn MachineIdentity>,
}

/// Owner of the active session: its in-memory state, the persisted session
/// pointer, the credential and the screenshot cadence ticket.
///
/// `start`, `stop`, `resume` and `logout` hold `transitions` for their whole
/// duration, so two of them never both observe `Idle` and both act. Readers
/// only take the short-lived `state` lock.
#[derive(Clone)]
pub struct SessionCore {
    state: Arc<Mutex<SessionState>>,
    transitions: Arc<Mutex<()>>,
    cadence: Arc<Mutex<CadenceController>>,
    cycle_ctx: CycleContext,
    identity: Arc<dyn MachineIdentity>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionCore {
    pub fn new(
        collaborators: Collaborators,
        store: Arc<StateStore>,
        settings: CadenceSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let Collaborators {
            api,
            capture,
            uploader,
            identity,
        } = collaborators;

        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            transitions: Arc::new(Mutex::new(())),
            cadence: Arc::new(Mutex::new(CadenceController::new(settings))),
            cycle_ctx: CycleContext {
                api,
                store,
                capture,
                uploader,
            },
            identity,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn api(&self) -> &dyn TrackingApi {
        self.cycle_ctx.api.as_ref()
    }

    pub fn store(&self) -> &StateStore {
        &self.cycle_ctx.store
    }

    pub(crate) fn require_token(&self) -> Result<String> {
        self.store().token().ok_or(TrackerError::Auth)
    }

    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await.clone();
        let cadence_active = self.cadence.lock().await.is_active();
        SessionSnapshot {
            elapsed_secs: state.elapsed_secs(Utc::now()),
            state,
            cadence_active,
        }
    }

    /// Ticket id of the live cadence and the number of tickets ever issued.
    pub async fn cadence_status(&self) -> (Option<u64>, u64) {
        let cadence = self.cadence.lock().await;
        (cadence.ticket_id(), cadence.tickets_issued())
    }

    /// Startup reconciliation. Never fails: any error leaves the core `Idle`.
    pub async fn init(&self) {
        if self.store().token().is_none() {
            info!("Not logged in; skipping session reconciliation");
            return;
        }

        match self.resume().await {
            Ok(current) => match current.active_log() {
                Some(log) => info!("Resumed active session {}", log.id),
                None => info!("No active session on the server"),
            },
            Err(err) => warn!("Startup session reconciliation failed: {}", err),
        }
    }

    /// Best-effort stop for process exit. Failures are logged, not retried.
    pub async fn teardown(&self) {
        let has_session = self.state.lock().await.active_session_id().is_some()
            || self.store().session_pointer().is_some();

        if has_session {
            match tokio::time::timeout(TEARDOWN_STOP_DEADLINE, self.stop(None)).await {
                Ok(Ok(log)) => info!("Stopped session {} on quit", log.id),
                Ok(Err(err)) => error!("Error stopping tracking on quit: {}", err),
                // The pointer survives, so the next start reconciles it.
                Err(_) => error!(
                    "Stopping tracking on quit timed out after {}s",
                    TEARDOWN_STOP_DEADLINE.as_secs()
                ),
            }
        }

        self.cadence.lock().await.shutdown(SHUTDOWN_GRACE).await;
    }

    pub async fn start(&self, task_id: &str, notes: Option<&str>) -> Result<TimeLog> {
        let _transition = self.transitions.lock().await;

        let in_memory = self.state.lock().await.active_session_id().map(str::to_string);
        // A pointer left by a crash or a failed reconciliation still names an
        // open remote session; it has to be stopped or resumed first.
        if let Some(active) = in_memory.or_else(|| self.store().session_pointer()) {
            return Err(TrackerError::AlreadyActive(active));
        }
        let token = self.require_token().map_err(|err| {
            error!("No auth token found, cannot start tracking");
            err
        })?;

        let identity = self.identity.clone();
        let mac_address = tokio::task::spawn_blocking(move || identity.mac_address())
            .await
            .unwrap_or_else(|err| {
                error!("Error getting MAC address: {}", err);
                String::new()
            });

        let request = StartSessionRequest {
            task_id: task_id.to_string(),
            notes: notes.map(str::to_string),
            mac_address,
        };

        let time_log = match self.api().start_session(&token, &request).await {
            Ok(time_log) => time_log,
            Err(err) => {
                error!("Error starting time tracking: {}", err);
                return Err(err);
            }
        };

        // The remote session exists now; losing the local pointer must not
        // also lose the in-memory session.
        if let Err(err) = self.store().set_session_pointer(&time_log.id) {
            error!("Failed to persist active session {}: {:#}", time_log.id, err);
        }
        self.state
            .lock()
            .await
            .begin_session(&time_log, task_id, notes);
        self.cadence
            .lock()
            .await
            .activate(time_log.id.clone(), self.cycle_ctx.clone());

        info!("Started session {} for task {}", time_log.id, task_id);
        self.emit_state_changed().await;
        Ok(time_log)
    }

    pub async fn stop(&self, notes: Option<&str>) -> Result<TimeLog> {
        let _transition = self.transitions.lock().await;
        self.stop_locked(notes).await
    }

    async fn stop_locked(&self, notes: Option<&str>) -> Result<TimeLog> {
        let in_memory = self.state.lock().await.active_session_id().map(str::to_string);
        let session_id = match in_memory.or_else(|| self.store().session_pointer()) {
            Some(session_id) => session_id,
            None => {
                warn!("No active time log found");
                return Err(TrackerError::NoActiveSession);
            }
        };

        let token = self.require_token().map_err(|err| {
            error!("No auth token found, cannot stop tracking");
            err
        })?;

        // No capture may run for a session the user has ended, whatever the
        // server says next.
        self.cadence.lock().await.deactivate();

        let result = self
            .api()
            .stop_session(&token, &session_id, notes)
            .await;

        if let Err(err) = self.store().clear_session_pointer() {
            error!("Failed to clear session pointer for {}: {:#}", session_id, err);
        }
        self.state.lock().await.finish();

        let message = match &result {
            Ok(_) => {
                info!("Stopped session {}", session_id);
                None
            }
            Err(err) => {
                error!("Error stopping time tracking for {}: {}", session_id, err);
                Some(err.user_message("Failed to stop time tracking"))
            }
        };
        self.emit(SessionEvent::SessionStopped {
            session_id,
            success: result.is_ok(),
            message,
        });
        self.emit_state_changed().await;

        result
    }

    /// Ask the server whether a session is open for this identity and adopt
    /// it, or clear local traces of one that no longer is.
    pub async fn resume(&self) -> Result<CurrentSession> {
        let _transition = self.transitions.lock().await;
        let token = self.require_token()?;

        let previous = self.state.lock().await.begin_reconcile();
        let current = match self.api().current_session(&token).await {
            Ok(current) => current,
            Err(err) => {
                self.state.lock().await.abort_reconcile(previous);
                error!("Error fetching current time log: {}", err);
                return Err(err);
            }
        };

        match current.active_log() {
            Some(time_log) => self.adopt(time_log).await,
            None => self.settle_inactive().await,
        }
        self.emit_state_changed().await;
        Ok(current)
    }

    async fn adopt(&self, time_log: &TimeLog) {
        if let Err(err) = self.store().set_session_pointer(&time_log.id) {
            error!("Failed to persist active session {}: {:#}", time_log.id, err);
        }
        self.state.lock().await.adopt(time_log);

        let mut cadence = self.cadence.lock().await;
        if cadence.session_id() == Some(time_log.id.as_str()) {
            debug!("Cadence already running for session {}", time_log.id);
        } else {
            cadence.activate(time_log.id.clone(), self.cycle_ctx.clone());
        }
    }

    async fn settle_inactive(&self) {
        if let Some(stale) = self.store().session_pointer() {
            warn!("Clearing pointer to session {} the server no longer reports", stale);
            if let Err(err) = self.store().clear_session_pointer() {
                error!("Failed to clear stale session pointer: {:#}", err);
            }
        }
        let canceled = self.cadence.lock().await.deactivate();
        if let Some(session_id) = canceled {
            warn!("Session {} ended elsewhere; screenshots stopped", session_id);
        }
        self.state.lock().await.finish();
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let response = self.api().login(email, password).await.map_err(|err| {
            error!("Login error: {}", err);
            err
        })?;

        self.store().set_credential(Credential {
            token: response.token.clone(),
            user: Some(response.employee.clone()),
        })?;
        info!("User logged in: {}", email);
        Ok(response)
    }

    /// Stop any open session, then forget the credential. The credential is
    /// cleared even if the stop fails.
    pub async fn logout(&self) -> Result<()> {
        let _transition = self.transitions.lock().await;

        let has_session = self.state.lock().await.active_session_id().is_some()
            || self.store().session_pointer().is_some();
        if has_session {
            if let Err(err) = self.stop_locked(None).await {
                warn!("Stopping tracking during logout failed: {}", err);
            }
        }

        // A stop refused before reaching the server (no credential) leaves
        // the cadence running; nothing may keep capturing past logout.
        let canceled = self.cadence.lock().await.deactivate();
        if let Some(session_id) = canceled {
            warn!("Canceled screenshots for session {} at logout", session_id);
            self.state.lock().await.finish();
            self.emit_state_changed().await;
        }

        self.store().clear_credential()?;
        info!("User logged out");
        self.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    pub fn user_data(&self) -> UserData {
        let credential = self.store().credential();
        UserData {
            is_authenticated: credential.is_some(),
            user: credential.and_then(|credential| credential.user),
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn emit_state_changed(&self) {
        let snapshot = self.snapshot().await;
        self.emit(SessionEvent::StateChanged { snapshot });
    }
}
