use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

use super::loop_worker::{cadence_loop, CycleContext};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "cadence";

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceSettings {
    pub period: Duration,
    pub cycle_timeout: Duration,
}

impl Default for CadenceSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(5 * 60),
            cycle_timeout: Duration::from_secs(120),
        }
    }
}

impl CadenceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            period: config.screenshot_interval(),
            cycle_timeout: config.cycle_timeout(),
        }
    }
}

/// The live recurring job, bound to one session.
struct CadenceTicket {
    id: u64,
    session_id: String,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns at most one live [`CadenceTicket`].
///
/// Canceling a ticket takes effect before its next tick: the loop checks the
/// token ahead of every cycle. A cycle already running finishes on its own
/// and drops its result; its task is kept in `retired` until it exits.
pub struct CadenceController {
    settings: CadenceSettings,
    ticket: Option<CadenceTicket>,
    retired: Vec<JoinHandle<()>>,
    issued: u64,
}

impl CadenceController {
    pub fn new(settings: CadenceSettings) -> Self {
        Self {
            settings,
            ticket: None,
            retired: Vec::new(),
            issued: 0,
        }
    }

    pub fn settings(&self) -> CadenceSettings {
        self.settings
    }

    /// Start a cadence for `session_id`, canceling any live ticket first.
    /// Returns the new ticket id.
    pub fn activate(&mut self, session_id: String, ctx: CycleContext) -> u64 {
        if let Some((old_id, old_session)) = self.retire_current() {
            log_info!(
                "Superseding cadence ticket {} (session {}) with session {}",
                old_id,
                old_session,
                session_id
            );
        }

        self.issued += 1;
        let id = self.issued;
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(cadence_loop(
            session_id.clone(),
            ctx,
            self.settings.period,
            self.settings.cycle_timeout,
            cancel_token.clone(),
        ));

        self.ticket = Some(CadenceTicket {
            id,
            session_id,
            cancel_token,
            handle,
        });
        id
    }

    /// Cancel the live ticket, returning the session it was bound to.
    pub fn deactivate(&mut self) -> Option<String> {
        self.retire_current().map(|(id, session_id)| {
            log_info!("Canceled cadence ticket {} for session {}", id, session_id);
            session_id
        })
    }

    pub fn is_active(&self) -> bool {
        self.ticket.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.ticket.as_ref().map(|ticket| ticket.session_id.as_str())
    }

    pub fn ticket_id(&self) -> Option<u64> {
        self.ticket.as_ref().map(|ticket| ticket.id)
    }

    /// Number of tickets ever activated by this controller.
    pub fn tickets_issued(&self) -> u64 {
        self.issued
    }

    /// Cancel everything and wait up to `grace` for running cycles to exit.
    /// Cycles still running after that are aborted.
    pub async fn shutdown(&mut self, grace: Duration) {
        self.deactivate();

        let deadline = Instant::now() + grace;
        for mut handle in std::mem::take(&mut self.retired) {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                log_warn!("Aborting screenshot cycle still running at shutdown");
                handle.abort();
            }
        }
    }

    fn retire_current(&mut self) -> Option<(u64, String)> {
        let ticket = self.ticket.take()?;
        ticket.cancel_token.cancel();

        self.retired.retain(|handle| !handle.is_finished());
        self.retired.push(ticket.handle);
        Some((ticket.id, ticket.session_id))
    }
}

impl Drop for CadenceController {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            ticket.cancel_token.cancel();
        }
    }
}
