#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tempfile::TempDir;

use tracktime_lib::{
    api::TrackingApi,
    cadence::CadenceSettings,
    capture::{CaptureProvider, ScreenshotArtifact},
    error::{RemoteError, Result, TrackerError},
    models::{
        Credential, CurrentSession, LoginResponse, Project, Screenshot, ScreenshotSubmission,
        StartSessionRequest, Task, TimeLog, TimeLogList, UserProfile,
    },
    session::{Collaborators, SessionCore},
    store::StateStore,
    upload::UploadProvider,
    utils::MachineIdentity,
};

pub const TOKEN: &str = "token-123";
pub const MAC: &str = "aa:bb:cc:dd:ee:ff";

pub fn server_error(message: &str) -> TrackerError {
    let body = serde_json::json!({ "message": message }).to_string();
    TrackerError::Remote(RemoteError::from_response(500, &body))
}

pub fn time_log(id: &str, task_id: &str) -> TimeLog {
    TimeLog {
        id: id.into(),
        task_id: Some(task_id.into()),
        notes: None,
        start_time: Utc::now(),
        end_time: None,
        duration: None,
        project: None,
        task: None,
    }
}

/// In-memory tracking service. Holds one "current session" the way the
/// server does and records every call.
#[derive(Default)]
pub struct FakeApi {
    pub next_session_id: Mutex<Option<String>>,
    pub current: Mutex<Option<TimeLog>>,
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
    pub fail_current: AtomicBool,
    pub start_requests: Mutex<Vec<StartSessionRequest>>,
    pub stopped: Mutex<Vec<(String, Option<String>)>>,
    pub current_calls: AtomicUsize,
    pub submissions: Mutex<Vec<ScreenshotSubmission>>,
    /// Delay applied inside `current_session`, to make calls overlap.
    pub current_delay: Mutex<Duration>,
    pub start_delay: Mutex<Duration>,
    /// `stop_session` never answers, like a server that stopped responding.
    pub stop_hangs: AtomicBool,
}

impl FakeApi {
    pub fn with_session_id(self, id: &str) -> Self {
        *self.next_session_id.lock().unwrap() = Some(id.into());
        self
    }

    /// Pretend a session is already open on the server.
    pub fn open_remote_session(&self, id: &str) {
        *self.current.lock().unwrap() = Some(time_log(id, "task-remote"));
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn stop_calls(&self) -> usize {
        self.stopped.lock().unwrap().len()
    }

    pub fn start_calls(&self) -> usize {
        self.start_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TrackingApi for FakeApi {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        if password != "secret" {
            return Err(TrackerError::Remote(RemoteError::from_response(
                401,
                r#"{"message":"Invalid credentials"}"#,
            )));
        }
        Ok(LoginResponse {
            token: TOKEN.into(),
            employee: UserProfile {
                id: "emp-1".into(),
                email: Some(email.into()),
                first_name: Some("Ada".into()),
                last_name: None,
            },
        })
    }

    async fn start_session(&self, _token: &str, request: &StartSessionRequest) -> Result<TimeLog> {
        self.start_requests.lock().unwrap().push(request.clone());
        let delay = *self.start_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(server_error("Task is archived"));
        }

        let id = self
            .next_session_id
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| format!("log-{}", self.start_calls()));
        let mut log = time_log(&id, &request.task_id);
        log.notes = request.notes.clone();
        *self.current.lock().unwrap() = Some(log.clone());
        Ok(log)
    }

    async fn stop_session(&self, _token: &str, session_id: &str, notes: Option<&str>) -> Result<TimeLog> {
        self.stopped
            .lock()
            .unwrap()
            .push((session_id.to_string(), notes.map(str::to_string)));
        if self.stop_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(server_error("Service unavailable"));
        }

        let mut log = self
            .current
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| time_log(session_id, "task-1"));
        log.end_time = Some(Utc::now());
        Ok(log)
    }

    async fn current_session(&self, _token: &str) -> Result<CurrentSession> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.current_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_current.load(Ordering::SeqCst) {
            return Err(server_error("Database offline"));
        }

        Ok(match self.current.lock().unwrap().clone() {
            Some(log) => CurrentSession {
                active: true,
                time_log: Some(log),
            },
            None => CurrentSession::inactive(),
        })
    }

    async fn list_time_logs(&self, _token: &str, _start: NaiveDate, _end: NaiveDate) -> Result<TimeLogList> {
        Ok(TimeLogList {
            time_logs: Vec::new(),
            total_duration: 0,
        })
    }

    async fn submit_screenshot(&self, _token: &str, submission: &ScreenshotSubmission) -> Result<()> {
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(())
    }

    async fn list_screenshots(&self, _token: &str, _session_id: &str) -> Result<Vec<Screenshot>> {
        Ok(Vec::new())
    }

    async fn list_projects(&self, _token: &str) -> Result<Vec<Project>> {
        Ok(vec![Project {
            id: "p1".into(),
            name: "Website".into(),
            description: None,
        }])
    }

    async fn list_tasks(&self, _token: &str, project_id: &str) -> Result<Vec<Task>> {
        Ok(vec![Task {
            id: format!("{project_id}-t1"),
            name: "Landing page".into(),
            description: None,
            status: None,
        }])
    }
}

/// Writes a small file per capture, or refuses like a locked-down OS.
pub struct FakeCapture {
    dir: TempDir,
    pub deny: AtomicBool,
    pub attempts: AtomicUsize,
}

impl FakeCapture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            deny: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn files_left(&self) -> usize {
        std::fs::read_dir(self.dir.path()).unwrap().count()
    }
}

#[async_trait]
impl CaptureProvider for FakeCapture {
    async fn capture(&self, session_id: &str) -> Result<ScreenshotArtifact> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.deny.load(Ordering::SeqCst) {
            return Err(TrackerError::Permission);
        }
        let path = self.dir.path().join(format!("shot-{n}.png"));
        std::fs::write(&path, b"not really a png").unwrap();
        Ok(ScreenshotArtifact::new(path, session_id, Utc::now()))
    }
}

#[derive(Default)]
pub struct FakeUploader {
    pub uploaded: Mutex<Vec<PathBuf>>,
    pub fail: AtomicBool,
    /// Time spent "uploading", on the tokio clock.
    pub delay: Mutex<Duration>,
}

impl FakeUploader {
    pub fn upload_count(&self) -> usize {
        self.uploaded.lock().unwrap().len()
    }
}

#[async_trait]
impl UploadProvider for FakeUploader {
    async fn upload(&self, artifact: ScreenshotArtifact) -> Result<String> {
        self.uploaded
            .lock()
            .unwrap()
            .push(artifact.path().to_path_buf());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(TrackerError::Upload("host rejected image".into()));
        }
        Ok(format!("https://img.example/{}", artifact.file_name()))
    }
}

pub struct FixedIdentity;

impl MachineIdentity for FixedIdentity {
    fn mac_address(&self) -> String {
        MAC.into()
    }
}

/// A Session Core wired to fakes over a temporary state file.
pub struct Harness {
    pub core: SessionCore,
    pub api: Arc<FakeApi>,
    pub capture: Arc<FakeCapture>,
    pub uploader: Arc<FakeUploader>,
    pub store: Arc<StateStore>,
    pub dir: Arc<TempDir>,
}

impl Harness {
    pub fn new(api: FakeApi) -> Self {
        let dir = Arc::new(tempfile::tempdir().unwrap());
        Self::build(
            Arc::new(api),
            Arc::new(FakeCapture::new()),
            Arc::new(FakeUploader::default()),
            dir,
        )
    }

    pub fn logged_in(api: FakeApi) -> Self {
        let harness = Self::new(api);
        harness.login();
        harness
    }

    fn build(
        api: Arc<FakeApi>,
        capture: Arc<FakeCapture>,
        uploader: Arc<FakeUploader>,
        dir: Arc<TempDir>,
    ) -> Self {
        let store = Arc::new(StateStore::open(dir.path().join("state.json")).unwrap());
        let core = SessionCore::new(
            Collaborators {
                api: api.clone(),
                capture: capture.clone(),
                uploader: uploader.clone(),
                identity: Arc::new(FixedIdentity),
            },
            store.clone(),
            CadenceSettings::default(),
        );
        Self {
            core,
            api,
            capture,
            uploader,
            store,
            dir,
        }
    }

    /// A fresh process over the same state file and the same server.
    pub fn restart(&self) -> Self {
        Self::build(
            self.api.clone(),
            self.capture.clone(),
            self.uploader.clone(),
            self.dir.clone(),
        )
    }

    pub fn login(&self) {
        self.store
            .set_credential(Credential {
                token: TOKEN.into(),
                user: None,
            })
            .unwrap();
    }
}

/// Let spawned tasks run until they block, then advance the paused clock.
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

pub const PERIOD: Duration = Duration::from_secs(300);
