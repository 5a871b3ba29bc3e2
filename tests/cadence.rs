mod common;

use std::{sync::atomic::Ordering, time::Duration};

use common::{advance, FakeApi, Harness, PERIOD};
use tracktime_lib::models::Credential;

const SETTLE: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn first_cycle_is_immediate_then_every_period() {
    let h = Harness::logged_in(FakeApi::default().with_session_id("abc"));
    h.core.start("task-1", Some("working")).await.unwrap();

    advance(SETTLE).await;
    assert_eq!(h.api.submission_count(), 1);

    advance(PERIOD).await;
    assert_eq!(h.api.submission_count(), 2);

    advance(PERIOD).await;
    assert_eq!(h.api.submission_count(), 3);

    let submissions = h.api.submissions.lock().unwrap();
    assert!(submissions.iter().all(|s| s.time_log_id == "abc" && s.has_permission));
    assert!(submissions[0].image_url.starts_with("https://img.example/"));
}

#[tokio::test(start_paused = true)]
async fn stop_between_cycles_prevents_the_next_one() {
    let h = Harness::logged_in(FakeApi::default().with_session_id("abc"));
    h.core.start("task-1", Some("working")).await.unwrap();

    advance(SETTLE).await;
    assert_eq!(h.api.submission_count(), 1);

    advance(Duration::from_secs(120)).await;
    h.core.stop(Some("done")).await.unwrap();

    advance(PERIOD * 3).await;
    assert_eq!(h.capture.attempts(), 1);
    assert_eq!(h.api.submission_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_on_tick_boundary_prevents_the_cycle() {
    let h = Harness::logged_in(FakeApi::default().with_session_id("abc"));
    h.core.start("task-1", None).await.unwrap();
    advance(SETTLE).await;

    // Wake on the instant the next tick is due. The test body is polled
    // before the cadence task, so the tick is ready but has not run when
    // `stop` cancels it.
    advance(PERIOD - SETTLE).await;
    h.core.stop(None).await.unwrap();
    advance(PERIOD * 3).await;

    assert_eq!(h.capture.attempts(), 1);
    assert_eq!(h.api.submission_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn in_flight_cycle_result_is_discarded_after_stop() {
    let h = Harness::logged_in(FakeApi::default().with_session_id("abc"));
    *h.uploader.delay.lock().unwrap() = Duration::from_secs(10);

    h.core.start("task-1", None).await.unwrap();
    advance(Duration::from_secs(5)).await;
    assert_eq!(h.uploader.upload_count(), 1);

    h.core.stop(None).await.unwrap();
    advance(Duration::from_secs(30)).await;

    assert_eq!(h.api.submission_count(), 0);
    assert_eq!(h.capture.files_left(), 0);
}

#[tokio::test(start_paused = true)]
async fn permission_denied_skips_cycle_and_keeps_cadence() {
    let h = Harness::logged_in(FakeApi::default().with_session_id("abc"));
    h.capture.deny.store(true, Ordering::SeqCst);

    h.core.start("task-1", None).await.unwrap();
    advance(SETTLE).await;

    assert_eq!(h.capture.attempts(), 1);
    assert_eq!(h.uploader.upload_count(), 0);
    assert_eq!(h.api.submission_count(), 0);
    assert!(h.core.snapshot().await.cadence_active);

    h.capture.deny.store(false, Ordering::SeqCst);
    advance(PERIOD).await;

    assert_eq!(h.capture.attempts(), 2);
    assert_eq!(h.api.submission_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn upload_failure_removes_file_and_continues() {
    let h = Harness::logged_in(FakeApi::default().with_session_id("abc"));
    h.uploader.fail.store(true, Ordering::SeqCst);

    h.core.start("task-1", None).await.unwrap();
    advance(SETTLE).await;

    assert_eq!(h.uploader.upload_count(), 1);
    assert_eq!(h.api.submission_count(), 0);
    assert_eq!(h.capture.files_left(), 0);

    h.uploader.fail.store(false, Ordering::SeqCst);
    advance(PERIOD).await;
    assert_eq!(h.api.submission_count(), 1);
    assert_eq!(h.capture.files_left(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_credential_skips_cycle_without_capturing() {
    let h = Harness::logged_in(FakeApi::default().with_session_id("abc"));
    h.core.start("task-1", None).await.unwrap();
    advance(SETTLE).await;
    assert_eq!(h.capture.attempts(), 1);

    h.store.clear_credential().unwrap();
    advance(PERIOD).await;

    assert_eq!(h.capture.attempts(), 1);
    assert!(h.core.snapshot().await.cadence_active);

    h.store
        .set_credential(Credential {
            token: common::TOKEN.into(),
            user: None,
        })
        .unwrap();
    advance(PERIOD).await;
    assert_eq!(h.api.submission_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn new_session_supersedes_cadence() {
    let h = Harness::logged_in(FakeApi::default());
    h.core.start("task-1", None).await.unwrap();
    advance(SETTLE).await;
    h.core.stop(None).await.unwrap();

    h.core.start("task-2", None).await.unwrap();
    advance(SETTLE).await;

    assert_eq!(h.core.cadence_status().await, (Some(2), 2));
    let submissions = h.api.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].time_log_id, "log-1");
    assert_eq!(submissions[1].time_log_id, "log-2");
}
