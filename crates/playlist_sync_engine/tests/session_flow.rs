mod common;

use std::time::Duration;

use common::{init_logging, pump_for, pump_until, runner_for, snapshot, PushFeed, ScriptedConnector};
use playlist_sync_core::{Affordance, JobStatus, Msg, TrackStatus, TransportMode};
use playlist_sync_engine::{PushEvent, SyncRunner};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAYLIST_URL: &str = "https://open.spotify.com/playlist/road-trip";

fn job_body(status: &str) -> serde_json::Value {
    json!({
        "job_id": "j1",
        "playlist_name": "Road Trip",
        "status": status,
        "tracks": [
            {"track": {"title": "One", "artist": "A", "album": "X"}, "status": "complete", "progress_pct": 100.0},
            {"track": {"title": "Two", "artist": "B", "album": "X"}, "status": "downloading", "progress_pct": 50.0},
            {"track": {"title": "Three", "artist": "C", "album": "X"}, "status": "pending"}
        ]
    })
}

async fn mount_startup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"configured": true})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/playlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "j1",
            "playlist_name": "Road Trip",
            "track_count": 3
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Starts with a playlist URL and waits until the first running snapshot
/// has been rendered through the push channel.
async fn running_session(server: &MockServer) -> (SyncRunner, std::sync::Arc<ScriptedConnector>, PushFeed) {
    mount_startup(server).await;
    let connector = ScriptedConnector::new();
    let feed = connector.expect_connection();
    let mut runner = runner_for(&server.uri(), connector.clone());

    runner.dispatch(Msg::Started {
        playlist_url: Some(PLAYLIST_URL.to_string()),
    });
    assert!(pump_until(&mut runner, |runner| runner
        .state()
        .transport_mode()
        == TransportMode::Push));
    assert!(pump_until(&mut runner, |_| connector.connected_jobs().len() == 1));

    feed.send(PushEvent::Snapshot(snapshot(job_body("running"))))
        .unwrap();
    assert!(pump_until(&mut runner, |runner| runner.state().view().rows.len() == 3));
    (runner, connector, feed)
}

async fn job_fetches(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == "GET" && request.url.path() == "/api/jobs/j1")
        .count()
}

#[tokio::test(flavor = "multi_thread")]
async fn submitted_playlist_streams_into_rows_and_stats() {
    init_logging();
    let server = MockServer::start().await;
    let (runner, connector, _feed) = running_session(&server).await;

    assert_eq!(connector.connected_jobs(), vec!["j1".to_string()]);
    let view = runner.state().view();
    let session = view.session.expect("session");
    assert_eq!(session.job_id, "j1");
    assert_eq!(session.playlist_name.as_deref(), Some("Road Trip"));
    assert_eq!(session.status, Some(JobStatus::Running));

    assert_eq!(view.stats.total_text(), "3 tracks");
    assert_eq!(view.stats.complete_text(), "1 complete");
    assert_eq!(view.stats.failed_text(), None);
    assert_eq!(view.stats.percent_text(), "33.3%");

    assert_eq!(view.rows[0].status_label, "Complete");
    assert_eq!(view.rows[1].progress_pct, Some(50.0));
    assert_eq!(view.rows[2].status, TrackStatus::Pending);
    assert_eq!(view.controls.stop, Affordance::ACTIVE);
    assert!(!view.controls.resume.visible);
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_disables_at_once_and_stopped_snapshot_offers_resume() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/j1/stop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "stopping"})))
        .expect(1)
        .mount(&server)
        .await;
    let (mut runner, _connector, feed) = running_session(&server).await;

    runner.dispatch(Msg::StopClicked);
    let controls = runner.state().view().controls;
    assert!(controls.stop.visible);
    assert!(!controls.stop.enabled);

    // A second click while the stop is in flight sends nothing.
    runner.dispatch(Msg::StopClicked);

    feed.send(PushEvent::Snapshot(snapshot(job_body("stopped"))))
        .unwrap();
    assert!(pump_until(&mut runner, |runner| runner
        .state()
        .view()
        .controls
        .resume
        .visible));
    pump_for(&mut runner, Duration::from_millis(100));

    let controls = runner.state().view().controls;
    assert_eq!(controls.resume, Affordance::ACTIVE);
    assert!(!controls.stop.visible);
    assert_eq!(runner.state().view().notice, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn clean_close_corrects_once_then_polls_to_completion() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body("running")))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "j1",
            "playlist_name": "Road Trip",
            "status": "complete",
            "tracks": [
                {"track": {"title": "One"}, "status": "complete", "progress_pct": 100.0},
                {"track": {"title": "Two"}, "status": "complete", "progress_pct": 100.0},
                {"track": {"title": "Three"}, "status": "failed", "error": "Timed out"}
            ]
        })))
        .mount(&server)
        .await;
    let (mut runner, connector, feed) = running_session(&server).await;

    feed.send(PushEvent::Closed).unwrap();
    assert!(pump_until(&mut runner, |runner| runner.state().transport_mode()
        == TransportMode::Poll));
    assert!(pump_until(&mut runner, |runner| {
        runner.state().transport_mode() == TransportMode::Idle
            && runner.state().session().and_then(|s| s.status()) == Some(&JobStatus::Complete)
    }));
    pump_for(&mut runner, Duration::from_millis(200));

    // Correction, one running poll, then the terminal poll.
    assert_eq!(job_fetches(&server).await, 3);
    assert_eq!(connector.connected_jobs().len(), 1);

    let view = runner.state().view();
    assert_eq!(view.stats.failed_text().as_deref(), Some("1 failed"));
    assert_eq!(view.rows[2].tooltip.as_deref(), Some("Timed out"));
    assert!(!view.controls.stop.visible);
    assert!(!view.controls.resume.visible);
}

#[tokio::test(flavor = "multi_thread")]
async fn push_failure_polls_same_job_and_resume_reopens_push() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body("stopped")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/j1/resume"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "resumed"})))
        .expect(1)
        .mount(&server)
        .await;
    let (mut runner, connector, feed) = running_session(&server).await;

    feed.send(PushEvent::Failed("connection reset".into()))
        .unwrap();
    assert!(pump_until(&mut runner, |runner| runner.state().transport_mode()
        == TransportMode::Poll));
    assert_eq!(runner.state().view().rows.len(), 3);

    assert!(pump_until(&mut runner, |runner| runner.state().transport_mode()
        == TransportMode::Idle));
    assert_eq!(runner.state().view().controls.resume, Affordance::ACTIVE);
    assert_eq!(runner.state().session().map(|s| s.job_id()), Some("j1"));

    let _second = connector.expect_connection();
    runner.dispatch(Msg::ResumeClicked);
    assert!(!runner.state().view().controls.resume.enabled);
    assert!(pump_until(&mut runner, |runner| runner.state().transport_mode()
        == TransportMode::Push));
    assert!(pump_until(&mut runner, |_| connector.connected_jobs().len() == 2));
    assert_eq!(connector.connected_jobs(), vec!["j1".to_string(), "j1".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn refused_push_falls_back_to_polling() {
    init_logging();
    let server = MockServer::start().await;
    mount_startup(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body("complete")))
        .mount(&server)
        .await;
    let connector = ScriptedConnector::new();
    connector.refuse_next("handshake rejected");
    let mut runner = runner_for(&server.uri(), connector.clone());

    runner.dispatch(Msg::Started {
        playlist_url: Some(PLAYLIST_URL.to_string()),
    });
    assert!(pump_until(&mut runner, |runner| {
        runner.state().session().and_then(|s| s.status()) == Some(&JobStatus::Complete)
    }));
    assert_eq!(runner.state().transport_mode(), TransportMode::Idle);
    assert_eq!(runner.state().view().rows.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn startup_without_url_resumes_tracking_of_the_active_job() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"configured": true})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"job_id": "old", "playlist_name": "Old", "status": "complete", "track_count": 4},
            {"job_id": "live", "playlist_name": "Live", "status": "running", "track_count": 2},
            {"job_id": "new", "playlist_name": "New", "status": "complete", "track_count": 1}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let connector = ScriptedConnector::new();
    let _feed = connector.expect_connection();
    let mut runner = runner_for(&server.uri(), connector.clone());

    runner.dispatch(Msg::Started { playlist_url: None });
    assert!(pump_until(&mut runner, |_| connector.connected_jobs().len() == 1));
    assert_eq!(connector.connected_jobs(), vec!["live".to_string()]);

    let session = runner.state().view().session.expect("session");
    assert_eq!(session.playlist_name.as_deref(), Some("Live"));
    assert_eq!(session.track_count_text.as_deref(), Some("2 tracks"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unconfigured_server_blocks_submission() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"configured": false})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/playlist"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let connector = ScriptedConnector::new();
    let mut runner = runner_for(&server.uri(), connector.clone());

    runner.dispatch(Msg::Started {
        playlist_url: Some(PLAYLIST_URL.to_string()),
    });
    assert!(pump_until(&mut runner, |runner| runner.state().configured() == Some(false)));
    pump_for(&mut runner, Duration::from_millis(100));

    assert!(runner.state().session().is_none());
    assert!(runner.state().view().notice.is_some());
    assert!(connector.connected_jobs().is_empty());
}
