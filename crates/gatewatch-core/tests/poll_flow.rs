// End-to-end pull-path tests: SnapshotFetcher isolation and the
// monitor's poll-apply-publish cycle against a mock backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gatewatch_api::ApiClient;
use gatewatch_core::{ConnectionState, Monitor, MonitorConfig, SnapshotFetcher};

// ── Helpers ─────────────────────────────────────────────────────────

async fn mount_logs(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/access_logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_camera(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/camera_status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "camera_active": true,
            "detection_active": true,
            "camera_available": true
        })))
        .mount(server)
        .await;
}

async fn mount_stats(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/detection_stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn sample_logs() -> serde_json::Value {
    json!([
        {
            "timestamp": "2026-08-07T09:15:00",
            "detection_type": "license_plate",
            "detected_value": "MH-12-AB-5678",
            "student_name": "Rahul Kumar",
            "status": "granted",
            "confidence": 0.97
        },
        {
            "timestamp": "2026-08-07T09:10:12",
            "detection_type": "face",
            "detected_value": "face:88",
            "status": "denied"
        }
    ])
}

fn monitor_for(server: &MockServer) -> Monitor {
    let config = MonitorConfig {
        base_url: server.uri().parse().unwrap(),
        push_enabled: false,
        poll_interval: Duration::ZERO,
        ..MonitorConfig::default()
    };
    Monitor::new(config).unwrap()
}

// ── SnapshotFetcher ─────────────────────────────────────────────────

#[tokio::test]
async fn partial_endpoint_failure_is_isolated() {
    let server = MockServer::start().await;

    // access_logs is down; the other two endpoints work.
    Mock::given(method("GET"))
        .and(path("/api/access_logs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_camera(&server).await;
    mount_stats(&server, json!({ "total_detections": 3, "granted": 2, "denied": 1 })).await;

    let client = Arc::new(ApiClient::with_client(
        reqwest::Client::new(),
        server.uri().parse().unwrap(),
    ));
    let fetcher = SnapshotFetcher::new(client);

    let outcome = fetcher.poll_once(1).await;

    assert_eq!(outcome.seq, 1);
    assert!(outcome.logs.is_none());
    assert!(outcome.camera.is_some());
    assert_eq!(outcome.stats.unwrap().total_detections, 3);
}

#[tokio::test]
async fn total_failure_yields_empty_outcome() {
    let server = MockServer::start().await;
    // No mocks mounted: every endpoint 404s.

    let client = Arc::new(ApiClient::with_client(
        reqwest::Client::new(),
        server.uri().parse().unwrap(),
    ));
    let fetcher = SnapshotFetcher::new(client);

    let outcome = fetcher.poll_once(7).await;
    assert!(outcome.is_empty());
}

// ── Monitor pull cycle ──────────────────────────────────────────────

#[tokio::test]
async fn initial_poll_populates_the_dashboard() {
    let server = MockServer::start().await;
    mount_logs(&server, sample_logs()).await;
    mount_camera(&server).await;
    mount_stats(
        &server,
        json!({
            "total_detections": 10,
            "granted": 8,
            "denied": 2,
            "hourly_distribution": { "09:00": 10 }
        }),
    )
    .await;

    let monitor = monitor_for(&server);
    monitor.start().await.unwrap();

    let mut events_rx = monitor.events();
    tokio::time::timeout(Duration::from_secs(5), events_rx.wait_for(|e| !e.is_empty()))
        .await
        .expect("poll should populate events")
        .unwrap();

    let view = monitor.dashboard();
    assert_eq!(view.events.len(), 2);
    assert_eq!(view.events[0].detected_value, "MH-12-AB-5678");
    // Server stats merged over the locally derived figures.
    assert!(view.stats.granted >= 8);
    assert_eq!(view.stats.peak_hour, "09:00");
    assert!(view.camera.camera_active);
    // Push channel disabled: the supervisor stays down.
    assert_eq!(view.connection, ConnectionState::Disconnected);
    assert!(!view.has_live_frame);

    monitor.shutdown().await;
}

#[tokio::test]
async fn refresh_applies_the_latest_snapshot() {
    let server = MockServer::start().await;

    // First response is consumed by the initial poll...
    Mock::given(method("GET"))
        .and(path("/api/access_logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_logs()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // ...later polls see a shorter authoritative log.
    mount_logs(
        &server,
        json!([{
            "timestamp": "2026-08-07T10:00:00",
            "detection_type": "student_id",
            "detected_value": "STU-2025-042",
            "status": "granted"
        }]),
    )
    .await;
    mount_camera(&server).await;
    mount_stats(&server, json!({})).await;

    let monitor = monitor_for(&server);
    monitor.start().await.unwrap();

    let mut events_rx = monitor.events();
    tokio::time::timeout(Duration::from_secs(5), events_rx.wait_for(|e| e.len() == 2))
        .await
        .expect("initial poll")
        .unwrap();

    monitor.refresh().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), events_rx.wait_for(|e| e.len() == 1))
        .await
        .expect("refresh should replace the event list")
        .unwrap();

    let view = monitor.dashboard();
    assert_eq!(view.events[0].detected_value, "STU-2025-042");

    monitor.shutdown().await;
}

#[tokio::test]
async fn malformed_rows_are_dropped_not_null_filled() {
    let server = MockServer::start().await;
    mount_logs(
        &server,
        json!([
            {
                "timestamp": "2026-08-07T09:15:00",
                "detection_type": "license_plate",
                "detected_value": "GOOD-1",
                "status": "granted"
            },
            {
                "timestamp": "2026-08-07T09:16:00",
                "detection_type": "not_a_kind",
                "detected_value": "BAD-1",
                "status": "granted"
            },
            {
                "timestamp": "2026-08-07T09:17:00",
                "detection_type": "face",
                "detected_value": "GOOD-2",
                "status": "wat"
            }
        ]),
    )
    .await;
    mount_camera(&server).await;
    mount_stats(&server, json!({})).await;

    let monitor = monitor_for(&server);
    monitor.start().await.unwrap();

    let mut events_rx = monitor.events();
    tokio::time::timeout(Duration::from_secs(5), events_rx.wait_for(|e| !e.is_empty()))
        .await
        .expect("poll should populate events")
        .unwrap();

    let view = monitor.dashboard();
    assert_eq!(view.events.len(), 1);
    assert_eq!(view.events[0].detected_value, "GOOD-1");

    monitor.shutdown().await;
}
