//! Webhook delivery failures against a live HTTP server.

mod common;

use std::time::Duration;

use chrono::Utc;
use http::StatusCode;
use vigil_health::{AlertError, AlertPayload, WebhookNotifier, build_client};

use common::TestServer;

#[tokio::test]
async fn slow_webhook_times_out() {
    let server = TestServer::start_with_delay(&[200], Some(Duration::from_secs(5))).await;
    let notifier = WebhookNotifier::new(
        build_client(),
        server.url("/hook"),
        Duration::from_millis(200),
    );
    let payload = AlertPayload::bad_health(Some("pm2 restart app"), Utc::now());

    let started = std::time::Instant::now();
    let err = notifier.send(&payload).await.unwrap_err();
    assert!(
        matches!(err, AlertError::Timeout(t) if t == Duration::from_millis(200)),
        "got {err:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(1));

    // The detached variant gives up just as quickly and only logs.
    let started = std::time::Instant::now();
    notifier.spawn_notify(payload).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn non_2xx_webhook_response_is_a_failure() {
    let server = TestServer::start(&[500]).await;
    let notifier =
        WebhookNotifier::new(build_client(), server.url("/hook"), Duration::from_secs(2));
    let payload = AlertPayload::bad_health(None, Utc::now());

    let err = notifier.send(&payload).await.unwrap_err();
    assert!(
        matches!(err, AlertError::Status(s) if s == StatusCode::INTERNAL_SERVER_ERROR),
        "got {err:?}"
    );
    assert_eq!(server.hits(), 1);

    notifier.spawn_notify(payload).await.unwrap();
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn accepted_webhook_returns_status() {
    let server = TestServer::start(&[204]).await;
    let notifier =
        WebhookNotifier::new(build_client(), server.url("/hook"), Duration::from_secs(2));

    let status = notifier
        .send(&AlertPayload::bad_health(None, Utc::now()))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
}
