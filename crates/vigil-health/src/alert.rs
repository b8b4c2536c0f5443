//! Webhook alerts for detected bad health.
//!
//! The payload uses the embed layout accepted by Discord-style webhooks:
//!
//! ```json
//! { "content": null,
//!   "embeds": [ { "title": "Bad Health Detected", "color": 16711680,
//!                 "description": "Command: `pm2 restart app`",
//!                 "timestamp": "2026-10-16T08:30:00.000Z" } ] }
//! ```

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use http::{Request, StatusCode, Uri, header};
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{self, HttpClient};

pub const ALERT_TITLE: &str = "Bad Health Detected";

/// Red, as a 24-bit RGB integer.
pub const ALERT_COLOR: u32 = 0xFF0000;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("failed to encode alert payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build webhook request: {0}")]
    Request(#[from] http::Error),

    #[error("webhook delivery failed: {0}")]
    Delivery(#[from] hyper_util::client::legacy::Error),

    #[error("webhook delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("webhook responded with {0}")]
    Status(StatusCode),
}

/// JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub description: String,
    pub timestamp: String,
}

impl AlertPayload {
    /// The alert sent when a cycle exhausts its attempts.
    ///
    /// `command` is the recovery command that was started, if any; the
    /// description carries it verbatim, or nothing between the backticks.
    pub fn bad_health(command: Option<&str>, at: DateTime<Utc>) -> Self {
        Self {
            content: None,
            embeds: vec![Embed {
                title: ALERT_TITLE.to_string(),
                color: ALERT_COLOR,
                description: format!("Command: `{}`", command.unwrap_or_default()),
                timestamp: iso_timestamp(at),
            }],
        }
    }
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g.
/// `2026-10-16T08:30:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Posts alerts to a webhook URL.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: HttpClient,
    url: Uri,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(client: HttpClient, url: Uri, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    /// Deliver `payload` and wait for the response status.
    ///
    /// Any non-2xx response is reported as [`AlertError::Status`].
    pub async fn send(&self, payload: &AlertPayload) -> Result<StatusCode, AlertError> {
        let body = serde_json::to_vec(payload)?;
        let req = Request::post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, client::USER_AGENT)
            .body(Full::new(Bytes::from(body)))?;

        let resp = tokio::time::timeout(self.timeout, self.client.request(req))
            .await
            .map_err(|_| AlertError::Timeout(self.timeout))??;

        let status = resp.status();
        if status.is_success() {
            Ok(status)
        } else {
            Err(AlertError::Status(status))
        }
    }

    /// Deliver `payload` on a detached task that logs its own outcome.
    pub fn spawn_notify(&self, payload: AlertPayload) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            debug!(url = %this.url, "sending webhook alert");
            match this.send(&payload).await {
                Ok(status) => info!(url = %this.url, %status, "webhook alert delivered"),
                Err(e) => warn!(url = %this.url, error = %e, "webhook alert failed"),
            }
        })
    }
}
