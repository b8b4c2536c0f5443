//! Single-attempt HTTP health probe.
//!
//! A probe is one GET against the health endpoint. Only a 2xx response
//! received before the deadline counts as healthy; connection errors,
//! non-2xx statuses, and timeouts are all failures. Failures are values,
//! not errors, so callers never need to handle a `Result` here.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, StatusCode, Uri, header};
use http_body_util::Full;
use tracing::{debug, info, warn};

use crate::client::{self, HttpClient};

/// Result of a single health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The health endpoint returned 2xx.
    Healthy(StatusCode),
    /// The health endpoint returned non-2xx.
    Unhealthy(StatusCode),
    /// The request could not be completed (connection or protocol error).
    Failed,
    /// No response arrived before the deadline.
    TimedOut,
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy(_))
    }
}

/// Something that can be asked whether the target is healthy.
pub trait Probe: Send + Sync {
    /// Make one attempt. `true` means healthy.
    fn probe(&self) -> impl Future<Output = bool> + Send;
}

/// Probes a fixed endpoint over HTTP(S).
#[derive(Clone)]
pub struct HttpProbe {
    client: HttpClient,
    endpoint: Uri,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: HttpClient, endpoint: Uri, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Run one probe and return the detailed outcome.
    pub async fn check(&self) -> ProbeOutcome {
        http_probe(&self.client, &self.endpoint, self.timeout).await
    }
}

impl Probe for HttpProbe {
    async fn probe(&self) -> bool {
        self.check().await.is_healthy()
    }
}

/// Perform an HTTP GET against `endpoint`.
///
/// The in-flight request is dropped when `timeout` elapses, which cancels
/// it and releases the connection.
pub async fn http_probe(client: &HttpClient, endpoint: &Uri, timeout: Duration) -> ProbeOutcome {
    info!(%endpoint, "checking health endpoint");

    let req = match Request::get(endpoint.clone())
        .header(header::USER_AGENT, client::USER_AGENT)
        .body(Full::new(Bytes::new()))
    {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, %endpoint, "failed to build health probe request");
            return ProbeOutcome::Failed;
        }
    };

    match tokio::time::timeout(timeout, client.request(req)).await {
        Ok(Ok(resp)) => {
            let status = resp.status();
            if status.is_success() {
                debug!(%status, %endpoint, "health probe succeeded");
                ProbeOutcome::Healthy(status)
            } else {
                warn!(%status, %endpoint, "health probe non-2xx");
                ProbeOutcome::Unhealthy(status)
            }
        }
        Ok(Err(e)) => {
            warn!(error = %e, %endpoint, "health probe request failed");
            ProbeOutcome::Failed
        }
        Err(_) => {
            warn!(
                %endpoint,
                timeout_ms = timeout.as_millis() as u64,
                "health probe timed out"
            );
            ProbeOutcome::TimedOut
        }
    }
}
