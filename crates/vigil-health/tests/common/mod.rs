//! Scriptable HTTP server for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, Uri, header};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

struct ServerState {
    /// Status for the n-th request; the last entry repeats.
    statuses: Vec<u16>,
    delay: Option<Duration>,
    hits: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ServerState {
    async fn handle(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let index = self.hits.fetch_add(1, Ordering::SeqCst);

        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes().to_vec(),
            Err(_) => Vec::new(),
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path,
            content_type,
            body,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let status = self
            .statuses
            .get(index)
            .or(self.statuses.last())
            .copied()
            .unwrap_or(200);
        Response::builder()
            .status(status)
            .body(Full::new(Bytes::from_static(b"ok")))
            .unwrap()
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown: watch::Sender<bool>,
}

impl TestServer {
    /// Serve `statuses` in order, repeating the last one.
    pub async fn start(statuses: &[u16]) -> Self {
        Self::start_with_delay(statuses, None).await
    }

    /// Like [`TestServer::start`], but hold every response for `delay`.
    pub async fn start_with_delay(statuses: &[u16], delay: Option<Duration>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState {
            statuses: statuses.to_vec(),
            delay,
            hits: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let server_state = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { break };
                        let state = server_state.clone();
                        tokio::spawn(async move {
                            let svc = service_fn(move |req: Request<Incoming>| {
                                let state = state.clone();
                                async move { Ok::<_, hyper::Error>(state.handle(req).await) }
                            });
                            let _ = http1::Builder::new()
                                .serve_connection(TokioIo::new(stream), svc)
                                .await;
                        });
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        Self {
            addr,
            state,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> Uri {
        format!("http://{}{}", self.addr, path).parse().unwrap()
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Poll `check` every 20ms until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
