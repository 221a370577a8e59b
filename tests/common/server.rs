//! A local HTTP server standing in for download origins.
//!
//! It serves one payload under every path, honors `Range: bytes=N-` unless
//! told otherwise, and records what it was asked for so tests can check the
//! requests the downloader made.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::StreamExt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How the server misbehaves.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    /// Answer every GET with the full payload and `200`.
    pub ignore_range: bool,
    /// Answer HEAD with `405`, leaving the size unknown to the client.
    pub no_head: bool,
    /// Cut the first GET's body after this many bytes.
    pub truncate_first_at: Option<usize>,
    /// Answer the GET with this index and every later one with `500`.
    pub fail_from: Option<usize>,
    /// Wait this long before answering each GET.
    pub delay: Duration,
}

struct ServerState {
    payload: Bytes,
    behavior: Behavior,
    ranges: Mutex<Vec<Option<String>>>,
    gets: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a ServerState);

impl<'a> InFlight<'a> {
    fn enter(state: &'a ServerState) -> Self {
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct TestServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(payload: Vec<u8>, behavior: Behavior) -> Self {
        let state = Arc::new(ServerState {
            payload: Bytes::from(payload),
            behavior,
            ranges: Mutex::new(Vec::new()),
            gets: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/{*path}", get(get_file).head(head_file))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Test server has no address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server stopped");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path)
    }

    /// The `Range` header of every GET, in arrival order.
    pub fn ranges(&self) -> Vec<Option<String>> {
        self.state.ranges.lock().unwrap().clone()
    }

    pub fn get_count(&self) -> usize {
        self.state.gets.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn head_file(State(state): State<Arc<ServerState>>) -> Response {
    if state.behavior.no_head {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    (
        StatusCode::OK,
        [(header::CONTENT_LENGTH, state.payload.len().to_string())],
    )
        .into_response()
}

async fn get_file(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    state.ranges.lock().unwrap().push(range.clone());
    let index = state.gets.fetch_add(1, Ordering::SeqCst);

    {
        let _flight = InFlight::enter(&state);
        if !state.behavior.delay.is_zero() {
            tokio::time::sleep(state.behavior.delay).await;
        }
    }

    if state.behavior.fail_from.is_some_and(|from| index >= from) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let payload = state.payload.clone();
    let len = payload.len();

    if let Some(cut) = state.behavior.truncate_first_at.filter(|_| index == 0) {
        let head = payload.slice(..cut.min(len));
        let body = futures::stream::iter(vec![Ok::<_, io::Error>(head)]).chain(
            futures::stream::once(async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(io::Error::other("connection dropped by test server"))
            }),
        );
        return (
            StatusCode::OK,
            [(header::CONTENT_LENGTH, len.to_string())],
            Body::from_stream(body),
        )
            .into_response();
    }

    let start = range
        .filter(|_| !state.behavior.ignore_range)
        .and_then(|range| {
            range
                .strip_prefix("bytes=")
                .and_then(|r| r.strip_suffix('-'))
                .and_then(|n| n.parse::<usize>().ok())
        });

    match start {
        Some(start) if start >= len => StatusCode::RANGE_NOT_SATISFIABLE.into_response(),
        Some(start) => (
            StatusCode::PARTIAL_CONTENT,
            [(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, len - 1, len),
            )],
            payload.slice(start..),
        )
            .into_response(),
        None => (StatusCode::OK, payload).into_response(),
    }
}
