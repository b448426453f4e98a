//! Fake Docker Engine API server for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves:
//! - `GET /containers/{id}/json`: inspect payload (`Name`, `Config.Tty`)
//! - `GET /containers/{id}/logs`: buffered log output, honouring `tail`,
//!   optionally followed by live lines pushed through a [`LiveLog`]
//!
//! In production the engine is reached over a Unix socket; the client under
//! test is pointed at [`FakeDockerApi::base_url`] instead.

use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

const RAW_STREAM: &str = "application/vnd.docker.raw-stream";
const MULTIPLEXED_STREAM: &str = "application/vnd.docker.multiplexed-stream";

/// How a container's log body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// 8-byte frame headers, declared via `Content-Type`.
    Multiplexed,
    /// 8-byte frame headers, but labelled as a raw stream (older engines).
    MultiplexedUndeclared,
    /// TTY container: plain bytes.
    Raw,
}

/// Standard stream a buffered line was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Std {
    Out,
    Err,
}

struct Container {
    name: String,
    framing: Framing,
    lines: Vec<(Std, String)>,
    live: Option<mpsc::UnboundedReceiver<Bytes>>,
}

#[derive(Default)]
struct ApiState {
    containers: HashMap<String, Container>,
    /// Raw query strings received on /containers/{id}/logs, in order.
    log_queries: Vec<(String, String)>,
}

type Shared = Arc<Mutex<ApiState>>;

/// Handle to the running fake Docker API server.
pub struct FakeDockerApi {
    addr: SocketAddr,
    state: Shared,
}

/// Pushes frames into a container's log response after it has been opened.
pub struct LiveLog {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl LiveLog {
    pub fn send_stdout(&self, line: &str) {
        let _ = self.tx.send(Bytes::from(frame(Std::Out, &format!("{line}\n"))));
    }
}

impl FakeDockerApi {
    /// Start the fake Docker API server on a random port. Returns once the
    /// server is listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state: Shared = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new()
            .route("/containers/{id}/json", get(inspect_container))
            .route("/containers/{id}/logs", get(container_logs))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Register a container.
    pub async fn add_container(&self, id: &str, name: &str, framing: Framing) {
        let mut state = self.state.lock().await;
        state.containers.insert(
            id.to_string(),
            Container {
                name: name.to_string(),
                framing,
                lines: vec![],
                live: None,
            },
        );
    }

    /// Register a multiplexed container whose log response stays open and
    /// carries whatever is pushed through the returned [`LiveLog`].
    pub async fn add_live_container(&self, id: &str, name: &str) -> LiveLog {
        let (tx, rx) = mpsc::unbounded_channel();
        self.add_container(id, name, Framing::Multiplexed).await;
        let mut state = self.state.lock().await;
        if let Some(c) = state.containers.get_mut(id) {
            c.live = Some(rx);
        }
        LiveLog { tx }
    }

    /// Buffer a log line to be returned by /containers/{id}/logs.
    pub async fn push_log(&self, container_id: &str, stream: Std, line: &str) {
        let mut state = self.state.lock().await;
        if let Some(c) = state.containers.get_mut(container_id) {
            c.lines.push((stream, line.to_string()));
        }
    }

    /// Query strings received for log requests, as `(container id, query)`.
    pub async fn log_queries(&self) -> Vec<(String, String)> {
        self.state.lock().await.log_queries.clone()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn inspect_container(Path(id): Path<String>, State(state): State<Shared>) -> Response {
    let state = state.lock().await;
    match state.containers.get(&id) {
        Some(c) => Json(serde_json::json!({
            "Id": id,
            "Name": format!("/{}", c.name),
            "State": { "Status": "running" },
            "Config": { "Tty": c.framing == Framing::Raw, "Labels": {} }
        }))
        .into_response(),
        None => not_found(&id),
    }
}

async fn container_logs(
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    State(state): State<Shared>,
) -> Response {
    let mut state = state.lock().await;
    let query = query.unwrap_or_default();
    state.log_queries.push((id.clone(), query.clone()));

    let Some(c) = state.containers.get_mut(&id) else {
        return not_found(&id);
    };

    let tail = query
        .split('&')
        .find_map(|kv| kv.strip_prefix("tail="))
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(0);
    let skip = if tail > 0 { c.lines.len().saturating_sub(tail) } else { 0 };

    let mut body = Vec::new();
    for (std, line) in &c.lines[skip..] {
        let payload = format!("{line}\n");
        match c.framing {
            Framing::Raw => body.extend_from_slice(payload.as_bytes()),
            Framing::Multiplexed | Framing::MultiplexedUndeclared => {
                body.extend_from_slice(&frame(*std, &payload))
            }
        }
    }

    let content_type = match c.framing {
        Framing::Multiplexed => MULTIPLEXED_STREAM,
        Framing::MultiplexedUndeclared | Framing::Raw => RAW_STREAM,
    };

    let body = match c.live.take() {
        Some(rx) => {
            let backlog = stream::iter([Ok::<Bytes, std::io::Error>(Bytes::from(body))]);
            let live = stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|chunk| (Ok(chunk), rx))
            });
            Body::from_stream(backlog.chain(live))
        }
        None => Body::from(body),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .unwrap()
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": format!("No such container: {id}") })),
    )
        .into_response()
}

/// Encode one multiplexed frame.
pub fn frame(stream: Std, payload: &str) -> Vec<u8> {
    let kind = match stream {
        Std::Out => 1u8,
        Std::Err => 2u8,
    };
    let mut out = vec![kind, 0, 0, 0];
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload.as_bytes());
    out
}
