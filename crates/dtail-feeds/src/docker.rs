//! Docker Engine API client.
//!
//! Speaks HTTP/1.1 with `hyper` directly over the engine socket, opening one
//! connection per request. The log connection lives exactly as long as the
//! returned [`LogStream`]: dropping the stream tears the connection down, which
//! is how a blocked follow-mode read gets interrupted.
//!
//! Log framing follows the container's TTY flag from inspect: TTY containers
//! stream raw bytes, all others multiplexed frames.
//!
//! Tests point the client at a TCP base URL (`http://127.0.0.1:PORT`) served by
//! a fake engine; production uses the Unix socket.

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use dtail_core::{Source, StreamOptions};
use futures::TryStreamExt;
use http_body_util::{BodyDataStream, BodyExt, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1::SendRequest;
use hyper::header::HOST;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use crate::error::FeedError;
use crate::frame::FrameDecoder;
use crate::{LogFeed, LogStream, Metadata};

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Where the engine listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    /// `host:port`
    Tcp(String),
}

impl Endpoint {
    /// Parse a `DOCKER_HOST`-style address: `unix:///path`, `tcp://host:port`,
    /// `http://host:port`, or a bare absolute socket path.
    pub fn parse(host: &str) -> Result<Self, FeedError> {
        let invalid = || FeedError::InvalidEndpoint(host.to_string());

        if let Some(path) = host.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }
        if let Some(rest) = host.strip_prefix("tcp://").or_else(|| host.strip_prefix("http://")) {
            let authority = rest.trim_end_matches('/');
            if authority.is_empty() || authority.contains('/') {
                return Err(invalid());
            }
            return Ok(Endpoint::Tcp(authority.to_string()));
        }
        if host.starts_with('/') {
            return Ok(Endpoint::Unix(PathBuf::from(host)));
        }
        Err(invalid())
    }

    fn host_header(&self) -> &str {
        match self {
            Endpoint::Unix(_) => "docker",
            Endpoint::Tcp(authority) => authority,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Tcp(authority) => write!(f, "tcp://{authority}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct InspectResponse {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Config", default)]
    config: Option<InspectConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct InspectConfig {
    #[serde(rename = "Tty", default)]
    tty: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Docker Engine API client.
#[derive(Debug, Clone)]
pub struct DockerClient {
    endpoint: Endpoint,
}

impl DockerClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    /// Build a client from a `DOCKER_HOST`-style address.
    pub fn from_host(host: &str) -> Result<Self, FeedError> {
        Endpoint::parse(host).map(Self::new)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// `GET /containers/{id}/json`.
    pub async fn inspect_container(&self, container_id: &str) -> Result<Metadata, FeedError> {
        let resp = self.get(&format!("/containers/{container_id}/json")).await?;
        let body = resp.into_body().collect().await?.to_bytes();
        let parsed: InspectResponse = serde_json::from_slice(&body)?;
        Ok(Metadata {
            name: parsed.name,
            tty: parsed.config.unwrap_or_default().tty,
        })
    }

    /// `GET /containers/{id}/logs`. Output of a non-TTY container has its
    /// multiplexed framing removed; TTY output is passed through untouched.
    pub async fn container_logs(
        &self,
        container_id: &str,
        tty: bool,
        opts: &StreamOptions,
    ) -> Result<LogStream, FeedError> {
        let resp = self.get(&logs_path(container_id, opts)).await?;
        let body = BodyDataStream::new(resp.into_body()).map_err(std::io::Error::other);
        let reader = StreamReader::new(Box::pin(body));
        tracing::debug!(container_id, tty, "log stream opened");

        if tty {
            Ok(Box::pin(reader))
        } else {
            let payloads = FramedRead::new(reader, FrameDecoder).map_ok(|frame| frame.payload);
            Ok(Box::pin(StreamReader::new(payloads)))
        }
    }

    async fn get(&self, path_and_query: &str) -> Result<Response<Incoming>, FeedError> {
        let mut sender = self.connect().await?;
        let req = Request::builder()
            .method(Method::GET)
            .uri(path_and_query)
            .header(HOST, self.endpoint.host_header())
            .body(Empty::<Bytes>::new())?;

        let resp = sender.send_request(req).await?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(status_error(resp).await)
        }
    }

    async fn connect(&self) -> Result<SendRequest<Empty<Bytes>>, FeedError> {
        let connect_err = |source| FeedError::Connect {
            endpoint: self.endpoint.to_string(),
            source,
        };
        match &self.endpoint {
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path).await.map_err(connect_err)?;
                handshake(stream).await
            }
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(FeedError::InvalidEndpoint(self.endpoint.to_string())),
            Endpoint::Tcp(authority) => {
                let stream = TcpStream::connect(authority.as_str()).await.map_err(connect_err)?;
                handshake(stream).await
            }
        }
    }
}

impl LogFeed for DockerClient {
    async fn inspect(&self, container_id: &str) -> Result<Metadata, FeedError> {
        self.inspect_container(container_id).await
    }

    async fn open_log_stream(
        &self,
        source: &Source,
        opts: &StreamOptions,
    ) -> Result<LogStream, FeedError> {
        self.container_logs(&source.id, source.tty, opts).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Request path for a container's logs. Both stdout and stderr are requested;
/// `tail` is only sent when positive so the engine default (everything) holds.
pub fn logs_path(container_id: &str, opts: &StreamOptions) -> String {
    let mut path = format!("/containers/{container_id}/logs?stdout=1&stderr=1");
    if opts.follow {
        path.push_str("&follow=1");
    }
    if opts.tail > 0 {
        path.push_str(&format!("&tail={}", opts.tail));
    }
    path
}

async fn handshake<T>(io: T) -> Result<SendRequest<Empty<Bytes>>, FeedError>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(io)).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(error = %e, "engine connection closed with error");
        }
    });
    Ok(sender)
}

async fn status_error(resp: Response<Incoming>) -> FeedError {
    let status = resp.status();
    let body = match resp.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return FeedError::Http(e),
    };
    let message = serde_json::from_slice::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(&body).trim().to_string();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                text
            }
        });
    FeedError::Status {
        status: status.as_u16(),
        message,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
