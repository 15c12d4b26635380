//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests to a handler function.
//! Supports HTTP/1.1 persistent connections (keep-alive) out of the box.
//!
//! Bodies are framed by `Content-Length` only and collected through a
//! [`BodyReader`]. A body that outgrows the configured cap gets no response
//! at all: the connection is dropped mid-read.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use serde_json::json;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::config::{Config, MAX_BODY_BYTES, MAX_HEAD_BYTES};
use crate::http::{
    BodyReader, StatusCode,
    request::{Request, RequestError},
    response::Response,
};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_body_bytes: usize,
    max_head_bytes: usize,
}

/// The HTTP server.
///
/// Binds to a TCP address and dispatches incoming HTTP/1.1 requests to a
/// handler function.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use roster::server::Server;
/// use roster::students::{self, InMemoryStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let router = Arc::new(students::routes(Arc::new(InMemoryStore::new())));
///     let server = Server::bind("127.0.0.1:5000").await?;
///     server.run(move |req| {
///         let router = Arc::clone(&router);
///         async move { router.route(req).await }
///     }).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    limits: Limits,
}

impl Server {
    /// Binds the server to the given TCP address with default size limits.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            limits: Limits {
                max_body_bytes: MAX_BODY_BYTES,
                max_head_bytes: MAX_HEAD_BYTES,
            },
        })
    }

    /// Binds to `config.listen_addr` and applies the configured size limits.
    ///
    /// # Errors
    ///
    /// As [`Server::bind`].
    pub async fn from_config(config: &Config) -> Result<Self, ServerError> {
        let mut server = Self::bind(&config.listen_addr).await?;
        server.limits = Limits {
            max_body_bytes: config.max_body_bytes,
            max_head_bytes: config.max_head_bytes,
        };
        Ok(server)
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting connections and dispatching requests to `handler`.
    ///
    /// The handler receives a [`Request`] with its body already collected and
    /// must return a [`Future`] that resolves to a [`Response`]. The handler is
    /// wrapped in an [`Arc`] and shared across all spawned Tokio tasks, so it
    /// must be `Send + Sync + 'static`.
    ///
    /// This method runs until the process is terminated or an unrecoverable
    /// listener error occurs.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        let handler = Arc::new(handler);
        info!(address = %self.local_addr, "listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);
            let limits = self.limits;

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, handler, limits).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

fn reject(status: StatusCode, message: &str) -> Response {
    Response::json(status, &json!({ "error": message })).keep_alive(false)
}

/// Handles a single TCP connection over its lifetime.
///
/// HTTP/1.1 connections are persistent by default: we loop, reading one
/// request per iteration, until the peer closes the connection or signals
/// `Connection: close`. Bytes that arrive after one request's body stay in
/// the buffer for the next iteration.
async fn handle_connection<H, F>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
    limits: Limits,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        let (request, body_offset) = loop {
            match Request::parse(&buf) {
                Ok(pair) => break pair,
                Err(RequestError::Incomplete) => {}
                Err(e) => {
                    warn!(peer = %peer_addr, error = %e, "bad request — sending 400");
                    let response = reject(StatusCode::BadRequest, "Bad Request");
                    stream.write_all(&response.into_bytes()).await?;
                    return Ok(());
                }
            }

            if buf.len() > limits.max_head_bytes {
                warn!(peer = %peer_addr, "request head too large — sending 413");
                let response = reject(StatusCode::PayloadTooLarge, "Request head too large");
                stream.write_all(&response.into_bytes()).await?;
                return Ok(());
            }

            if stream.read_buf(&mut buf).await? == 0 {
                debug!(peer = %peer_addr, "connection closed by peer");
                return Ok(());
            }
        };
        buf.advance(body_offset);

        if request.has_transfer_encoding() {
            warn!(peer = %peer_addr, "Transfer-Encoding bodies unsupported — sending 411");
            let response = reject(StatusCode::LengthRequired, "Length Required");
            stream.write_all(&response.into_bytes()).await?;
            return Ok(());
        }

        let content_length = request.content_length().unwrap_or(0);
        let expects_continue = request
            .headers()
            .get("expect")
            .is_some_and(|v| v.eq_ignore_ascii_case("100-continue"));
        if expects_continue && content_length > buf.len() {
            stream.write_all(CONTINUE).await?;
        }

        let mut body = BodyReader::new(limits.max_body_bytes);
        while body.len() < content_length {
            if buf.is_empty() && stream.read_buf(&mut buf).await? == 0 {
                debug!(peer = %peer_addr, "connection closed mid-body");
                return Ok(());
            }
            let take = (content_length - body.len()).min(buf.len());
            let chunk = buf.split_to(take);
            if let Err(e) = body.push(&chunk) {
                warn!(peer = %peer_addr, error = %e, "dropping connection");
                return Ok(());
            }
        }

        let request = request.with_body(body.finish());
        let keep_alive = request.is_keep_alive();

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = %request.path(),
            "dispatching request"
        );

        let response = handler(request).await.keep_alive(keep_alive);
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;

        if !keep_alive {
            debug!(peer = %peer_addr, "Connection: close — shutting down");
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::LoggerMiddleware;
    use crate::students::{self, InMemoryStore};

    async fn spawn_app(config: Config) -> SocketAddr {
        let mut router = students::routes(Arc::new(InMemoryStore::new()));
        router.layer(LoggerMiddleware);
        let router = Arc::new(router);

        let server = Server::from_config(&config).await.unwrap();
        let addr = server.local_addr();
        tokio::spawn(server.run(move |req| {
            let router = Arc::clone(&router);
            async move { router.route(req).await }
        }));
        addr
    }

    fn local() -> Config {
        Config::builder().listen_addr("127.0.0.1:0").build()
    }

    async fn exchange(addr: SocketAddr, raw: &[u8]) -> std::io::Result<String> {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(raw).await?;
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn post(path: &str, body: &str) -> Vec<u8> {
        format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
             Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn health_over_tcp() {
        let addr = spawn_app(local()).await;
        let res = exchange(
            addr,
            b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
        assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(res.contains("Content-Type: application/json\r\n"));
        assert!(res.contains("Connection: close\r\n"));
        assert!(res.ends_with(r#"{"status":"API running"}"#));
    }

    #[tokio::test]
    async fn create_over_tcp() {
        let addr = spawn_app(local()).await;
        let body = r#"{"name":"Ann","age":20,"course":"CS","year_level":2,"status":"active"}"#;
        let res = exchange(addr, &post("/students", body)).await.unwrap();
        assert!(res.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(res.ends_with(
            r#"{"student_id":1,"name":"Ann","age":20,"course":"CS","year_level":2,"status":"active"}"#
        ));
    }

    #[tokio::test]
    async fn keep_alive_serves_pipelined_requests() {
        let addr = spawn_app(local()).await;
        let raw = b"GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n\
                    GET /students HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
        let res = exchange(addr, raw).await.unwrap();
        assert_eq!(res.matches("HTTP/1.1 200 OK\r\n").count(), 2);
        assert!(res.contains("Connection: keep-alive\r\n"));
        assert!(res.ends_with("[]"));
    }

    #[tokio::test]
    async fn body_split_across_writes() {
        let addr = spawn_app(local()).await;
        let body = r#"{"name":"Ann","age":20,"course":"CS","year_level":2,"status":"active"}"#;
        let raw = post("/students", body);
        let (head, tail) = raw.split_at(raw.len() - 10);

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(head).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(tail).await.unwrap();

        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        assert!(out.starts_with("HTTP/1.1 201 Created\r\n"));
    }

    #[tokio::test]
    async fn oversized_body_drops_connection() {
        let config = Config::builder()
            .listen_addr("127.0.0.1:0")
            .max_body_bytes(16)
            .build();
        let addr = spawn_app(config).await;
        let body = format!(r#"{{"name":"{}"}}"#, "x".repeat(32));
        match exchange(addr, &post("/students", &body)).await {
            Ok(res) => assert!(res.is_empty(), "expected no response, got {res:?}"),
            Err(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset),
        }
    }

    #[tokio::test]
    async fn body_at_cap_is_accepted() {
        let config = Config::builder()
            .listen_addr("127.0.0.1:0")
            .max_body_bytes(2)
            .build();
        let addr = spawn_app(config).await;
        let res = exchange(addr, &post("/students", "{}")).await.unwrap();
        assert!(res.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(res.contains(r#""errors":["#));
    }

    #[tokio::test]
    async fn expect_continue_gets_interim_response() {
        let addr = spawn_app(local()).await;
        let body = r#"{"name":"Ann","age":20,"course":"CS","year_level":2,"status":"active"}"#;
        let head = format!(
            "POST /students HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
             Expect: 100-continue\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(head.as_bytes()).await.unwrap();

        let mut interim = [0u8; CONTINUE.len()];
        stream.read_exact(&mut interim).await.unwrap();
        assert_eq!(&interim[..], CONTINUE);

        stream.write_all(body.as_bytes()).await.unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        assert!(out.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(out.contains(r#""student_id":1"#));
    }

    #[tokio::test]
    async fn oversized_head_gets_413() {
        let config = Config::builder()
            .listen_addr("127.0.0.1:0")
            .max_head_bytes(64)
            .build();
        let addr = spawn_app(config).await;
        let raw = format!(
            "GET /students HTTP/1.1\r\nX-Padding: {}",
            "a".repeat(200)
        );
        let res = exchange(addr, raw.as_bytes()).await.unwrap();
        assert!(res.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
        assert!(res.contains("Connection: close\r\n"));
        assert!(res.ends_with(r#"{"error":"Request head too large"}"#));
    }

    #[tokio::test]
    async fn malformed_head_gets_400() {
        let addr = spawn_app(local()).await;
        let res = exchange(addr, b"NOT A REQUEST\r\n\r\n").await.unwrap();
        assert!(res.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(res.ends_with(r#"{"error":"Bad Request"}"#));
    }

    #[tokio::test]
    async fn chunked_body_gets_411() {
        let addr = spawn_app(local()).await;
        let raw = b"POST /students HTTP/1.1\r\nHost: localhost\r\n\
                    Transfer-Encoding: chunked\r\n\r\n2\r\n{}\r\n0\r\n\r\n";
        let res = exchange(addr, raw).await.unwrap();
        assert!(res.starts_with("HTTP/1.1 411 Length Required\r\n"));
    }

    #[tokio::test]
    async fn unknown_route_over_tcp() {
        let addr = spawn_app(local()).await;
        let res = exchange(
            addr,
            b"GET /students/abc HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
        assert!(res.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(res.ends_with(r#"{"error":"Route not found"}"#));
    }
}
