//! HTTP/1.1 request parsing using the [`httparse`] crate.

use bytes::Bytes;
use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request head.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete — more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid Content-Length header: {value:?}")]
    InvalidContentLength { value: String },
}

/// A parsed HTTP/1.1 request.
///
/// [`Request::parse`] reads only the head; the body is attached afterwards
/// with [`Request::with_body`] once the [`BodyReader`](super::BodyReader) has
/// collected it off the wire.
///
/// # Examples
///
/// ```
/// use roster::http::request::Request;
///
/// let raw = b"GET /students?page=2 HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, _offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method().as_str(), "GET");
/// assert_eq!(request.path(), "/students");
/// assert_eq!(request.headers().get("host"), Some("localhost"));
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    content_length: Option<usize>,
    body: Bytes,
}

impl Request {
    /// Maximum number of headers we support per request.
    const MAX_HEADERS: usize = 64;

    /// Parse the head of an HTTP/1.1 request from a byte slice.
    ///
    /// Returns the parsed `Request` (with an empty body) and the byte offset at
    /// which the body begins in `buf`, i.e. immediately after the `\r\n\r\n`
    /// header terminator. The query string is dropped from the path; routing
    /// only ever looks at the path component.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`] — more data is needed to complete the head.
    /// - [`RequestError::Parse`] — the data is malformed and cannot be parsed.
    /// - [`RequestError::MissingField`] — method, path, or version is absent.
    /// - [`RequestError::InvalidContentLength`] — `Content-Length` is not a number.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let Ok(method) = raw_req
            .method
            .ok_or(RequestError::MissingField { field: "method" })?
            .parse::<Method>();

        let raw_path = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;
        let path = match raw_path.find('?') {
            Some(pos) => raw_path[..pos].to_owned(),
            None => raw_path.to_owned(),
        };

        let version = raw_req
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        let content_length = match header_map.get("content-length") {
            Some(value) => Some(value.trim().parse().map_err(|_| {
                RequestError::InvalidContentLength {
                    value: value.to_owned(),
                }
            })?),
            None => None,
        };

        Ok((
            Self {
                method,
                path,
                version,
                headers: header_map,
                content_length,
                body: Bytes::new(),
            },
            body_offset,
        ))
    }

    /// Attaches the fully-read request body.
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` if the connection should be kept alive after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive. HTTP/1.0 defaults to close unless
    /// `Connection: keep-alive` is explicitly set.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) => conn.eq_ignore_ascii_case("keep-alive"),
            None => self.version == 1,
        }
    }

    /// Returns the declared `Content-Length`, if the header was present.
    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// Returns `true` if the body is framed with `Transfer-Encoding` rather
    /// than `Content-Length`.
    pub fn has_transfer_encoding(&self) -> bool {
        self.headers.contains("transfer-encoding")
    }
}
