//! Size-capped request body accumulation and JSON decoding.
//!
//! The connection loop feeds body bytes into a [`BodyReader`] as they arrive
//! off the socket. Exceeding the cap is a hard failure: the caller is expected
//! to drop the connection rather than answer it.

use bytes::{Bytes, BytesMut};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced while collecting or decoding a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds maximum allowed size of {max_bytes} bytes")]
    TooLarge { max_bytes: usize },

    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Request body must be a JSON object")]
    NotAnObject,
}

/// Incrementally accumulates a request body, enforcing a maximum size.
///
/// # Examples
///
/// ```
/// use roster::http::BodyReader;
///
/// let mut reader = BodyReader::new(8);
/// reader.push(b"{}").unwrap();
/// assert!(reader.push(b"0123456789").is_err());
/// ```
#[derive(Debug)]
pub struct BodyReader {
    buf: BytesMut,
    max_bytes: usize,
}

impl BodyReader {
    /// Creates a reader that accepts at most `max_bytes` of body.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_bytes,
        }
    }

    /// Appends a chunk of body bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::TooLarge`] once the accumulated body would exceed
    /// the cap. The chunk is not retained.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), BodyError> {
        if self.buf.len() + chunk.len() > self.max_bytes {
            return Err(BodyError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Number of body bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finishes accumulation and returns the collected body.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Decodes a complete body as JSON.
///
/// An empty body decodes to an empty object, so required-field validation
/// reports every field as missing instead of failing on syntax.
///
/// # Errors
///
/// Returns [`BodyError::InvalidJson`] for any non-empty body that is not
/// well-formed JSON.
pub fn parse_json(body: &[u8]) -> Result<Value, BodyError> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(BodyError::InvalidJson)
}

/// Decodes a complete body as a JSON object.
///
/// # Errors
///
/// As [`parse_json`], plus [`BodyError::NotAnObject`] when the document is
/// valid JSON of any other shape.
pub fn parse_json_object(body: &[u8]) -> Result<Map<String, Value>, BodyError> {
    match parse_json(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(BodyError::NotAnObject),
    }
}
