//! Per-request context handed to route handlers and middleware.
//!
//! Bundles the [`Request`] with the [`PathParams`] captured by the router.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::Request;
use crate::http::body::{self, BodyError};

/// Path parameters extracted from the matched route.
#[derive(Default, Debug, Clone)]
pub struct PathParams {
    map: HashMap<String, String>,
}

impl PathParams {
    /// Create a new empty parameters map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a captured value under `key`
    pub fn insert(&mut self, key: String, value: String) {
        self.map.insert(key, value);
    }

    /// Get a captured value by name
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }
}

/// Per-request context.
pub struct Context {
    request: Request,
    params: PathParams,
}

impl Context {
    /// Create a context with no captured path parameters
    pub fn new(request: Request) -> Self {
        Self::with_params(request, PathParams::new())
    }

    /// Create a context carrying the parameters captured by a route match
    pub fn with_params(request: Request, params: PathParams) -> Self {
        Self { request, params }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Decode the request body as a JSON object.
    ///
    /// An empty body yields an empty object.
    pub fn json_object(&self) -> Result<Map<String, Value>, BodyError> {
        body::parse_json_object(self.request.body())
    }
}
