//! # roster
//!
//! An in-memory student records JSON API, served by a from-scratch async
//! HTTP/1.1 server.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roster::{Config, Server};
//! use roster::middleware::LoggerMiddleware;
//! use roster::students::{self, InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = students::routes(Arc::new(InMemoryStore::new()));
//!     router.layer(LoggerMiddleware);
//!     let router = Arc::new(router);
//!
//!     let server = Server::from_config(&Config::default()).await?;
//!     server.run(move |req| {
//!         let router = Arc::clone(&router);
//!         async move { router.route(req).await }
//!     }).await?;
//!     Ok(())
//! }
//! ```

// ── Transport ─────────────────────────────────────────────────────────────────
pub mod config;
pub mod http;
pub mod server;

// ── Dispatch ──────────────────────────────────────────────────────────────────
pub mod context;
pub mod middleware;
pub mod router;

// ── Domain ────────────────────────────────────────────────────────────────────
pub mod students;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::Config;
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
