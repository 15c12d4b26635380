//! The student records API: record model, body validation, storage, and the
//! HTTP handlers that tie them together.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roster::students::{self, InMemoryStore};
//!
//! let router = students::routes(Arc::new(InMemoryStore::new()));
//! ```

pub mod handlers;
pub mod model;
pub mod store;
pub mod validate;

pub use handlers::{ApiError, routes};
pub use model::{NewStudent, Student, StudentId, StudentPatch};
pub use store::{InMemoryStore, StudentStore};
