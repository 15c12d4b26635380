//! HTTP handlers for the student records API and the route table that
//! binds them.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::debug;

use super::model::StudentId;
use super::store::StudentStore;
use super::validate;
use crate::context::Context;
use crate::http::BodyError;
use crate::router::{IntoHandler, Router};
use crate::{Response, StatusCode};

/// Everything a handler can fail with, mapped to a status and JSON body by
/// [`ApiError::into_response`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Body(#[from] BodyError),

    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Student not found")]
    NotFound,

    #[error("Route not found")]
    RouteNotFound,
}

impl ApiError {
    pub fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                Response::json(StatusCode::BadRequest, &json!({ "errors": errors }))
            }
            ApiError::Body(_) => error_body(StatusCode::BadRequest, &self),
            ApiError::NotFound | ApiError::RouteNotFound => error_body(StatusCode::NotFound, &self),
        }
    }
}

fn error_body(status: StatusCode, error: &ApiError) -> Response {
    Response::json(status, &json!({ "error": error.to_string() }))
}

type Outcome = Result<Response, ApiError>;

/// Builds the route table for the API over `store`.
///
/// | Method | Path             | Handler            |
/// |--------|------------------|--------------------|
/// | GET    | `/health`        | [`health`]         |
/// | GET    | `/students`      | [`list_students`]  |
/// | POST   | `/students`      | [`create_student`] |
/// | GET    | `/students/{id}` | [`get_student`]    |
/// | PUT    | `/students/{id}` | [`replace_student`]|
/// | PATCH  | `/students/{id}` | [`update_student`] |
/// | DELETE | `/students/{id}` | [`delete_student`] |
///
/// Anything else answers 404 `{"error":"Route not found"}`.
pub fn routes<S: StudentStore>(store: Arc<S>) -> Router {
    const ONE: &str = r"/students/:id(\d+)";

    let mut router = Router::new();
    router.get("/health", |_ctx: Context| async { health() });
    router.get("/students", with_store(&store, list_students::<S>));
    router.post("/students", with_store(&store, create_student::<S>));
    router.get(ONE, with_store(&store, get_student::<S>));
    router.put(ONE, with_store(&store, replace_student::<S>));
    router.patch(ONE, with_store(&store, update_student::<S>));
    router.delete(ONE, with_store(&store, delete_student::<S>));
    router.fallback(|_ctx: Context| async { ApiError::RouteNotFound.into_response() });
    router
}

// Adapts a synchronous store operation into an async route handler.
fn with_store<S: StudentStore>(
    store: &Arc<S>,
    op: fn(&S, &Context) -> Outcome,
) -> impl IntoHandler + use<S> {
    let store = Arc::clone(store);
    move |ctx: Context| {
        let store = Arc::clone(&store);
        async move { op(&store, &ctx).unwrap_or_else(ApiError::into_response) }
    }
}

// `/students/{id}`: the router guarantees digits; ids beyond u64 cannot exist.
fn student_id(ctx: &Context) -> Result<StudentId, ApiError> {
    let raw = ctx.params().get("id").ok_or(ApiError::RouteNotFound)?;
    raw.parse().map_err(|_| ApiError::NotFound)
}

pub fn health() -> Response {
    Response::json(StatusCode::Ok, &json!({ "status": "API running" }))
}

pub fn list_students<S: StudentStore>(store: &S, _ctx: &Context) -> Outcome {
    Ok(Response::json(StatusCode::Ok, &store.list()))
}

pub fn create_student<S: StudentStore>(store: &S, ctx: &Context) -> Outcome {
    let fields = validate::new_student(ctx.json_object()?).map_err(ApiError::Validation)?;
    let student = store.insert(fields);
    debug!(student_id = student.student_id, "student created");
    Ok(Response::json(StatusCode::Created, &student))
}

pub fn get_student<S: StudentStore>(store: &S, ctx: &Context) -> Outcome {
    let student = store.get(student_id(ctx)?).ok_or(ApiError::NotFound)?;
    Ok(Response::json(StatusCode::Ok, &student))
}

/// Full replacement. The body is validated before the id is looked up, so a
/// bad body on a missing id is a 400, not a 404.
pub fn replace_student<S: StudentStore>(store: &S, ctx: &Context) -> Outcome {
    let fields = validate::new_student(ctx.json_object()?).map_err(ApiError::Validation)?;
    let id = student_id(ctx)?;
    let student = store.replace(id, fields).ok_or(ApiError::NotFound)?;
    debug!(student_id = id, "student replaced");
    Ok(Response::json(StatusCode::Ok, &student))
}

/// Partial update with the same validate-then-lookup ordering as
/// [`replace_student`].
pub fn update_student<S: StudentStore>(store: &S, ctx: &Context) -> Outcome {
    let patch = validate::student_patch(ctx.json_object()?).map_err(ApiError::Validation)?;
    let id = student_id(ctx)?;
    let student = store.update(id, patch).ok_or(ApiError::NotFound)?;
    debug!(student_id = id, "student updated");
    Ok(Response::json(StatusCode::Ok, &student))
}

pub fn delete_student<S: StudentStore>(store: &S, ctx: &Context) -> Outcome {
    let id = student_id(ctx)?;
    let student = store.remove(id).ok_or(ApiError::NotFound)?;
    debug!(student_id = id, "student deleted");
    Ok(Response::json(StatusCode::Ok, &student))
}
