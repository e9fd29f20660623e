//! HTTP surface of the To-Do store.
//!
//! [`todo_router`] maps `/api/todo` onto [`TodoStore`] operations. Token validation is expected
//! to happen in an outer layer that inserts [`TodoClaims`] into the request extensions; the
//! handlers enforce the scope-or-app-permission rule and translate store outcomes into status
//! codes.

pub mod claims;

pub use claims::*;

// crates.io
use axum::{
	Json, Router,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
// self
use crate::{
	_prelude::*,
	config::RequiredTodoAccessPermissions,
	todo::{AddOutcome, DeleteOutcome, Todo, TodoDraft, TodoId, TodoStore, UpdateOutcome},
};

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct TodoApiState {
	/// Records served by the API.
	pub store: TodoStore,
	/// Permissions demanded from inbound tokens.
	pub permissions: Arc<RequiredTodoAccessPermissions>,
}
impl TodoApiState {
	/// Creates state over `store`.
	pub fn new(store: TodoStore, permissions: RequiredTodoAccessPermissions) -> Self {
		Self { store, permissions: Arc::new(permissions) }
	}
}

/// Failures a handler answers with instead of a body.
#[derive(Debug, ThisError)]
pub enum TodoApiError {
	/// No validated claims reached the handler.
	#[error("Request carries no validated token claims.")]
	MissingClaims,
	/// The `oid` claim is absent or unusable.
	#[error("Token does not identify the caller.")]
	InvalidCaller,
	/// Neither a required scope nor a required app permission was granted.
	#[error("Token lacks the required scope or app permission.")]
	Forbidden,
	/// The path segment is not a To-Do id.
	#[error("Malformed To-Do id.")]
	InvalidId,
	/// The store refused to create the record.
	#[error("Caller may not create this To-Do.")]
	Unauthorized,
	/// Absent, or not visible to the caller.
	#[error("To-Do not found.")]
	NotFound,
}
impl TodoApiError {
	/// Status code sent for this failure.
	pub fn status(&self) -> StatusCode {
		match self {
			TodoApiError::MissingClaims => StatusCode::INTERNAL_SERVER_ERROR,
			TodoApiError::InvalidCaller | TodoApiError::InvalidId => StatusCode::BAD_REQUEST,
			TodoApiError::Forbidden => StatusCode::FORBIDDEN,
			TodoApiError::Unauthorized => StatusCode::UNAUTHORIZED,
			TodoApiError::NotFound => StatusCode::NOT_FOUND,
		}
	}
}
impl IntoResponse for TodoApiError {
	fn into_response(self) -> Response {
		(self.status(), self.to_string()).into_response()
	}
}

/// Builds the `/api/todo` router.
pub fn todo_router(state: TodoApiState) -> Router {
	Router::new()
		.route("/api/todo", get(list_todos).post(add_todo))
		.route("/api/todo/{id}", get(get_todo).post(update_todo).delete(delete_todo))
		.with_state(state)
}

async fn list_todos(
	State(state): State<TodoApiState>,
	claims: TodoClaims,
) -> Result<Json<Vec<Todo>>, TodoApiError> {
	let caller = claims.authorize(&state.permissions, Access::Read)?;

	Ok(Json(state.store.get_all(&caller)))
}

async fn get_todo(
	State(state): State<TodoApiState>,
	claims: TodoClaims,
	Path(id): Path<String>,
) -> Result<Json<Todo>, TodoApiError> {
	let caller = claims.authorize(&state.permissions, Access::Read)?;
	let id = parse_id(&id)?;

	state.store.get(&caller, &id).map(Json).ok_or(TodoApiError::NotFound)
}

async fn add_todo(
	State(state): State<TodoApiState>,
	claims: TodoClaims,
	Json(draft): Json<TodoDraft>,
) -> Result<Json<TodoId>, TodoApiError> {
	let caller = claims.authorize(&state.permissions, Access::Write)?;

	match state.store.add(&caller, draft) {
		AddOutcome::Created(id) => Ok(Json(id)),
		AddOutcome::Rejected => Err(TodoApiError::Unauthorized),
	}
}

async fn update_todo(
	State(state): State<TodoApiState>,
	claims: TodoClaims,
	Path(id): Path<String>,
	Json(draft): Json<TodoDraft>,
) -> Result<Json<TodoId>, TodoApiError> {
	let caller = claims.authorize(&state.permissions, Access::Write)?;
	let id = parse_id(&id)?;

	match state.store.update(&caller, &id, draft) {
		UpdateOutcome::Updated(id) => Ok(Json(id)),
		UpdateOutcome::NotFound | UpdateOutcome::Rejected => Err(TodoApiError::NotFound),
	}
}

async fn delete_todo(
	State(state): State<TodoApiState>,
	claims: TodoClaims,
	Path(id): Path<String>,
) -> Result<StatusCode, TodoApiError> {
	let caller = claims.authorize(&state.permissions, Access::Write)?;
	let id = parse_id(&id)?;

	match state.store.delete(&caller, &id) {
		DeleteOutcome::Deleted => Ok(StatusCode::OK),
		DeleteOutcome::NotFound => Err(TodoApiError::NotFound),
	}
}

fn parse_id(raw: &str) -> Result<TodoId, TodoApiError> {
	TodoId::from_str(raw).map_err(|_| TodoApiError::InvalidId)
}
