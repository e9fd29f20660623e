//! Validated token claims as deposited by the upstream authorizer.

// crates.io
use axum::{extract::FromRequestParts, http::request::Parts};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, UserId},
	config::RequiredTodoAccessPermissions,
	server::TodoApiError,
	todo::Caller,
};

/// Subset of an Entra access token the To-Do API reads.
///
/// JWT validation happens before the router; handlers only look for this value in the request
/// extensions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoClaims {
	/// Object id of the caller.
	#[serde(default)]
	pub oid: Option<String>,
	/// Display name of the caller.
	#[serde(default)]
	pub name: Option<String>,
	/// `app` for application tokens.
	#[serde(default)]
	pub idtyp: Option<String>,
	/// Delegated scopes.
	#[serde(default)]
	pub scp: ScopeSet,
	/// Application roles.
	#[serde(default)]
	pub roles: ScopeSet,
}
impl TodoClaims {
	/// Claims of an application token.
	pub fn application(oid: impl Into<String>, roles: ScopeSet) -> Self {
		Self { oid: Some(oid.into()), idtyp: Some("app".into()), roles, ..Default::default() }
	}

	/// Claims of a token issued on behalf of a user.
	pub fn delegated(oid: impl Into<String>, name: impl Into<String>, scp: ScopeSet) -> Self {
		Self { oid: Some(oid.into()), name: Some(name.into()), scp, ..Default::default() }
	}

	/// Whether the token was issued to an application.
	pub fn is_application(&self) -> bool {
		self.idtyp.as_deref() == Some("app")
	}

	/// Checks the permission for `access`, then builds the caller.
	pub fn authorize(
		&self,
		permissions: &RequiredTodoAccessPermissions,
		access: Access,
	) -> Result<Caller, TodoApiError> {
		let granted = if self.is_application() {
			let read = &permissions.required_application_todo_read_claims;
			let read_write = &permissions.required_application_todo_read_write_claims;

			match access {
				Access::Read =>
					grants_any(&self.roles, read) || grants_any(&self.roles, read_write),
				Access::Write => grants_any(&self.roles, read_write),
			}
		} else {
			let required = match access {
				Access::Read => &permissions.required_delegated_todo_read_claims,
				Access::Write => &permissions.required_delegated_todo_write_claims,
			};

			grants_any(&self.scp, required)
		};

		if !granted {
			return Err(TodoApiError::Forbidden);
		}

		let id = self
			.oid
			.as_deref()
			.and_then(|oid| UserId::new(oid).ok())
			.ok_or(TodoApiError::InvalidCaller)?;
		let name = self.name.clone().unwrap_or_default();

		Ok(if self.is_application() {
			Caller::application(id, name)
		} else {
			Caller::delegated(id, name)
		})
	}
}
impl<S> FromRequestParts<S> for TodoClaims
where
	S: Send + Sync,
{
	type Rejection = TodoApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts.extensions.get::<TodoClaims>().cloned().ok_or(TodoApiError::MissingClaims)
	}
}

/// Access level a route needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
	/// List and get.
	Read,
	/// Add, update, and delete.
	Write,
}

fn grants_any(held: &ScopeSet, required: &ScopeSet) -> bool {
	held.iter().any(|scope| required.contains(scope))
}
