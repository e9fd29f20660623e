//! The principal an operation runs on behalf of.

// self
use crate::{_prelude::*, auth::UserId, todo::Todo};

/// Whether a caller holds application permissions or acts for a signed-in user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallerKind {
	/// App-only token; ownership checks are bypassed.
	Application,
	/// Token issued on behalf of a user; ownership checks apply.
	Delegated,
}

/// Identity attached to a store operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
	/// Permission model.
	pub kind: CallerKind,
	/// Principal identifier (`oid`).
	pub id: UserId,
	/// Principal display name (`name`).
	pub display_name: String,
}
impl Caller {
	/// Application caller.
	pub fn application(id: UserId, display_name: impl Into<String>) -> Self {
		Self { kind: CallerKind::Application, id, display_name: display_name.into() }
	}

	/// Delegated caller.
	pub fn delegated(id: UserId, display_name: impl Into<String>) -> Self {
		Self { kind: CallerKind::Delegated, id, display_name: display_name.into() }
	}

	/// Returns `true` for application callers.
	pub fn has_app_permissions(&self) -> bool {
		matches!(self.kind, CallerKind::Application)
	}

	/// Whether the caller may read or delete `todo`.
	pub fn can_access(&self, todo: &Todo) -> bool {
		self.has_app_permissions() || todo.user_id == self.id
	}

	/// Whether the caller may replace `todo`; delegated callers must match owner too.
	pub fn can_modify(&self, todo: &Todo) -> bool {
		self.has_app_permissions() || (todo.user_id == self.id && todo.owner == self.display_name)
	}
}
