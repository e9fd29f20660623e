//! To-Do records and their identifiers.

// crates.io
use uuid::Uuid;
// self
use crate::{_prelude::*, auth::UserId};

/// Server-assigned To-Do identifier (UUID v4).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Uuid);
impl TodoId {
	/// Generates a fresh random identifier.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	/// Returns the underlying UUID.
	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}
impl Default for TodoId {
	fn default() -> Self {
		Self::new()
	}
}
impl From<Uuid> for TodoId {
	fn from(value: Uuid) -> Self {
		Self(value)
	}
}
impl FromStr for TodoId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s.trim()).map(Self)
	}
}
impl Debug for TodoId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TodoId({})", self.0)
	}
}
impl Display for TodoId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0.hyphenated(), f)
	}
}

/// Stored To-Do record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
	/// Immutable identifier assigned on creation.
	pub id: TodoId,
	/// Principal that owns the record.
	pub user_id: UserId,
	/// Free text.
	pub title: String,
	/// Display name of the owner.
	pub owner: String,
}
impl Display for Todo {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		writeln!(f, "Id = {}", self.id)?;
		writeln!(f, "UserId = {}", self.user_id)?;
		writeln!(f, "Title = {}", self.title)?;
		write!(f, "Owner = {}", self.owner)
	}
}

/// Incoming To-Do payload; the store assigns (or forces) the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
	/// Client-supplied id. Always overwritten by the store.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<TodoId>,
	/// Principal the record should belong to.
	pub user_id: UserId,
	/// Free text.
	pub title: String,
	/// Display name of the owner.
	pub owner: String,
}
impl TodoDraft {
	/// Creates a payload without an id.
	pub fn new(user_id: UserId, title: impl Into<String>, owner: impl Into<String>) -> Self {
		Self { id: None, user_id, title: title.into(), owner: owner.into() }
	}

	/// Materializes the record under `id`, discarding any supplied id.
	pub fn into_todo(self, id: TodoId) -> Todo {
		Todo { id, user_id: self.user_id, title: self.title, owner: self.owner }
	}
}
impl From<Todo> for TodoDraft {
	fn from(value: Todo) -> Self {
		Self { id: Some(value.id), user_id: value.user_id, title: value.title, owner: value.owner }
	}
}
