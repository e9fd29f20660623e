//! Concurrent in-memory store.
//!
//! Records live in a sharded [`DashMap`]. Operations on distinct ids usually land on different
//! shards; operations on the same id serialize on its shard lock, so every check-then-mutate
//! sequence below runs against a consistent snapshot. Nothing here awaits.

// crates.io
use dashmap::{DashMap, mapref::entry::Entry};
// self
use crate::{
	_prelude::*,
	obs::{self, StoreOp},
	todo::{Caller, Todo, TodoDraft, TodoId},
};

/// Result of [`TodoStore::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
	/// Stored under the returned id.
	Created(TodoId),
	/// Delegated ownership mismatch or id collision; nothing was stored.
	Rejected,
}
impl AddOutcome {
	fn label(self) -> &'static str {
		match self {
			AddOutcome::Created(_) => "created",
			AddOutcome::Rejected => "rejected",
		}
	}
}

/// Result of [`TodoStore::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
	/// Replaced the record with the returned id.
	Updated(TodoId),
	/// No record with that id exists.
	NotFound,
	/// The delegated caller does not own the existing record.
	Rejected,
}
impl UpdateOutcome {
	fn label(self) -> &'static str {
		match self {
			UpdateOutcome::Updated(_) => "updated",
			UpdateOutcome::NotFound => "not_found",
			UpdateOutcome::Rejected => "rejected",
		}
	}
}

/// Result of [`TodoStore::delete`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
	/// The record was removed.
	Deleted,
	/// Absent, or not visible to the caller.
	NotFound,
}
impl DeleteOutcome {
	fn label(self) -> &'static str {
		match self {
			DeleteOutcome::Deleted => "deleted",
			DeleteOutcome::NotFound => "not_found",
		}
	}
}

/// Shared handle to the To-Do records of one process.
#[derive(Clone, Debug, Default)]
pub struct TodoStore(Arc<DashMap<TodoId, Todo>>);
impl TodoStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns every record visible to `caller`.
	pub fn get_all(&self, caller: &Caller) -> Vec<Todo> {
		let todos = self
			.0
			.iter()
			.filter(|entry| caller.can_access(entry.value()))
			.map(|entry| entry.value().clone())
			.collect::<Vec<_>>();

		obs::record_store_outcome(StoreOp::List, "ok");

		todos
	}

	/// Looks up `id` within the records visible to `caller`.
	pub fn get(&self, caller: &Caller, id: &TodoId) -> Option<Todo> {
		let todo = self
			.0
			.get(id)
			.filter(|entry| caller.can_access(entry.value()))
			.map(|entry| entry.value().clone());

		obs::record_store_outcome(StoreOp::Get, if todo.is_some() { "found" } else { "not_found" });

		todo
	}

	/// Stores `draft` under a fresh id.
	///
	/// Delegated callers may only create records carrying their own identifier and display
	/// name.
	pub fn add(&self, caller: &Caller, draft: TodoDraft) -> AddOutcome {
		let id = TodoId::new();
		let todo = draft.into_todo(id);
		let outcome = if !caller.can_modify(&todo) {
			AddOutcome::Rejected
		} else {
			match self.0.entry(id) {
				Entry::Occupied(_) => AddOutcome::Rejected,
				Entry::Vacant(slot) => {
					slot.insert(todo);

					AddOutcome::Created(id)
				},
			}
		};

		obs::record_store_outcome(StoreOp::Add, outcome.label());

		outcome
	}

	/// Replaces the record at `id` with `draft`, keeping `id`.
	///
	/// Delegated callers must own the existing record; the payload itself is not checked.
	pub fn update(&self, caller: &Caller, id: &TodoId, draft: TodoDraft) -> UpdateOutcome {
		let outcome = match self.0.get_mut(id) {
			None => UpdateOutcome::NotFound,
			Some(existing) if !caller.can_modify(existing.value()) => UpdateOutcome::Rejected,
			Some(mut existing) => {
				*existing = draft.into_todo(*id);

				UpdateOutcome::Updated(*id)
			},
		};

		obs::record_store_outcome(StoreOp::Update, outcome.label());

		outcome
	}

	/// Removes the record at `id` if the caller may see it.
	pub fn delete(&self, caller: &Caller, id: &TodoId) -> DeleteOutcome {
		let outcome = match self.0.remove_if(id, |_, todo| caller.can_access(todo)) {
			Some(_) => DeleteOutcome::Deleted,
			None => DeleteOutcome::NotFound,
		};

		obs::record_store_outcome(StoreOp::Delete, outcome.label());

		outcome
	}

	/// Number of stored records, across all owners.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no records are stored.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
