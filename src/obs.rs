//! Optional observability helpers.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run token acquisitions inside `identity_todo.token` spans (fields
//!   `source` and `stage`), emit `trace` events for cache hits and misses, and emit `debug`
//!   events for every To-Do store operation.
//! - Enable `metrics` to increment `identity_todo_token_total{source,outcome}` and
//!   `identity_todo_store_total{op,outcome}`.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for token acquisitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenOutcome {
	/// Entry to the acquirer.
	Attempt,
	/// Served from the cache.
	CacheHit,
	/// Freshly issued by the endpoint.
	Issued,
	/// Failure propagated back to the caller.
	Failure,
}
impl TokenOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenOutcome::Attempt => "attempt",
			TokenOutcome::CacheHit => "cache_hit",
			TokenOutcome::Issued => "issued",
			TokenOutcome::Failure => "failure",
		}
	}
}
impl Display for TokenOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// To-Do store operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
	/// `get_all`.
	List,
	/// `get`.
	Get,
	/// `add`.
	Add,
	/// `update`.
	Update,
	/// `delete`.
	Delete,
}
impl StoreOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StoreOp::List => "list",
			StoreOp::Get => "get",
			StoreOp::Add => "add",
			StoreOp::Update => "update",
			StoreOp::Delete => "delete",
		}
	}
}
impl Display for StoreOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Logs and counts a store operation outcome.
pub fn record_store_outcome(op: StoreOp, outcome: &'static str) {
	store_event(op, outcome);
	count_store_outcome(op, outcome);
}
