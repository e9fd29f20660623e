//! Token cache contract and the built-in in-memory cache.
//!
//! App-only tokens are keyed by who asked (authority, client, credential kind) and for what
//! (scope fingerprint). Nothing user-specific is cached.

pub mod memory;

pub use memory::MemoryTokenCache;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId, ScopeSet},
	credential::CredentialKind,
};

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage backend for acquired tokens.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Stores or replaces the token under `key`.
	fn save(&self, key: CacheKey, token: AccessToken) -> CacheFuture<'_, ()>;

	/// Returns the token stored under `key`, if any.
	fn fetch<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<AccessToken>>;

	/// Removes and returns the token stored under `key`.
	fn evict<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<AccessToken>>;
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Token could not be encoded or decoded by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying a cached token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
	/// Authority the token was issued by, `{instance}{tenant}`.
	pub authority: String,
	/// Application the token was issued to.
	pub client_id: ClientId,
	/// Credential that obtained the token.
	pub kind: CredentialKind,
	/// Scope fingerprint used for partitioning.
	pub scope_fingerprint: String,
}
impl CacheKey {
	/// Builds a key for the provided tuple.
	pub fn new(
		authority: impl Display,
		client_id: &ClientId,
		kind: CredentialKind,
		scope: &ScopeSet,
	) -> Self {
		Self {
			authority: authority.to_string(),
			client_id: client_id.clone(),
			kind,
			scope_fingerprint: scope.fingerprint(),
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as _;
	// self
	use super::*;

	#[test]
	fn cache_error_converts_into_crate_error_with_source() {
		let cache_error = CacheError::Backend { message: "redis unreachable".into() };
		let error: Error = cache_error.clone().into();

		assert!(matches!(error, Error::Cache(_)));
		assert!(error.to_string().contains("redis unreachable"));
		assert_eq!(
			error.source().expect("Crate error should expose the cache error.").to_string(),
			cache_error.to_string()
		);
	}

	#[test]
	fn key_ignores_scope_order() {
		let client = ClientId::new("app").expect("Client fixture should be valid.");
		let lhs = CacheKey::new(
			"https://login.microsoftonline.com/contoso",
			&client,
			CredentialKind::ClientSecret,
			&ScopeSet::new(["b", "a"]).expect("Scope fixture should be valid."),
		);
		let rhs = CacheKey::new(
			"https://login.microsoftonline.com/contoso",
			&client,
			CredentialKind::ClientSecret,
			&ScopeSet::new(["a", "b"]).expect("Scope fixture should be valid."),
		);
		let other_kind = CacheKey { kind: CredentialKind::Certificate, ..rhs.clone() };

		assert_eq!(lhs, rhs);
		assert_ne!(rhs, other_kind);
	}
}
