//! Thread-safe in-memory [`TokenCache`] implementation.

// crates.io
use parking_lot::RwLock;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	cache::{CacheFuture, CacheKey, TokenCache},
};

type CacheMap = Arc<RwLock<HashMap<CacheKey, AccessToken>>>;

/// Process-local token cache; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenCache(CacheMap);
impl MemoryTokenCache {
	/// Number of cached tokens, expired ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Drops every token expired at `now` and returns how many were removed.
	pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
		let mut guard = self.0.write();
		let before = guard.len();

		guard.retain(|_, token| !token.is_expired_at(now));

		before - guard.len()
	}
}
impl TokenCache for MemoryTokenCache {
	fn save(&self, key: CacheKey, token: AccessToken) -> CacheFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key, token);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<AccessToken>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn evict<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<AccessToken>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(key)) })
	}
}
