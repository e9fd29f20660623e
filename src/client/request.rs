//! Per-call token request parameters and the cache refresh policy.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet},
};

/// Parameters of one `acquire_token_for_client` call.
#[derive(Clone, Debug)]
pub struct TokenRequest {
	/// Normalized scopes; `{resource}/.default` for app-only tokens.
	pub scope: ScopeSet,
	/// Bypasses the cache when true.
	pub force: bool,
	/// Jittered preemptive window used when refreshing early.
	pub preemptive_window: Duration,
}
impl TokenRequest {
	const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates a request for `scope` that honors the cache.
	pub fn new(scope: ScopeSet) -> Self {
		Self { scope, force: false, preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW }
	}

	/// Forces a call to the token endpoint.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Overrides the force flag.
	pub fn with_force(mut self, force: bool) -> Self {
		self.force = force;

		self
	}

	/// Overrides the preemptive window (defaults to 60 seconds).
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Determines whether a cached token must be replaced.
	///
	/// Tokens are refreshed when forced, expired, or inside the preemptive window. The window is
	/// shortened by a jitter derived from the scope so processes sharing a cache do not all
	/// refresh at the same instant.
	pub fn should_refresh(&self, token: &AccessToken, now: OffsetDateTime) -> bool {
		if self.force || token.is_expired_at(now) {
			return true;
		}

		let effective_window = self.effective_preemptive_window();

		if effective_window.is_zero() {
			return false;
		}

		token.expires_at - now <= effective_window
	}

	fn effective_preemptive_window(&self) -> Duration {
		self.preemptive_window.checked_sub(self.preemptive_jitter()).unwrap_or(Duration::ZERO)
	}

	fn preemptive_jitter(&self) -> Duration {
		let window_secs = self.preemptive_window.whole_seconds();

		if window_secs <= 1 {
			return Duration::ZERO;
		}

		let modulus = u64::try_from(window_secs).unwrap_or(u64::MAX);
		let jitter_secs = self.jitter_seed() % modulus;

		Duration::seconds(i64::try_from(jitter_secs).unwrap_or(i64::MAX))
	}

	fn jitter_seed(&self) -> u64 {
		let mut hasher = DefaultHasher::new();

		self.scope.hash(&mut hasher);

		hasher.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::credential::CredentialKind;

	fn token(expires_at: OffsetDateTime) -> AccessToken {
		AccessToken::builder(scope(), CredentialKind::ClientSecret)
			.secret("cached")
			.issued_at(expires_at - Duration::hours(1))
			.expires_at(expires_at)
			.build()
			.expect("Token fixture should build.")
	}

	fn scope() -> ScopeSet {
		ScopeSet::from_str("api://todo-api/.default").expect("Scope fixture should parse.")
	}

	#[test]
	fn fresh_tokens_are_reused_until_the_window() {
		let now = macros::datetime!(2025-03-01 08:00 UTC);
		let request = TokenRequest::new(scope());

		assert!(!request.should_refresh(&token(now + Duration::minutes(30)), now));
		assert!(request.should_refresh(&token(now + Duration::seconds(1)), now));
		assert!(request.should_refresh(&token(now), now));
	}

	#[test]
	fn force_and_zero_window() {
		let now = macros::datetime!(2025-03-01 08:00 UTC);
		let fresh = token(now + Duration::minutes(30));
		let nearly_expired = token(now + Duration::seconds(1));
		let no_window = TokenRequest::new(scope()).with_preemptive_window(Duration::seconds(-5));

		assert!(TokenRequest::new(scope()).force_refresh().should_refresh(&fresh, now));
		assert_eq!(no_window.preemptive_window, Duration::ZERO);
		assert!(!no_window.should_refresh(&nearly_expired, now));
	}

	#[test]
	fn jitter_never_exceeds_the_window() {
		let request = TokenRequest::new(scope()).with_preemptive_window(Duration::seconds(120));
		let effective = request.effective_preemptive_window();

		assert!(effective > Duration::ZERO);
		assert!(effective <= Duration::seconds(120));
	}
}
