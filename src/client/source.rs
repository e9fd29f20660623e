//! The seam between token acquisition and the code that needs tokens.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet},
};

/// Boxed future returned by [`TokenSource::access_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken>> + 'a + Send>>;

/// Anything that can hand out an app-only token for a scope set.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Returns a token valid for `scope`.
	fn access_token<'a>(&'a self, scope: &'a ScopeSet) -> TokenFuture<'a>;
}

/// Source that always returns the same token.
#[derive(Clone, Debug)]
pub struct StaticTokenSource(AccessToken);
impl StaticTokenSource {
	/// Wraps a token.
	pub fn new(token: AccessToken) -> Self {
		Self(token)
	}
}
impl TokenSource for StaticTokenSource {
	fn access_token<'a>(&'a self, _scope: &'a ScopeSet) -> TokenFuture<'a> {
		let token = self.0.clone();

		Box::pin(async move { Ok(token) })
	}
}
