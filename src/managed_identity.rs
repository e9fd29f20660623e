//! Tokens from the Azure compute host.
//!
//! [`ManagedIdentity`] wraps `azure_identity`'s [`ManagedIdentityCredential`], which discovers
//! the endpoint on its own: App Service and Functions publish `IDENTITY_ENDPOINT` and
//! `IDENTITY_HEADER`, everything else is served by the Instance Metadata Service. Managed
//! identities have no authority or client secret, so a [`ManagedIdentity`] is a
//! [`TokenSource`] by itself.

// crates.io
use azure_core::credentials::TokenCredential;
use azure_identity::{ManagedIdentityCredential, ManagedIdentityCredentialOptions, UserAssignedId};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet},
	client::{TokenFuture, TokenSource},
	config::ManagedIdentityOptions,
	credential::CredentialKind,
	error::ConfigError,
	obs::{self, TokenOutcome, TokenSpan},
};

/// Managed identity of the hosting compute resource.
#[derive(Clone)]
pub struct ManagedIdentity {
	options: ManagedIdentityOptions,
	credential: Arc<ManagedIdentityCredential>,
}
impl ManagedIdentity {
	/// Builds the credential for the system-assigned identity or the configured user-assigned
	/// one. No request is made until a token is needed.
	pub fn new(options: &ManagedIdentityOptions) -> Result<Self> {
		let credential = ManagedIdentityCredential::new(Some(ManagedIdentityCredentialOptions {
			user_assigned_id: options.user_assigned_client_id.clone().map(UserAssignedId::ClientId),
			..Default::default()
		}))
		.map_err(Error::ManagedIdentity)?;

		Ok(Self { options: options.clone(), credential })
	}

	/// Options the credential was built from.
	pub fn options(&self) -> &ManagedIdentityOptions {
		&self.options
	}

	/// Requests a token for the single resource behind `scope`.
	pub async fn acquire(&self, scope: &ScopeSet) -> Result<AccessToken> {
		let span = TokenSpan::new(CredentialKind::ManagedIdentity, "managed_identity");

		obs::record_token_outcome(CredentialKind::ManagedIdentity, TokenOutcome::Attempt);

		let result = span.instrument(self.fetch(scope)).await;
		let outcome = if result.is_ok() { TokenOutcome::Issued } else { TokenOutcome::Failure };

		obs::record_token_outcome(CredentialKind::ManagedIdentity, outcome);

		result
	}

	/// Token request without its own span, for callers that already record one.
	pub(crate) async fn fetch(&self, scope: &ScopeSet) -> Result<AccessToken> {
		let scopes = scope.iter().collect::<Vec<_>>();

		// The host endpoints take one `resource`, derived from a single `/.default` scope.
		if scopes.len() != 1 {
			return Err(ConfigError::ManagedIdentityScope { scopes: scope.normalized() }.into());
		}

		let issued =
			self.credential.get_token(&scopes, None).await.map_err(Error::ManagedIdentity)?;

		AccessToken::builder(scope.clone(), CredentialKind::ManagedIdentity)
			.secret(issued.token.secret())
			.issued_at(OffsetDateTime::now_utc())
			.expires_at(issued.expires_on)
			.build()
			.map_err(|_| ConfigError::MissingExpiresIn.into())
	}
}
impl TokenSource for ManagedIdentity {
	fn access_token<'a>(&'a self, scope: &'a ScopeSet) -> TokenFuture<'a> {
		Box::pin(self.acquire(scope))
	}
}
impl Debug for ManagedIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ManagedIdentity").field("options", &self.options).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn several_scopes_are_rejected_before_contacting_the_host() {
		let identity = ManagedIdentity::new(
			&ManagedIdentityOptions::default()
				.with_user_assigned_client_id("3b57c42c-3201-4295-ae27-d6baec5b7027"),
		)
		.expect("Credential construction should not touch the network.");
		let scope = ScopeSet::new([
			"https://vault.azure.net/.default",
			"https://graph.microsoft.com/.default",
		])
		.expect("Scope fixture should be valid.");
		let err = identity.acquire(&scope).await.expect_err("Two resources must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::ManagedIdentityScope { .. })));
		assert_eq!(
			identity.options().user_assigned_client_id.as_deref(),
			Some("3b57c42c-3201-4295-ae27-d6baec5b7027")
		);
	}
}
