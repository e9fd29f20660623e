//! App-only token acquisition with caching and singleflight guards.
//!
//! [`TokenAcquirer::acquire_token_for_client`] evaluates the cached token for the
//! authority/client/credential/scope tuple and only contacts the issuer when the token is
//! missing, expired, inside its jittered preemptive window, or the caller forces a refresh. A
//! per-[`CacheKey`] guard makes concurrent callers wait for the in-flight request instead of
//! stampeding the endpoint.

pub mod request;
pub mod source;

pub use request::*;
pub use source::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId, ScopeSet},
	authority::Authority,
	cache::{CacheKey, MemoryTokenCache, TokenCache},
	config::AzureAdOptions,
	credential::{CertificateCredential, ClientCredential, CredentialKind},
	error::ConfigError,
	http::HttpClient,
	oauth::{self, ClientAuth},
	obs::{self, TokenOutcome, TokenSpan},
};

/// Confidential client that acquires tokens for itself.
#[derive(Clone)]
pub struct TokenAcquirer {
	authority: Authority,
	client_id: ClientId,
	credential: ClientCredential,
	http_client: HttpClient,
	cache: Arc<dyn TokenCache>,
	guards: Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>,
}
impl TokenAcquirer {
	/// Creates an acquirer with a fresh HTTP client and an in-memory cache.
	pub fn new(
		authority: Authority,
		client_id: ClientId,
		credential: ClientCredential,
	) -> Result<Self> {
		Ok(Self {
			authority,
			client_id,
			credential,
			http_client: HttpClient::new()?,
			cache: Arc::new(MemoryTokenCache::default()),
			guards: Default::default(),
		})
	}

	/// Builds the acquirer described by the `AzureAd` section, resolving its credential.
	pub fn from_options(options: &AzureAdOptions) -> Result<Self> {
		let authority = Authority::from_options(options)?;
		let credential = ClientCredential::resolve(options)?;

		Self::new(authority, options.client_id.clone(), credential)
	}

	/// Replaces the HTTP client.
	pub fn with_http_client(mut self, http_client: HttpClient) -> Self {
		self.http_client = http_client;

		self
	}

	/// Replaces the token cache.
	pub fn with_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Authority tokens are requested from.
	pub fn authority(&self) -> &Authority {
		&self.authority
	}

	/// Application (client) id.
	pub fn client_id(&self) -> &ClientId {
		&self.client_id
	}

	/// Kind of the resolved credential.
	pub fn credential_kind(&self) -> CredentialKind {
		self.credential.kind()
	}

	/// Returns a token for `request.scope`, from the cache when possible.
	pub async fn acquire_token_for_client(&self, request: TokenRequest) -> Result<AccessToken> {
		let kind = self.credential.kind();
		let span = TokenSpan::new(kind, "acquire_token_for_client");

		obs::record_token_outcome(kind, TokenOutcome::Attempt);

		let result = span.instrument(self.acquire_with_cache(request, kind)).await;

		match result {
			Ok((token, outcome)) => {
				obs::record_token_outcome(kind, outcome);

				Ok(token)
			},
			Err(e) => {
				obs::record_token_outcome(kind, TokenOutcome::Failure);

				Err(e)
			},
		}
	}

	async fn acquire_with_cache(
		&self,
		request: TokenRequest,
		kind: CredentialKind,
	) -> Result<(AccessToken, TokenOutcome)> {
		if request.scope.is_empty() {
			return Err(ConfigError::MissingScopes.into());
		}

		let key = CacheKey::new(&self.authority, &self.client_id, kind, &request.scope);
		let guard = self.guard(&key);
		let result = self.acquire_guarded(&guard, &key, &request, kind).await;

		self.release_guard(&key, guard);

		result
	}

	async fn acquire_guarded(
		&self,
		guard: &AsyncMutex<()>,
		key: &CacheKey,
		request: &TokenRequest,
		kind: CredentialKind,
	) -> Result<(AccessToken, TokenOutcome)> {
		let _singleflight = guard.lock().await;
		let now = OffsetDateTime::now_utc();

		if let Some(current) =
			self.cache.fetch(key).await?.filter(|token| !request.should_refresh(token, now))
		{
			obs::cache_event(kind, true);

			return Ok((current, TokenOutcome::CacheHit));
		}

		obs::cache_event(kind, false);

		let token = self.request_token(&request.scope).await?;

		self.cache.save(key.clone(), token.clone()).await?;

		Ok((token, TokenOutcome::Issued))
	}

	async fn request_token(&self, scope: &ScopeSet) -> Result<AccessToken> {
		match &self.credential {
			ClientCredential::Secret(secret) => {
				let endpoint = self.authority.token_endpoint()?;

				oauth::exchange_client_credentials(
					&self.http_client,
					&endpoint,
					&self.client_id,
					ClientAuth::Secret(secret),
					scope,
				)
				.await
			},
			ClientCredential::Certificate(certificate) =>
				self.exchange_assertion(certificate, scope).await,
			ClientCredential::KeyVaultCertificate(vault) => {
				let certificate = vault.load().await?;

				self.exchange_assertion(&certificate, scope).await
			},
			ClientCredential::ManagedIdentity(identity) => identity.fetch(scope).await,
		}
	}

	async fn exchange_assertion(
		&self,
		certificate: &CertificateCredential,
		scope: &ScopeSet,
	) -> Result<AccessToken> {
		let endpoint = self.authority.token_endpoint()?;
		let assertion = certificate
			.assertion(&endpoint, &self.client_id, OffsetDateTime::now_utc())
			.map_err(ConfigError::from)?;

		oauth::exchange_client_credentials(
			&self.http_client,
			&endpoint,
			&self.client_id,
			ClientAuth::Assertion(&assertion),
			scope,
		)
		.await
	}

	fn guard(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	// Drops the map entry once no other caller holds or awaits this guard.
	fn release_guard(&self, key: &CacheKey, guard: Arc<AsyncMutex<()>>) {
		let mut guards = self.guards.lock();

		if guards.get(key).is_some_and(|current| Arc::ptr_eq(current, &guard))
			&& Arc::strong_count(&guard) == 2
		{
			guards.remove(key);
		}
	}
}
impl TokenSource for TokenAcquirer {
	fn access_token<'a>(&'a self, scope: &'a ScopeSet) -> TokenFuture<'a> {
		Box::pin(self.acquire_token_for_client(TokenRequest::new(scope.clone())))
	}
}
impl Debug for TokenAcquirer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenAcquirer")
			.field("authority", &self.authority)
			.field("client_id", &self.client_id)
			.field("credential", &self.credential.kind())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{TenantId, TokenSecret};

	fn acquirer(instance: &str) -> TokenAcquirer {
		let authority = Authority::new(
			instance,
			TenantId::new("contoso.onmicrosoft.com").expect("Tenant fixture should be valid."),
		)
		.expect("Authority fixture should be valid.");
		let client_id = ClientId::new("6731de76-14a6-49ae-97bc-6eba6914391e")
			.expect("Client fixture should be valid.");
		let credential = ClientCredential::Secret(TokenSecret::new("s3cr3t"));

		TokenAcquirer::new(authority, client_id, credential).expect("Acquirer should build.")
	}

	#[tokio::test]
	async fn guards_are_released_after_a_cache_hit() {
		let acquirer = acquirer("https://login.microsoftonline.com/");
		let scope =
			ScopeSet::new(["api://todo-api/.default"]).expect("Scope fixture should be valid.");
		let key = CacheKey::new(
			acquirer.authority(),
			acquirer.client_id(),
			CredentialKind::ClientSecret,
			&scope,
		);
		let cached = AccessToken::builder(scope.clone(), CredentialKind::ClientSecret)
			.secret("cached")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token fixture should build.");

		acquirer.cache.save(key, cached).await.expect("Save should succeed.");

		let token = acquirer
			.acquire_token_for_client(TokenRequest::new(scope))
			.await
			.expect("Cached token should be served.");

		assert_eq!(token.secret.expose(), "cached");
		assert!(acquirer.guards.lock().is_empty());
	}

	#[tokio::test]
	async fn guards_are_released_after_a_failure() {
		let acquirer = acquirer("http://127.0.0.1:1/");
		let scope =
			ScopeSet::new(["api://todo-api/.default"]).expect("Scope fixture should be valid.");

		acquirer
			.acquire_token_for_client(TokenRequest::new(scope))
			.await
			.expect_err("Closed port must fail the request.");

		assert!(acquirer.guards.lock().is_empty());
	}
}
