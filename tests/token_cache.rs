// crates.io
use time::{Duration, OffsetDateTime};
// self
use identity_todo::{
	auth::{AccessToken, ClientId, ScopeSet},
	cache::{CacheKey, MemoryTokenCache, TokenCache},
	credential::CredentialKind,
};

fn key(scope: &ScopeSet) -> CacheKey {
	let client_id = ClientId::new("6731de76-14a6-49ae-97bc-6eba6914391e")
		.expect("Client fixture should be valid.");

	CacheKey::new(
		"https://login.microsoftonline.com/contoso.onmicrosoft.com",
		&client_id,
		CredentialKind::ClientSecret,
		scope,
	)
}

fn token(scope: &ScopeSet, secret: &str, expires_in: Duration) -> AccessToken {
	AccessToken::builder(scope.clone(), CredentialKind::ClientSecret)
		.secret(secret)
		.expires_in(expires_in)
		.build()
		.expect("Token fixture should build.")
}

#[tokio::test]
async fn save_fetch_and_evict() {
	let cache = MemoryTokenCache::default();
	let scope = ScopeSet::new(["api://todo-api/.default"]).expect("Scope fixture should be valid.");
	let other = ScopeSet::new(["https://graph.microsoft.com/.default"])
		.expect("Scope fixture should be valid.");

	cache
		.save(key(&scope), token(&scope, "todo-token", Duration::hours(1)))
		.await
		.expect("Save should succeed.");

	let fetched = cache
		.fetch(&key(&scope))
		.await
		.expect("Fetch should succeed.")
		.expect("Saved token should be present.");

	assert_eq!(fetched.secret.expose(), "todo-token");
	assert!(cache.fetch(&key(&other)).await.expect("Fetch should succeed.").is_none());

	let evicted = cache.evict(&key(&scope)).await.expect("Evict should succeed.");

	assert!(evicted.is_some());
	assert!(cache.is_empty());
}

#[tokio::test]
async fn purge_drops_only_expired_tokens() {
	let cache = MemoryTokenCache::default();
	let live = ScopeSet::new(["api://todo-api/.default"]).expect("Scope fixture should be valid.");
	let stale = ScopeSet::new(["https://graph.microsoft.com/.default"])
		.expect("Scope fixture should be valid.");

	cache
		.save(key(&live), token(&live, "live", Duration::hours(1)))
		.await
		.expect("Save should succeed.");
	cache
		.save(key(&stale), token(&stale, "stale", Duration::seconds(1)))
		.await
		.expect("Save should succeed.");

	assert_eq!(cache.len(), 2);
	assert_eq!(cache.purge_expired(OffsetDateTime::now_utc() + Duration::minutes(5)), 1);
	assert_eq!(cache.len(), 1);
	assert!(cache.fetch(&key(&live)).await.expect("Fetch should succeed.").is_some());
}
