// crates.io
use serde_json::json;
// self
use identity_todo::{
	auth::{ClientId, ScopeSet, TenantId},
	authority::Authority,
	client::{TokenAcquirer, TokenRequest},
	config::{AzureAdOptions, ManagedIdentityOptions},
	credential::{ClientCredential, CredentialKind},
	error::{ConfigError, Error},
	managed_identity::ManagedIdentity,
};

const USER_ASSIGNED_CLIENT_ID: &str = "3b57c42c-3201-4295-ae27-d6baec5b7027";

fn acquirer(identity: ManagedIdentity) -> TokenAcquirer {
	let tenant = TenantId::new("contoso.onmicrosoft.com").expect("Tenant fixture should be valid.");
	let authority = Authority::new("https://login.microsoftonline.com/", tenant)
		.expect("Public authority should be valid.");
	let client_id = ClientId::new("6731de76-14a6-49ae-97bc-6eba6914391e")
		.expect("Client fixture should be valid.");

	TokenAcquirer::new(authority, client_id, ClientCredential::ManagedIdentity(identity))
		.expect("Acquirer should build.")
}

fn user_assigned() -> ManagedIdentityOptions {
	ManagedIdentityOptions::default().with_user_assigned_client_id(USER_ASSIGNED_CLIENT_ID)
}

#[tokio::test]
async fn multiple_scopes_cannot_be_translated_to_a_resource() {
	let identity =
		ManagedIdentity::new(&ManagedIdentityOptions::default()).expect("Credential should build.");
	let acquirer = acquirer(identity);

	assert_eq!(acquirer.credential_kind(), CredentialKind::ManagedIdentity);

	let scope = ScopeSet::new(["api://todo-api/.default", "https://graph.microsoft.com/.default"])
		.expect("Scope fixture should be valid.");
	let err = acquirer
		.acquire_token_for_client(TokenRequest::new(scope))
		.await
		.expect_err("Two resources must be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::ManagedIdentityScope { .. })));
}

#[test]
fn settings_with_only_a_managed_identity_resolve_to_it() {
	let options: AzureAdOptions = serde_json::from_value(json!({
		"TenantId": "contoso.onmicrosoft.com",
		"ClientId": "6731de76-14a6-49ae-97bc-6eba6914391e",
		"ManagedIdentity": { "UserAssignedClientId": USER_ASSIGNED_CLIENT_ID },
	}))
	.expect("Settings fixture should parse.");
	let credential = ClientCredential::resolve(&options).expect("Managed identity should resolve.");

	match credential {
		ClientCredential::ManagedIdentity(identity) =>
			assert_eq!(identity.options(), &user_assigned()),
		other => panic!("Unexpected credential: {other:?}."),
	}
}
