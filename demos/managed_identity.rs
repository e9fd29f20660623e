//! Reads a Key Vault secret with a managed-identity token.
//!
//! On an Azure host, set `KEY_VAULT_URL` and `KEY_VAULT_SECRET_NAME` (and optionally
//! `USER_ASSIGNED_CLIENT_ID`). Without `IDENTITY_ENDPOINT` in the environment, local mocks play
//! the App Service identity endpoint and the vault.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use url::Url;
// self
use identity_todo::{
	config::ManagedIdentityOptions, downstream::KeyVaultClient, managed_identity::ManagedIdentity,
};

const DEMO_IDENTITY_HEADER: &str = "demo-identity-header";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	let identity_host = MockServer::start_async().await;
	let vault = MockServer::start_async().await;
	let mocked = env::var_os("IDENTITY_ENDPOINT").is_none();

	if mocked {
		let endpoint = format!("http://{}/msi/token", identity_host.address());

		// SAFETY: nothing else in the process reads the environment while it is set.
		unsafe {
			env::set_var("IDENTITY_ENDPOINT", endpoint);
			env::set_var("IDENTITY_HEADER", DEMO_IDENTITY_HEADER);
		}
	}

	let expires_on = time::OffsetDateTime::now_utc().unix_timestamp() + 86_399;
	let identity_mock = identity_host
		.mock_async(|when, then| {
			when.method(GET)
				.path("/msi/token")
				.header("X-IDENTITY-HEADER", DEMO_IDENTITY_HEADER)
				.query_param("resource", "https://vault.azure.net");
			then.status(200).json_body(json!({
				"access_token": "demo-mi-token",
				"expires_on": expires_on.to_string(),
				"resource": "https://vault.azure.net",
				"token_type": "Bearer",
			}));
		})
		.await;
	let vault_mock = vault
		.mock_async(|when, then| {
			when.method(GET)
				.path("/secrets/demo-secret")
				.query_param("api-version", "7.2")
				.header("authorization", "Bearer demo-mi-token");
			then.status(200).json_body(json!({
				"value": "Hello from Key Vault.",
				"id": format!("http://{}/secrets/demo-secret/1", vault.address()),
			}));
		})
		.await;
	let mut options = ManagedIdentityOptions::default();

	if let Ok(client_id) = env::var("USER_ASSIGNED_CLIENT_ID") {
		options = options.with_user_assigned_client_id(client_id);
	}

	let identity = ManagedIdentity::new(&options)?;
	let vault_url =
		env::var("KEY_VAULT_URL").unwrap_or_else(|_| format!("http://{}/", vault.address()));
	let secret_name =
		env::var("KEY_VAULT_SECRET_NAME").unwrap_or_else(|_| "demo-secret".to_owned());
	let client = KeyVaultClient::new(Url::parse(&vault_url)?, Arc::new(identity))?;
	let secret = client.get_secret(&secret_name).await?;

	println!("{} = {}", secret.id, secret.value.expose());

	if mocked {
		identity_mock.assert_calls_async(1).await;
		vault_mock.assert_calls_async(1).await;
		println!("Served by the local identity and vault mocks.");
	}

	Ok(())
}
