//! Azure Key Vault secret reads.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	client::TokenSource,
	downstream::{self, ApiTransport},
	error::ConfigError,
	http::HttpClient,
};

/// Resource scope for the Key Vault data plane.
pub const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";

const API_VERSION: &str = "7.2";
const NAME_MAX_LEN: usize = 127;
const TARGET: &str = "key vault";

/// Secret bundle returned by `GET /secrets/{name}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultSecret {
	/// Secret value.
	pub value: TokenSecret,
	/// Versioned secret identifier.
	pub id: String,
	/// Content type recorded with the secret, e.g. `application/x-pem-file` for certificates.
	#[serde(default)]
	pub content_type: Option<String>,
}

/// Reads secrets from one vault with a bearer token for [`KEY_VAULT_SCOPE`].
#[derive(Clone, Debug)]
pub struct KeyVaultClient {
	vault_url: Url,
	transport: ApiTransport,
}
impl KeyVaultClient {
	/// Creates a client for the vault at `vault_url`.
	pub fn new(vault_url: Url, tokens: Arc<dyn TokenSource>) -> Result<Self> {
		let scope = ScopeSet::from_str(KEY_VAULT_SCOPE).map_err(ConfigError::from)?;

		Ok(Self {
			vault_url: downstream::with_trailing_slash(vault_url),
			transport: ApiTransport::new(tokens, scope)?,
		})
	}

	/// Replaces the HTTP client.
	pub fn with_http_client(mut self, http_client: HttpClient) -> Self {
		self.transport.set_http_client(http_client);

		self
	}

	/// Vault address.
	pub fn vault_url(&self) -> &Url {
		&self.vault_url
	}

	/// Latest version of the secret called `name`.
	///
	/// Certificates imported into the vault are readable here too, under the certificate's name.
	pub async fn get_secret(&self, name: &str) -> Result<KeyVaultSecret> {
		let url = self.secret_url(name)?;

		self.transport.execute_json(TARGET, self.transport.http().get(url)).await
	}

	fn secret_url(&self, name: &str) -> Result<Url> {
		if name.is_empty()
			|| name.len() > NAME_MAX_LEN
			|| !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
		{
			return Err(ConfigError::InvalidKeyVaultName { name: name.to_owned() }.into());
		}

		let mut url = self.vault_url.join(&format!("secrets/{name}")).map_err(|source| {
			ConfigError::InvalidUrl { field: "AzureAd.Certificate.KeyVaultUrl", source }
		})?;

		url.query_pairs_mut().append_pair("api-version", API_VERSION);

		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::AccessToken, client::StaticTokenSource, credential::CredentialKind};

	fn client() -> KeyVaultClient {
		let scope = ScopeSet::from_str(KEY_VAULT_SCOPE).expect("Scope fixture should parse.");
		let token = AccessToken::builder(scope, CredentialKind::ManagedIdentity)
			.secret("fixture")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token fixture should build.");

		KeyVaultClient::new(
			Url::parse("https://contoso.vault.azure.net").expect("URL fixture should parse."),
			Arc::new(StaticTokenSource::new(token)),
		)
		.expect("Client should build.")
	}

	#[test]
	fn secret_urls_carry_the_api_version() {
		let url = client().secret_url("daemon-cert").expect("Valid name should build a URL.");

		assert_eq!(
			url.as_str(),
			"https://contoso.vault.azure.net/secrets/daemon-cert?api-version=7.2"
		);
	}

	#[test]
	fn names_outside_the_vault_alphabet_are_rejected() {
		let client = client();
		let too_long = "a".repeat(NAME_MAX_LEN + 1);

		for name in ["", "../keys/x", "name?x=1", "has space", too_long.as_str()] {
			assert!(matches!(
				client.secret_url(name),
				Err(Error::Config(ConfigError::InvalidKeyVaultName { .. }))
			));
		}
	}

	#[test]
	fn secret_bundle_decodes_camel_case() {
		let secret: KeyVaultSecret = serde_json::from_str(
			r#"{
				"value": "pem text",
				"id": "https://contoso.vault.azure.net/secrets/daemon-cert/4387e9f3",
				"contentType": "application/x-pem-file",
				"attributes": { "enabled": true }
			}"#,
		)
		.expect("Secret bundle should parse.");

		assert_eq!(secret.value.expose(), "pem text");
		assert_eq!(secret.content_type.as_deref(), Some("application/x-pem-file"));
	}
}
