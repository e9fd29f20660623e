//! Typed `appsettings.json` model.
//!
//! The layout mirrors the settings files shipped with the identity-platform daemon samples:
//!
//! ```json
//! {
//!   "AzureAd": {
//!     "Instance": "https://login.microsoftonline.com/",
//!     "TenantId": "contoso.onmicrosoft.com",
//!     "ClientId": "6731de76-14a6-49ae-97bc-6eba6914391e",
//!     "ClientSecret": "[Enter here a client secret for your application]"
//!   },
//!   "DownstreamApi": {
//!     "BaseUrl": "https://localhost:44372/",
//!     "Scopes": "api://todo-api/.default"
//!   }
//! }
//! ```

// std
use std::{fs, path::Path};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, TenantId, TokenSecret},
	error::ConfigError,
};

/// Public cloud authority instance.
pub const DEFAULT_INSTANCE: &str = "https://login.microsoftonline.com/";
/// Base address the sample To-Do API listens on.
pub const DEFAULT_API_BASE_URL: &str = "https://localhost:44372/";

/// Root of the settings file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppSettings {
	/// Confidential-client registration.
	pub azure_ad: AzureAdOptions,
	/// API the daemon calls with its token.
	#[serde(default, alias = "DownStreamApi")]
	pub downstream_api: DownstreamApiOptions,
	/// Permissions the To-Do API demands from inbound tokens.
	#[serde(default)]
	pub required_todo_access_permissions: RequiredTodoAccessPermissions,
}
impl AppSettings {
	/// Reads and parses a settings file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadSettings {
			path: path.display().to_string(),
			source,
		})?;

		Self::from_json_str(&raw)
	}

	/// Parses settings from a JSON document, reporting the path of the first invalid field.
	pub fn from_json_str(raw: &str) -> Result<Self> {
		let deserializer = &mut serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(deserializer).map_err(|e| {
			let path = e.path().to_string();

			ConfigError::ParseSettings { path, source: e.into_inner() }.into()
		})
	}
}

/// `AzureAd` section: who the daemon is and how it proves it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AzureAdOptions {
	/// Cloud instance, e.g. `https://login.microsoftonline.com/`.
	#[serde(default = "default_instance")]
	pub instance: String,
	/// Directory (tenant) id.
	#[serde(default)]
	pub tenant_id: Option<TenantId>,
	/// Verified domain, used when no tenant id is configured.
	#[serde(default)]
	pub domain: Option<TenantId>,
	/// Application (client) id.
	pub client_id: ClientId,
	/// Client secret, if the app authenticates with one.
	#[serde(default)]
	pub client_secret: Option<TokenSecret>,
	/// Certificate, if the app authenticates with one.
	#[serde(default)]
	pub certificate: Option<CertificateDescription>,
	/// Managed identity, if the daemon runs on Azure compute.
	#[serde(default)]
	pub managed_identity: Option<ManagedIdentityOptions>,
}
impl AzureAdOptions {
	/// Creates options for the provided tenant and client with no credential.
	pub fn new(tenant: TenantId, client_id: ClientId) -> Self {
		Self {
			instance: default_instance(),
			tenant_id: Some(tenant),
			domain: None,
			client_id,
			client_secret: None,
			certificate: None,
			managed_identity: None,
		}
	}

	/// Overrides the cloud instance.
	pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
		self.instance = instance.into();

		self
	}

	/// Sets the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the certificate description.
	pub fn with_certificate(mut self, certificate: CertificateDescription) -> Self {
		self.certificate = Some(certificate);

		self
	}

	/// Sets the managed-identity options.
	pub fn with_managed_identity(mut self, options: ManagedIdentityOptions) -> Self {
		self.managed_identity = Some(options);

		self
	}

	/// Tenant to request tokens from: `TenantId`, falling back to `Domain`.
	pub fn tenant(&self) -> Option<&TenantId> {
		self.tenant_id.as_ref().or(self.domain.as_ref())
	}
}

/// Where the app certificate and its RSA private key come from.
///
/// `SourceType` selects the variant:
///
/// ```json
/// { "SourceType": "Path", "CertificatePath": "cert.pem", "PrivateKeyPath": "key.pem" }
/// ```
///
/// ```json
/// {
///   "SourceType": "KeyVault",
///   "KeyVaultUrl": "https://contoso.vault.azure.net/",
///   "KeyVaultCertificateName": "daemon-cert"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "SourceType")]
pub enum CertificateDescription {
	/// PEM files on disk.
	Path(CertificatePaths),
	/// PEM certificate kept in Azure Key Vault together with its private key.
	KeyVault(KeyVaultCertificateDescription),
}
impl CertificateDescription {
	/// Describes PEM files on disk.
	pub fn from_paths(
		certificate_path: impl Into<String>,
		private_key_path: impl Into<String>,
	) -> Self {
		Self::Path(CertificatePaths {
			certificate_path: certificate_path.into(),
			private_key_path: private_key_path.into(),
		})
	}

	/// Describes a certificate stored in the vault at `key_vault_url`.
	pub fn from_key_vault(
		key_vault_url: impl Into<String>,
		certificate_name: impl Into<String>,
	) -> Self {
		Self::KeyVault(KeyVaultCertificateDescription {
			key_vault_url: key_vault_url.into(),
			key_vault_certificate_name: certificate_name.into(),
		})
	}
}

/// PEM certificate and private key files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CertificatePaths {
	/// Path to the PEM certificate.
	pub certificate_path: String,
	/// Path to the PEM private key.
	pub private_key_path: String,
}

/// Certificate stored in Azure Key Vault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyVaultCertificateDescription {
	/// Vault address, e.g. `https://contoso.vault.azure.net/`.
	pub key_vault_url: String,
	/// Certificate name inside the vault.
	pub key_vault_certificate_name: String,
}
impl KeyVaultCertificateDescription {
	/// Parses the vault address.
	pub fn parsed_key_vault_url(&self) -> Result<Url> {
		Url::parse(&self.key_vault_url).map_err(|source| {
			ConfigError::InvalidUrl { field: "AzureAd.Certificate.KeyVaultUrl", source }.into()
		})
	}
}

/// Managed-identity settings.
///
/// The host picks the protocol: App Service and Functions publish `IDENTITY_ENDPOINT` and
/// `IDENTITY_HEADER`, virtual machines answer on the Instance Metadata Service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedIdentityOptions {
	/// Client id of a user-assigned identity; `None` selects the system-assigned identity.
	#[serde(default)]
	pub user_assigned_client_id: Option<String>,
}
impl ManagedIdentityOptions {
	/// Selects a user-assigned identity.
	pub fn with_user_assigned_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.user_assigned_client_id = Some(client_id.into());

		self
	}
}

/// `DownstreamApi` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DownstreamApiOptions {
	/// Base address of the API.
	#[serde(default = "default_api_base_url")]
	pub base_url: String,
	/// Scopes to request; `{resource}/.default` for app-only tokens.
	#[serde(default)]
	pub scopes: ScopeSet,
}
impl DownstreamApiOptions {
	/// Parses the base address.
	pub fn parsed_base_url(&self) -> Result<Url> {
		Url::parse(&self.base_url).map_err(|source| {
			ConfigError::InvalidUrl { field: "DownstreamApi.BaseUrl", source }.into()
		})
	}

	/// Returns the scopes, failing when none are configured.
	pub fn required_scopes(&self) -> Result<&ScopeSet> {
		if self.scopes.is_empty() {
			return Err(ConfigError::MissingScopes.into());
		}

		Ok(&self.scopes)
	}
}
impl Default for DownstreamApiOptions {
	fn default() -> Self {
		Self { base_url: default_api_base_url(), scopes: ScopeSet::default() }
	}
}

/// Permissions the To-Do API requires, per caller kind and access level.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequiredTodoAccessPermissions {
	/// Delegated scopes for read routes.
	#[serde(default)]
	pub required_delegated_todo_read_claims: ScopeSet,
	/// Delegated scopes for write routes.
	#[serde(default)]
	pub required_delegated_todo_write_claims: ScopeSet,
	/// App roles for read routes.
	#[serde(default)]
	pub required_application_todo_read_claims: ScopeSet,
	/// App roles for read and write routes.
	#[serde(default)]
	pub required_application_todo_read_write_claims: ScopeSet,
}

fn default_instance() -> String {
	DEFAULT_INSTANCE.into()
}

fn default_api_base_url() -> String {
	DEFAULT_API_BASE_URL.into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_sample_settings() {
		let settings = AppSettings::from_json_str(
			r#"{
				"AzureAd": {
					"Domain": "contoso.onmicrosoft.com",
					"ClientId": "6731de76-14a6-49ae-97bc-6eba6914391e",
					"ClientSecret": "[Enter here a client secret for your application]"
				},
				"DownStreamApi": { "Scopes": "api://todo-api/.default" },
				"RequiredTodoAccessPermissions": {
					"RequiredDelegatedTodoReadClaims": "ToDoList.Read",
					"RequiredApplicationTodoReadWriteClaims": "ToDoList.ReadWrite.All"
				}
			}"#,
		)
		.expect("Sample settings should parse.");

		assert_eq!(settings.azure_ad.instance, DEFAULT_INSTANCE);
		assert_eq!(
			settings.azure_ad.tenant().map(TenantId::as_str),
			Some("contoso.onmicrosoft.com")
		);
		assert_eq!(settings.downstream_api.base_url, DEFAULT_API_BASE_URL);
		assert_eq!(
			settings
				.downstream_api
				.required_scopes()
				.expect("Scopes are configured.")
				.normalized(),
			"api://todo-api/.default"
		);
		assert!(
			settings
				.required_todo_access_permissions
				.required_delegated_todo_read_claims
				.contains("ToDoList.Read")
		);
		assert!(
			settings
				.required_todo_access_permissions
				.required_application_todo_read_claims
				.is_empty()
		);
	}

	#[test]
	fn parse_errors_point_at_the_field() {
		let err = AppSettings::from_json_str(r#"{ "AzureAd": { "ClientId": "has space" } }"#)
			.expect_err("Whitespace in a client id must be rejected.");

		match err {
			Error::Config(ConfigError::ParseSettings { path, .. }) =>
				assert_eq!(path, "AzureAd.ClientId"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn certificate_source_type_selects_the_loader() {
		let settings = AppSettings::from_json_str(
			r#"{
				"AzureAd": {
					"TenantId": "contoso.onmicrosoft.com",
					"ClientId": "6731de76-14a6-49ae-97bc-6eba6914391e",
					"Certificate": {
						"SourceType": "KeyVault",
						"KeyVaultUrl": "https://contoso.vault.azure.net/",
						"KeyVaultCertificateName": "daemon-cert"
					},
					"ManagedIdentity": { "UserAssignedClientId": "3b57c42c-3201-4295-ae27-d6baec5b7027" }
				}
			}"#,
		)
		.expect("Key Vault settings should parse.");

		assert_eq!(
			settings.azure_ad.certificate,
			Some(CertificateDescription::from_key_vault(
				"https://contoso.vault.azure.net/",
				"daemon-cert"
			))
		);
		assert_eq!(
			settings.azure_ad.managed_identity.and_then(|options| options.user_assigned_client_id),
			Some("3b57c42c-3201-4295-ae27-d6baec5b7027".into())
		);

		let paths: CertificateDescription = serde_json::from_str(
			r#"{ "SourceType": "Path", "CertificatePath": "c.pem", "PrivateKeyPath": "k.pem" }"#,
		)
		.expect("Path description should parse.");

		assert_eq!(paths, CertificateDescription::from_paths("c.pem", "k.pem"));
		assert!(
			serde_json::from_str::<CertificateDescription>(r#"{ "CertificatePath": "c.pem" }"#)
				.is_err()
		);
	}

	#[test]
	fn missing_scopes_are_reported() {
		let err = DownstreamApiOptions::default()
			.required_scopes()
			.expect_err("Empty scopes must be rejected.");

		assert_eq!(
			err.to_string(),
			"'Scopes' must be set in the 'DownStreamApi' of appsettings.json file."
		);
	}
}
