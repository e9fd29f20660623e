//! Confidential-client credential selection.
//!
//! A daemon proves its identity with exactly one mechanism. [`ClientCredential::resolve`] picks
//! it from the `AzureAd` settings section: a usable client secret wins, then a certificate, then
//! a managed identity.

pub mod certificate;
pub mod key_vault;

pub use certificate::*;
pub use key_vault::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::TokenSource,
	config::{AzureAdOptions, CertificateDescription, KeyVaultCertificateDescription},
	downstream::KeyVaultClient,
	error::ConfigError,
	managed_identity::ManagedIdentity,
};

/// Template value shipped in sample settings files; never a real secret.
pub const CLIENT_SECRET_PLACEHOLDER: &str = "[Enter here a client secret for your application]";

/// Mechanism used to authenticate the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
	/// Shared secret sent in the token request body.
	ClientSecret,
	/// Signed JWT client assertion.
	Certificate,
	/// Token issued by the Azure compute host.
	ManagedIdentity,
}
impl CredentialKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKind::ClientSecret => "client_secret",
			CredentialKind::Certificate => "certificate",
			CredentialKind::ManagedIdentity => "managed_identity",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Resolved credential ready to be used by the token acquirer.
#[derive(Clone, Debug)]
pub enum ClientCredential {
	/// Client secret.
	Secret(TokenSecret),
	/// Certificate with its private key.
	Certificate(Arc<CertificateCredential>),
	/// Certificate read from Key Vault on first use.
	KeyVaultCertificate(Arc<KeyVaultCertificate>),
	/// Managed identity of the hosting compute resource.
	ManagedIdentity(ManagedIdentity),
}
impl ClientCredential {
	/// Picks the credential configured in `options`.
	///
	/// Blank secrets and the settings-template placeholder are treated as absent. Certificate
	/// files are loaded eagerly so a bad path fails at startup. A Key Vault certificate is read
	/// with the managed identity (the configured one, else the system-assigned one) when the
	/// first token is requested.
	pub fn resolve(options: &AzureAdOptions) -> Result<Self> {
		if let Some(secret) = options.client_secret.as_ref().filter(|s| is_usable_secret(s)) {
			return Ok(Self::Secret(secret.clone()));
		}

		match &options.certificate {
			Some(CertificateDescription::Path(paths)) => {
				let certificate =
					CertificateCredential::from_paths(paths).map_err(ConfigError::from)?;

				return Ok(Self::Certificate(Arc::new(certificate)));
			},
			Some(CertificateDescription::KeyVault(description)) => {
				let identity =
					ManagedIdentity::new(&options.managed_identity.clone().unwrap_or_default())?;

				return Self::key_vault_certificate(description, Arc::new(identity));
			},
			None => {},
		}

		if let Some(managed) = &options.managed_identity {
			return Ok(Self::ManagedIdentity(ManagedIdentity::new(managed)?));
		}

		Err(ConfigError::MissingCredential.into())
	}

	/// Certificate `description` read from the vault with tokens from `vault_tokens`.
	pub fn key_vault_certificate(
		description: &KeyVaultCertificateDescription,
		vault_tokens: Arc<dyn TokenSource>,
	) -> Result<Self> {
		let client = KeyVaultClient::new(description.parsed_key_vault_url()?, vault_tokens)?;
		let certificate = KeyVaultCertificate::new(client, &description.key_vault_certificate_name);

		Ok(Self::KeyVaultCertificate(Arc::new(certificate)))
	}

	/// Kind of this credential.
	pub fn kind(&self) -> CredentialKind {
		match self {
			Self::Secret(_) => CredentialKind::ClientSecret,
			Self::Certificate(_) | Self::KeyVaultCertificate(_) => CredentialKind::Certificate,
			Self::ManagedIdentity(_) => CredentialKind::ManagedIdentity,
		}
	}
}

fn is_usable_secret(secret: &TokenSecret) -> bool {
	!secret.is_blank() && secret.expose() != CLIENT_SECRET_PLACEHOLDER
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::{ClientId, TenantId},
		config::ManagedIdentityOptions,
	};

	fn options() -> AzureAdOptions {
		AzureAdOptions::new(
			TenantId::new("contoso.onmicrosoft.com").expect("Tenant fixture should be valid."),
			ClientId::new("6731de76-14a6-49ae-97bc-6eba6914391e")
				.expect("Client fixture should be valid."),
		)
	}

	fn fixture_certificate() -> CertificateDescription {
		CertificateDescription::from_paths(
			concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/daemon-cert.pem"),
			concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/daemon-key.pem"),
		)
	}

	#[test]
	fn secret_takes_precedence() {
		let credential = ClientCredential::resolve(
			&options()
				.with_client_secret("s3cr3t")
				.with_certificate(fixture_certificate())
				.with_managed_identity(ManagedIdentityOptions::default()),
		)
		.expect("Secret should resolve.");

		assert_eq!(credential.kind(), CredentialKind::ClientSecret);
	}

	#[test]
	fn placeholder_and_blank_secrets_fall_through_to_certificate() {
		for secret in [CLIENT_SECRET_PLACEHOLDER, "", "   "] {
			let credential = ClientCredential::resolve(
				&options().with_client_secret(secret).with_certificate(fixture_certificate()),
			)
			.expect("Certificate should resolve.");

			assert_eq!(credential.kind(), CredentialKind::Certificate);
		}
	}

	#[test]
	fn managed_identity_is_the_last_resort() {
		let credential = ClientCredential::resolve(
			&options()
				.with_client_secret(CLIENT_SECRET_PLACEHOLDER)
				.with_managed_identity(ManagedIdentityOptions::default()),
		)
		.expect("Managed identity should resolve.");

		assert_eq!(credential.kind(), CredentialKind::ManagedIdentity);
	}

	#[test]
	fn nothing_configured_is_an_error() {
		let placeholder_only = options().with_client_secret(CLIENT_SECRET_PLACEHOLDER);
		let err = ClientCredential::resolve(&placeholder_only)
			.expect_err("Placeholder alone must not resolve.");

		assert!(matches!(err, Error::Config(ConfigError::MissingCredential)));
	}

	#[test]
	fn unreadable_certificate_fails_resolution() {
		let err = ClientCredential::resolve(&options().with_certificate(
			CertificateDescription::from_paths("/nonexistent/cert.pem", "/nonexistent/key.pem"),
		))
		.expect_err("Missing certificate files must fail.");

		assert!(matches!(err, Error::Config(ConfigError::Certificate(_))));
	}

	#[test]
	fn key_vault_certificate_is_deferred_until_first_use() {
		let credential = ClientCredential::resolve(&options().with_certificate(
			CertificateDescription::from_key_vault("https://contoso.vault.azure.net/", "daemon"),
		))
		.expect("Key Vault certificate should resolve without network access.");

		assert_eq!(credential.kind(), CredentialKind::Certificate);
		assert!(matches!(
			credential,
			ClientCredential::KeyVaultCertificate(ref cert) if cert.name() == "daemon"
		));
	}

	#[test]
	fn key_vault_url_must_parse() {
		let err = ClientCredential::resolve(
			&options().with_certificate(CertificateDescription::from_key_vault("vault", "daemon")),
		)
		.expect_err("Relative vault URL must fail.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidUrl { .. })));
	}
}
