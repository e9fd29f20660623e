//! App certificate kept in Azure Key Vault.
//!
//! The vault exposes a certificate's key and certificate as a secret of the same name. Only the
//! PEM content type is understood; the bundle is fetched on first use and reused afterwards.

// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	credential::{CertificateCredential, CertificateError},
	downstream::KeyVaultClient,
	error::ConfigError,
};

/// Content type Key Vault records for PEM certificate secrets.
pub const PEM_CONTENT_TYPE: &str = "application/x-pem-file";

/// Certificate credential loaded lazily from a vault.
pub struct KeyVaultCertificate {
	client: KeyVaultClient,
	name: String,
	loaded: OnceCell<Arc<CertificateCredential>>,
}
impl KeyVaultCertificate {
	/// Describes the certificate `name` in the vault behind `client`.
	pub fn new(client: KeyVaultClient, name: impl Into<String>) -> Self {
		Self { client, name: name.into(), loaded: OnceCell::new() }
	}

	/// Certificate name inside the vault.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the credential, reading the vault on the first call only.
	///
	/// A failed read is not cached, so the next call tries again.
	pub async fn load(&self) -> Result<Arc<CertificateCredential>> {
		self.loaded.get_or_try_init(|| self.fetch()).await.cloned()
	}

	async fn fetch(&self) -> Result<Arc<CertificateCredential>> {
		let secret = self.client.get_secret(&self.name).await?;

		if let Some(content_type) = secret.content_type.filter(|ct| ct != PEM_CONTENT_TYPE) {
			let unsupported = CertificateError::UnsupportedContentType { content_type };

			return Err(ConfigError::from(unsupported).into());
		}

		let certificate = CertificateCredential::from_pem_bundle(secret.value.expose())
			.map_err(ConfigError::from)?;

		Ok(Arc::new(certificate))
	}
}
impl Debug for KeyVaultCertificate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeyVaultCertificate")
			.field("vault_url", &self.client.vault_url().as_str())
			.field("name", &self.name)
			.field("loaded", &self.loaded.is_initialized())
			.finish()
	}
}
