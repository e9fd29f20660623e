//! Certificate credentials and RS256 client assertions.
//!
//! Entra accepts a JWT signed with the app certificate's private key in place of a client
//! secret. The assertion header carries `x5t`, the base64url SHA-1 thumbprint of the DER
//! certificate, so the authority can pick the matching public key.

// std
use std::{fs, path::Path};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use pem::Pem;
use sha1::{Digest, Sha1};
use x509_parser::{error::X509Error, nom};
// self
use crate::{_prelude::*, auth::ClientId, config::CertificatePaths};

/// `client_assertion_type` value for JWT bearer assertions.
pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

const ASSERTION_LIFETIME: Duration = Duration::minutes(10);
const CERTIFICATE_TAG: &str = "CERTIFICATE";
const PRIVATE_KEY_TAGS: [&str; 2] = ["PRIVATE KEY", "RSA PRIVATE KEY"];

/// Failures while loading certificate material or signing assertions.
#[derive(Debug, ThisError)]
pub enum CertificateError {
	/// A PEM file could not be read.
	#[error("Certificate file {path} could not be read.")]
	Read {
		/// Path that failed to load.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// The text is not well-formed PEM.
	#[error("Certificate material is not valid PEM.")]
	Pem(#[from] pem::PemError),
	/// The PEM text holds no `CERTIFICATE` block.
	#[error("No PEM certificate block was found.")]
	MissingCertificateBlock,
	/// The PEM text holds no private key block.
	#[error("No PEM private key block was found.")]
	MissingPrivateKeyBlock,
	/// The certificate block is not an X.509 certificate.
	#[error("PEM certificate block is not a valid X.509 certificate.")]
	InvalidCertificate(#[source] nom::Err<X509Error>),
	/// A Key Vault secret is stored in a format other than PEM.
	#[error("Key Vault certificate content type {content_type} is not supported.")]
	UnsupportedContentType {
		/// Content type reported by the vault.
		content_type: String,
	},
	/// The private key could not be parsed as an RSA PEM key.
	#[error("Private key is not a valid RSA PEM key.")]
	PrivateKey(#[source] jsonwebtoken::errors::Error),
	/// Signing the assertion failed.
	#[error("Client assertion could not be signed.")]
	Sign(#[source] jsonwebtoken::errors::Error),
}

/// Claims of a client assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Token endpoint the assertion is presented to.
	pub aud: String,
	/// Client id.
	pub iss: String,
	/// Client id.
	pub sub: String,
	/// Unique assertion id.
	pub jti: String,
	/// Not-before, seconds since the epoch.
	pub nbf: i64,
	/// Issued-at, seconds since the epoch.
	pub iat: i64,
	/// Expiry, seconds since the epoch.
	pub exp: i64,
}

/// App certificate together with the key that signs assertions.
#[derive(Clone)]
pub struct CertificateCredential {
	thumbprint: String,
	key: EncodingKey,
}
impl CertificateCredential {
	/// Loads both PEM files named by `paths`.
	pub fn from_paths(paths: &CertificatePaths) -> Result<Self, CertificateError> {
		let certificate = read_pem(&paths.certificate_path)?;
		let key = read_pem(&paths.private_key_path)?;

		Self::from_pem(&certificate, &key)
	}

	/// Builds a credential from in-memory PEM text.
	pub fn from_pem(certificate_pem: &str, key_pem: &str) -> Result<Self, CertificateError> {
		let certificate = pem::parse_many(certificate_pem)?;
		let key = pem::parse_many(key_pem)?;

		Self::from_blocks(&certificate, &key)
	}

	/// Builds a credential from one PEM document holding both the key and the certificate, the
	/// layout Key Vault uses for `application/x-pem-file` secrets.
	pub fn from_pem_bundle(bundle: &str) -> Result<Self, CertificateError> {
		let blocks = pem::parse_many(bundle)?;

		Self::from_blocks(&blocks, &blocks)
	}

	fn from_blocks(certificate: &[Pem], key: &[Pem]) -> Result<Self, CertificateError> {
		let der = certificate_der(certificate)?;
		let thumbprint = URL_SAFE_NO_PAD.encode(Sha1::digest(der));
		let key = key
			.iter()
			.find(|block| PRIVATE_KEY_TAGS.contains(&block.tag()))
			.ok_or(CertificateError::MissingPrivateKeyBlock)?;
		// The key loader reads only the first block of its input.
		let key = EncodingKey::from_rsa_pem(pem::encode(key).as_bytes())
			.map_err(CertificateError::PrivateKey)?;

		Ok(Self { thumbprint, key })
	}

	/// Base64url SHA-1 thumbprint, sent as the `x5t` header.
	pub fn thumbprint(&self) -> &str {
		&self.thumbprint
	}

	/// Signs a client assertion for `token_endpoint`, valid for ten minutes from `now`.
	pub fn assertion(
		&self,
		token_endpoint: &Url,
		client_id: &ClientId,
		now: OffsetDateTime,
	) -> Result<String, CertificateError> {
		let mut header = Header::new(Algorithm::RS256);

		header.x5t = Some(self.thumbprint.clone());

		let issued_at = now.unix_timestamp();
		let claims = AssertionClaims {
			aud: token_endpoint.to_string(),
			iss: client_id.to_string(),
			sub: client_id.to_string(),
			jti: uuid::Uuid::new_v4().to_string(),
			nbf: issued_at,
			iat: issued_at,
			exp: (now + ASSERTION_LIFETIME).unix_timestamp(),
		};

		jsonwebtoken::encode(&header, &claims, &self.key).map_err(CertificateError::Sign)
	}
}
impl Debug for CertificateCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CertificateCredential")
			.field("thumbprint", &self.thumbprint)
			.field("key", &"<redacted>")
			.finish()
	}
}

fn read_pem(path: impl AsRef<Path>) -> Result<String, CertificateError> {
	let path = path.as_ref();

	fs::read_to_string(path)
		.map_err(|source| CertificateError::Read { path: path.display().to_string(), source })
}

// The first certificate is the leaf; any that follow are its chain.
fn certificate_der(blocks: &[Pem]) -> Result<&[u8], CertificateError> {
	let der = blocks
		.iter()
		.find(|block| block.tag() == CERTIFICATE_TAG)
		.map(Pem::contents)
		.ok_or(CertificateError::MissingCertificateBlock)?;

	x509_parser::parse_x509_certificate(der).map_err(CertificateError::InvalidCertificate)?;

	Ok(der)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const CERT: &str = include_str!("../../tests/fixtures/daemon-cert.pem");
	const KEY: &str = include_str!("../../tests/fixtures/daemon-key.pem");

	fn decode_segment<T>(segment: &str) -> T
	where
		T: for<'de> Deserialize<'de>,
	{
		let bytes = URL_SAFE_NO_PAD.decode(segment).expect("JWT segment should be base64url.");

		serde_json::from_slice(&bytes).expect("JWT segment should be JSON.")
	}

	#[test]
	fn thumbprint_matches_openssl_fingerprint() {
		let credential =
			CertificateCredential::from_pem(CERT, KEY).expect("Fixture certificate should load.");

		assert_eq!(credential.thumbprint(), "AKz5I6egwEJ41tzi1kkdHYeigIU");
		assert!(!format!("{credential:?}").contains("BEGIN"));
	}

	#[test]
	fn assertion_carries_expected_header_and_claims() {
		let credential =
			CertificateCredential::from_pem(CERT, KEY).expect("Fixture certificate should load.");
		let endpoint = Url::parse("https://login.microsoftonline.com/contoso/oauth2/v2.0/token")
			.expect("Endpoint fixture should parse.");
		let client_id = ClientId::new("6731de76-14a6-49ae-97bc-6eba6914391e")
			.expect("Client fixture should be valid.");
		let now = macros::datetime!(2025-03-01 08:00 UTC);
		let jwt = credential.assertion(&endpoint, &client_id, now).expect("Assertion should sign.");
		let segments = jwt.split('.').collect::<Vec<_>>();

		assert_eq!(segments.len(), 3);

		let header = jsonwebtoken::decode_header(&jwt).expect("Header should decode.");

		assert_eq!(header.alg, Algorithm::RS256);
		assert_eq!(header.x5t.as_deref(), Some("AKz5I6egwEJ41tzi1kkdHYeigIU"));

		let claims: AssertionClaims = decode_segment(segments[1]);

		assert_eq!(claims.aud, endpoint.as_str());
		assert_eq!(claims.iss, client_id.as_str());
		assert_eq!(claims.sub, client_id.as_str());
		assert_eq!(claims.iat, now.unix_timestamp());
		assert_eq!(claims.exp - claims.iat, 600);
		assert!(uuid::Uuid::parse_str(&claims.jti).is_ok());
	}

	#[test]
	fn rejects_pem_without_certificate_block() {
		assert!(matches!(
			CertificateCredential::from_pem(KEY, KEY),
			Err(CertificateError::MissingCertificateBlock)
		));
		assert!(matches!(
			CertificateCredential::from_pem(CERT, "not a key"),
			Err(CertificateError::MissingPrivateKeyBlock)
		));
	}

	#[test]
	fn rejects_certificate_block_that_is_not_x509() {
		let bogus = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";

		assert!(matches!(
			CertificateCredential::from_pem(bogus, KEY),
			Err(CertificateError::InvalidCertificate(_))
		));
	}

	#[test]
	fn bundle_with_key_first_loads_like_separate_files() {
		let bundle = format!("{KEY}\n{CERT}");
		let credential = CertificateCredential::from_pem_bundle(&bundle)
			.expect("Key Vault style bundle should load.");

		assert_eq!(credential.thumbprint(), "AKz5I6egwEJ41tzi1kkdHYeigIU");
	}
}
