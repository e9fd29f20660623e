//! Crate-level error types shared by credential resolution, token acquisition, and the
//! downstream API clients.
//!
//! The To-Do store itself never produces these errors: access-control failures are reported as
//! outcome values (see [`crate::todo`]) so unauthorized callers cannot tell "absent" from
//! "not yours".

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token cache failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The authority rejected the client credential (bad secret, bad assertion, unknown app).
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Authority-supplied reason string.
		reason: String,
	},
	/// The requested scope is malformed or not granted to the application.
	#[error("Requested scope was rejected: {reason}.")]
	InvalidScope {
		/// Authority-supplied reason string.
		reason: String,
	},
	/// The authority rejected the grant itself.
	#[error("Authority rejected the grant: {reason}.")]
	InvalidGrant {
		/// Authority-supplied reason string.
		reason: String,
	},
	/// The host's managed-identity endpoint did not issue a token.
	#[error("Managed identity token request failed.")]
	ManagedIdentity(#[source] azure_core::Error),
	/// The issued token cannot be sent in an `Authorization` header.
	#[error("Access token contains characters that are not allowed in an HTTP header.")]
	MalformedToken,
	/// A downstream API answered with a body that does not match the expected shape.
	#[error("Downstream API returned a body that could not be decoded.")]
	ApiDecode(#[source] serde_path_to_error::Error<serde_json::Error>),
	/// A downstream API answered with a non-success status.
	#[error("Downstream API returned status {status}: {body}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Response body, truncated for logging.
		body: String,
	},
	/// A paged response linked to a page on another origin.
	#[error("Next page link {link} points outside {origin}.")]
	ForeignNextLink {
		/// Link the API returned.
		link: String,
		/// Origin the client is bound to.
		origin: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured URL cannot be parsed.
	#[error("Configuration contains an invalid URL for {field}.")]
	InvalidUrl {
		/// Configuration field holding the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The authority instance must use HTTPS.
	#[error("The authority instance must use HTTPS: {url}.")]
	InsecureAuthority {
		/// Offending URL.
		url: String,
	},
	/// No usable credential was configured.
	#[error(
		"You must choose between using client secret or certificate. Please update appsettings.json file."
	)]
	MissingCredential,
	/// Neither a tenant id nor a domain was configured.
	#[error("'TenantId' or 'Domain' must be set in the 'AzureAd' section of appsettings.json file.")]
	MissingTenant,
	/// Token requests need at least one scope.
	#[error("'Scopes' must be set in the 'DownStreamApi' of appsettings.json file.")]
	MissingScopes,
	/// Managed-identity endpoints take a single resource.
	#[error("Managed identity tokens require exactly one scope, got `{scopes}`.")]
	ManagedIdentityScope {
		/// Requested scopes, space separated.
		scopes: String,
	},
	/// Key Vault object names are limited to ASCII letters, digits, and dashes.
	#[error("`{name}` is not a valid Key Vault object name.")]
	InvalidKeyVaultName {
		/// Offending name.
		name: String,
	},
	/// Configuration file could not be read.
	#[error("Configuration file {path} could not be read.")]
	ReadSettings {
		/// Path that failed to load.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Configuration JSON is malformed; the path points at the offending field.
	#[error("Configuration is invalid at `{path}`.")]
	ParseSettings {
		/// JSON path of the offending field.
		path: String,
		/// Underlying parse failure.
		#[source]
		source: serde_json::Error,
	},
	/// An identifier in the configuration failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Request scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Certificate material could not be loaded or used.
	#[error(transparent)]
	Certificate(#[from] crate::credential::CertificateError),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Which endpoint was being called.
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during an HTTP exchange.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error raised while calling `target`.
	pub fn network(
		target: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { target, source: Box::new(src) }
	}
}
