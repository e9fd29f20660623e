//! Token-issuing authority: cloud instance plus tenant.
//!
//! Besides deriving the v2.0 token endpoint, the authority knows how Entra reports failures.
//! Error responses carry a generic OAuth `error` code and an `error_description` that starts
//! with an `AADSTS` code; the latter is far more specific, so it is consulted first.

// self
use crate::{
	_prelude::*,
	auth::TenantId,
	config::AzureAdOptions,
	error::ConfigError,
};

const INVALID_CLIENT_CODES: &[&str] = &[
	// Invalid client secret provided.
	"AADSTS7000215",
	// Application not found in the directory.
	"AADSTS700016",
	// Client assertion signature or certificate is not registered.
	"AADSTS700027",
];
const INVALID_SCOPE_CODES: &[&str] = &[
	// Scope is not valid.
	"AADSTS70011",
	// Scope for a client-credentials request must end in /.default.
	"AADSTS1002012",
];
const BODY_PREVIEW_LIMIT: usize = 256;

/// Cloud instance and tenant that issue tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authority {
	instance: Url,
	tenant: TenantId,
}
impl Authority {
	/// Validates the instance URL and pairs it with `tenant`.
	///
	/// Plain HTTP is only accepted for loopback hosts.
	pub fn new(instance: &str, tenant: TenantId) -> Result<Self> {
		let mut instance = Url::parse(instance)
			.map_err(|source| ConfigError::InvalidUrl { field: "AzureAd.Instance", source })?;

		if instance.scheme() != "https" && !is_loopback(&instance) {
			return Err(ConfigError::InsecureAuthority { url: instance.to_string() }.into());
		}
		if !instance.path().ends_with('/') {
			let path = format!("{}/", instance.path());

			instance.set_path(&path);
		}

		Ok(Self { instance, tenant })
	}

	/// Builds the authority described by the `AzureAd` section.
	pub fn from_options(options: &AzureAdOptions) -> Result<Self> {
		let tenant = options.tenant().cloned().ok_or(ConfigError::MissingTenant)?;

		Self::new(&options.instance, tenant)
	}

	/// Cloud instance, always ending with `/`.
	pub fn instance(&self) -> &Url {
		&self.instance
	}

	/// Tenant identifier.
	pub fn tenant(&self) -> &TenantId {
		&self.tenant
	}

	/// `{instance}{tenant}/oauth2/v2.0/token`.
	pub fn token_endpoint(&self) -> Result<Url> {
		self.instance.join(&format!("{}/oauth2/v2.0/token", self.tenant)).map_err(|source| {
			ConfigError::InvalidUrl { field: "AzureAd.TenantId", source }.into()
		})
	}
}
impl Display for Authority {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}{}", self.instance, self.tenant)
	}
}

/// Error categories the acquirer maps onto [`Error`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenErrorKind {
	/// Credential rejected or application unknown.
	InvalidClient,
	/// Scope malformed or not granted.
	InvalidScope,
	/// Grant rejected.
	InvalidGrant,
	/// Failure is temporary and should be retried.
	Transient,
}

/// Primitive view of a failed token response, independent of the HTTP client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenErrorContext {
	/// HTTP status code, when available.
	pub http_status: Option<u16>,
	/// OAuth `error` field.
	pub oauth_error: Option<String>,
	/// OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of a non-JSON body.
	pub body_preview: Option<String>,
}
impl TokenErrorContext {
	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth `error` code.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description`.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a truncated body preview.
	pub fn with_body_preview(mut self, body: impl AsRef<str>) -> Self {
		self.body_preview = Some(truncate_preview(body.as_ref()));

		self
	}

	/// Classifies the failure: `AADSTS` codes, then the OAuth code, then body hints, then the
	/// status.
	pub fn classify(&self) -> TokenErrorKind {
		let texts = [self.error_description.as_deref(), self.body_preview.as_deref()];

		texts
			.iter()
			.flatten()
			.find_map(|text| classify_aadsts(text))
			.or_else(|| self.oauth_error.as_deref().and_then(classify_oauth_error))
			.or_else(|| texts.iter().flatten().find_map(|text| classify_body(text)))
			.unwrap_or_else(|| classify_status(self.http_status))
	}
}

fn is_loopback(url: &Url) -> bool {
	matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"))
}

fn truncate_preview(body: &str) -> String {
	let mut preview = body.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	if body.chars().nth(BODY_PREVIEW_LIMIT).is_some() {
		preview.push('…');
	}

	preview
}

fn classify_aadsts(text: &str) -> Option<TokenErrorKind> {
	let contains_code = |codes: &[&str]| {
		codes.iter().any(|code| {
			text.match_indices(code).any(|(idx, _)| {
				!text[idx + code.len()..].starts_with(|c: char| c.is_ascii_digit())
			})
		})
	};

	if contains_code(INVALID_CLIENT_CODES) {
		Some(TokenErrorKind::InvalidClient)
	} else if contains_code(INVALID_SCOPE_CODES) {
		Some(TokenErrorKind::InvalidScope)
	} else {
		None
	}
}

fn classify_oauth_error(value: &str) -> Option<TokenErrorKind> {
	if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(TokenErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope") {
		Some(TokenErrorKind::InvalidScope)
	} else if value.eq_ignore_ascii_case("invalid_grant")
		|| value.eq_ignore_ascii_case("access_denied")
	{
		Some(TokenErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(TokenErrorKind::Transient)
	} else {
		None
	}
}

fn classify_body(body: &str) -> Option<TokenErrorKind> {
	let lowered = body.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_client") => Some(TokenErrorKind::InvalidClient),
		text if text.contains("invalid_scope") => Some(TokenErrorKind::InvalidScope),
		text if text.contains("invalid_grant") => Some(TokenErrorKind::InvalidGrant),
		text if text.contains("temporarily_unavailable") => Some(TokenErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> TokenErrorKind {
	match status {
		Some(401) => TokenErrorKind::InvalidClient,
		Some(400) => TokenErrorKind::InvalidGrant,
		_ => TokenErrorKind::Transient,
	}
}
