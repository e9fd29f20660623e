//! Client-credentials exchange on top of the `oauth2` crate.
//!
//! The request always authenticates in the body (`client_secret_post` style): Entra accepts the
//! secret there, and certificate assertions have no header form.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientSecret, HttpClientError, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId, ScopeSet, TokenSecret},
	authority::{TokenErrorContext, TokenErrorKind},
	credential::{CLIENT_ASSERTION_TYPE, CredentialKind},
	error::{ConfigError, TransientError, TransportError},
	http::{HttpClient, ResponseMetadata, ResponseMetadataSlot},
};

/// How the application authenticates to the token endpoint.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ClientAuth<'a> {
	/// `client_secret` form field.
	Secret(&'a TokenSecret),
	/// Signed `client_assertion` form field.
	Assertion(&'a str),
}
impl ClientAuth<'_> {
	fn kind(self) -> CredentialKind {
		match self {
			ClientAuth::Secret(_) => CredentialKind::ClientSecret,
			ClientAuth::Assertion(_) => CredentialKind::Certificate,
		}
	}
}

/// Performs the `client_credentials` grant against `token_endpoint`.
pub(crate) async fn exchange_client_credentials(
	http: &HttpClient,
	token_endpoint: &Url,
	client_id: &ClientId,
	auth: ClientAuth<'_>,
	scope: &ScopeSet,
) -> Result<AccessToken> {
	let token_url = TokenUrl::from_url(token_endpoint.clone());
	let mut oauth_client = BasicClient::new(oauth2::ClientId::new(client_id.to_string()))
		.set_token_uri(token_url)
		.set_auth_type(AuthType::RequestBody);

	if let ClientAuth::Secret(secret) = auth {
		oauth_client =
			oauth_client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
	}

	let meta = ResponseMetadataSlot::default();
	let instrumented = http.instrumented(meta.clone());
	let mut request = oauth_client.exchange_client_credentials();

	for value in scope.iter() {
		request = request.add_scope(Scope::new(value.to_owned()));
	}
	if let ClientAuth::Assertion(assertion) = auth {
		request = request
			.add_extra_param("client_assertion_type", CLIENT_ASSERTION_TYPE)
			.add_extra_param("client_assertion", assertion);
	}

	let response = request
		.request_async(&instrumented)
		.await
		.map_err(|err| map_request_error(meta.take(), err))?;

	map_token_response(scope.clone(), auth.kind(), response)
}

fn map_token_response(
	scope: ScopeSet,
	kind: CredentialKind,
	response: BasicTokenResponse,
) -> Result<AccessToken> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	build_token(scope, kind, response.access_token().secret().to_owned(), expires_in)
}

/// Validates `expires_in` and builds the token record.
fn build_token(
	scope: ScopeSet,
	kind: CredentialKind,
	secret: String,
	expires_in: i64,
) -> Result<AccessToken> {
	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	AccessToken::builder(scope, kind)
		.secret(secret)
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in))
		.build()
		.map_err(|_| ConfigError::MissingExpiresIn.into())
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.as_ref().and_then(|value| value.status);
	let retry_after = meta.as_ref().and_then(|value| value.retry_after);

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, status, retry_after),
		RequestTokenError::Request(HttpClientError::Reqwest(inner)) =>
			map_reqwest_error("token endpoint", status, retry_after, *inner),
		RequestTokenError::Request(HttpClientError::Http(inner)) => ConfigError::from(inner).into(),
		RequestTokenError::Request(HttpClientError::Io(inner)) => TransportError::Io(inner).into(),
		RequestTokenError::Request(other) => TransientError::TokenEndpoint {
			message: format!("HTTP client error: {other}"),
			status,
			retry_after,
		}
		.into(),
		RequestTokenError::Parse(source, _body) =>
			TransientError::TokenResponseParse { source, status }.into(),
		RequestTokenError::Other(message) =>
			TransientError::TokenEndpoint { message, status, retry_after }.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> Error {
	let mut ctx = TokenErrorContext::default().with_oauth_error(response.error().as_ref());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.as_str());
	}
	if let Some(status) = status {
		ctx = ctx.with_http_status(status);
	}

	let reason = response
		.error_description()
		.map(|description| description.trim_end_matches('.').to_owned())
		.unwrap_or_else(|| response.error().as_ref().to_owned());

	classified_error(ctx.classify(), reason, status, retry_after)
}

/// Converts a classified failure into the matching [`Error`] variant.
fn classified_error(
	kind: TokenErrorKind,
	reason: String,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> Error {
	match kind {
		TokenErrorKind::InvalidClient => Error::InvalidClient { reason },
		TokenErrorKind::InvalidScope => Error::InvalidScope { reason },
		TokenErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		TokenErrorKind::Transient =>
			TransientError::TokenEndpoint { message: reason, status, retry_after }.into(),
	}
}

/// Maps a reqwest failure raised while calling `target`.
pub(crate) fn map_reqwest_error(
	target: &'static str,
	status: Option<u16>,
	retry_after: Option<Duration>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: format!("request to the {target} timed out"),
			status: status.or_else(|| err.status().map(|code| code.as_u16())),
			retry_after,
		}
		.into();
	}

	TransportError::network(target, err).into()
}
