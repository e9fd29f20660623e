//! Bearer-authenticated clients for the APIs a daemon calls.
//!
//! Each request acquires a token through a [`TokenSource`] (the acquirer answers from its cache
//! when it can), signs the request with [`BearerSigner`], and maps non-success statuses to
//! [`Error::Api`].

pub mod graph;
pub mod key_vault;
pub mod todo_api;

pub use graph::*;
pub use key_vault::*;
pub use todo_api::*;

// crates.io
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	client::TokenSource,
	error::ConfigError,
	http::{self, HttpClient},
	oauth,
	signer::{BearerSigner, RequestSigner},
};

const BODY_PREVIEW_LIMIT: usize = 512;

/// Token source, scope, and transport shared by the downstream clients.
#[derive(Clone)]
pub(crate) struct ApiTransport {
	http_client: HttpClient,
	tokens: Arc<dyn TokenSource>,
	scope: ScopeSet,
	signer: BearerSigner,
}
impl ApiTransport {
	pub(crate) fn new(tokens: Arc<dyn TokenSource>, scope: ScopeSet) -> Result<Self> {
		if scope.is_empty() {
			return Err(ConfigError::MissingScopes.into());
		}

		Ok(Self { http_client: HttpClient::new()?, tokens, scope, signer: BearerSigner })
	}

	pub(crate) fn set_http_client(&mut self, http_client: HttpClient) {
		self.http_client = http_client;
	}

	pub(crate) fn http(&self) -> &HttpClient {
		&self.http_client
	}

	/// Signs and sends `request`, returning the body of a successful response.
	pub(crate) async fn execute(
		&self,
		target: &'static str,
		request: RequestBuilder,
	) -> Result<Vec<u8>> {
		let token = self.tokens.access_token(&self.scope).await?;
		let request = self.signer.attach_token(request, &token)?;
		let response =
			request.send().await.map_err(|e| oauth::map_reqwest_error(target, None, None, e))?;
		let status = response.status();
		let retry_after = http::parse_retry_after(response.headers());
		let body = response.bytes().await.map_err(|e| {
			oauth::map_reqwest_error(target, Some(status.as_u16()), retry_after, e)
		})?;

		if !status.is_success() {
			return Err(Error::Api { status: status.as_u16(), body: body_preview(&body) });
		}

		Ok(body.to_vec())
	}

	/// Like [`ApiTransport::execute`], decoding the body as JSON.
	pub(crate) async fn execute_json<T>(
		&self,
		target: &'static str,
		request: RequestBuilder,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let body = self.execute(target, request).await?;

		decode(&body)
	}
}
impl Debug for ApiTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiTransport").field("scope", &self.scope).finish()
	}
}

pub(crate) fn decode<T>(body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let deserializer = &mut serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(deserializer).map_err(Error::ApiDecode)
}

/// Ensures `url` ends with `/` so relative joins append instead of replacing the last segment.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	match trimmed.char_indices().nth(BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}...", &trimmed[..cut]),
		None => trimmed.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn trailing_slash_is_added_once() {
		let bare = Url::parse("https://localhost:44372/base").expect("URL fixture should parse.");
		let slashed = Url::parse("https://localhost:44372/").expect("URL fixture should parse.");

		assert_eq!(with_trailing_slash(bare).as_str(), "https://localhost:44372/base/");
		assert_eq!(with_trailing_slash(slashed).as_str(), "https://localhost:44372/");
	}

	#[test]
	fn long_bodies_are_truncated() {
		let body = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let preview = body_preview(body.as_bytes());

		assert_eq!(preview.len(), BODY_PREVIEW_LIMIT + 3);
		assert!(preview.ends_with("..."));
		assert_eq!(body_preview(b"  denied \n"), "denied");
	}

	#[test]
	fn decode_failures_keep_the_json_path() {
		let err = decode::<Vec<crate::todo::Todo>>(br#"[{"id":"nope"}]"#)
			.expect_err("Invalid id must fail to decode.");

		match err {
			Error::ApiDecode(e) => assert_eq!(e.path().to_string(), "[0].id"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
