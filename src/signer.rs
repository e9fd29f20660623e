//! Attaching bearer tokens to outbound requests.

// crates.io
use reqwest::{
	RequestBuilder,
	header::{ACCEPT, AUTHORIZATION, HeaderValue},
};
// self
use crate::{_prelude::*, auth::AccessToken};

/// Describes how to attach an [`AccessToken`] to a request without constraining the HTTP client
/// type.
pub trait RequestSigner<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the request and returns it with authorization state attached.
	fn attach_token(&self, request: Request, token: &AccessToken) -> Result<Request, Error>;
}

/// Adds `Authorization: Bearer ..` and `Accept: application/json` to reqwest requests.
#[derive(Clone, Copy, Debug, Default)]
pub struct BearerSigner;
impl RequestSigner<RequestBuilder, Error> for BearerSigner {
	fn attach_token(&self, request: RequestBuilder, token: &AccessToken) -> Result<RequestBuilder> {
		let mut authorization = HeaderValue::from_str(&token.authorization_value())
			.map_err(|_| Error::MalformedToken)?;

		authorization.set_sensitive(true);

		Ok(request
			.header(AUTHORIZATION, authorization)
			.header(ACCEPT, HeaderValue::from_static("application/json")))
	}
}
