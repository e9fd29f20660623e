//! Helpers shared by the integration tests.

// crates.io
use reqwest::{Client, redirect::Policy};
// self
use identity_todo::http::HttpClient;

/// Builds an HTTP client that accepts the self-signed certificate `httpmock` serves, keeping the
/// no-redirect policy of [`HttpClient::new`].
pub fn test_http_client() -> HttpClient {
	let client = Client::builder()
		.redirect(Policy::none())
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	HttpClient::with_client(client)
}
