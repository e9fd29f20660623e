//! Microsoft Graph user listing.
//!
//! Graph pages collections and links the next page through `@odata.nextLink`; the client
//! follows those links until they run out or enough rows were collected. A link to another
//! origin ends paging with [`Error::ForeignNextLink`] before the bearer token is sent.

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	client::TokenSource,
	downstream::{self, ApiTransport},
	error::ConfigError,
	http::HttpClient,
};

/// Graph v1.0 root.
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0/";
/// App-only scope for Graph.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

const TARGET: &str = "microsoft graph";
const USER_SELECT: &str = "id,displayName,userPrincipalName";

/// Directory user as returned by `GET /users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
	/// Object id.
	pub id: String,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Sign-in name.
	#[serde(default)]
	pub user_principal_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserPage {
	#[serde(default)]
	value: Vec<GraphUser>,
	#[serde(default, rename = "@odata.nextLink")]
	next_link: Option<Url>,
}

/// Reads directory data with an app-only token.
#[derive(Clone, Debug)]
pub struct GraphClient {
	base_url: Url,
	transport: ApiTransport,
}
impl GraphClient {
	/// Creates a client rooted at `base_url`, requesting tokens for `scope`.
	pub fn new(base_url: Url, scope: ScopeSet, tokens: Arc<dyn TokenSource>) -> Result<Self> {
		Ok(Self {
			base_url: downstream::with_trailing_slash(base_url),
			transport: ApiTransport::new(tokens, scope)?,
		})
	}

	/// Creates a client for the public Graph endpoint.
	pub fn public(tokens: Arc<dyn TokenSource>) -> Result<Self> {
		let base_url = Url::parse(GRAPH_BASE_URL)
			.map_err(|source| ConfigError::InvalidUrl { field: "Graph.BaseUrl", source })?;
		let scope = ScopeSet::from_str(GRAPH_DEFAULT_SCOPE).map_err(ConfigError::from)?;

		Self::new(base_url, scope, tokens)
	}

	/// Replaces the HTTP client.
	pub fn with_http_client(mut self, http_client: HttpClient) -> Self {
		self.transport.set_http_client(http_client);

		self
	}

	/// Lists users, following `@odata.nextLink` while it stays on the base URL's origin.
	///
	/// `max_rows` caps the result; `None` reads every page.
	pub async fn list_users(&self, max_rows: Option<usize>) -> Result<Vec<GraphUser>> {
		let mut users = Vec::new();
		let mut next = Some(self.users_url()?);

		while let Some(url) = next.take() {
			if max_rows.is_some_and(|max| users.len() >= max) {
				break;
			}

			let page: UserPage =
				self.transport.execute_json(TARGET, self.transport.http().get(url)).await?;

			users.extend(page.value);
			next = page.next_link.map(|link| self.same_origin(link)).transpose()?;
		}

		if let Some(max) = max_rows {
			users.truncate(max);
		}

		Ok(users)
	}

	fn same_origin(&self, link: Url) -> Result<Url> {
		let origin = self.base_url.origin();

		if link.origin() != origin {
			return Err(Error::ForeignNextLink {
				link: link.to_string(),
				origin: origin.ascii_serialization(),
			});
		}

		Ok(link)
	}

	fn users_url(&self) -> Result<Url> {
		let mut url = self
			.base_url
			.join("users")
			.map_err(|source| ConfigError::InvalidUrl { field: "Graph.BaseUrl", source })?;

		url.query_pairs_mut().append_pair("$select", USER_SELECT);

		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::AccessToken, client::StaticTokenSource, credential::CredentialKind};

	fn client() -> GraphClient {
		let scope = ScopeSet::from_str(GRAPH_DEFAULT_SCOPE).expect("Scope fixture should parse.");
		let token = AccessToken::builder(scope.clone(), CredentialKind::ClientSecret)
			.secret("fixture")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token fixture should build.");

		GraphClient::new(
			Url::parse(GRAPH_BASE_URL).expect("URL fixture should parse."),
			scope,
			Arc::new(StaticTokenSource::new(token)),
		)
		.expect("Client should build.")
	}

	#[test]
	fn next_links_must_share_the_base_origin() {
		let client = client();
		let same = Url::parse("https://graph.microsoft.com/v1.0/users?$skiptoken=X")
			.expect("URL fixture should parse.");

		assert_eq!(client.same_origin(same.clone()).expect("Same origin should pass."), same);

		for foreign in [
			"https://attacker.example/v1.0/users",
			"http://graph.microsoft.com/v1.0/users",
			"https://graph.microsoft.com:8443/v1.0/users",
		] {
			let err = client
				.same_origin(Url::parse(foreign).expect("URL fixture should parse."))
				.expect_err("Foreign origin must be rejected.");

			assert!(matches!(
				err,
				Error::ForeignNextLink { ref origin, .. } if origin == "https://graph.microsoft.com"
			));
		}
	}

	#[test]
	fn pages_parse_next_links() {
		let page: UserPage = serde_json::from_str(
			r#"{
				"@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users",
				"@odata.nextLink": "https://graph.microsoft.com/v1.0/users?$skiptoken=X",
				"value": [{ "id": "4c3a8f32", "displayName": "Alice" }]
			}"#,
		)
		.expect("Graph page should parse.");

		assert_eq!(page.value[0].display_name.as_deref(), Some("Alice"));
		assert_eq!(page.value[0].user_principal_name, None);
		assert!(page.next_link.is_some());
	}
}
