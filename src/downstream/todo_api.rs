//! Client for the To-Do REST API.

// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, UserId},
	client::TokenSource,
	config::DownstreamApiOptions,
	downstream::{self, ApiTransport},
	error::ConfigError,
	http::HttpClient,
	todo::{Todo, TodoDraft, TodoId},
};

const TARGET: &str = "todo api";

/// Calls `/api/todo` with an app-only bearer token.
#[derive(Clone, Debug)]
pub struct TodoApiClient {
	base_url: Url,
	transport: ApiTransport,
}
impl TodoApiClient {
	/// Creates a client for the API rooted at `base_url`, requesting tokens for `scope`.
	pub fn new(base_url: Url, scope: ScopeSet, tokens: Arc<dyn TokenSource>) -> Result<Self> {
		Ok(Self {
			base_url: downstream::with_trailing_slash(base_url),
			transport: ApiTransport::new(tokens, scope)?,
		})
	}

	/// Builds the client described by the `DownstreamApi` section.
	pub fn from_options(
		options: &DownstreamApiOptions,
		tokens: Arc<dyn TokenSource>,
	) -> Result<Self> {
		Self::new(options.parsed_base_url()?, options.required_scopes()?.clone(), tokens)
	}

	/// Replaces the HTTP client.
	pub fn with_http_client(mut self, http_client: HttpClient) -> Self {
		self.transport.set_http_client(http_client);

		self
	}

	/// Base address of the API.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// `GET /api/todo`.
	pub async fn list(&self) -> Result<Vec<Todo>> {
		let url = self.endpoint(None)?;

		self.transport.execute_json(TARGET, self.transport.http().get(url)).await
	}

	/// `GET /api/todo/{id}`.
	pub async fn get(&self, id: &TodoId) -> Result<Todo> {
		let url = self.endpoint(Some(id))?;

		self.transport.execute_json(TARGET, self.transport.http().get(url)).await
	}

	/// `POST /api/todo`; returns the id the API assigned.
	pub async fn add(&self, draft: &TodoDraft) -> Result<TodoId> {
		let url = self.endpoint(None)?;

		self.transport.execute_json(TARGET, self.transport.http().post(url).json(draft)).await
	}

	/// `POST /api/todo/{id}`; returns the updated id.
	pub async fn update(&self, id: &TodoId, draft: &TodoDraft) -> Result<TodoId> {
		let url = self.endpoint(Some(id))?;

		self.transport.execute_json(TARGET, self.transport.http().post(url).json(draft)).await
	}

	/// `DELETE /api/todo/{id}`.
	pub async fn delete(&self, id: &TodoId) -> Result<()> {
		let url = self.endpoint(Some(id))?;

		self.transport.execute(TARGET, self.transport.http().delete(url)).await?;

		Ok(())
	}

	fn endpoint(&self, id: Option<&TodoId>) -> Result<Url> {
		let path = match id {
			Some(id) => format!("api/todo/{id}"),
			None => "api/todo".to_owned(),
		};

		self.base_url.join(&path).map_err(|source| {
			ConfigError::InvalidUrl { field: "DownstreamApi.BaseUrl", source }.into()
		})
	}
}

/// Alice/Bob sample set with freshly generated principal ids.
pub fn sample_todos() -> Result<Vec<TodoDraft>> {
	let alice = UserId::new(Uuid::new_v4().to_string()).map_err(ConfigError::from)?;
	let bob = UserId::new(Uuid::new_v4().to_string()).map_err(ConfigError::from)?;

	Ok(vec![
		TodoDraft::new(alice.clone(), "Feed cat.", "Alice"),
		TodoDraft::new(alice, "Feed dog.", "Alice"),
		TodoDraft::new(bob.clone(), "Bake bread.", "Bob"),
		TodoDraft::new(bob, "Butter bread.", "Bob"),
	])
}

/// Uploads [`sample_todos`] and returns the ids the API assigned, in upload order.
pub async fn seed_sample_todos(client: &TodoApiClient) -> Result<Vec<TodoId>> {
	let mut ids = Vec::new();

	for draft in sample_todos()? {
		ids.push(client.add(&draft).await?);
	}

	Ok(ids)
}
