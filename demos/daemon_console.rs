//! Runs the whole daemon loop in one process: a mocked Entra token endpoint, the To-Do API on a
//! loopback port, and a daemon that acquires an app-only token, seeds the sample To-Dos, and
//! prints them.

// std
use std::sync::Arc;
// crates.io
use axum::Extension;
use color_eyre::Result;
use httpmock::prelude::*;
use reqwest::{Client, redirect::Policy};
use tracing_subscriber::EnvFilter;
// self
use identity_todo::{
	client::{TokenAcquirer, TokenSource},
	config::AppSettings,
	downstream::{TodoApiClient, seed_sample_todos},
	http::HttpClient,
	server::{TodoApiState, TodoClaims, todo_router},
	todo::TodoStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	let entra = MockServer::start_async().await;
	let token_mock = entra
		.mock_async(|when, then| {
			when.method(POST).path("/contoso.onmicrosoft.com/oauth2/v2.0/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-daemon-token\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await;
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
	let api_address = listener.local_addr()?;
	let settings = AppSettings::from_json_str(&format!(
		r#"{{
			"AzureAd": {{
				"Instance": "{instance}/",
				"TenantId": "contoso.onmicrosoft.com",
				"ClientId": "6731de76-14a6-49ae-97bc-6eba6914391e",
				"ClientSecret": "demo-secret"
			}},
			"DownstreamApi": {{
				"BaseUrl": "http://{api_address}/",
				"Scopes": "api://todo-api/.default"
			}},
			"RequiredTodoAccessPermissions": {{
				"RequiredDelegatedTodoReadClaims": "ToDoList.Read ToDoList.ReadWrite",
				"RequiredDelegatedTodoWriteClaims": "ToDoList.ReadWrite",
				"RequiredApplicationTodoReadClaims": "ToDoList.Read.All",
				"RequiredApplicationTodoReadWriteClaims": "ToDoList.ReadWrite.All"
			}}
		}}"#,
		instance = entra.base_url(),
	))?;
	let store = TodoStore::new();
	// Stands in for the JWT validation layer in front of a real deployment.
	let daemon_claims = TodoClaims::application(
		"c3e8a2b0-8d3f-4f42-9a65-0d7c6f0e1b2a",
		"ToDoList.ReadWrite.All".parse()?,
	);
	let api = todo_router(TodoApiState::new(
		store.clone(),
		settings.required_todo_access_permissions.clone(),
	))
	.layer(Extension(daemon_claims));
	let server = tokio::spawn(async move { axum::serve(listener, api).await });
	// The mock authority serves a self-signed certificate.
	let mock_tls = Client::builder()
		.redirect(Policy::none())
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()?;
	let acquirer = TokenAcquirer::from_options(&settings.azure_ad)?
		.with_http_client(HttpClient::with_client(mock_tls));
	let token = acquirer.access_token(settings.downstream_api.required_scopes()?).await?;

	println!("Token acquired, expires at {}.\n", token.expires_at);

	let client = TodoApiClient::from_options(&settings.downstream_api, Arc::new(acquirer))?;
	let ids = seed_sample_todos(&client).await?;

	println!("Uploaded {} To-Dos.\n", ids.len());

	for todo in client.list().await? {
		println!("{todo}\n");
	}

	println!("Store holds {} records.", store.len());

	token_mock.assert_calls_async(1).await;
	server.abort();

	Ok(())
}
