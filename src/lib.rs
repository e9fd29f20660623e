//! Confidential-client token acquisition for Microsoft identity platform daemons, plus the
//! permission-aware, multi-tenant To-Do store those daemons talk to.
//!
//! The crate covers the whole daemon loop: resolve a credential (client secret, certificate from
//! disk or Key Vault, or managed identity), acquire and cache an app-only token, attach it to
//! outbound requests, and serve an in-memory To-Do API that enforces application versus
//! delegated ownership rules.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authority;
pub mod cache;
pub mod client;
pub mod config;
pub mod credential;
pub mod downstream;
pub mod error;
pub mod http;
pub mod managed_identity;
pub mod oauth;
pub mod obs;
#[cfg(feature = "server")] pub mod server;
pub mod signer;
pub mod todo;

mod _prelude {
	pub use std::{
		collections::{HashMap, hash_map::DefaultHasher},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)]
use {
	color_eyre as _, httpmock as _, tokio as _, tower as _, tracing_subscriber as _,
};
