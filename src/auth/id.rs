//! Strongly typed identifiers for tenants, client applications, and principals.
//!
//! Entra issues GUID-shaped object ids, but the store treats principal identifiers as opaque
//! strings: the only requirements are that they are non-empty, free of whitespace, and bounded
//! in length.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates and wraps an identifier.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				check($kind, view)?;

				Ok(Self(view.to_owned()))
			}

			/// Returns the identifier as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				check($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "Id({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

const MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (tenant, client, user).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (tenant, client, user).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed length.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (tenant, client, user).
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

def_id! { TenantId, "Directory (tenant) identifier or verified domain name.", "Tenant" }
def_id! { ClientId, "Application (client) identifier of a registered app.", "Client" }
def_id! { UserId, "Object identifier of the principal that owns a To-Do.", "User" }

fn check(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejects_blank_and_padded_values() {
		assert!(matches!(UserId::new(""), Err(IdentifierError::Empty { kind: "User" })));
		assert!(matches!(
			TenantId::new("contoso .onmicrosoft.com"),
			Err(IdentifierError::ContainsWhitespace { kind: "Tenant" })
		));
		assert!(ClientId::new(" 6731de76-14a6-49ae-97bc-6eba6914391e").is_err());
		assert!(UserId::new("a".repeat(MAX_LEN + 1)).is_err());
		UserId::new("a".repeat(MAX_LEN)).expect("Exact length should be accepted.");
	}

	#[test]
	fn guid_and_opaque_user_ids_are_both_accepted() {
		let guid = UserId::new("4c3a8f32-5a0f-4a7d-9a0c-1f3e5b7d9c11")
			.expect("GUID-shaped object id should be valid.");
		let opaque = UserId::new("alice-id").expect("Opaque identifier should be valid.");

		assert_eq!(guid.as_str(), "4c3a8f32-5a0f-4a7d-9a0c-1f3e5b7d9c11");
		assert_eq!(format!("{opaque:?}"), "UserId(alice-id)");
	}

	#[test]
	fn deserialization_runs_validation() {
		let tenant: TenantId = serde_json::from_str("\"contoso.onmicrosoft.com\"")
			.expect("Domain-style tenant should deserialize.");

		assert_eq!(tenant.to_string(), "contoso.onmicrosoft.com");
		assert!(serde_json::from_str::<UserId>("\"\"").is_err());
	}

	#[test]
	fn borrow_allows_str_lookups() {
		let map = HashMap::from([(UserId::new("bob-id").expect("Fixture should be valid."), 2_u8)]);

		assert_eq!(map.get("bob-id"), Some(&2));
	}
}
