//! Scope sets used for token requests and for permission checks on inbound claims.
//!
//! Entra daemons always request `{resource}/.default`; the API layer compares the `scp` and
//! `roles` claims against configured requirements. Both cases share one normalized type.

// std
use std::collections::BTreeSet;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserializer, Serializer, de::Error as DeError};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Deduplicated, sorted set of scope or permission names.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeSet(Arc<[String]>);
impl ScopeSet {
	/// Creates a normalized set from any iterator of scope strings.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
			}

			set.insert(owned);
		}

		Ok(Self(set.into_iter().collect::<Vec<_>>().into()))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains `scope`.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Returns true if every scope of `required` is present in `self`.
	pub fn contains_all(&self, required: &ScopeSet) -> bool {
		required.iter().all(|scope| self.contains(scope))
	}

	/// Iterator over normalized scopes.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Space-delimited representation, as sent in the `scope` form field.
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}

	/// Stable base64url SHA-256 digest of the normalized string, used as a cache key segment.
	pub fn fingerprint(&self) -> String {
		URL_SAFE_NO_PAD.encode(Sha256::digest(self.normalized().as_bytes()))
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.0).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s.split_whitespace())
	}
}
impl TryFrom<Vec<String>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.normalized())
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Delimited(String),
			List(Vec<String>),
		}

		match Raw::deserialize(deserializer)? {
			Raw::Delimited(value) => value.parse().map_err(DeError::custom),
			Raw::List(values) => ScopeSet::new(values).map_err(DeError::custom),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn normalizes_order_and_duplicates() {
		let lhs = ScopeSet::new(["Todo.Write", "Todo.Read", "Todo.Read"])
			.expect("Scope fixture should be valid.");
		let rhs: ScopeSet = "Todo.Read Todo.Write".parse().expect("Scope string should parse.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.normalized(), "Todo.Read Todo.Write");
		assert_eq!(lhs.fingerprint(), rhs.fingerprint());
	}

	#[test]
	fn rejects_blank_and_padded_entries() {
		assert_eq!(ScopeSet::new([""]), Err(ScopeValidationError::Empty));
		assert!(matches!(
			ScopeSet::new(["User.Read All"]),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
		assert!(ScopeSet::from_str("   ").expect("Whitespace parses as empty.").is_empty());
	}

	#[test]
	fn contains_all_checks_requirements() {
		let granted = ScopeSet::from_str("ToDoList.Read ToDoList.ReadWrite")
			.expect("Granted scopes should parse.");
		let required = ScopeSet::from_str("ToDoList.Read").expect("Required scopes should parse.");

		assert!(granted.contains_all(&required));
		assert!(!required.contains_all(&granted));
		assert!(granted.contains_all(&ScopeSet::default()));
	}

	#[test]
	fn deserializes_strings_and_lists() {
		let from_string: ScopeSet =
			serde_json::from_str("\"b a\"").expect("Delimited scopes should deserialize.");
		let from_list: ScopeSet =
			serde_json::from_str("[\"a\",\"b\"]").expect("Scope list should deserialize.");

		assert_eq!(from_string, from_list);
		assert_eq!(
			serde_json::to_string(&from_list).expect("Scopes should serialize."),
			"\"a b\""
		);
	}
}
