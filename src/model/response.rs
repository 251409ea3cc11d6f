//! Response parameter sink.

// crates.io
use serde::{Serializer, ser::SerializeMap};
use serde_json::Value;
// self
use crate::_prelude::*;

/// `code` response parameter.
pub const CODE: &str = "code";
/// `redirect_uri` response parameter.
pub const REDIRECT_URI: &str = "redirect_uri";
/// `access_token` response parameter.
pub const ACCESS_TOKEN: &str = "access_token";
/// `token_type` response parameter.
pub const TOKEN_TYPE: &str = "token_type";
/// `expires_in` response parameter.
pub const EXPIRES_IN: &str = "expires_in";
/// `refresh_token` response parameter.
pub const REFRESH_TOKEN: &str = "refresh_token";
/// `id_token` response parameter.
pub const ID_TOKEN: &str = "id_token";
/// `state` response parameter.
pub const STATE: &str = "state";
/// The only token type issued.
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Open, insertion-ordered key/value sink.
///
/// Setting an existing key replaces its value in place; keys are never removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response(Vec<(String, Value)>);
impl Response {
	/// Creates an empty response.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets `key` to `value`.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		let key = key.into();
		let value = value.into();

		match self.0.iter_mut().find(|(k, _)| *k == key) {
			Some((_, slot)) => *slot = value,
			None => self.0.push((key, value)),
		}
	}

	/// Returns the raw value for `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	/// Returns the value for `key` when it is a non-empty string.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
	}

	/// Returns true when `key` holds a non-empty string.
	pub fn has(&self, key: &str) -> bool {
		self.get_str(key).is_some()
	}

	/// Copies every entry of `other` into this response.
	pub fn merge(&mut self, other: Response) {
		for (key, value) in other.0 {
			self.set(key, value);
		}
	}

	/// Keys in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|(k, _)| k.as_str())
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when nothing has been set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Serialize for Response {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.0.len()))?;

		for (k, v) in self.0.iter() {
			map.serialize_entry(k, v)?;
		}

		map.end()
	}
}
