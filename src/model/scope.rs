//! Scope sets used for requested and granted scopes.

// std
use std::collections::{BTreeSet, btree_set::Iter};
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
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
impl From<ScopeValidationError> for Error {
	fn from(e: ScopeValidationError) -> Self {
		Error::invalid_scope(e.to_string())
	}
}

/// Deduplicated, sorted set of OAuth scopes.
///
/// A session's granted scopes only ever grow: [`insert`](Self::insert) and
/// [`extend_from`](Self::extend_from) form set unions and nothing removes an entry.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeSet(BTreeSet<String>);
impl ScopeSet {
	/// Creates a validated scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for scope in scopes {
			set.insert(validate(scope.into())?);
		}

		Ok(Self(set))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.contains(scope)
	}

	/// Returns true if any of the provided scopes is present.
	pub fn contains_any(&self, scopes: &[&str]) -> bool {
		scopes.iter().any(|scope| self.contains(scope))
	}

	/// Adds a scope to the set.
	pub fn insert(&mut self, scope: impl Into<String>) -> Result<(), ScopeValidationError> {
		self.0.insert(validate(scope.into())?);

		Ok(())
	}

	/// Unions `other` into this set.
	pub fn extend_from(&mut self, other: &ScopeSet) {
		self.0.extend(other.0.iter().cloned());
	}

	/// Iterator over the scopes in sorted order.
	pub fn iter(&self) -> ScopeIter<'_> {
		ScopeIter { inner: self.0.iter() }
	}

	/// Returns the space-delimited representation.
	pub fn normalized(&self) -> String {
		self.0.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
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
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for scope in self.0.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeSet::new(values).map_err(DeError::custom)
	}
}

fn validate(scope: String) -> Result<String, ScopeValidationError> {
	if scope.is_empty() {
		return Err(ScopeValidationError::Empty);
	}
	if scope.chars().any(char::is_whitespace) {
		return Err(ScopeValidationError::ContainsWhitespace { scope });
	}

	Ok(scope)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_deduplicate_and_sort() {
		let lhs = ScopeSet::new(["profile", "email", "email"])
			.expect("Left-hand scope set should be valid.");
		let rhs =
			ScopeSet::new(["email", "profile"]).expect("Right-hand scope set should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.normalized(), "email profile");
	}

	#[test]
	fn scopes_reject_whitespace_and_empty_entries() {
		let err = ScopeSet::new([" profile "]).expect_err("Padded scopes must be rejected.");

		assert!(matches!(err, ScopeValidationError::ContainsWhitespace { .. }));
		assert!(ScopeSet::new([""]).is_err());
		assert!(ScopeSet::from_str("").expect("Empty input is an empty set.").is_empty());
	}

	#[test]
	fn extend_from_is_a_union() {
		let mut granted = ScopeSet::from_str("foo bar").expect("Fixture should parse.");
		let other = ScopeSet::from_str("bar baz").expect("Fixture should parse.");

		granted.extend_from(&other);

		assert_eq!(granted.iter().collect::<Vec<_>>(), vec!["bar", "baz", "foo"]);
		assert!(granted.contains_any(&["nope", "baz"]));
	}

	#[test]
	fn serde_enforces_validation() {
		let set: ScopeSet =
			serde_json::from_str("[\"openid\",\"email\"]").expect("Scopes should deserialize.");

		assert_eq!(set.len(), 2);
		assert!(serde_json::from_str::<ScopeSet>("[\"with space\"]").is_err());
	}
}
