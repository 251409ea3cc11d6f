//! Session state threaded across authorize, code exchange, and refresh.
//!
//! OpenID Connect sessions hold an [`OAuthSession`] and re-expose it through
//! `Deref`/`DerefMut`, so handlers written against the OAuth surface work unchanged on
//! either flavor.

// std
use std::ops::{Deref, DerefMut};
// self
use crate::{
	_prelude::*,
	model::{Claims, RequestId, ScopeSet},
};

/// Plain OAuth 2.0 session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthSession {
	/// Resource owner identifier.
	pub subject: String,
	/// Scopes granted so far; only ever grows.
	pub granted_scopes: ScopeSet,
	/// Free-form claims merged into access tokens.
	pub access_claims: Claims,
	/// Request that originated the current lineage.
	#[serde(skip)]
	pub last_request_id: Option<RequestId>,
}
impl OAuthSession {
	/// Creates a session for the provided subject.
	pub fn new(subject: impl Into<String>) -> Self {
		Self { subject: subject.into(), ..Default::default() }
	}

	/// Adds granted scopes.
	pub fn grant(&mut self, scopes: &ScopeSet) {
		self.granted_scopes.extend_from(scopes);
	}

	/// Merges `other` into this session; scalars keep the first writer, collections union.
	pub fn merge(&mut self, other: &OAuthSession) {
		if self.subject.is_empty() {
			self.subject = other.subject.clone();
		}

		self.granted_scopes.extend_from(&other.granted_scopes);

		for (k, v) in other.access_claims.iter() {
			self.access_claims.insert(k.clone(), v.clone());
		}
	}
}

/// OpenID Connect session extending [`OAuthSession`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OidcSession {
	/// Embedded OAuth session.
	#[serde(flatten)]
	pub oauth: OAuthSession,
	/// Pairwise subject placed in ID tokens.
	pub obfuscated_subject: String,
	/// Time the end user authenticated.
	#[serde(with = "time::serde::timestamp::option", default)]
	pub auth_time: Option<OffsetDateTime>,
	/// Nonce echoed into ID tokens.
	pub nonce: String,
	/// Authentication context class references.
	pub acr_values: Vec<String>,
	/// Free-form claims merged into ID tokens.
	pub id_token_claims: Claims,
}
impl OidcSession {
	/// Creates a session for the provided subject and its obfuscated counterpart.
	pub fn new(subject: impl Into<String>, obfuscated_subject: impl Into<String>) -> Self {
		Self {
			oauth: OAuthSession::new(subject),
			obfuscated_subject: obfuscated_subject.into(),
			..Default::default()
		}
	}

	/// Appends ACR values not already present.
	pub fn add_acr_values<I, S>(&mut self, values: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for value in values {
			let value = value.into();

			if !self.acr_values.contains(&value) {
				self.acr_values.push(value);
			}
		}
	}

	/// Merges another OIDC session's state into this one.
	pub fn merge(&mut self, other: &OidcSession) {
		self.oauth.merge(&other.oauth);

		if self.obfuscated_subject.is_empty() {
			self.obfuscated_subject = other.obfuscated_subject.clone();
		}
		if self.auth_time.is_none() {
			self.auth_time = other.auth_time;
		}
		if self.nonce.is_empty() {
			self.nonce = other.nonce.clone();
		}

		self.add_acr_values(other.acr_values.iter().cloned());

		for (k, v) in other.id_token_claims.iter() {
			self.id_token_claims.insert(k.clone(), v.clone());
		}
	}
}
impl Deref for OidcSession {
	type Target = OAuthSession;

	fn deref(&self) -> &Self::Target {
		&self.oauth
	}
}
impl DerefMut for OidcSession {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.oauth
	}
}

/// Session owned by a request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flavor", rename_all = "snake_case")]
pub enum Session {
	/// Plain OAuth 2.0 session.
	OAuth(OAuthSession),
	/// OpenID Connect session.
	Oidc(OidcSession),
}
impl Session {
	/// Returns the OAuth view of the session.
	pub fn oauth(&self) -> &OAuthSession {
		match self {
			Session::OAuth(session) => session,
			Session::Oidc(session) => &session.oauth,
		}
	}

	/// Returns the mutable OAuth view of the session.
	pub fn oauth_mut(&mut self) -> &mut OAuthSession {
		match self {
			Session::OAuth(session) => session,
			Session::Oidc(session) => &mut session.oauth,
		}
	}

	/// Returns the OIDC session, if this is one.
	pub fn oidc(&self) -> Option<&OidcSession> {
		match self {
			Session::Oidc(session) => Some(session),
			Session::OAuth(_) => None,
		}
	}

	/// Returns the mutable OIDC session, if this is one.
	pub fn oidc_mut(&mut self) -> Option<&mut OidcSession> {
		match self {
			Session::Oidc(session) => Some(session),
			Session::OAuth(_) => None,
		}
	}

	/// Merges `other` into this session.
	///
	/// A plain OAuth session merging an OIDC session is promoted to OIDC so the
	/// OIDC-only state of `other` survives the code exchange or refresh.
	pub fn merge(&mut self, other: &Session) {
		match (&mut *self, other) {
			(Session::Oidc(own), Session::Oidc(theirs)) => own.merge(theirs),
			(Session::Oidc(own), Session::OAuth(theirs)) => own.oauth.merge(theirs),
			(Session::OAuth(own), Session::OAuth(theirs)) => own.merge(theirs),
			(Session::OAuth(own), Session::Oidc(theirs)) => {
				let mut promoted = OidcSession { oauth: std::mem::take(own), ..Default::default() };

				promoted.merge(theirs);

				*self = Session::Oidc(promoted);
			},
		}
	}
}
impl Default for Session {
	fn default() -> Self {
		Session::OAuth(OAuthSession::default())
	}
}
impl From<OAuthSession> for Session {
	fn from(value: OAuthSession) -> Self {
		Session::OAuth(value)
	}
}
impl From<OidcSession> for Session {
	fn from(value: OidcSession) -> Self {
		Session::Oidc(value)
	}
}
