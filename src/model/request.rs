//! Request value types for the authorize and token endpoints.
//!
//! [`AuthorizeRequest`] and [`TokenRequest`] wrap a common [`Request`] and re-expose it
//! through `Deref`/`DerefMut`.

// std
use std::{
	collections::BTreeSet,
	ops::{Deref, DerefMut},
};
// self
use crate::{
	_prelude::*,
	client::Client,
	model::{Claims, GrantType, RequestId, ResponseType, ScopeSet, Session},
};

/// Elements common to every protocol request.
#[derive(Clone)]
pub struct Request {
	id: RequestId,
	timestamp: OffsetDateTime,
	client: Arc<dyn Client>,
	/// Effective redirect URI.
	pub redirect_uri: Option<String>,
	/// Requested scopes.
	pub scopes: ScopeSet,
	/// Session owned by this request.
	pub session: Session,
}
impl Request {
	/// Creates a request with a fresh identifier and the current timestamp.
	pub fn new(client: Arc<dyn Client>, session: impl Into<Session>) -> Self {
		Self {
			id: RequestId::generate(),
			timestamp: OffsetDateTime::now_utc(),
			client,
			redirect_uri: None,
			scopes: ScopeSet::default(),
			session: session.into(),
		}
	}

	/// Rebuilds a request previously persisted by a repository.
	pub fn restore(
		id: RequestId,
		timestamp: OffsetDateTime,
		client: Arc<dyn Client>,
		session: Session,
	) -> Self {
		Self { id, timestamp, client, redirect_uri: None, scopes: ScopeSet::default(), session }
	}

	/// Sets the redirect URI.
	pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
		self.redirect_uri = Some(uri.into());

		self
	}

	/// Sets the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Request identifier assigned at creation.
	pub fn id(&self) -> &RequestId {
		&self.id
	}

	/// Creation time.
	pub fn timestamp(&self) -> OffsetDateTime {
		self.timestamp
	}

	/// Client owning the request.
	pub fn client(&self) -> &Arc<dyn Client> {
		&self.client
	}

	/// Effective redirect URI, or an empty string.
	pub fn redirect_uri_or_empty(&self) -> &str {
		self.redirect_uri.as_deref().unwrap_or_default()
	}
}
impl Debug for Request {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Request")
			.field("id", &self.id)
			.field("timestamp", &self.timestamp)
			.field("client", &self.client.id())
			.field("redirect_uri", &self.redirect_uri)
			.field("scopes", &self.scopes)
			.field("session", &self.session)
			.finish()
	}
}

/// OpenID Connect authorize parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcParameters {
	/// `response_mode`.
	pub response_mode: Option<String>,
	/// `nonce`.
	pub nonce: Option<String>,
	/// `display`.
	pub display: Option<String>,
	/// `prompt` values.
	pub prompts: Vec<String>,
	/// `max_age` in seconds.
	pub max_age: Option<u64>,
	/// `ui_locales`.
	pub ui_locales: Vec<String>,
	/// `id_token_hint`.
	pub id_token_hint: Option<String>,
	/// `acr_values`.
	pub acr_values: Vec<String>,
	/// `claims` request object.
	pub claims: Claims,
	/// `claims_locales`.
	pub claims_locales: Vec<String>,
	/// `iss` (third-party initiated login).
	pub iss: Option<String>,
	/// `target_link_uri`.
	pub target_link_uri: Option<String>,
}

/// Authorize endpoint request.
#[derive(Clone, Debug)]
pub struct AuthorizeRequest {
	request: Request,
	response_types: Vec<ResponseType>,
	handled: BTreeSet<ResponseType>,
	/// Opaque CSRF token echoed back to the client.
	pub state: Option<String>,
	/// OIDC parameters.
	pub oidc: OidcParameters,
}
impl AuthorizeRequest {
	/// Wraps a common request.
	pub fn new(request: Request) -> Self {
		Self {
			request,
			response_types: Vec::new(),
			handled: BTreeSet::new(),
			state: None,
			oidc: OidcParameters::default(),
		}
	}

	/// Appends response types, keeping the first occurrence of each.
	pub fn add_response_types<I>(&mut self, types: I)
	where
		I: IntoIterator<Item = ResponseType>,
	{
		for ty in types {
			if !self.response_types.contains(&ty) {
				self.response_types.push(ty);
			}
		}
	}

	/// Builder-style [`add_response_types`](Self::add_response_types).
	pub fn with_response_types<I>(mut self, types: I) -> Self
	where
		I: IntoIterator<Item = ResponseType>,
	{
		self.add_response_types(types);

		self
	}

	/// Requested response types in request order.
	pub fn response_types(&self) -> &[ResponseType] {
		&self.response_types
	}

	/// Returns true when the response types equal `expected` as a set.
	pub fn has_exactly_response_types(&self, expected: &[ResponseType]) -> bool {
		self.response_types.len() == expected.len()
			&& expected.iter().all(|ty| self.response_types.contains(ty))
	}

	/// Returns true when `ty` was requested.
	pub fn requests(&self, ty: ResponseType) -> bool {
		self.response_types.contains(&ty)
	}

	/// Marks a response type handled; idempotent and irreversible.
	pub fn mark_handled(&mut self, ty: ResponseType) {
		self.handled.insert(ty);
	}

	/// Returns true once `ty` has been handled.
	pub fn is_handled(&self, ty: ResponseType) -> bool {
		self.handled.contains(&ty)
	}

	/// Requested response types that no handler has processed yet.
	pub fn unhandled(&self) -> impl Iterator<Item = ResponseType> + '_ {
		self.response_types.iter().copied().filter(|ty| !self.handled.contains(ty))
	}

	/// Consumes the wrapper, returning the common request.
	pub fn into_inner(self) -> Request {
		self.request
	}
}
impl Deref for AuthorizeRequest {
	type Target = Request;

	fn deref(&self) -> &Self::Target {
		&self.request
	}
}
impl DerefMut for AuthorizeRequest {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.request
	}
}

/// Token endpoint request.
#[derive(Clone, Debug)]
pub struct TokenRequest {
	request: Request,
	grant_types: Vec<GrantType>,
	/// Supplied authorization code.
	pub code: Option<String>,
	/// Supplied refresh token.
	pub refresh_token: Option<String>,
}
impl TokenRequest {
	/// Wraps a common request.
	pub fn new(request: Request) -> Self {
		Self { request, grant_types: Vec::new(), code: None, refresh_token: None }
	}

	/// Appends grant types, keeping the first occurrence of each.
	pub fn add_grant_types<I>(&mut self, grants: I)
	where
		I: IntoIterator<Item = GrantType>,
	{
		for grant in grants {
			if !self.grant_types.contains(&grant) {
				self.grant_types.push(grant);
			}
		}
	}

	/// Builder-style [`add_grant_types`](Self::add_grant_types).
	pub fn with_grant_types<I>(mut self, grants: I) -> Self
	where
		I: IntoIterator<Item = GrantType>,
	{
		self.add_grant_types(grants);

		self
	}

	/// Sets the authorization code.
	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());

		self
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(token.into());

		self
	}

	/// Requested grant types.
	pub fn grant_types(&self) -> &[GrantType] {
		&self.grant_types
	}

	/// Returns true when the request carries exactly the one grant type `grant`.
	pub fn has_exactly_grant_type(&self, grant: GrantType) -> bool {
		self.grant_types == [grant]
	}

	/// Consumes the wrapper, returning the common request.
	pub fn into_inner(self) -> Request {
		self.request
	}
}
impl Deref for TokenRequest {
	type Target = Request;

	fn deref(&self) -> &Self::Target {
		&self.request
	}
}
impl DerefMut for TokenRequest {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.request
	}
}
