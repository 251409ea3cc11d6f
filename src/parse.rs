//! Builds authorize and token requests from decoded endpoint parameters.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	authorize::redirect,
	client::{Client, ClientLookup},
	model::{
		AuthorizeRequest, EndpointRequest, GrantType, Method, Request, ResponseType, ScopeSet,
		Session, TokenRequest,
	},
};

/// Parses endpoint parameters into protocol requests.
#[derive(Clone)]
pub struct RequestParser {
	lookup: Arc<dyn ClientLookup>,
}
impl RequestParser {
	/// Creates a parser resolving clients through `lookup`.
	pub fn new(lookup: Arc<dyn ClientLookup>) -> Self {
		Self { lookup }
	}

	/// Parses an authorize call.
	///
	/// `session` is the consented session of the end user; a `nonce` parameter is copied into
	/// it when it is an OpenID Connect session.
	pub async fn parse_authorize_request(
		&self,
		endpoint: &EndpointRequest,
		session: impl Into<Session>,
	) -> Result<AuthorizeRequest> {
		if endpoint.method != Method::Get {
			return Err(Error::invalid_request("http method is not supported."));
		}

		let client_id = endpoint
			.param("client_id")
			.ok_or_else(|| Error::invalid_request("client_id is missing."))?;
		let client = self.lookup.find_by_id(client_id).await?;
		let redirect_uri =
			redirect::select_redirect_uri(client.as_ref(), endpoint.param("redirect_uri"))?;
		let mut request = Request::new(client, session).with_redirect_uri(redirect_uri);

		request.scopes = parse_scopes(endpoint)?;

		let response_types = split(endpoint, "response_type")
			.into_iter()
			.map(ResponseType::from_str)
			.collect::<Result<Vec<_>>>()?;
		let mut request = AuthorizeRequest::new(request).with_response_types(response_types);

		request.state = owned(endpoint, "state");

		let oidc = &mut request.oidc;

		oidc.response_mode = owned(endpoint, "response_mode");
		oidc.nonce = owned(endpoint, "nonce");
		oidc.display = owned(endpoint, "display");
		oidc.prompts = owned_split(endpoint, "prompt");
		oidc.max_age = endpoint
			.param("max_age")
			.map(|raw| {
				raw.parse::<u64>()
					.map_err(|_| Error::invalid_request("max_age must be a non-negative integer."))
			})
			.transpose()?;
		oidc.ui_locales = owned_split(endpoint, "ui_locales");
		oidc.id_token_hint = owned(endpoint, "id_token_hint");
		oidc.acr_values = owned_split(endpoint, "acr_values");
		oidc.claims_locales = owned_split(endpoint, "claims_locales");
		oidc.iss = owned(endpoint, "iss");
		oidc.target_link_uri = owned(endpoint, "target_link_uri");

		if let Some(raw) = endpoint.param("claims") {
			match serde_json::from_str::<Value>(raw) {
				Ok(Value::Object(claims)) => oidc.claims = claims,
				_ => return Err(Error::invalid_request("claims must be a JSON object.")),
			}
		}

		let nonce = request.oidc.nonce.clone();

		if let (Some(nonce), Some(session)) = (nonce, request.session.oidc_mut()) {
			session.nonce = nonce;
		}

		Ok(request)
	}

	/// Parses a token call made by the already authenticated `client`.
	pub fn parse_token_request(
		&self,
		endpoint: &EndpointRequest,
		client: Arc<dyn Client>,
		session: impl Into<Session>,
	) -> Result<TokenRequest> {
		if !endpoint.is_post() {
			return Err(Error::invalid_request("http method is not supported."));
		}

		let mut request = Request::new(client, session);

		request.scopes = parse_scopes(endpoint)?;
		request.redirect_uri = owned(endpoint, "redirect_uri");

		let grants = split(endpoint, "grant_type")
			.into_iter()
			.map(GrantType::from_str)
			.collect::<Result<Vec<_>>>()?;
		let mut request = TokenRequest::new(request).with_grant_types(grants);

		request.code = owned(endpoint, "code");
		request.refresh_token = owned(endpoint, "refresh_token");

		Ok(request)
	}
}
impl Debug for RequestParser {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestParser").finish_non_exhaustive()
	}
}

fn parse_scopes(endpoint: &EndpointRequest) -> Result<ScopeSet> {
	Ok(ScopeSet::from_str(endpoint.param("scope").unwrap_or_default())?)
}

fn split<'a>(endpoint: &'a EndpointRequest, name: &str) -> Vec<&'a str> {
	endpoint.param(name).map(|raw| raw.split_whitespace().collect()).unwrap_or_default()
}

fn owned_split(endpoint: &EndpointRequest, name: &str) -> Vec<String> {
	split(endpoint, name).into_iter().map(ToOwned::to_owned).collect()
}

fn owned(endpoint: &EndpointRequest, name: &str) -> Option<String> {
	endpoint.param(name).map(ToOwned::to_owned)
}
