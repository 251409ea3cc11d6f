//! Implicit grant: `response_type=token`, plus the OpenID Connect `id_token` and
//! `id_token token` combinations.

// self
use crate::{
	_prelude::*,
	authorize::{AuthorizeFuture, AuthorizeHandler},
	model::{
		AuthorizeRequest, GrantType, Response, ResponseType, SCOPE_OPENID,
		response::ACCESS_TOKEN,
	},
	policy::ScopeStrategy,
	token::{AccessTokenHelper, IdTokenHelper},
};

/// Issues access and ID tokens straight from the authorize endpoint.
#[derive(Clone)]
pub struct ImplicitHandler {
	access: AccessTokenHelper,
	id_tokens: Option<IdTokenHelper>,
	scopes: Arc<dyn ScopeStrategy>,
}
impl ImplicitHandler {
	/// Creates a handler for the plain OAuth 2.0 `token` response type.
	pub fn new(access: AccessTokenHelper, scopes: Arc<dyn ScopeStrategy>) -> Self {
		Self { access, id_tokens: None, scopes }
	}

	/// Enables the OpenID Connect combinations.
	pub fn with_id_tokens(mut self, id_tokens: IdTokenHelper) -> Self {
		self.id_tokens = Some(id_tokens);

		self
	}

	fn oidc_helper(&self, request: &AuthorizeRequest) -> Option<&IdTokenHelper> {
		let combination = request.has_exactly_response_types(&[ResponseType::IdToken])
			|| request.has_exactly_response_types(&[ResponseType::Token, ResponseType::IdToken]);
		let eligible = combination
			&& request.session.oidc().is_some()
			&& request.session.oauth().granted_scopes.contains(SCOPE_OPENID);

		if eligible { self.id_tokens.as_ref() } else { None }
	}
}
impl AuthorizeHandler for ImplicitHandler {
	fn handle<'a>(
		&'a self,
		request: &'a mut AuthorizeRequest,
		response: &'a mut Response,
	) -> AuthorizeFuture<'a> {
		Box::pin(async move {
			let id_tokens = self.oidc_helper(request);

			if id_tokens.is_none() && !request.has_exactly_response_types(&[ResponseType::Token]) {
				return Ok(());
			}

			let client = request.client().clone();

			if !client.supports_grant_type(GrantType::Implicit) {
				return Err(Error::invalid_grant("client is incapable of implicit grant."));
			}

			self.scopes.require_all(client.as_ref(), &request.session.oauth().granted_scopes)?;

			if request.requests(ResponseType::Token) && !response.has(ACCESS_TOKEN) {
				response.merge(self.access.issue(request).await?);
				request.mark_handled(ResponseType::Token);
			}
			if let Some(id_tokens) = id_tokens {
				id_tokens.issue(request, response).await?;
				request.mark_handled(ResponseType::IdToken);
			}

			Ok(())
		})
	}
}
impl Debug for ImplicitHandler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ImplicitHandler")
			.field("access", &self.access)
			.field("oidc", &self.id_tokens.is_some())
			.finish_non_exhaustive()
	}
}
