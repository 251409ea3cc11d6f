//! `grant_type=authorization_code`.

// self
use crate::{
	_prelude::*,
	authorize::redirect,
	config::{Persistence, ServerConfig},
	grant::{GrantFuture, TokenHandler, TokenIssuer},
	model::{GrantType, Response, SCOPE_OPENID, TokenRequest},
	store::AuthorizeCodeRepository,
	task::{self, TaskLabel},
	token::{IdTokenHelper, opaque::AuthorizeCodeStrategy},
};

/// Exchanges authorization codes for tokens.
#[derive(Clone)]
pub struct AuthorizationCodeGrant {
	strategy: Arc<dyn AuthorizeCodeStrategy>,
	repository: Arc<dyn AuthorizeCodeRepository>,
	issuer: TokenIssuer,
	id_tokens: Option<IdTokenHelper>,
	code_lifespan: Duration,
	persistence: Persistence,
}
impl AuthorizationCodeGrant {
	/// Creates the handler; consumed codes are deleted per [`ServerConfig::persistence`].
	pub fn new(
		config: &ServerConfig,
		strategy: Arc<dyn AuthorizeCodeStrategy>,
		repository: Arc<dyn AuthorizeCodeRepository>,
		issuer: TokenIssuer,
	) -> Self {
		Self {
			strategy,
			repository,
			issuer,
			id_tokens: None,
			code_lifespan: config.authorize_code_lifespan(),
			persistence: config.persistence(),
		}
	}

	/// Issues an ID token alongside the access token when `openid` was granted.
	pub fn with_id_tokens(mut self, id_tokens: IdTokenHelper) -> Self {
		self.id_tokens = Some(id_tokens);

		self
	}

	async fn revive(&self, request: &mut TokenRequest) -> Result<()> {
		if !request.client().supports_grant_type(GrantType::AuthorizationCode) {
			return Err(Error::invalid_grant(
				"client unable to use authorization_code grant type.",
			));
		}

		let code = request
			.code
			.clone()
			.filter(|code| !code.is_empty())
			.ok_or_else(|| Error::invalid_request("authorization code is missing"))?;
		let id = self.strategy.compute_identifier(&code)?;
		let stored = self
			.repository
			.get_request(&id)
			.await?
			.ok_or_else(|| Error::invalid_grant("authorize code is invalid."))?;

		self.strategy.validate_code(&code, &stored)?;

		if stored.timestamp() + self.code_lifespan < OffsetDateTime::now_utc() {
			return Err(Error::invalid_grant("authorize code has expired."));
		}
		if stored.client().id() != request.client().id() {
			return Err(Error::unauthorized_client(
				"client is not authorized to use this authorization code.",
			));
		}

		let effective = match request.redirect_uri.as_deref() {
			Some(uri) if !uri.is_empty() => Some(uri.to_owned()),
			_ => redirect::select_redirect_uri(request.client().as_ref(), None).ok(),
		};

		if stored.redirect_uri != effective {
			return Err(Error::unauthorized_client(
				"authorization code was issued to a different redirect uri.",
			));
		}

		request.session.merge(&stored.session);
		request.session.oauth_mut().last_request_id = Some(stored.id().clone());

		let repository = self.repository.clone();
		let label =
			TaskLabel::new("delete_authorize_code", stored.id().to_string(), stored.client().id());

		task::cleanup(self.persistence, label, async move {
			repository.delete(&id).await.map_err(Error::from)
		})
		.await;

		Ok(())
	}
}
impl TokenHandler for AuthorizationCodeGrant {
	fn supports(&self, request: &TokenRequest) -> bool {
		request.has_exactly_grant_type(GrantType::AuthorizationCode)
	}

	fn update_session<'a>(&'a self, request: &'a mut TokenRequest) -> GrantFuture<'a> {
		Box::pin(async move {
			if !self.supports(request) {
				return Ok(());
			}

			self.revive(request).await
		})
	}

	fn issue_token<'a>(
		&'a self,
		request: &'a mut TokenRequest,
		response: &'a mut Response,
	) -> GrantFuture<'a> {
		Box::pin(async move {
			if !self.supports(request) {
				return Ok(());
			}

			response.merge(self.issuer.issue_for(request).await?);

			let openid = request.session.oidc().is_some()
				&& request.session.oauth().granted_scopes.contains(SCOPE_OPENID);

			if let Some(id_tokens) = self.id_tokens.as_ref().filter(|_| openid) {
				id_tokens.issue(request, response).await?;
			}

			Ok(())
		})
	}
}
impl Debug for AuthorizationCodeGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCodeGrant")
			.field("issuer", &self.issuer)
			.field("oidc", &self.id_tokens.is_some())
			.field("code_lifespan", &self.code_lifespan)
			.field("persistence", &self.persistence)
			.finish_non_exhaustive()
	}
}
