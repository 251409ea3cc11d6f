//! `grant_type=refresh_token` with rotation.

// self
use crate::{
	_prelude::*,
	config::ServerConfig,
	grant::{GrantFuture, TokenHandler, TokenIssuer},
	model::{GrantType, RequestId, Response, SCOPE_OPENID, TokenRequest},
	store::{AccessTokenRepository, RefreshTokenRepository},
	task::{self, TaskFuture},
	token::{IdTokenHelper, opaque::RefreshTokenStrategy},
};

/// Exchanges refresh tokens for a fresh token pair, revoking the pair they came from.
#[derive(Clone)]
pub struct RefreshTokenGrant {
	strategy: Arc<dyn RefreshTokenStrategy>,
	access_tokens: Arc<dyn AccessTokenRepository>,
	refresh_tokens: Arc<dyn RefreshTokenRepository>,
	issuer: TokenIssuer,
	id_tokens: Option<IdTokenHelper>,
	lifespan: Duration,
}
impl RefreshTokenGrant {
	/// Creates the handler.
	pub fn new(
		config: &ServerConfig,
		strategy: Arc<dyn RefreshTokenStrategy>,
		access_tokens: Arc<dyn AccessTokenRepository>,
		refresh_tokens: Arc<dyn RefreshTokenRepository>,
		issuer: TokenIssuer,
	) -> Self {
		Self {
			strategy,
			access_tokens,
			refresh_tokens,
			issuer,
			id_tokens: None,
			lifespan: config.refresh_token_lifespan(),
		}
	}

	/// Issues a new ID token on refresh when the session is an OpenID Connect one.
	pub fn with_id_tokens(mut self, id_tokens: IdTokenHelper) -> Self {
		self.id_tokens = Some(id_tokens);

		self
	}

	async fn revive(&self, request: &mut TokenRequest) -> Result<()> {
		if !request.client().supports_grant_type(GrantType::RefreshToken) {
			return Err(Error::invalid_grant("client not capable of using refresh_token grants."));
		}

		let token = request
			.refresh_token
			.clone()
			.filter(|token| !token.is_empty())
			.ok_or_else(|| Error::invalid_request("refresh token is missing"))?;

		self.strategy.validate_token(&token, request)?;

		let id = self.strategy.compute_identifier(&token)?;
		let stored = self
			.refresh_tokens
			.get_request(&id)
			.await?
			.ok_or_else(|| Error::invalid_grant("refresh token is invalid."))?;

		if stored.timestamp() + self.lifespan < OffsetDateTime::now_utc() {
			return Err(Error::invalid_grant("refresh token has expired."));
		}
		if stored.client().id() != request.client().id() {
			return Err(Error::invalid_grant("refresh token was issued to another client."));
		}

		request.session.merge(&stored.session);
		request.session.oauth_mut().last_request_id = Some(stored.id().clone());

		Ok(())
	}

	/// Deletes every token minted by `origin`; both deletions must succeed.
	async fn revoke(&self, origin: RequestId) -> Result<()> {
		let access_tokens = self.access_tokens.clone();
		let refresh_tokens = self.refresh_tokens.clone();
		let origin_for_refresh = origin.clone();
		let access: TaskFuture<()> = Box::pin(async move {
			access_tokens.delete_by_request_id(&origin).await.map_err(Error::from)
		});
		let refresh: TaskFuture<()> = Box::pin(async move {
			refresh_tokens.delete_by_request_id(&origin_for_refresh).await.map_err(Error::from)
		});

		task::fan_out([access, refresh], self.issuer.cancellation()).await?;

		Ok(())
	}
}
impl TokenHandler for RefreshTokenGrant {
	fn supports(&self, request: &TokenRequest) -> bool {
		request.has_exactly_grant_type(GrantType::RefreshToken)
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

			let origin = request
				.session
				.oauth()
				.last_request_id
				.clone()
				.ok_or_else(|| Error::server_error("refresh session was not revived."))?;

			self.revoke(origin).await?;

			response.merge(self.issuer.issue(request, true).await?);

			let openid = request.session.oidc().is_some()
				&& request.session.oauth().granted_scopes.contains(SCOPE_OPENID);

			if let Some(id_tokens) = self.id_tokens.as_ref().filter(|_| openid) {
				id_tokens.issue(request, response).await?;
			}

			Ok(())
		})
	}
}
impl Debug for RefreshTokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshTokenGrant")
			.field("issuer", &self.issuer)
			.field("oidc", &self.id_tokens.is_some())
			.field("lifespan", &self.lifespan)
			.finish_non_exhaustive()
	}
}
