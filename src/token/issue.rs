//! Token issuance helpers shared by the authorize and grant handlers.
//!
//! Access and refresh helpers return `'static` [`TaskFuture`]s producing a partial
//! [`Response`], so handlers can run them side by side through [`task::fan_out`] and merge
//! the disjoint keys afterwards. Persistence of the minted token follows
//! [`ServerConfig::persistence`].

// self
use crate::{
	_prelude::*,
	client,
	config::{Persistence, ServerConfig},
	model::{
		Request, Response,
		response::{
			ACCESS_TOKEN, CODE, EXPIRES_IN, ID_TOKEN, REFRESH_TOKEN, TOKEN_TYPE, TOKEN_TYPE_BEARER,
		},
	},
	store::{AccessTokenRepository, RefreshTokenRepository},
	task::{self, TaskFuture, TaskLabel},
	token::{
		id_token::{self, IdTokenStrategy},
		jwt::AccessTokenStrategy,
		opaque::RefreshTokenStrategy,
	},
};

/// Mints, persists, and reports access tokens.
#[derive(Clone)]
pub struct AccessTokenHelper {
	strategy: Arc<dyn AccessTokenStrategy>,
	repository: Arc<dyn AccessTokenRepository>,
	lifespan: Duration,
	persistence: Persistence,
}
impl AccessTokenHelper {
	/// Creates a helper using the lifespan and persistence mode of `config`.
	pub fn new(
		config: &ServerConfig,
		strategy: Arc<dyn AccessTokenStrategy>,
		repository: Arc<dyn AccessTokenRepository>,
	) -> Self {
		Self {
			strategy,
			repository,
			lifespan: config.access_token_lifespan(),
			persistence: config.persistence(),
		}
	}

	/// Mints an access token for `request`.
	///
	/// The returned response carries `access_token`, `token_type`, and `expires_in`.
	pub fn issue(&self, request: &Request) -> TaskFuture<Response> {
		let helper = self.clone();
		let request = request.clone();

		Box::pin(async move {
			let token = helper.strategy.new_token(&request)?;
			let id = helper.strategy.compute_identifier(&token)?;
			let label = TaskLabel::new(
				"persist_access_token",
				request.id().to_string(),
				request.client().id(),
			);
			let repository = helper.repository.clone();

			task::persist(helper.persistence, label, async move {
				repository.save(id, request).await.map_err(Error::from)
			})
			.await?;

			let mut response = Response::new();

			response.set(ACCESS_TOKEN, token);
			response.set(TOKEN_TYPE, TOKEN_TYPE_BEARER);
			response.set(EXPIRES_IN, helper.lifespan.whole_seconds());

			Ok(response)
		})
	}
}
impl Debug for AccessTokenHelper {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessTokenHelper")
			.field("lifespan", &self.lifespan)
			.field("persistence", &self.persistence)
			.finish_non_exhaustive()
	}
}

/// Mints, persists, and reports refresh tokens.
#[derive(Clone)]
pub struct RefreshTokenHelper {
	strategy: Arc<dyn RefreshTokenStrategy>,
	repository: Arc<dyn RefreshTokenRepository>,
	persistence: Persistence,
}
impl RefreshTokenHelper {
	/// Creates a helper using the persistence mode of `config`.
	pub fn new(
		config: &ServerConfig,
		strategy: Arc<dyn RefreshTokenStrategy>,
		repository: Arc<dyn RefreshTokenRepository>,
	) -> Self {
		Self { strategy, repository, persistence: config.persistence() }
	}

	/// Mints a refresh token for `request`; the response carries `refresh_token`.
	pub fn issue(&self, request: &Request) -> TaskFuture<Response> {
		let helper = self.clone();
		let request = request.clone();

		Box::pin(async move {
			let token = helper.strategy.new_token(&request)?;
			let id = helper.strategy.compute_identifier(&token)?;
			let label = TaskLabel::new(
				"persist_refresh_token",
				request.id().to_string(),
				request.client().id(),
			);
			let repository = helper.repository.clone();

			task::persist(helper.persistence, label, async move {
				repository.save(id, request).await.map_err(Error::from)
			})
			.await?;

			let mut response = Response::new();

			response.set(REFRESH_TOKEN, token);

			Ok(response)
		})
	}
}
impl Debug for RefreshTokenHelper {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshTokenHelper")
			.field("persistence", &self.persistence)
			.finish_non_exhaustive()
	}
}

/// Mints ID tokens bound to the code and access token already in the response.
#[derive(Clone)]
pub struct IdTokenHelper {
	strategy: Arc<dyn IdTokenStrategy>,
}
impl IdTokenHelper {
	/// Wraps an ID token strategy.
	pub fn new(strategy: Arc<dyn IdTokenStrategy>) -> Self {
		Self { strategy }
	}

	/// Injects `c_hash`/`at_hash`, then mints the ID token into `response`.
	///
	/// Runs after any concurrent issuance has joined: the session is mutated here.
	pub async fn issue(&self, request: &mut Request, response: &mut Response) -> Result<()> {
		let alg = client::require_oidc(request.client().as_ref())?
			.id_token_signed_response_alg
			.clone();
		let session = request
			.session
			.oidc_mut()
			.ok_or_else(|| Error::server_error("request must carry an oidc session."))?;

		for (key, claim) in [(CODE, "c_hash"), (ACCESS_TOKEN, "at_hash")] {
			if let Some(hash) =
				response.get_str(key).and_then(|token| id_token::left_half_hash(token, &alg))
			{
				session.id_token_claims.insert(claim.into(), hash.into());
			}
		}

		let token = self.strategy.new_token(request).await?;

		response.set(ID_TOKEN, token);

		Ok(())
	}
}
impl Debug for IdTokenHelper {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdTokenHelper").finish_non_exhaustive()
	}
}
