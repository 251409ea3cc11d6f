//! `response_type=code`.

// self
use crate::{
	_prelude::*,
	authorize::{AuthorizeFuture, AuthorizeHandler, redirect},
	model::{
		AuthorizeRequest, GrantType, Response, ResponseType,
		response::{CODE, REDIRECT_URI},
	},
	policy::ScopeStrategy,
	store::AuthorizeCodeRepository,
	token::opaque::AuthorizeCodeStrategy,
};

/// Issues authorization codes.
#[derive(Clone)]
pub struct AuthorizeCodeHandler {
	strategy: Arc<dyn AuthorizeCodeStrategy>,
	repository: Arc<dyn AuthorizeCodeRepository>,
	scopes: Arc<dyn ScopeStrategy>,
}
impl AuthorizeCodeHandler {
	/// Creates the handler.
	pub fn new(
		strategy: Arc<dyn AuthorizeCodeStrategy>,
		repository: Arc<dyn AuthorizeCodeRepository>,
		scopes: Arc<dyn ScopeStrategy>,
	) -> Self {
		Self { strategy, repository, scopes }
	}

	/// Mints and stores a code, then writes `code` and `redirect_uri` into `response`.
	///
	/// Shared with the hybrid handler, which calls it regardless of the exact response-type
	/// combination.
	pub async fn issue_code(
		&self,
		request: &mut AuthorizeRequest,
		response: &mut Response,
	) -> Result<()> {
		let client = request.client().clone();

		if !client.supports_response_type(ResponseType::Code) {
			return Err(Error::unauthorized_client("client disabled response_type=code."));
		}
		if !client.supports_grant_type(GrantType::AuthorizationCode) {
			return Err(Error::unauthorized_client(
				"client disabled grant_type=authorization_code.",
			));
		}

		self.scopes.require_all(client.as_ref(), &request.session.oauth().granted_scopes)?;

		let redirect_uri =
			redirect::select_redirect_uri(client.as_ref(), request.redirect_uri.as_deref())?;

		request.redirect_uri = Some(redirect_uri.clone());

		let code = self.strategy.new_code(request)?;
		let id = self.strategy.compute_identifier(&code)?;

		self.repository.save(id, request.clone()).await?;

		response.set(CODE, code);
		response.set(REDIRECT_URI, redirect_uri);
		request.mark_handled(ResponseType::Code);

		Ok(())
	}
}
impl AuthorizeHandler for AuthorizeCodeHandler {
	fn handle<'a>(
		&'a self,
		request: &'a mut AuthorizeRequest,
		response: &'a mut Response,
	) -> AuthorizeFuture<'a> {
		Box::pin(async move {
			if !request.has_exactly_response_types(&[ResponseType::Code]) {
				return Ok(());
			}

			self.issue_code(request, response).await
		})
	}
}
impl Debug for AuthorizeCodeHandler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizeCodeHandler").finish_non_exhaustive()
	}
}
