//! Token endpoint: grant-type handlers and their orchestrator.
//!
//! An exchange runs in two passes. [`TokenHandler::update_session`] revives the prior
//! session (code exchange, refresh) on every handler, then [`TokenHandler::issue_token`]
//! mints the response. Handlers whose grant type is not the sole requested one do nothing
//! in either pass.

pub mod authorization_code;
pub mod client_credentials;
pub mod refresh;

pub use authorization_code::*;
pub use client_credentials::*;
pub use refresh::*;

// crates.io
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	model::{Request, Response, SCOPE_OFFLINE, SCOPE_OFFLINE_ACCESS, TokenRequest},
	obs::{self, FlowKind},
	task,
	token::{AccessTokenHelper, RefreshTokenHelper},
	validate::TokenRequestValidator,
};

/// Future returned by [`TokenHandler`] passes.
pub type GrantFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Handles one grant type.
pub trait TokenHandler
where
	Self: Send + Sync,
{
	/// Returns true when `request` carries exactly this handler's grant type.
	fn supports(&self, request: &TokenRequest) -> bool;

	/// Validates the grant and revives the session it refers to.
	fn update_session<'a>(&'a self, request: &'a mut TokenRequest) -> GrantFuture<'a>;

	/// Mints the tokens of the grant into `response`.
	fn issue_token<'a>(
		&'a self,
		request: &'a mut TokenRequest,
		response: &'a mut Response,
	) -> GrantFuture<'a>;
}

/// Mints the access token and, when requested, the refresh token of a grant concurrently.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
	access: AccessTokenHelper,
	refresh: RefreshTokenHelper,
	cancel: Option<CancellationToken>,
}
impl TokenIssuer {
	/// Creates an issuer from the two token helpers.
	pub fn new(access: AccessTokenHelper, refresh: RefreshTokenHelper) -> Self {
		Self { access, refresh, cancel: None }
	}

	/// Checks `cancel` once both issuance tasks have joined.
	pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
		self.cancel = Some(cancel);

		self
	}

	/// Returns true when the session of `request` was granted offline access.
	pub fn offline_granted(request: &Request) -> bool {
		request.session.oauth().granted_scopes.contains_any(&[SCOPE_OFFLINE_ACCESS, SCOPE_OFFLINE])
	}

	/// Issues an access token, plus a refresh token when `with_refresh` is set.
	pub async fn issue(&self, request: &Request, with_refresh: bool) -> Result<Response> {
		let cancel = self.cancel.as_ref();
		let outputs = if with_refresh {
			task::fan_out([self.access.issue(request), self.refresh.issue(request)], cancel)
				.await?
		} else {
			task::fan_out([self.access.issue(request)], cancel).await?
		};
		let mut response = Response::new();

		for partial in outputs {
			response.merge(partial);
		}

		Ok(response)
	}

	/// Like [`issue`](Self::issue), issuing a refresh token only for offline sessions.
	pub async fn issue_for(&self, request: &Request) -> Result<Response> {
		self.issue(request, Self::offline_granted(request)).await
	}

	pub(crate) fn cancellation(&self) -> Option<&CancellationToken> {
		self.cancel.as_ref()
	}
}

/// Runs validation and both handler passes for a token exchange.
#[derive(Clone, Default)]
pub struct TokenEndpoint {
	validator: TokenRequestValidator,
	handlers: Vec<Arc<dyn TokenHandler>>,
}
impl TokenEndpoint {
	/// Creates an endpoint without handlers.
	pub fn new(validator: TokenRequestValidator) -> Self {
		Self { validator, handlers: Vec::new() }
	}

	/// Appends a handler.
	pub fn with_handler(mut self, handler: Arc<dyn TokenHandler>) -> Self {
		self.handlers.push(handler);

		self
	}

	/// Produces the token response for an authenticated client's `request`.
	pub async fn exchange(&self, request: &mut TokenRequest) -> Result<Response> {
		obs::observe(FlowKind::Token, "exchange", async move {
			self.validator.validate(request)?;

			for handler in &self.handlers {
				handler.update_session(request).await?;
			}

			let mut response = Response::new();

			for handler in &self.handlers {
				handler.issue_token(request, &mut response).await?;
			}

			if response.is_empty() {
				let grants =
					request.grant_types().iter().map(|grant| grant.as_str()).collect::<Vec<_>>();

				return Err(Error::unsupported_grant_type(format!(
					"grant_type `{}` was not handled by any handler.",
					grants.join(" ")
				)));
			}

			Ok(response)
		})
		.await
	}
}
impl Debug for TokenEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenEndpoint")
			.field("validator", &self.validator)
			.field("handlers", &self.handlers.len())
			.finish()
	}
}
