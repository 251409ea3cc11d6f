//! Authorize endpoint: response-type handlers and their orchestrator.
//!
//! Every registered [`AuthorizeHandler`] sees every request. A handler whose exact
//! response-type combination is not requested does nothing; a handler that recognizes the
//! request but fails a prerequisite aborts the whole call. Whatever response type no
//! handler marked as handled is reported as unsupported.

pub mod code;
pub mod hybrid;
pub mod implicit;
pub mod redirect;

pub use code::*;
pub use hybrid::*;
pub use implicit::*;
pub use redirect::*;

// self
use crate::{
	_prelude::*,
	model::{AuthorizeRequest, Response, response::STATE},
	obs::{self, FlowKind},
	validate::AuthorizeRequestValidator,
};

/// Future returned by [`AuthorizeHandler::handle`].
pub type AuthorizeFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// Handles one response-type combination.
pub trait AuthorizeHandler
where
	Self: Send + Sync,
{
	/// Writes the handler's parameters into `response` and marks what it handled.
	fn handle<'a>(
		&'a self,
		request: &'a mut AuthorizeRequest,
		response: &'a mut Response,
	) -> AuthorizeFuture<'a>;
}

/// Runs validation and every registered handler for an authorize call.
#[derive(Clone, Default)]
pub struct AuthorizeEndpoint {
	validator: AuthorizeRequestValidator,
	handlers: Vec<Arc<dyn AuthorizeHandler>>,
}
impl AuthorizeEndpoint {
	/// Creates an endpoint without handlers.
	pub fn new(validator: AuthorizeRequestValidator) -> Self {
		Self { validator, handlers: Vec::new() }
	}

	/// Appends a handler.
	pub fn with_handler(mut self, handler: Arc<dyn AuthorizeHandler>) -> Self {
		self.handlers.push(handler);

		self
	}

	/// Produces the authorize response for an already-consented `request`.
	///
	/// `state` is echoed when present.
	pub async fn authorize(&self, request: &mut AuthorizeRequest) -> Result<Response> {
		obs::observe(FlowKind::Authorize, "authorize", async move {
			self.validator.validate(request)?;

			let mut response = Response::new();

			for handler in &self.handlers {
				handler.handle(request, &mut response).await?;
			}

			if let Some(ty) = request.unhandled().next() {
				return Err(Error::unsupported_response_type(format!(
					"response_type `{ty}` was not handled by any handler."
				)));
			}
			if let Some(state) = request.state.as_deref().filter(|state| !state.is_empty()) {
				response.set(STATE, state);
			}

			Ok(response)
		})
		.await
	}
}
impl Debug for AuthorizeEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizeEndpoint")
			.field("validator", &self.validator)
			.field("handlers", &self.handlers.len())
			.finish()
	}
}
