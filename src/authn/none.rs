//! `none`: public clients identified by `client_id` alone.

// self
use crate::{
	_prelude::*,
	authn::{AuthnFuture, ClientAuthenticator},
	client::ClientLookup,
	model::{AuthMethod, ClientType, EndpointRequest},
};

/// Authenticator for public clients.
#[derive(Clone)]
pub struct NoneAuthenticator {
	lookup: Arc<dyn ClientLookup>,
}
impl NoneAuthenticator {
	/// Creates the authenticator.
	pub fn new(lookup: Arc<dyn ClientLookup>) -> Self {
		Self { lookup }
	}
}
impl ClientAuthenticator for NoneAuthenticator {
	fn method(&self) -> AuthMethod {
		AuthMethod::None
	}

	fn supports(&self, _: &EndpointRequest) -> bool {
		true
	}

	fn authenticate<'a>(&'a self, request: &'a EndpointRequest) -> AuthnFuture<'a> {
		Box::pin(async move {
			let id = request
				.param("client_id")
				.ok_or_else(|| Error::invalid_client("missing client_id"))?;
			let client = self
				.lookup
				.find_by_id(id)
				.await
				.map_err(|err| Error::invalid_client(err.reason()))?;

			if client.client_type() != ClientType::Public {
				return Err(Error::invalid_client(
					"authentication is required for non-public clients.",
				));
			}

			Ok(client)
		})
	}
}
impl Debug for NoneAuthenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("NoneAuthenticator").finish_non_exhaustive()
	}
}
