//! `client_secret_post`: credentials in the form body.

// self
use crate::{
	_prelude::*,
	authn::{self, AuthnFuture, ClientAuthenticator, SecretComparator},
	client::ClientLookup,
	model::{AuthMethod, EndpointRequest},
};

/// Form-body client authenticator.
#[derive(Clone)]
pub struct PostAuthenticator {
	lookup: Arc<dyn ClientLookup>,
	comparator: SecretComparator,
}
impl PostAuthenticator {
	/// Creates an authenticator comparing secrets exactly.
	pub fn new(lookup: Arc<dyn ClientLookup>) -> Self {
		Self { lookup, comparator: authn::exact_secret_comparator() }
	}

	/// Replaces the secret comparison.
	pub fn with_comparator(mut self, comparator: SecretComparator) -> Self {
		self.comparator = comparator;

		self
	}
}
impl ClientAuthenticator for PostAuthenticator {
	fn method(&self) -> AuthMethod {
		AuthMethod::ClientSecretPost
	}

	fn supports(&self, request: &EndpointRequest) -> bool {
		request.is_post()
			&& request.param("client_id").is_some()
			&& request.param("client_secret").is_some()
	}

	fn authenticate<'a>(&'a self, request: &'a EndpointRequest) -> AuthnFuture<'a> {
		Box::pin(async move {
			if !request.is_post() {
				return Err(Error::invalid_client("only POST method is supported"));
			}

			let id = request
				.param("client_id")
				.ok_or_else(|| Error::invalid_client("missing client_id"))?;
			let secret = request
				.param("client_secret")
				.ok_or_else(|| Error::invalid_client("missing client_secret"))?;
			let client = self
				.lookup
				.find_by_id(id)
				.await
				.map_err(|err| Error::invalid_client(err.reason()))?;

			authn::verify_secret(&self.comparator, client.as_ref(), secret, || {
				Error::invalid_client("authentication failed")
			})?;

			Ok(client)
		})
	}
}
impl Debug for PostAuthenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PostAuthenticator").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, client::MemoryClientLookup, error::ErrorKind, model::Method};

	fn authenticator() -> PostAuthenticator {
		PostAuthenticator::new(Arc::new(MemoryClientLookup::default().with_client(test_client())))
	}

	fn form(method: Method, secret: &str) -> EndpointRequest {
		EndpointRequest::new(method)
			.with_param("client_id", "client-a")
			.with_param("client_secret", secret)
	}

	#[tokio::test]
	async fn form_credentials_authenticate() {
		let request = form(Method::Post, TEST_SECRET);

		assert!(authenticator().supports(&request));

		let client =
			authenticator().authenticate(&request).await.expect("Form credentials should pass.");

		assert_eq!(client.id(), "client-a");
	}

	#[tokio::test]
	async fn wrong_secret_and_wrong_method_fail_without_challenge() {
		let err = authenticator()
			.authenticate(&form(Method::Post, "nope"))
			.await
			.expect_err("Wrong secret should fail.");

		assert_eq!(err.kind(), ErrorKind::InvalidClient);
		assert!(err.www_authenticate().is_none());

		let request = form(Method::Get, TEST_SECRET);

		assert!(!authenticator().supports(&request));

		let err = authenticator()
			.authenticate(&request)
			.await
			.expect_err("Only POST should be accepted.");

		assert_eq!(err.reason(), "only POST method is supported");
	}
}
