//! `client_secret_basic`: credentials in an `Authorization: Basic` header.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	authn::{self, AuthnFuture, ClientAuthenticator, SecretComparator},
	client::ClientLookup,
	model::{AuthMethod, EndpointRequest},
};

/// Challenge scheme rendered in `WWW-Authenticate`.
pub const BASIC_SCHEME: &str = "Basic";

/// HTTP Basic client authenticator.
#[derive(Clone)]
pub struct BasicAuthenticator {
	lookup: Arc<dyn ClientLookup>,
	comparator: SecretComparator,
}
impl BasicAuthenticator {
	/// Creates an authenticator comparing secrets exactly.
	pub fn new(lookup: Arc<dyn ClientLookup>) -> Self {
		Self { lookup, comparator: authn::exact_secret_comparator() }
	}

	/// Replaces the secret comparison, e.g. with a password-hash check.
	pub fn with_comparator(mut self, comparator: SecretComparator) -> Self {
		self.comparator = comparator;

		self
	}
}
impl ClientAuthenticator for BasicAuthenticator {
	fn method(&self) -> AuthMethod {
		AuthMethod::ClientSecretBasic
	}

	fn supports(&self, request: &EndpointRequest) -> bool {
		request.authorization.is_some()
	}

	fn authenticate<'a>(&'a self, request: &'a EndpointRequest) -> AuthnFuture<'a> {
		Box::pin(async move {
			let (id, secret) = parse_basic_header(request.authorization.as_deref())
				.map_err(|reason| Error::invalid_client_with_scheme(reason, BASIC_SCHEME))?;
			let client = self.lookup.find_by_id(&id).await.map_err(|err| {
				Error::invalid_client_with_scheme(err.reason(), BASIC_SCHEME)
			})?;

			authn::verify_secret(&self.comparator, client.as_ref(), &secret, || {
				Error::invalid_client_with_scheme("authentication failed", BASIC_SCHEME)
			})?;

			Ok(client)
		})
	}
}
impl Debug for BasicAuthenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BasicAuthenticator").finish_non_exhaustive()
	}
}

/// Splits a `Basic` header into `(client_id, client_secret)`.
fn parse_basic_header(header: Option<&str>) -> Result<(String, String), &'static str> {
	let header = header.filter(|header| !header.is_empty()).ok_or("missing Authorization header")?;
	let (scheme, encoded) =
		header.split_once(' ').ok_or("invalid Authorization header scheme")?;

	if !scheme.eq_ignore_ascii_case(BASIC_SCHEME) {
		return Err("invalid Authorization header scheme");
	}

	let decoded =
		STANDARD.decode(encoded.trim()).map_err(|_| "invalid Authorization header encoding")?;
	let decoded = String::from_utf8(decoded).map_err(|_| "invalid Authorization header encoding")?;
	let (id, secret) =
		decoded.split_once(':').ok_or("invalid Authorization header content format")?;

	if id.is_empty() {
		return Err("invalid Authorization header content format");
	}

	Ok((id.to_owned(), secret.to_owned()))
}
