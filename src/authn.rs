//! Token endpoint client authentication.
//!
//! Each [`ClientAuthenticator`] implements one `token_endpoint_auth_method`. The
//! [`ClientAuthenticatorChain`] picks the authenticator matching an OpenID Connect client's
//! registered method, or otherwise tries every authenticator that recognizes the request.

pub mod assertion;
pub mod basic;
pub mod chain;
pub mod none;
pub mod post;

pub use assertion::*;
pub use basic::*;
pub use chain::*;
pub use none::*;
pub use post::*;

// self
use crate::{
	_prelude::*,
	client::{self, Client},
	model::{AuthMethod, EndpointRequest},
};

/// Future returned by [`ClientAuthenticator::authenticate`].
pub type AuthnFuture<'a> = Pin<Box<dyn Future<Output = Result<Arc<dyn Client>>> + 'a + Send>>;

/// Compares a `(stored, presented)` secret pair.
pub type SecretComparator = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Authenticates the client calling the token endpoint.
pub trait ClientAuthenticator
where
	Self: Send + Sync,
{
	/// Method implemented by this authenticator.
	fn method(&self) -> AuthMethod;

	/// Returns true when `request` carries the credentials this authenticator reads.
	fn supports(&self, request: &EndpointRequest) -> bool;

	/// Returns the authenticated client.
	fn authenticate<'a>(&'a self, request: &'a EndpointRequest) -> AuthnFuture<'a>;
}

/// Exact comparison whose running time does not depend on where the inputs differ.
pub fn exact_secret_comparator() -> SecretComparator {
	Arc::new(|stored: &str, presented: &str| {
		stored.len() == presented.len()
			&& stored.bytes().zip(presented.bytes()).fold(0, |acc, (a, b)| acc | (a ^ b)) == 0
	})
}

/// Checks `presented` against the client's stored secret.
///
/// `failure` builds the error returned when the secret does not match.
fn verify_secret(
	comparator: &SecretComparator,
	client: &dyn Client,
	presented: &str,
	failure: impl FnOnce() -> Error,
) -> Result<()> {
	let stored = client::require_secret(client)?;

	if comparator(stored, presented) { Ok(()) } else { Err(failure()) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn exact_comparator_requires_identical_secrets() {
		let comparator = exact_secret_comparator();

		assert!(comparator("s3cret", "s3cret"));
		assert!(!comparator("s3cret", "s3creT"));
		assert!(!comparator("s3cret", "s3cret-longer"));
		assert!(!comparator("s3cret", ""));
	}
}
