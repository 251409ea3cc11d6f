//! Repository contracts for authorization codes, access tokens, and refresh tokens.
//!
//! Every repository is keyed by the token *identifier* returned by the matching
//! strategy's `compute_identifier`, so backends never hold the secret half of an opaque
//! token. Records are also indexed by the owning request's id to support lineage-wide
//! revocation through `delete_by_request_id`.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	model::{AuthorizeRequest, Request, RequestId, Session},
};

/// Future returned by repository operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence for authorization codes awaiting exchange.
pub trait AuthorizeCodeRepository
where
	Self: Send + Sync,
{
	/// Returns the authorize request that produced the code, if still present.
	fn get_request<'a>(&'a self, code_id: &'a str) -> StoreFuture<'a, Option<AuthorizeRequest>>;

	/// Persists the authorize request under the code identifier.
	fn save(&self, code_id: String, request: AuthorizeRequest) -> StoreFuture<'_, ()>;

	/// Removes the code; removing an absent code succeeds.
	fn delete<'a>(&'a self, code_id: &'a str) -> StoreFuture<'a, ()>;
}

/// Persistence for issued access tokens.
pub trait AccessTokenRepository
where
	Self: Send + Sync,
{
	/// Persists the request that minted the token.
	fn save(&self, token_id: String, request: Request) -> StoreFuture<'_, ()>;

	/// Returns the session bound to the token, if still present.
	fn get_session<'a>(&'a self, token_id: &'a str) -> StoreFuture<'a, Option<Session>>;

	/// Removes the token.
	fn delete<'a>(&'a self, token_id: &'a str) -> StoreFuture<'a, ()>;

	/// Removes every token minted by `request_id`.
	fn delete_by_request_id<'a>(&'a self, request_id: &'a RequestId) -> StoreFuture<'a, ()>;
}

/// Persistence for issued refresh tokens.
pub trait RefreshTokenRepository
where
	Self: Send + Sync,
{
	/// Persists the request that minted the token.
	fn save(&self, token_id: String, request: Request) -> StoreFuture<'_, ()>;

	/// Returns the request bound to the token, if still present.
	fn get_request<'a>(&'a self, token_id: &'a str) -> StoreFuture<'a, Option<Request>>;

	/// Removes the token.
	fn delete<'a>(&'a self, token_id: &'a str) -> StoreFuture<'a, ()>;

	/// Removes every token minted by `request_id`.
	fn delete_by_request_id<'a>(&'a self, request_id: &'a RequestId) -> StoreFuture<'a, ()>;
}

/// Error type produced by repository implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_protocol_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("database unreachable"));

		let source =
			StdError::source(&error).expect("Error should expose the original store error.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
