//! Client capability surface consumed by strategies, handlers, and authenticators.
//!
//! Registered clients live outside this crate; they are reached through [`ClientLookup`] and
//! described by the [`Client`] trait. Optional capabilities (secret comparison, OpenID
//! Connect metadata) are probed through methods returning `Option`, so a missing capability
//! is an explicit [`Error::NotImplemented`] at the call site instead of a panic.

pub mod lookup;
pub mod metadata;
pub mod secret;
pub mod static_client;

pub use lookup::*;
pub use metadata::*;
pub use secret::*;
pub use static_client::*;

// self
use crate::{
	_prelude::*,
	model::{ClientType, GrantType, ResponseType},
};

/// Registered OAuth client.
pub trait Client
where
	Self: Send + Sync + Debug,
{
	/// Universal client identifier.
	fn id(&self) -> &str;

	/// Display name.
	fn name(&self) -> &str;

	/// Confidential or public.
	fn client_type(&self) -> ClientType;

	/// Registered redirect URIs.
	fn redirect_uris(&self) -> &[String];

	/// Registered response types.
	fn response_types(&self) -> &[ResponseType];

	/// Registered grant types.
	fn grant_types(&self) -> &[GrantType];

	/// Registered scopes.
	fn scopes(&self) -> &[String];

	/// Stored secret, when the client supports secret comparison.
	fn secret(&self) -> Option<&str> {
		None
	}

	/// OpenID Connect metadata, when the client is an OIDC client.
	fn oidc(&self) -> Option<&OidcMetadata> {
		None
	}

	/// Returns true when the client registered `response_type`.
	fn supports_response_type(&self, response_type: ResponseType) -> bool {
		self.response_types().contains(&response_type)
	}

	/// Returns true when the client registered `grant_type`.
	fn supports_grant_type(&self, grant_type: GrantType) -> bool {
		self.grant_types().contains(&grant_type)
	}
}

/// Returns the client's secret or [`Error::NotImplemented`].
pub fn require_secret(client: &dyn Client) -> Result<&str> {
	client.secret().ok_or(Error::NotImplemented { capability: "client_secret" })
}

/// Returns the client's OIDC metadata or [`Error::NotImplemented`].
pub fn require_oidc(client: &dyn Client) -> Result<&OidcMetadata> {
	client.oidc().ok_or(Error::NotImplemented { capability: "oidc_metadata" })
}
