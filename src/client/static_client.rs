//! In-process client registration with a validating builder.

// self
use crate::{
	_prelude::*,
	client::{Client, ClientSecret, OidcMetadata},
	model::{ClientType, GrantType, ResponseType},
};

/// Errors raised while constructing or validating a [`StaticClient`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StaticClientError {
	/// The client identifier is required.
	#[error("Client identifier cannot be empty.")]
	MissingId,
	/// Public clients cannot hold a secret.
	#[error("Public client `{id}` cannot carry a client secret.")]
	PublicClientWithSecret {
		/// Offending client identifier.
		id: String,
	},
	/// Redirect URIs must be non-empty strings.
	#[error("Client `{id}` registered an empty redirect URI.")]
	EmptyRedirectUri {
		/// Offending client identifier.
		id: String,
	},
}

/// Client registration held in memory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticClient {
	/// Client identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Client type.
	pub client_type: ClientType,
	/// Stored secret.
	pub secret: Option<ClientSecret>,
	/// Registered redirect URIs.
	pub redirect_uris: Vec<String>,
	/// Registered response types.
	pub response_types: Vec<ResponseType>,
	/// Registered grant types.
	pub grant_types: Vec<GrantType>,
	/// Registered scopes.
	pub scopes: Vec<String>,
	/// OIDC metadata, for OIDC clients.
	pub oidc: Option<OidcMetadata>,
}
impl StaticClient {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: impl Into<String>) -> StaticClientBuilder {
		StaticClientBuilder::new(id)
	}

	fn validate(&self) -> Result<(), StaticClientError> {
		if self.id.is_empty() {
			return Err(StaticClientError::MissingId);
		}
		if self.client_type == ClientType::Public && self.secret.is_some() {
			return Err(StaticClientError::PublicClientWithSecret { id: self.id.clone() });
		}
		if self.redirect_uris.iter().any(String::is_empty) {
			return Err(StaticClientError::EmptyRedirectUri { id: self.id.clone() });
		}

		Ok(())
	}
}
impl Client for StaticClient {
	fn id(&self) -> &str {
		&self.id
	}

	fn name(&self) -> &str {
		&self.name
	}

	fn client_type(&self) -> ClientType {
		self.client_type
	}

	fn redirect_uris(&self) -> &[String] {
		&self.redirect_uris
	}

	fn response_types(&self) -> &[ResponseType] {
		&self.response_types
	}

	fn grant_types(&self) -> &[GrantType] {
		&self.grant_types
	}

	fn scopes(&self) -> &[String] {
		&self.scopes
	}

	fn secret(&self) -> Option<&str> {
		self.secret.as_ref().map(ClientSecret::expose)
	}

	fn oidc(&self) -> Option<&OidcMetadata> {
		self.oidc.as_ref()
	}
}

/// Builder for [`StaticClient`] values.
#[derive(Debug)]
pub struct StaticClientBuilder {
	client: StaticClient,
}
impl StaticClientBuilder {
	/// Creates a new confidential-client builder seeded with the provided identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			client: StaticClient {
				id: id.into(),
				name: String::new(),
				client_type: ClientType::Confidential,
				secret: None,
				redirect_uris: Vec::new(),
				response_types: Vec::new(),
				grant_types: Vec::new(),
				scopes: Vec::new(),
				oidc: None,
			},
		}
	}

	/// Sets the display name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.client.name = name.into();

		self
	}

	/// Marks the client as public.
	pub fn public(mut self) -> Self {
		self.client.client_type = ClientType::Public;

		self
	}

	/// Sets the stored secret.
	pub fn secret(mut self, secret: impl Into<String>) -> Self {
		self.client.secret = Some(ClientSecret::new(secret));

		self
	}

	/// Registers redirect URIs.
	pub fn redirect_uris<I, S>(mut self, uris: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.client.redirect_uris.extend(uris.into_iter().map(Into::into));

		self
	}

	/// Registers response types.
	pub fn response_types<I>(mut self, types: I) -> Self
	where
		I: IntoIterator<Item = ResponseType>,
	{
		for ty in types {
			if !self.client.response_types.contains(&ty) {
				self.client.response_types.push(ty);
			}
		}

		self
	}

	/// Registers grant types.
	pub fn grant_types<I>(mut self, grants: I) -> Self
	where
		I: IntoIterator<Item = GrantType>,
	{
		for grant in grants {
			if !self.client.grant_types.contains(&grant) {
				self.client.grant_types.push(grant);
			}
		}

		self
	}

	/// Registers scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.client.scopes.extend(scopes.into_iter().map(Into::into));

		self
	}

	/// Attaches OIDC metadata, turning the client into an OIDC client.
	pub fn oidc(mut self, metadata: OidcMetadata) -> Self {
		self.client.oidc = Some(metadata);

		self
	}

	/// Consumes the builder and validates the resulting client.
	pub fn build(self) -> Result<StaticClient, StaticClientError> {
		self.client.validate()?;

		Ok(self.client)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builder_collects_registration() {
		let client = StaticClient::builder("client-a")
			.secret("s3cret")
			.redirect_uris(["https://app.example.com/cb"])
			.response_types([ResponseType::Code, ResponseType::Code])
			.grant_types([GrantType::AuthorizationCode])
			.scopes(["foo"])
			.build()
			.expect("Client fixture should build.");

		assert_eq!(client.response_types(), &[ResponseType::Code]);
		assert!(client.supports_grant_type(GrantType::AuthorizationCode));
		assert!(!client.supports_grant_type(GrantType::Implicit));
		assert_eq!(Client::secret(&client), Some("s3cret"));
		assert!(client.oidc().is_none());
	}

	#[test]
	fn builder_rejects_invalid_registrations() {
		assert_eq!(StaticClient::builder("").build(), Err(StaticClientError::MissingId));
		assert!(matches!(
			StaticClient::builder("pub").public().secret("x").build(),
			Err(StaticClientError::PublicClientWithSecret { .. })
		));
		assert!(matches!(
			StaticClient::builder("c").redirect_uris([""]).build(),
			Err(StaticClientError::EmptyRedirectUri { .. })
		));
	}
}
