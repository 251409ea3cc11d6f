//! Authenticator selection.

// self
use crate::{
	_prelude::*,
	authn::{
		AuthnFuture, BasicAuthenticator, ClientAuthenticator, JwtAssertionAuthenticator,
		NoneAuthenticator, PostAuthenticator,
	},
	client::{Client, ClientLookup},
	config::ServerConfig,
	jwks::ClientKeyResolver,
	model::EndpointRequest,
	obs::{self, FlowKind},
};

/// Ordered set of authenticators behind one entry point.
#[derive(Clone)]
pub struct ClientAuthenticatorChain {
	lookup: Arc<dyn ClientLookup>,
	authenticators: Vec<Arc<dyn ClientAuthenticator>>,
}
impl ClientAuthenticatorChain {
	/// Creates an empty chain.
	pub fn new(lookup: Arc<dyn ClientLookup>) -> Self {
		Self { lookup, authenticators: Vec::new() }
	}

	/// Registers every built-in method: basic, post, `client_secret_jwt`, `private_key_jwt`,
	/// then `none`.
	pub fn with_defaults(
		lookup: Arc<dyn ClientLookup>,
		config: &ServerConfig,
		resolver: ClientKeyResolver,
	) -> Self {
		Self::new(lookup.clone())
			.with(Arc::new(BasicAuthenticator::new(lookup.clone())))
			.with(Arc::new(PostAuthenticator::new(lookup.clone())))
			.with(Arc::new(JwtAssertionAuthenticator::client_secret_jwt(lookup.clone(), config)))
			.with(Arc::new(JwtAssertionAuthenticator::private_key_jwt(
				lookup.clone(),
				config,
				resolver,
			)))
			.with(Arc::new(NoneAuthenticator::new(lookup)))
	}

	/// Appends an authenticator; earlier registrations are tried first.
	pub fn with(mut self, authenticator: Arc<dyn ClientAuthenticator>) -> Self {
		self.authenticators.push(authenticator);

		self
	}

	/// Authenticates the caller of the token endpoint.
	///
	/// A `client_id` naming an OpenID Connect client routes straight to the authenticator of
	/// its registered method. Otherwise every authenticator recognizing the request is tried
	/// in order; the first success wins. On failure, the first error carrying a
	/// `WWW-Authenticate` challenge is returned, else the last one.
	pub fn authenticate<'a>(&'a self, request: &'a EndpointRequest) -> AuthnFuture<'a> {
		Box::pin(obs::observe(FlowKind::ClientAuthentication, "authenticate", async move {
			if let Some(client) = self.registered_oidc_client(request).await {
				let method = client.oidc().map(|metadata| metadata.token_endpoint_auth_method);
				let authenticator = self
					.authenticators
					.iter()
					.find(|authenticator| Some(authenticator.method()) == method)
					.ok_or_else(|| Error::server_error("failed to locate proper authenticator."))?;

				return authenticator.authenticate(request).await;
			}

			let mut challenged = None;
			let mut last_error = None;

			for authenticator in self.authenticators.iter().filter(|a| a.supports(request)) {
				match authenticator.authenticate(request).await {
					Ok(client) => return Ok(client),
					Err(err) if challenged.is_none() && err.www_authenticate().is_some() => {
						challenged = Some(err);
					},
					Err(err) => last_error = Some(err),
				}
			}

			Err(challenged
				.or(last_error)
				.unwrap_or_else(|| Error::server_error("failed to locate proper authenticator.")))
		}))
	}

	async fn registered_oidc_client(&self, request: &EndpointRequest) -> Option<Arc<dyn Client>> {
		let id = request.param("client_id")?;

		self.lookup.find_by_id(id).await.ok().filter(|client| client.oidc().is_some())
	}
}
impl Debug for ClientAuthenticatorChain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientAuthenticatorChain")
			.field(
				"methods",
				&self.authenticators.iter().map(|a| a.method()).collect::<Vec<_>>(),
			)
			.finish_non_exhaustive()
	}
}
