//! `grant_type=client_credentials`.

// self
use crate::{
	_prelude::*,
	grant::{GrantFuture, TokenHandler, TokenIssuer},
	model::{ClientType, GrantType, Response, TokenRequest},
	policy::ScopeStrategy,
};

/// Issues tokens to confidential clients acting on their own behalf.
#[derive(Clone)]
pub struct ClientCredentialsGrant {
	issuer: TokenIssuer,
	scopes: Arc<dyn ScopeStrategy>,
}
impl ClientCredentialsGrant {
	/// Creates the handler.
	pub fn new(issuer: TokenIssuer, scopes: Arc<dyn ScopeStrategy>) -> Self {
		Self { issuer, scopes }
	}
}
impl TokenHandler for ClientCredentialsGrant {
	fn supports(&self, request: &TokenRequest) -> bool {
		request.has_exactly_grant_type(GrantType::ClientCredentials)
	}

	fn update_session<'a>(&'a self, request: &'a mut TokenRequest) -> GrantFuture<'a> {
		Box::pin(async move {
			if !self.supports(request) {
				return Ok(());
			}

			let client = request.client().clone();

			if client.client_type() == ClientType::Public {
				return Err(Error::invalid_client(
					"public client cannot use client_credentials flow.",
				));
			}
			if !client.supports_grant_type(GrantType::ClientCredentials) {
				return Err(Error::invalid_grant("client unable to use client_credentials grant."));
			}
			if !self.scopes.accepts_all(client.as_ref(), &request.scopes) {
				return Err(Error::invalid_scope("scope is not accepted by client."));
			}

			let requested = request.scopes.clone();

			request.session.oauth_mut().grant(&requested);

			Ok(())
		})
	}

	fn issue_token<'a>(
		&'a self,
		request: &'a mut TokenRequest,
		response: &'a mut Response,
	) -> GrantFuture<'a> {
		Box::pin(async move {
			if self.supports(request) {
				response.merge(self.issuer.issue_for(request).await?);
			}

			Ok(())
		})
	}
}
impl Debug for ClientCredentialsGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentialsGrant")
			.field("issuer", &self.issuer)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		client::StaticClient,
		config::Persistence,
		error::ErrorKind,
		model::{
			ScopeSet,
			response::{ACCESS_TOKEN, REFRESH_TOKEN},
		},
		policy::RegisteredScopeStrategy,
		store::MemoryStore,
		token::{
			AccessTokenHelper, HmacRefreshTokenStrategy, HmacSigner, JwtAccessTokenStrategy,
			RefreshTokenHelper,
		},
	};

	fn grant(store: Arc<MemoryStore>) -> ClientCredentialsGrant {
		let config = test_config_with(Persistence::Awaited);
		let signer = HmacSigner::sha256(&[2; 32]).expect("HMAC key should be accepted.");
		let issuer = TokenIssuer::new(
			AccessTokenHelper::new(
				&config,
				Arc::new(JwtAccessTokenStrategy::new(&config, Arc::new(test_signing_keys()))),
				store.clone(),
			),
			RefreshTokenHelper::new(
				&config,
				Arc::new(HmacRefreshTokenStrategy::new(config.entropy(), signer)),
				store,
			),
		);

		ClientCredentialsGrant::new(issuer, Arc::new(RegisteredScopeStrategy::new()))
	}

	fn request(client: Arc<dyn crate::client::Client>, scopes: &str) -> TokenRequest {
		TokenRequest::new(
			test_request(client)
				.with_scopes(ScopeSet::from_str(scopes).expect("Scope fixture should parse.")),
		)
		.with_grant_types([GrantType::ClientCredentials])
	}

	async fn exchange(
		grant: &ClientCredentialsGrant,
		request: &mut TokenRequest,
	) -> Result<Response> {
		let mut response = Response::new();

		grant.update_session(request).await?;
		grant.issue_token(request, &mut response).await?;

		Ok(response)
	}

	#[tokio::test]
	async fn requested_scopes_are_granted() {
		let store = Arc::new(MemoryStore::default());
		let grant = grant(store.clone());
		let mut request = request(test_client(), "foo offline_access");
		let response = exchange(&grant, &mut request).await.expect("Exchange should succeed.");

		assert!(response.has(ACCESS_TOKEN));
		assert!(response.has(REFRESH_TOKEN));
		assert!(request.session.oauth().granted_scopes.contains("foo"));
		assert_eq!(store.access_token_count(), 1);
	}

	#[tokio::test]
	async fn prerequisites_are_enforced() {
		let grant = grant(Arc::new(MemoryStore::default()));
		let err = exchange(&grant, &mut request(test_client(), "admin"))
			.await
			.expect_err("Unregistered scope should fail.");

		assert_eq!(err.kind(), ErrorKind::InvalidScope);

		let public = client_arc(
			StaticClient::builder("spa").public().grant_types([GrantType::ClientCredentials]),
		);
		let err = exchange(&grant, &mut request(public, ""))
			.await
			.expect_err("Public clients should be rejected.");

		assert_eq!(err.kind(), ErrorKind::InvalidClient);

		let mut other = request(test_client(), "");

		other.add_grant_types([GrantType::RefreshToken]);

		let response = exchange(&grant, &mut other).await.expect("Mixed grants are ignored.");

		assert!(response.is_empty());
	}
}
