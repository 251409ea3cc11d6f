//! OpenID Connect hybrid flow: `code token`, `code id_token`, and `code id_token token`.

// self
use crate::{
	_prelude::*,
	authorize::{AuthorizeCodeHandler, AuthorizeFuture, AuthorizeHandler},
	model::{AuthorizeRequest, GrantType, Response, ResponseType, SCOPE_OPENID},
	token::{AccessTokenHelper, IdTokenHelper},
};

const COMBINATIONS: [&[ResponseType]; 3] = [
	&[ResponseType::Code, ResponseType::Token],
	&[ResponseType::Code, ResponseType::IdToken],
	&[ResponseType::Code, ResponseType::Token, ResponseType::IdToken],
];

/// Issues a code together with an access and/or ID token.
#[derive(Clone)]
pub struct HybridHandler {
	code: Arc<AuthorizeCodeHandler>,
	access: AccessTokenHelper,
	id_tokens: IdTokenHelper,
}
impl HybridHandler {
	/// Creates the handler around the code handler it delegates code issuance to.
	pub fn new(
		code: Arc<AuthorizeCodeHandler>,
		access: AccessTokenHelper,
		id_tokens: IdTokenHelper,
	) -> Self {
		Self { code, access, id_tokens }
	}
}
impl AuthorizeHandler for HybridHandler {
	fn handle<'a>(
		&'a self,
		request: &'a mut AuthorizeRequest,
		response: &'a mut Response,
	) -> AuthorizeFuture<'a> {
		Box::pin(async move {
			if !COMBINATIONS.iter().any(|types| request.has_exactly_response_types(types)) {
				return Ok(());
			}

			self.code.issue_code(request, response).await?;

			if request.requests(ResponseType::Token) {
				if !request.client().supports_grant_type(GrantType::Implicit) {
					return Err(Error::invalid_grant("client is incapable of implicit grant."));
				}

				response.merge(self.access.issue(request).await?);
				request.mark_handled(ResponseType::Token);
			}
			if request.requests(ResponseType::IdToken)
				&& request.session.oauth().granted_scopes.contains(SCOPE_OPENID)
			{
				self.id_tokens.issue(request, response).await?;
				request.mark_handled(ResponseType::IdToken);
			}

			Ok(())
		})
	}
}
impl Debug for HybridHandler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HybridHandler").field("access", &self.access).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		client::OidcMetadata,
		config::Persistence,
		model::{
			OidcSession, Request, ScopeSet,
			response::{ACCESS_TOKEN, CODE, ID_TOKEN},
		},
		policy::RegisteredScopeStrategy,
		store::MemoryStore,
		token::{
			HmacAuthorizeCodeStrategy, HmacSigner, JwtAccessTokenStrategy, JwtIdTokenStrategy,
			jwt,
		},
	};

	fn handler(store: Arc<MemoryStore>) -> HybridHandler {
		let config = test_config_with(Persistence::Awaited);
		let keys = Arc::new(test_signing_keys());
		let signer = HmacSigner::sha256(&[5; 32]).expect("HMAC key should be accepted.");
		let code = AuthorizeCodeHandler::new(
			Arc::new(HmacAuthorizeCodeStrategy::new(32, signer)),
			store.clone(),
			Arc::new(RegisteredScopeStrategy::new()),
		);
		let access = AccessTokenHelper::new(
			&config,
			Arc::new(JwtAccessTokenStrategy::new(&config, keys.clone())),
			store,
		);

		HybridHandler::new(
			Arc::new(code),
			access,
			IdTokenHelper::new(Arc::new(JwtIdTokenStrategy::new(&config, keys))),
		)
	}

	fn request(types: &[ResponseType]) -> AuthorizeRequest {
		let client = client_arc(test_client_builder("rp").oidc(OidcMetadata::default()));
		let mut session = OidcSession::new("alice", "pairwise-alice");

		session.grant(&ScopeSet::from_str("openid").expect("Scope fixture should parse."));

		AuthorizeRequest::new(Request::new(client, session))
			.with_response_types(types.iter().copied())
	}

	#[tokio::test]
	async fn code_id_token_token_issues_everything_bound_together() {
		let store = Arc::new(MemoryStore::default());
		let mut request =
			request(&[ResponseType::Code, ResponseType::IdToken, ResponseType::Token]);
		let mut response = Response::new();

		handler(store.clone())
			.handle(&mut request, &mut response)
			.await
			.expect("Hybrid response should be issued.");

		assert!(response.has(CODE));
		assert!(response.has(ACCESS_TOKEN));
		assert!(request.unhandled().next().is_none());
		assert_eq!(store.code_count(), 1);
		assert_eq!(store.access_token_count(), 1);

		let id_token = response.get_str(ID_TOKEN).expect("ID token should be issued.");
		let (_, claims) = jwt::decode_unverified(id_token).expect("ID token should parse.");

		assert!(claims.contains_key("c_hash"));
		assert!(claims.contains_key("at_hash"));
	}

	#[tokio::test]
	async fn code_alone_is_left_to_the_code_handler() {
		let store = Arc::new(MemoryStore::default());
		let mut request = request(&[ResponseType::Code]);
		let mut response = Response::new();

		handler(store.clone())
			.handle(&mut request, &mut response)
			.await
			.expect("Ineligible handler should be a no-op.");

		assert!(response.is_empty());
		assert_eq!(store.code_count(), 0);
	}
}
