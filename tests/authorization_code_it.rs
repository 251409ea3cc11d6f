#![cfg(feature = "test")]

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde_json::Value;
// self
use oauth2_issuer::{
	_preludet::*,
	authn::ClientAuthenticatorChain,
	authorize::{AuthorizeCodeHandler, AuthorizeEndpoint},
	client::{Client, MemoryClientLookup, OidcMetadata},
	config::{Persistence, ServerConfig},
	error::ErrorKind,
	grant::{AuthorizationCodeGrant, TokenEndpoint, TokenIssuer},
	jwks::ClientKeyResolver,
	model::{
		EndpointRequest, Method, OAuthSession, OidcSession, Response, Session,
		response::{
			ACCESS_TOKEN, CODE, EXPIRES_IN, ID_TOKEN, REDIRECT_URI, REFRESH_TOKEN, STATE,
			TOKEN_TYPE,
		},
	},
	parse::RequestParser,
	policy::RegisteredScopeStrategy,
	store::MemoryStore,
	token::{
		AccessTokenHelper, AccessTokenStrategy, HmacAuthorizeCodeStrategy,
		HmacRefreshTokenStrategy, HmacSigner, IdTokenHelper, JwtAccessTokenStrategy,
		JwtIdTokenStrategy, RefreshTokenHelper,
	},
	validate::{AuthorizeRequestValidator, TokenRequestValidator},
};

const SERVER_RSA_PUB_PEM: &str = include_str!("fixtures/server_rsa.pub.pem");

struct Server {
	store: Arc<MemoryStore>,
	access: Arc<JwtAccessTokenStrategy>,
	parser: RequestParser,
	authn: ClientAuthenticatorChain,
	authorize: AuthorizeEndpoint,
	token: TokenEndpoint,
}
impl Server {
	fn new(config: ServerConfig) -> Self {
		let keys = Arc::new(test_signing_keys());
		let store = Arc::new(MemoryStore::default());
		let lookup = Arc::new(
			MemoryClientLookup::default().with_client(test_client()).with_client(client_arc(
				test_client_builder("rp").oidc(OidcMetadata::default()),
			)),
		);
		let signer =
			HmacSigner::sha256(&[11; 32]).expect("HMAC key fixture should be accepted.");
		let codes =
			Arc::new(HmacAuthorizeCodeStrategy::new(config.entropy(), signer.clone()));
		let access = Arc::new(JwtAccessTokenStrategy::new(&config, keys.clone()));
		let issuer = TokenIssuer::new(
			AccessTokenHelper::new(&config, access.clone(), store.clone()),
			RefreshTokenHelper::new(
				&config,
				Arc::new(HmacRefreshTokenStrategy::new(config.entropy(), signer)),
				store.clone(),
			),
		);
		let id_tokens = IdTokenHelper::new(Arc::new(JwtIdTokenStrategy::new(&config, keys)));
		let authorize = AuthorizeEndpoint::new(AuthorizeRequestValidator::default()).with_handler(
			Arc::new(AuthorizeCodeHandler::new(
				codes.clone(),
				store.clone(),
				Arc::new(RegisteredScopeStrategy::new()),
			)),
		);
		let token = TokenEndpoint::new(TokenRequestValidator).with_handler(Arc::new(
			AuthorizationCodeGrant::new(&config, codes, store.clone(), issuer)
				.with_id_tokens(id_tokens),
		));

		Self {
			store,
			access,
			parser: RequestParser::new(lookup.clone()),
			authn: ClientAuthenticatorChain::with_defaults(
				lookup,
				&config,
				ClientKeyResolver::new(),
			),
			authorize,
			token,
		}
	}

	async fn authorize(&self, query: &str, session: impl Into<Session>) -> Result<Response> {
		let url = Url::parse(&format!("{TEST_ISSUER}/oauth2/auth?{query}"))
			.expect("Authorize URL should parse.");
		let mut request =
			self.parser.parse_authorize_request(&EndpointRequest::from_query(&url), session).await?;
		let consented = request.scopes.clone();

		request.session.oauth_mut().grant(&consented);

		self.authorize.authorize(&mut request).await
	}

	async fn exchange(&self, client_id: &str, code: &str) -> Result<(Arc<dyn Client>, Response)> {
		let credentials = STANDARD.encode(format!("{client_id}:{TEST_SECRET}"));
		let call = EndpointRequest::new(Method::Post)
			.with_authorization(format!("Basic {credentials}"))
			.with_param("grant_type", "authorization_code")
			.with_param("code", code)
			.with_param("redirect_uri", TEST_REDIRECT_URI);
		let client = self.authn.authenticate(&call).await?;
		let mut request =
			self.parser.parse_token_request(&call, client.clone(), OAuthSession::default())?;
		let response = self.token.exchange(&mut request).await?;

		self.access.validate_token(
			response.get_str(ACCESS_TOKEN).expect("Access token should be issued."),
			&request,
		)?;

		Ok((client, response))
	}
}

fn awaited() -> ServerConfig {
	test_config_with(Persistence::Awaited)
}

#[tokio::test]
async fn code_is_issued_exchanged_once_and_consumed() {
	let server = Server::new(awaited());
	let response = server
		.authorize(
			"client_id=client-a&response_type=code&scope=foo&state=af0ifjsldkj",
			OAuthSession::new("alice"),
		)
		.await
		.expect("Authorize call should succeed.");
	let code = response.get_str(CODE).expect("Code should be issued.");

	assert_eq!(response.get_str(REDIRECT_URI), Some(TEST_REDIRECT_URI));
	assert_eq!(response.get_str(STATE), Some("af0ifjsldkj"));
	assert_eq!(server.store.code_count(), 1);

	let (client, tokens) =
		server.exchange("client-a", code).await.expect("First exchange should succeed.");

	assert_eq!(client.id(), "client-a");
	assert_eq!(tokens.get_str(TOKEN_TYPE), Some("Bearer"));
	assert!(tokens.get(EXPIRES_IN).and_then(Value::as_i64).is_some_and(|secs| secs > 0));
	assert!(!tokens.has(ID_TOKEN));
	assert_eq!(server.store.code_count(), 0);

	let err = server.exchange("client-a", code).await.expect_err("Reused code should fail.");

	assert_eq!(err.kind(), ErrorKind::InvalidGrant);
}

#[tokio::test]
async fn openid_code_flow_issues_a_bound_id_token() {
	let server = Server::new(awaited());
	let response = server
		.authorize(
			"client_id=rp&response_type=code&scope=openid%20offline_access&nonce=n-0S6_WzA2Mj",
			OidcSession::new("alice", "pairwise-alice"),
		)
		.await
		.expect("Authorize call should succeed.");
	let code = response.get_str(CODE).expect("Code should be issued.");
	let (_, tokens) = server.exchange("rp", code).await.expect("Exchange should succeed.");
	let id_token = tokens.get_str(ID_TOKEN).expect("ID token should be issued.");
	let key = DecodingKey::from_rsa_pem(SERVER_RSA_PUB_PEM.as_bytes())
		.expect("Server public key should load.");
	let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);

	validation.set_audience(&["rp"]);
	validation.set_issuer(&[TEST_ISSUER]);

	let claims = decode::<Value>(id_token, &key, &validation)
		.expect("ID token should verify with the server key.")
		.claims;

	assert_eq!(claims["sub"], "pairwise-alice");
	assert_eq!(claims["nonce"], "n-0S6_WzA2Mj");
	assert!(claims.get("at_hash").is_some());
	assert!(tokens.has(REFRESH_TOKEN));
	assert_eq!(server.store.refresh_token_count(), 1);
}

#[tokio::test]
async fn code_cannot_be_redeemed_by_another_client() {
	let server = Server::new(awaited());
	let response = server
		.authorize("client_id=client-a&response_type=code&scope=foo", OAuthSession::new("alice"))
		.await
		.expect("Authorize call should succeed.");
	let code = response.get_str(CODE).expect("Code should be issued.");
	let err = server.exchange("rp", code).await.expect_err("Foreign client should fail.");

	assert_eq!(err.kind(), ErrorKind::UnauthorizedClient);
	assert_eq!(server.store.code_count(), 1);
}

#[tokio::test]
async fn unregistered_scope_is_rejected_at_authorize() {
	let server = Server::new(awaited());
	let err = server
		.authorize("client_id=client-a&response_type=code&scope=admin", OAuthSession::new("alice"))
		.await
		.expect_err("Unregistered scope should fail.");

	assert_eq!(err.kind(), ErrorKind::InvalidScope);
	assert_eq!(err.status_code(), 400);
	assert_eq!(server.store.code_count(), 0);
}
