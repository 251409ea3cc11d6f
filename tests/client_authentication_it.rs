#![cfg(feature = "test")]

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
#[cfg(feature = "reqwest")] use httpmock::prelude::*;
use jsonwebtoken::{Algorithm, EncodingKey};
// self
#[cfg(feature = "reqwest")] use oauth2_issuer::jwks::ReqwestJwksFetcher;
use oauth2_issuer::{
	_preludet::*,
	authn::{BasicAuthenticator, ClientAuthenticator, ClientAuthenticatorChain},
	client::{Client, MemoryClientLookup, OidcMetadata, StaticClient},
	error::ErrorKind,
	jwks::ClientKeyResolver,
	model::{AuthMethod, CLIENT_ASSERTION_TYPE_JWT_BEARER, EndpointRequest, Method},
};

fn secret_jwt_client() -> Arc<dyn Client> {
	client_arc(test_client_builder("secret-jwt").oidc(OidcMetadata {
		token_endpoint_auth_method: AuthMethod::ClientSecretJwt,
		token_endpoint_auth_signing_alg: Some("HS256".into()),
		..Default::default()
	}))
}

fn private_key_client(metadata: OidcMetadata) -> Arc<dyn Client> {
	client_arc(test_client_builder("private-key").oidc(OidcMetadata {
		token_endpoint_auth_method: AuthMethod::PrivateKeyJwt,
		token_endpoint_auth_signing_alg: Some("RS256".into()),
		..metadata
	}))
}

fn chain(resolver: ClientKeyResolver, clients: Vec<Arc<dyn Client>>) -> ClientAuthenticatorChain {
	let lookup = clients
		.into_iter()
		.fold(MemoryClientLookup::default(), |lookup, client| lookup.with_client(client));

	ClientAuthenticatorChain::with_defaults(Arc::new(lookup), &test_config(), resolver)
}

fn default_chain() -> ClientAuthenticatorChain {
	chain(
		ClientKeyResolver::new(),
		vec![
			test_client(),
			secret_jwt_client(),
			private_key_client(OidcMetadata {
				jwks: Some(CLIENT_JWKS.into()),
				..Default::default()
			}),
			client_arc(StaticClient::builder("spa").public().redirect_uris([TEST_REDIRECT_URI])),
		],
	)
}

fn assertion_call(client_id: &str, assertion: String) -> EndpointRequest {
	EndpointRequest::new(Method::Post)
		.with_param("client_id", client_id)
		.with_param("client_assertion_type", CLIENT_ASSERTION_TYPE_JWT_BEARER)
		.with_param("client_assertion", assertion)
}

#[cfg(feature = "reqwest")]
fn mock_jwks_uri(server: &MockServer) -> Url {
	Url::parse(&format!("http://{}/jwks.json", server.address()))
		.expect("Mock JWKS URI should parse.")
}

fn client_rsa_key() -> EncodingKey {
	EncodingKey::from_rsa_pem(CLIENT_RSA_PEM.as_bytes()).expect("Client key fixture should load.")
}

#[tokio::test]
async fn basic_credentials_authenticate_and_failures_carry_a_challenge() {
	let chain = default_chain();
	let basic = |secret: &str| {
		EndpointRequest::new(Method::Post)
			.with_authorization(format!("Basic {}", STANDARD.encode(format!("client-a:{secret}"))))
	};
	let client = chain.authenticate(&basic(TEST_SECRET)).await.expect("Basic should pass.");

	assert_eq!(client.id(), "client-a");

	let err = chain.authenticate(&basic("wrong")).await.expect_err("Wrong secret should fail.");

	assert_eq!(err.kind(), ErrorKind::InvalidClient);
	assert_eq!(err.status_code(), 401);
	assert_eq!(
		err.www_authenticate().as_deref(),
		Some("Basic error=\"invalid_client\" error_description=\"authentication failed\"")
	);

	let lookup = Arc::new(MemoryClientLookup::default().with_client(test_client()));
	let err = BasicAuthenticator::new(lookup)
		.authenticate(&basic("wrong"))
		.await
		.expect_err("Wrong secret should fail.");

	assert_eq!(err.kind(), ErrorKind::InvalidClient);
	assert!(err.www_authenticate().is_some());
}

#[tokio::test]
async fn post_and_none_methods_cover_confidential_and_public_clients() {
	let chain = default_chain();
	let post = EndpointRequest::new(Method::Post)
		.with_param("client_id", "client-a")
		.with_param("client_secret", TEST_SECRET);

	assert_eq!(chain.authenticate(&post).await.expect("Post should pass.").id(), "client-a");

	let public = EndpointRequest::new(Method::Post).with_param("client_id", "spa");

	assert_eq!(chain.authenticate(&public).await.expect("Public should pass.").id(), "spa");

	let bare = EndpointRequest::new(Method::Post).with_param("client_id", "client-a");
	let err = chain.authenticate(&bare).await.expect_err("Confidential clients need a secret.");

	assert_eq!(err.kind(), ErrorKind::InvalidClient);
}

#[tokio::test]
async fn client_secret_jwt_signed_with_another_secret_is_rejected() {
	let chain = default_chain();
	let good = sign_assertion(
		"secret-jwt",
		Algorithm::HS256,
		&EncodingKey::from_secret(TEST_SECRET.as_bytes()),
		None,
		TEST_TOKEN_ENDPOINT,
	);

	chain
		.authenticate(&assertion_call("secret-jwt", good))
		.await
		.expect("Assertion signed with the registered secret should pass.");

	let forged = sign_assertion(
		"secret-jwt",
		Algorithm::HS256,
		&EncodingKey::from_secret(b"another-clients-secret"),
		None,
		TEST_TOKEN_ENDPOINT,
	);
	let err = chain
		.authenticate(&assertion_call("secret-jwt", forged))
		.await
		.expect_err("Assertion signed with another secret should fail.");

	assert_eq!(err.kind(), ErrorKind::InvalidClient);
}

#[tokio::test]
async fn private_key_jwt_verifies_with_the_inline_key_set() {
	let chain = default_chain();
	let assertion = sign_assertion(
		"private-key",
		Algorithm::RS256,
		&client_rsa_key(),
		Some("client-sig"),
		TEST_TOKEN_ENDPOINT,
	);
	let client = chain
		.authenticate(&assertion_call("private-key", assertion))
		.await
		.expect("Assertion signed with the client key should pass.");

	assert_eq!(client.id(), "private-key");

	let misdirected = sign_assertion(
		"private-key",
		Algorithm::RS256,
		&client_rsa_key(),
		Some("client-sig"),
		"https://other-issuer.example.com/token",
	);
	let err = chain
		.authenticate(&assertion_call("private-key", misdirected))
		.await
		.expect_err("Assertion for another audience should fail.");

	assert_eq!(err.kind(), ErrorKind::InvalidClient);
}

#[cfg(feature = "reqwest")]
#[tokio::test]
async fn private_key_jwt_resolves_and_caches_the_jwks_uri() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/jwks.json");
			then.status(200).header("content-type", "application/json").body(CLIENT_JWKS);
		})
		.await;
	let jwks_uri = mock_jwks_uri(&server);
	let fetcher = ReqwestJwksFetcher::new().expect("JWKS fetcher should build.");
	let chain = chain(
		ClientKeyResolver::new().with_fetcher(Arc::new(fetcher)),
		vec![private_key_client(OidcMetadata { jwks_uri: Some(jwks_uri), ..Default::default() })],
	);

	for _ in 0..2 {
		let assertion = sign_assertion(
			"private-key",
			Algorithm::RS256,
			&client_rsa_key(),
			Some("client-sig"),
			TEST_TOKEN_ENDPOINT,
		);

		chain
			.authenticate(&assertion_call("private-key", assertion))
			.await
			.expect("Assertion should verify against the fetched key set.");
	}

	mock.assert_calls_async(1).await;
}

#[cfg(feature = "reqwest")]
#[tokio::test]
async fn unreachable_jwks_uri_is_a_server_error() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/jwks.json");
			then.status(503);
		})
		.await;
	let jwks_uri = mock_jwks_uri(&server);
	let fetcher = ReqwestJwksFetcher::new().expect("JWKS fetcher should build.");
	let chain = chain(
		ClientKeyResolver::new().with_fetcher(Arc::new(fetcher)),
		vec![private_key_client(OidcMetadata { jwks_uri: Some(jwks_uri), ..Default::default() })],
	);
	let assertion = sign_assertion(
		"private-key",
		Algorithm::RS256,
		&client_rsa_key(),
		Some("client-sig"),
		TEST_TOKEN_ENDPOINT,
	);
	let err = chain
		.authenticate(&assertion_call("private-key", assertion))
		.await
		.expect_err("Failed JWKS fetch should fail authentication.");

	mock.assert_calls_async(1).await;

	assert_eq!(err.kind(), ErrorKind::ServerError);
	assert_eq!(err.status_code(), 500);
	assert!(err.reason().starts_with("failed to fetch client jwks"));
}
