//! OpenID Connect ID tokens.
//!
//! The signing algorithm is the client's registered `id_token_signed_response_alg`, resolved
//! to a server key by algorithm. `none` yields the bare claim object. When the client also
//! registers an encryption algorithm, the result is wrapped in a compact JWE addressed to a
//! key from the client's own key set.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;
use sha2::{Digest, Sha256, Sha384, Sha512};
// self
use crate::{
	_prelude::*,
	client::{self, ALG_NONE, OidcMetadata},
	config::ServerConfig,
	jwks::ClientKeyResolver,
	model::{Claims, OidcSession, Request},
	token::{
		jwe::{self, ContentEncryption, KeyManagement},
		jwt,
		keys::{self, SigningKeySet},
	},
};

/// Future returned by [`IdTokenStrategy::new_token`].
pub type IdTokenFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a + Send>>;

/// Mints ID tokens.
pub trait IdTokenStrategy
where
	Self: Send + Sync,
{
	/// Mints an ID token for `request`, which must carry an OIDC session and client.
	fn new_token<'a>(&'a self, request: &'a Request) -> IdTokenFuture<'a>;
}

/// Signed (and optionally encrypted) JWT implementation of [`IdTokenStrategy`].
#[derive(Clone, Debug)]
pub struct JwtIdTokenStrategy {
	issuer: String,
	lifespan: Duration,
	keys: Arc<SigningKeySet>,
	resolver: ClientKeyResolver,
}
impl JwtIdTokenStrategy {
	/// Creates a strategy that only encrypts for clients publishing inline key sets.
	pub fn new(config: &ServerConfig, keys: Arc<SigningKeySet>) -> Self {
		Self {
			issuer: config.issuer().into(),
			lifespan: config.id_token_lifespan(),
			keys,
			resolver: ClientKeyResolver::new(),
		}
	}

	/// Replaces the resolver used to find client encryption keys.
	pub fn with_key_resolver(mut self, resolver: ClientKeyResolver) -> Self {
		self.resolver = resolver;

		self
	}

	fn claims(&self, session: &OidcSession, client_id: &str) -> Claims {
		let subject = &session.obfuscated_subject;
		let mut claims = jwt::registered_claims(&self.issuer, subject, client_id, self.lifespan);

		claims.extend(session.id_token_claims.clone());

		if let Some(auth_time) = session.auth_time {
			claims.insert("auth_time".into(), auth_time.unix_timestamp().into());
		}
		if !session.nonce.is_empty() {
			claims.insert("nonce".into(), session.nonce.clone().into());
		}
		if !session.acr_values.is_empty() {
			claims.insert(
				"acr_values".into(),
				Value::Array(session.acr_values.iter().cloned().map(Value::from).collect()),
			);
		}

		claims
	}

	fn sign(&self, claims: &Claims, metadata: &OidcMetadata) -> Result<String> {
		let alg = metadata.id_token_signed_response_alg.as_str();

		if alg == ALG_NONE {
			return serde_json::to_string(claims).map_err(|err| {
				Error::server_error(format!("failed to serialize id_token claims: {err}."))
			});
		}

		let algorithm = keys::parse_algorithm(alg)?;
		let key = self.keys.by_algorithm(algorithm).ok_or_else(|| {
			Error::server_error("cannot find key to sign id_token for client.")
		})?;

		jwt::sign(key, claims)
	}

	async fn encrypt(&self, token: String, metadata: &OidcMetadata) -> Result<String> {
		let Some((alg, enc)) = metadata.id_token_encryption() else {
			return Ok(token);
		};
		let key_management = KeyManagement::from_str(alg)?;
		let content = ContentEncryption::from_str(enc)?;
		let recipient =
			self.resolver.resolve(metadata).await?.encryption_recipient(alg).ok_or_else(|| {
				Error::server_error("cannot find key to encrypt id_token for client.")
			})?;

		Ok(jwe::encrypt(token.as_bytes(), key_management, content, &recipient)?)
	}
}
impl IdTokenStrategy for JwtIdTokenStrategy {
	fn new_token<'a>(&'a self, request: &'a Request) -> IdTokenFuture<'a> {
		Box::pin(async move {
			let session = request
				.session
				.oidc()
				.ok_or_else(|| Error::server_error("request must carry an oidc session."))?;
			let metadata = client::require_oidc(request.client().as_ref())?;
			let claims = self.claims(session, request.client().id());
			let token = self.sign(&claims, metadata)?;

			self.encrypt(token, metadata).await
		})
	}
}

/// OIDC left-half hash of `token` for the JWS algorithm `alg`.
///
/// Returns `None` for algorithms outside the RS/PS/ES/HS 256/384/512 families, in which case
/// no `c_hash`/`at_hash` is emitted.
pub fn left_half_hash(token: &str, alg: &str) -> Option<String> {
	if !matches!(alg.get(..2)?, "RS" | "PS" | "ES" | "HS") {
		return None;
	}

	let digest = match alg.get(2..)? {
		"256" => Sha256::digest(token.as_bytes()).to_vec(),
		"384" => Sha384::digest(token.as_bytes()).to_vec(),
		"512" => Sha512::digest(token.as_bytes()).to_vec(),
		_ => return None,
	};

	Some(URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2]))
}

#[cfg(test)]
mod tests {
	// crates.io
	use rsa::{RsaPrivateKey, pkcs8::DecodePrivateKey};
	// self
	use super::*;
	use crate::{_preludet::*, model::OAuthSession, token::jwt::decode_unverified};

	const CLIENT_PRIVATE_PEM: &str = include_str!("../../tests/fixtures/client_rsa.pem");

	fn oidc_request(metadata: OidcMetadata) -> Request {
		let client = client_arc(test_client_builder("oidc-client").oidc(metadata));
		let mut session = OidcSession::new("alice", "pairwise-alice");

		session.nonce = "n-0S6_WzA2Mj".into();
		session.id_token_claims.insert("email".into(), "alice@example.com".into());

		Request::new(client, session)
	}

	fn strategy() -> JwtIdTokenStrategy {
		JwtIdTokenStrategy::new(&test_config(), Arc::new(test_signing_keys()))
	}

	#[tokio::test]
	async fn signed_token_carries_obfuscated_subject_and_set_extras_only() {
		let request = oidc_request(OidcMetadata::default());
		let token = strategy().new_token(&request).await.expect("ID token should mint.");
		let (header, claims) = decode_unverified(&token).expect("ID token should parse.");

		assert_eq!(header.kid.as_deref(), Some("server-rsa"));
		assert_eq!(claims["sub"], "pairwise-alice");
		assert_eq!(claims["aud"], serde_json::json!(["oidc-client"]));
		assert_eq!(claims["nonce"], "n-0S6_WzA2Mj");
		assert_eq!(claims["email"], "alice@example.com");
		assert!(!claims.contains_key("auth_time"));
		assert!(!claims.contains_key("acr_values"));
	}

	#[tokio::test]
	async fn alg_none_yields_plain_claims() {
		let metadata =
			OidcMetadata { id_token_signed_response_alg: ALG_NONE.into(), ..Default::default() };
		let token = strategy()
			.new_token(&oidc_request(metadata))
			.await
			.expect("Unsigned ID token should mint.");
		let claims =
			serde_json::from_str::<Claims>(&token).expect("Unsigned ID token should be JSON.");

		assert_eq!(claims["iss"], test_config().issuer());
	}

	#[tokio::test]
	async fn encrypted_token_opens_with_client_key() {
		let metadata = OidcMetadata {
			jwks: Some(CLIENT_JWKS.into()),
			id_token_encrypted_response_alg: Some("RSA-OAEP-256".into()),
			id_token_encrypted_response_enc: Some("A256GCM".into()),
			..Default::default()
		};
		let token = strategy()
			.new_token(&oidc_request(metadata))
			.await
			.expect("Encrypted ID token should mint.");

		assert_eq!(token.split('.').count(), 5);

		let key = RsaPrivateKey::from_pkcs8_pem(CLIENT_PRIVATE_PEM)
			.expect("Client private key fixture should parse.");
		let nested = jwe::decrypt(&token, &key).expect("Client should decrypt the ID token.");
		let nested = String::from_utf8(nested).expect("Nested token should be UTF-8.");
		let (_, claims) = decode_unverified(&nested).expect("Nested token should parse.");

		assert_eq!(claims["sub"], "pairwise-alice");
	}

	#[tokio::test]
	async fn missing_encryption_key_is_server_error() {
		let metadata = OidcMetadata {
			jwks: Some(CLIENT_JWKS.into()),
			id_token_encrypted_response_alg: Some("RSA1_5".into()),
			..Default::default()
		};
		let err = strategy()
			.new_token(&oidc_request(metadata))
			.await
			.expect_err("Encryption without a matching key should fail.");

		assert_eq!(err.kind(), crate::error::ErrorKind::ServerError);
		assert_eq!(err.reason(), "cannot find key to encrypt id_token for client.");
	}

	#[tokio::test]
	async fn oauth_session_is_rejected() {
		let request = Request::new(
			client_arc(test_client_builder("oidc-client").oidc(OidcMetadata::default())),
			OAuthSession::new("alice"),
		);
		let err =
			strategy().new_token(&request).await.expect_err("OAuth sessions cannot mint ID tokens.");

		assert_eq!(err.reason(), "request must carry an oidc session.");
	}

	#[test]
	fn left_half_hash_follows_algorithm_family() {
		// OIDC Core, appendix A.3: at_hash of "jHkWEdUXMU1BwAsC4vtUsZwnNvTIxEl0z9K3vx5KF0Y".
		let at_hash = left_half_hash("jHkWEdUXMU1BwAsC4vtUsZwnNvTIxEl0z9K3vx5KF0Y", "RS256");

		assert_eq!(at_hash.as_deref(), Some("77QmUPtjPfzWtF2AnpK9RQ"));
		assert_eq!(left_half_hash("x", "ES384").map(|hash| hash.len()), Some(32));
		assert!(left_half_hash("x", "EdDSA").is_none());
		assert!(left_half_hash("x", "none").is_none());
	}
}
