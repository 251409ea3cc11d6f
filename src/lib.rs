//! OAuth 2.0 and OpenID Connect authorization-server engine: opaque and signed token
//! strategies, authorize and token handlers, and client authentication, wired to
//! storage and client registries you bring yourself.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod authn;
pub mod authorize;
pub mod client;
pub mod config;
pub mod error;
pub mod grant;
pub mod jwks;
pub mod model;
pub mod obs;
pub mod parse;
pub mod policy;
pub mod store;
pub mod task;
pub mod token;
pub mod validate;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests; enabled via `cfg(test)` or
	//! the `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use jsonwebtoken::{Algorithm, EncodingKey, Header};
	// self
	use crate::{
		client::{Client, StaticClient, StaticClientBuilder},
		config::{Persistence, ServerConfig},
		model::{Claims, GrantType, OAuthSession, Request, ResponseType},
		token::keys::{SigningKey, SigningKeySet},
	};

	/// Client key set publishing `client-sig` (RS256) and `client-enc` (RSA-OAEP-256), both
	/// backed by `tests/fixtures/client_rsa.pem`.
	pub const CLIENT_JWKS: &str = include_str!("../tests/fixtures/client_jwks.json");
	/// Client private key matching [`CLIENT_JWKS`].
	pub const CLIENT_RSA_PEM: &str = include_str!("../tests/fixtures/client_rsa.pem");

	const SERVER_RSA_PEM: &str = include_str!("../tests/fixtures/server_rsa.pem");
	const SERVER_RSA_PUB_PEM: &str = include_str!("../tests/fixtures/server_rsa.pub.pem");
	const SERVER_EC_PEM: &str = include_str!("../tests/fixtures/server_ec.pem");
	const SERVER_EC_PUB_PEM: &str = include_str!("../tests/fixtures/server_ec.pub.pem");

	/// Issuer used by every fixture.
	pub const TEST_ISSUER: &str = "https://issuer.example.com";
	/// Token endpoint used by every fixture; client assertions must target it.
	pub const TEST_TOKEN_ENDPOINT: &str = "https://issuer.example.com/oauth2/token";
	/// Secret shared by [`test_client_builder`] clients.
	pub const TEST_SECRET: &str = "s3cret";
	/// Sole redirect URI registered by [`test_client_builder`] clients.
	pub const TEST_REDIRECT_URI: &str = "https://app.example.com/cb";

	/// Server configuration with detached persistence and one-hour access tokens.
	pub fn test_config() -> ServerConfig {
		test_config_with(Persistence::Detached)
	}

	/// Server configuration using `persistence`.
	pub fn test_config_with(persistence: Persistence) -> ServerConfig {
		ServerConfig::builder()
			.issuer(TEST_ISSUER)
			.token_endpoint(Url::parse(TEST_TOKEN_ENDPOINT).expect("Token endpoint should parse."))
			.persistence(persistence)
			.build()
			.expect("Test configuration should build.")
	}

	/// `server-rsa` (RS256) and `server-ec` (ES256) signing keys.
	pub fn test_signing_keys() -> SigningKeySet {
		let rsa = SigningKey::rsa_pem(
			"server-rsa",
			Algorithm::RS256,
			SERVER_RSA_PEM.as_bytes(),
			SERVER_RSA_PUB_PEM.as_bytes(),
		)
		.expect("RSA fixture key should load.");
		let ec = SigningKey::ec_pem(
			"server-ec",
			Algorithm::ES256,
			SERVER_EC_PEM.as_bytes(),
			SERVER_EC_PUB_PEM.as_bytes(),
		)
		.expect("EC fixture key should load.");

		SigningKeySet::new().with_key(rsa).with_key(ec)
	}

	/// Confidential client registering every response and grant type the engine handles.
	pub fn test_client_builder(id: &str) -> StaticClientBuilder {
		StaticClient::builder(id)
			.secret(TEST_SECRET)
			.redirect_uris([TEST_REDIRECT_URI])
			.response_types([ResponseType::Code, ResponseType::Token, ResponseType::IdToken])
			.grant_types([
				GrantType::AuthorizationCode,
				GrantType::Implicit,
				GrantType::ClientCredentials,
				GrantType::RefreshToken,
			])
			.scopes(["foo", "bar", "openid", "offline_access"])
	}

	/// Builds `builder` into a shared client.
	pub fn client_arc(builder: StaticClientBuilder) -> Arc<dyn Client> {
		Arc::new(builder.build().expect("Client fixture should build."))
	}

	/// `client-a` built from [`test_client_builder`].
	pub fn test_client() -> Arc<dyn Client> {
		client_arc(test_client_builder("client-a"))
	}

	/// Request for `client` owned by subject `alice`.
	pub fn test_request(client: Arc<dyn Client>) -> Request {
		Request::new(client, OAuthSession::new("alice"))
	}

	/// Signs a five-minute client assertion issued by and about `client_id`.
	pub fn sign_assertion(
		client_id: &str,
		alg: Algorithm,
		key: &EncodingKey,
		kid: Option<&str>,
		audience: &str,
	) -> String {
		let now = OffsetDateTime::now_utc();
		let mut header = Header::new(alg);
		let mut claims = Claims::new();

		header.kid = kid.map(str::to_owned);
		claims.insert("jti".into(), uuid::Uuid::new_v4().to_string().into());
		claims.insert("iss".into(), client_id.into());
		claims.insert("sub".into(), client_id.into());
		claims.insert("aud".into(), audience.into());
		claims.insert("iat".into(), now.unix_timestamp().into());
		claims.insert("exp".into(), (now + Duration::minutes(5)).unix_timestamp().into());

		jsonwebtoken::encode(&header, &claims, key).expect("Client assertion should sign.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
