//! JWT access tokens.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use serde_json::Value;
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	config::ServerConfig,
	model::{Claims, Request},
	token::keys::{SigningKey, SigningKeySet},
};

/// Clock skew tolerated when validating signed tokens, in seconds.
pub const LEEWAY_SECS: u64 = 5;

/// Mints and verifies access tokens.
pub trait AccessTokenStrategy
where
	Self: Send + Sync,
{
	/// Returns the storage key of `token`. Never used for trust decisions.
	fn compute_identifier(&self, token: &str) -> Result<String>;

	/// Mints a new access token for `request`.
	fn new_token(&self, request: &Request) -> Result<String>;

	/// Verifies signature, issuer, audience, and lifetime of `token`.
	fn validate_token(&self, token: &str, request: &Request) -> Result<()>;
}

/// Signed JWT implementation of [`AccessTokenStrategy`].
#[derive(Clone, Debug)]
pub struct JwtAccessTokenStrategy {
	issuer: String,
	lifespan: Duration,
	keys: Arc<SigningKeySet>,
	algorithm: Algorithm,
	kid: Option<String>,
}
impl JwtAccessTokenStrategy {
	/// Creates an RS256 strategy drawing its key from `keys`.
	pub fn new(config: &ServerConfig, keys: Arc<SigningKeySet>) -> Self {
		Self {
			issuer: config.issuer().into(),
			lifespan: config.access_token_lifespan(),
			keys,
			algorithm: Algorithm::RS256,
			kid: None,
		}
	}

	/// Overrides the signature algorithm.
	pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
		self.algorithm = algorithm;

		self
	}

	/// Pins the signing key by identifier.
	pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
		self.kid = Some(kid.into());

		self
	}

	fn key(&self) -> Result<&SigningKey> {
		self.keys.select(self.kid.as_deref(), self.algorithm)
	}
}
impl AccessTokenStrategy for JwtAccessTokenStrategy {
	fn compute_identifier(&self, token: &str) -> Result<String> {
		let (_, claims) = decode_unverified(token)
			.map_err(|_| Error::invalid_grant("access token is malformed."))?;

		match claims.get("jti").and_then(Value::as_str) {
			Some(id) if !id.is_empty() => Ok(id.to_owned()),
			_ => Err(Error::invalid_grant("access token has no encoded id.")),
		}
	}

	fn new_token(&self, request: &Request) -> Result<String> {
		let key = self.key()?;
		let session = request.session.oauth();
		let subject =
			if session.subject.is_empty() { request.client().id() } else { &session.subject };
		let mut claims =
			registered_claims(&self.issuer, subject, request.client().id(), self.lifespan);

		claims.extend(session.access_claims.clone());

		sign(key, &claims)
	}

	fn validate_token(&self, token: &str, request: &Request) -> Result<()> {
		let key = self.key()?;
		let mut validation = Validation::new(key.algorithm());

		validation.leeway = LEEWAY_SECS;
		validation.validate_nbf = true;
		validation.set_issuer(&[&self.issuer]);
		validation.set_audience(&[request.client().id()]);

		jsonwebtoken::decode::<Claims>(token, key.decoding_key(), &validation)
			.map(|_| ())
			.map_err(|err| Error::invalid_grant(format!("access token is invalid: {err}.")))
	}
}

/// Registered claims shared by access and ID tokens.
pub(crate) fn registered_claims(
	issuer: &str,
	subject: &str,
	audience: &str,
	lifespan: Duration,
) -> Claims {
	let now = OffsetDateTime::now_utc();
	let mut claims = Claims::new();

	claims.insert("jti".into(), Uuid::new_v4().to_string().into());
	claims.insert("iss".into(), issuer.into());
	claims.insert("sub".into(), subject.into());
	claims.insert("aud".into(), Value::Array(vec![audience.into()]));
	claims.insert("nbf".into(), now.unix_timestamp().into());
	claims.insert("iat".into(), now.unix_timestamp().into());
	claims.insert("exp".into(), (now + lifespan).unix_timestamp().into());

	claims
}

/// Signs `claims` as a compact JWS carrying the key's `kid`.
pub(crate) fn sign(key: &SigningKey, claims: &Claims) -> Result<String> {
	let mut header = Header::new(key.algorithm());

	header.kid = Some(key.kid().into());

	jsonwebtoken::encode(&header, claims, key.encoding_key())
		.map_err(|err| Error::server_error(format!("failed to sign token: {err}.")))
}

/// Parses a compact JWS without checking its signature or any claim.
pub(crate) fn decode_unverified(
	token: &str,
) -> Result<(Header, Claims), jsonwebtoken::errors::Error> {
	let mut validation = Validation::default();

	validation.insecure_disable_signature_validation();
	validation.validate_exp = false;
	validation.validate_aud = false;
	validation.required_spec_claims.clear();

	let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;

	Ok((data.header, data.claims))
}
