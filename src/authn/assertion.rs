//! `client_secret_jwt` and `private_key_jwt`: RFC 7523 client assertions.
//!
//! Both methods read `client_assertion` and `client_assertion_type` from the form and differ
//! only in the verification key: the client's shared secret, or a key from the client's
//! published key set. The assertion must be issued by and about the client
//! (`iss == sub == client_id`) and addressed to the token endpoint.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	authn::{AuthnFuture, ClientAuthenticator},
	client::{self, Client, ClientLookup},
	config::ServerConfig,
	jwks::ClientKeyResolver,
	model::{AuthMethod, CLIENT_ASSERTION_TYPE_JWT_BEARER, Claims, EndpointRequest},
	token::{jwt, keys},
};

/// Turns a stored client secret into HMAC key bytes.
pub type SecretConversion = Arc<dyn Fn(&str) -> Result<Vec<u8>> + Send + Sync>;

/// JWT bearer assertion authenticator.
#[derive(Clone)]
pub struct JwtAssertionAuthenticator {
	method: AuthMethod,
	lookup: Arc<dyn ClientLookup>,
	audiences: Vec<String>,
	resolver: ClientKeyResolver,
	conversion: Option<SecretConversion>,
}
impl JwtAssertionAuthenticator {
	/// `client_secret_jwt`: assertions are HMAC-signed with the client secret.
	pub fn client_secret_jwt(lookup: Arc<dyn ClientLookup>, config: &ServerConfig) -> Self {
		Self {
			method: AuthMethod::ClientSecretJwt,
			lookup,
			audiences: endpoint_audiences(config.token_endpoint()),
			resolver: ClientKeyResolver::new(),
			conversion: None,
		}
	}

	/// `private_key_jwt`: assertions are signed with a key from the client's key set.
	pub fn private_key_jwt(
		lookup: Arc<dyn ClientLookup>,
		config: &ServerConfig,
		resolver: ClientKeyResolver,
	) -> Self {
		Self {
			method: AuthMethod::PrivateKeyJwt,
			lookup,
			audiences: endpoint_audiences(config.token_endpoint()),
			resolver,
			conversion: None,
		}
	}

	/// Derives the HMAC key from the stored secret, e.g. when secrets are kept encoded.
	pub fn with_secret_conversion(mut self, conversion: SecretConversion) -> Self {
		self.conversion = Some(conversion);

		self
	}

	fn check_algorithm(&self, client: &dyn Client, alg: Algorithm) -> Result<()> {
		let registered = client
			.oidc()
			.and_then(|metadata| metadata.token_endpoint_auth_signing_alg.as_deref())
			.filter(|label| !label.is_empty());
		let accepted = match registered {
			Some(label) => keys::parse_algorithm(label).is_ok_and(|registered| registered == alg),
			None => is_hmac(alg) == (self.method == AuthMethod::ClientSecretJwt),
		};

		if accepted {
			Ok(())
		} else {
			Err(Error::invalid_client(
				"client_assertion signing algorithm mismatch with token_endpoint_auth_signing_alg",
			))
		}
	}

	async fn verification_keys(
		&self,
		client: &dyn Client,
		kid: Option<&str>,
	) -> Result<Vec<DecodingKey>> {
		let keys = match self.method {
			AuthMethod::ClientSecretJwt => {
				let secret = client::require_secret(client)?;
				let key = match &self.conversion {
					Some(conversion) => conversion(secret)?,
					None => secret.as_bytes().to_vec(),
				};

				vec![DecodingKey::from_secret(&key)]
			},
			_ => {
				let metadata = client::require_oidc(client)?;

				self.resolver.resolve(metadata).await?.verification_keys(kid)
			},
		};

		if keys.is_empty() {
			return Err(Error::invalid_client("no key available to verify client_assertion"));
		}

		Ok(keys)
	}

	fn verify(
		&self,
		assertion: &str,
		alg: Algorithm,
		keys: &[DecodingKey],
		client_id: &str,
	) -> Result<()> {
		let mut validation = Validation::new(alg);

		validation.leeway = jwt::LEEWAY_SECS;
		validation.validate_nbf = true;
		validation.set_issuer(&[client_id]);
		validation.set_audience(&self.audiences);
		validation.set_required_spec_claims(&["exp", "iss", "sub", "aud"]);
		validation.sub = Some(client_id.to_owned());

		let mut last_error = None;

		for key in keys {
			match jsonwebtoken::decode::<Claims>(assertion, key, &validation) {
				Ok(_) => return Ok(()),
				Err(err) => last_error = Some(err),
			}
		}

		Err(Error::invalid_client(match last_error {
			Some(err) => format!("invalid client_assertion: {err}"),
			None => "invalid client_assertion".into(),
		}))
	}
}
impl ClientAuthenticator for JwtAssertionAuthenticator {
	fn method(&self) -> AuthMethod {
		self.method
	}

	fn supports(&self, request: &EndpointRequest) -> bool {
		request.param("client_assertion").is_some()
			&& request.param("client_assertion_type").is_some()
	}

	fn authenticate<'a>(&'a self, request: &'a EndpointRequest) -> AuthnFuture<'a> {
		Box::pin(async move {
			if request.param("client_assertion_type") != Some(CLIENT_ASSERTION_TYPE_JWT_BEARER) {
				return Err(Error::invalid_client("invalid client_assertion_type"));
			}

			let assertion = request
				.param("client_assertion")
				.ok_or_else(|| Error::invalid_client("missing client_assertion"))?;
			let header = jsonwebtoken::decode_header(assertion)
				.map_err(|err| Error::invalid_client(format!("invalid client_assertion: {err}")))?;
			let id = match request.param("client_id") {
				Some(id) => id.to_owned(),
				None => assertion_subject(assertion)?,
			};
			let client = self
				.lookup
				.find_by_id(&id)
				.await
				.map_err(|err| Error::invalid_client(err.reason()))?;

			self.check_algorithm(client.as_ref(), header.alg)?;

			let keys = self.verification_keys(client.as_ref(), header.kid.as_deref()).await?;

			self.verify(assertion, header.alg, &keys, client.id())?;

			Ok(client)
		})
	}
}
impl Debug for JwtAssertionAuthenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtAssertionAuthenticator")
			.field("method", &self.method)
			.field("audiences", &self.audiences)
			.finish_non_exhaustive()
	}
}

/// Audiences an assertion may name for `endpoint`.
///
/// `Url` serializes a pathless endpoint with a trailing `/`, so both spellings are accepted
/// for it.
fn endpoint_audiences(endpoint: &Url) -> Vec<String> {
	let serialized = endpoint.to_string();
	let pathless =
		endpoint.path() == "/" && endpoint.query().is_none() && endpoint.fragment().is_none();

	let bare = serialized.strip_suffix('/').filter(|_| pathless).map(str::to_owned);

	match bare {
		Some(bare) => vec![bare, serialized],
		None => vec![serialized],
	}
}

/// Reads `sub` from an assertion without checking its signature.
fn assertion_subject(assertion: &str) -> Result<String> {
	let (_, claims) = jwt::decode_unverified(assertion)
		.map_err(|err| Error::invalid_client(format!("invalid client_assertion: {err}")))?;

	match claims.get("sub") {
		Some(Value::String(sub)) if !sub.is_empty() => Ok(sub.clone()),
		_ => Err(Error::invalid_client("invalid client_assertion: sub is not a string")),
	}
}

fn is_hmac(alg: Algorithm) -> bool {
	matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}
