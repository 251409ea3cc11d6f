//! Client JSON Web Key Sets.
//!
//! A client publishes its keys inline (`jwks`) or by reference (`jwks_uri`). Inline sets win;
//! referenced sets are retrieved through a [`JwksFetcher`]. With the default `reqwest`
//! feature, [`ReqwestJwksFetcher`] caches each document for a TTL and lets only one request
//! per URI go out at a time.
//!
//! Keys are kept as raw JSON and converted on demand: entries that do not convert (unknown
//! `kty`, private-only members, unsupported `alg`) are skipped instead of failing the set.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{DecodingKey, jwk::Jwk};
use rsa::{BigUint, RsaPublicKey};
use serde_json::Value;
// self
use crate::{_prelude::*, client::OidcMetadata, token::jwe::JweRecipient};

/// Default lifetime of a fetched key set.
pub const DEFAULT_JWKS_TTL: Duration = Duration::minutes(5);

/// Future returned by [`JwksFetcher::fetch`].
pub type JwksFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Parsed client key set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientKeySet {
	/// Raw JWK entries.
	pub keys: Vec<Value>,
}
impl ClientKeySet {
	/// Parses a JWKS document.
	pub fn parse(json: &str) -> Result<Self> {
		let de = &mut serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(de).map_err(|err| {
			Error::server_error(format!("invalid client json web key set: {err}."))
		})
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// True when the set has no entry.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Verification keys, restricted to `kid` when given, in document order.
	pub fn verification_keys(&self, kid: Option<&str>) -> Vec<DecodingKey> {
		self.keys
			.iter()
			.filter(|entry| kid.is_none_or(|kid| member(entry, "kid") == Some(kid)))
			.filter_map(|entry| serde_json::from_value::<Jwk>(entry.clone()).ok())
			.filter_map(|jwk| DecodingKey::from_jwk(&jwk).ok())
			.collect()
	}

	/// First RSA key registered for the JWE key management algorithm `alg`.
	pub fn encryption_recipient(&self, alg: &str) -> Option<JweRecipient> {
		self.keys
			.iter()
			.filter(|entry| member(entry, "alg") == Some(alg) && member(entry, "kty") == Some("RSA"))
			.find_map(|entry| {
				rsa_public_key(entry).map(|key| JweRecipient {
					kid: member(entry, "kid").map(str::to_owned),
					key,
				})
			})
	}
}

fn member<'a>(entry: &'a Value, name: &str) -> Option<&'a str> {
	entry.get(name).and_then(Value::as_str)
}

fn rsa_public_key(entry: &Value) -> Option<RsaPublicKey> {
	let n = URL_SAFE_NO_PAD.decode(member(entry, "n")?).ok()?;
	let e = URL_SAFE_NO_PAD.decode(member(entry, "e")?).ok()?;

	RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e)).ok()
}

/// Retrieves a key set published at a URI.
pub trait JwksFetcher
where
	Self: Send + Sync,
{
	/// Fetches and parses the document at `uri`.
	fn fetch<'a>(&'a self, uri: &'a Url) -> JwksFuture<'a, ClientKeySet>;
}

/// Resolves the key set a client registered, inline or by reference.
#[derive(Clone, Default)]
pub struct ClientKeyResolver {
	fetcher: Option<Arc<dyn JwksFetcher>>,
}
impl ClientKeyResolver {
	/// Creates a resolver that only accepts inline key sets.
	pub fn new() -> Self {
		Self::default()
	}

	/// Enables `jwks_uri` resolution.
	pub fn with_fetcher(mut self, fetcher: Arc<dyn JwksFetcher>) -> Self {
		self.fetcher = Some(fetcher);

		self
	}

	/// Returns the client's key set.
	pub async fn resolve(&self, metadata: &OidcMetadata) -> Result<ClientKeySet> {
		if let Some(jwks) = metadata.jwks.as_deref().filter(|jwks| !jwks.trim().is_empty()) {
			return ClientKeySet::parse(jwks);
		}

		match (metadata.jwks_uri.as_ref(), self.fetcher.as_ref()) {
			(Some(uri), Some(fetcher)) => fetcher.fetch(uri).await,
			(Some(_), None) => Err(Error::NotImplemented { capability: "jwks_fetcher" }),
			(None, _) => Err(Error::server_error("missing client json web key set.")),
		}
	}
}
impl Debug for ClientKeyResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientKeyResolver").field("fetcher", &self.fetcher.is_some()).finish()
	}
}

#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
struct CachedKeySet {
	keys: ClientKeySet,
	fetched_at: OffsetDateTime,
}

/// Caching [`JwksFetcher`] backed by [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestJwksFetcher {
	client: ReqwestClient,
	ttl: Duration,
	cache: Arc<RwLock<HashMap<Url, CachedKeySet>>>,
	guards: Arc<Mutex<HashMap<Url, Arc<AsyncMutex<()>>>>>,
}
#[cfg(feature = "reqwest")]
impl ReqwestJwksFetcher {
	/// Builds a fetcher with a default HTTP client.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::HttpClientBuild)?;

		Ok(Self::with_client(client))
	}

	/// Wraps an existing client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self {
			client,
			ttl: DEFAULT_JWKS_TTL,
			cache: Default::default(),
			guards: Default::default(),
		}
	}

	/// Overrides how long a fetched document is reused.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Drops every cached document.
	pub fn clear(&self) {
		self.cache.write().clear();
	}

	fn cached(&self, uri: &Url) -> Option<ClientKeySet> {
		let cache = self.cache.read();
		let entry = cache.get(uri)?;

		(OffsetDateTime::now_utc() - entry.fetched_at < self.ttl).then(|| entry.keys.clone())
	}

	fn guard(&self, uri: &Url) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(uri.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	/// Drops the guard of `uri` once no other fetch is waiting on it.
	fn release(&self, uri: &Url, guard: Arc<AsyncMutex<()>>) {
		let mut guards = self.guards.lock();
		let idle = guards
			.get(uri)
			.is_some_and(|held| Arc::ptr_eq(held, &guard) && Arc::strong_count(held) == 2);

		if idle {
			guards.remove(uri);
		}
	}

	async fn fetch_serialized(&self, uri: &Url, guard: &AsyncMutex<()>) -> Result<ClientKeySet> {
		let _lock = guard.lock().await;

		if let Some(keys) = self.cached(uri) {
			return Ok(keys);
		}

		let keys = self.download(uri).await?;

		self.cache.write().insert(
			uri.clone(),
			CachedKeySet { keys: keys.clone(), fetched_at: OffsetDateTime::now_utc() },
		);

		Ok(keys)
	}

	async fn download(&self, uri: &Url) -> Result<ClientKeySet> {
		let response = self
			.client
			.get(uri.clone())
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)
			.map_err(|err| Error::server_error(format!("failed to fetch client jwks: {err}.")))?;
		let body = response
			.text()
			.await
			.map_err(|err| Error::server_error(format!("failed to read client jwks: {err}.")))?;

		ClientKeySet::parse(&body)
	}
}
#[cfg(feature = "reqwest")]
impl JwksFetcher for ReqwestJwksFetcher {
	fn fetch<'a>(&'a self, uri: &'a Url) -> JwksFuture<'a, ClientKeySet> {
		Box::pin(async move {
			if let Some(keys) = self.cached(uri) {
				return Ok(keys);
			}

			let guard = self.guard(uri);
			let keys = self.fetch_serialized(uri, &guard).await;

			self.release(uri, guard);

			keys
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn keys_are_filtered_by_kid_and_alg() {
		let keys = ClientKeySet::parse(CLIENT_JWKS).expect("Fixture JWKS should parse.");

		assert_eq!(keys.len(), 2);
		assert_eq!(keys.verification_keys(Some("client-sig")).len(), 1);
		assert!(keys.verification_keys(Some("unknown")).is_empty());

		let recipient =
			keys.encryption_recipient("RSA-OAEP-256").expect("Encryption key should exist.");

		assert_eq!(recipient.kid.as_deref(), Some("client-enc"));
		assert!(keys.encryption_recipient("RSA1_5").is_none());
	}

	#[test]
	fn unusable_entries_are_skipped() {
		let keys = ClientKeySet::parse(r#"{ "keys": [{ "kty": "OKP", "kid": "x" }] }"#)
			.expect("Document should parse.");

		assert!(keys.verification_keys(None).is_empty());
		assert!(ClientKeySet::parse(r#"{ "keys": "nope" }"#).is_err());
	}

	#[tokio::test]
	async fn resolver_prefers_inline_keys() {
		let metadata = OidcMetadata { jwks: Some(CLIENT_JWKS.into()), ..Default::default() };
		let keys =
			ClientKeyResolver::new().resolve(&metadata).await.expect("Inline JWKS should resolve.");

		assert_eq!(keys.len(), 2);

		let uri = Url::parse("https://client.example.com/jwks").expect("URL should parse.");
		let by_uri = OidcMetadata { jwks_uri: Some(uri), ..Default::default() };
		let err = ClientKeyResolver::new()
			.resolve(&by_uri)
			.await
			.expect_err("Missing fetcher should be reported.");

		assert!(matches!(err, Error::NotImplemented { capability: "jwks_fetcher" }));

		let err = ClientKeyResolver::new()
			.resolve(&OidcMetadata::default())
			.await
			.expect_err("Missing key set should fail.");

		assert_eq!(err.reason(), "missing client json web key set.");
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn fetcher_caches_documents_and_prunes_guards() {
		// crates.io
		use httpmock::prelude::*;

		let server = MockServer::start_async().await;
		let published = server
			.mock_async(|when, then| {
				when.method(GET).path("/jwks.json");
				then.status(200).header("content-type", "application/json").body(CLIENT_JWKS);
			})
			.await;
		let missing = server
			.mock_async(|when, then| {
				when.method(GET).path("/gone.json");
				then.status(404);
			})
			.await;
		let url = |path: &str| {
			Url::parse(&format!("http://{}{path}", server.address()))
				.expect("Mock URL should parse.")
		};
		let fetcher = ReqwestJwksFetcher::new().expect("JWKS fetcher should build.");

		for _ in 0..2 {
			let keys = fetcher.fetch(&url("/jwks.json")).await.expect("Key set should be fetched.");

			assert_eq!(keys.len(), 2);
		}

		published.assert_calls_async(1).await;

		let err = fetcher.fetch(&url("/gone.json")).await.expect_err("Missing document fails.");

		missing.assert_calls_async(1).await;

		assert_eq!(err.kind(), crate::error::ErrorKind::ServerError);
		assert!(fetcher.guards.lock().is_empty());
		assert_eq!(fetcher.cache.read().len(), 1);
	}
}
