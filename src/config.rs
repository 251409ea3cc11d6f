//! Server-wide configuration shared by token strategies and handlers.
//!
//! [`ServerConfig`] is assembled through [`ServerConfigBuilder`], which validates issuer,
//! endpoint, lifespan, and entropy settings before anything else is constructed. Deployments
//! that keep configuration on disk can load the same settings from JSON with
//! [`ServerConfig::from_json`].

// self
use crate::_prelude::*;

/// Default lifespan of access tokens.
pub const DEFAULT_ACCESS_TOKEN_LIFESPAN: Duration = Duration::hours(1);
/// Default lifespan of refresh tokens.
pub const DEFAULT_REFRESH_TOKEN_LIFESPAN: Duration = Duration::days(14);
/// Default lifespan of authorization codes.
pub const DEFAULT_AUTHORIZE_CODE_LIFESPAN: Duration = Duration::minutes(10);
/// Default lifespan of ID tokens.
pub const DEFAULT_ID_TOKEN_LIFESPAN: Duration = Duration::hours(1);
/// Default random-value length of opaque tokens, in bytes.
pub const DEFAULT_ENTROPY: usize = 32;
/// Smallest accepted random-value length, in bytes.
pub const MIN_ENTROPY: usize = 16;

/// Errors raised while constructing or loading a [`ServerConfig`].
#[derive(Debug, ThisError)]
pub enum ServerConfigError {
	/// Issuer is required and must not be blank.
	#[error("Missing issuer.")]
	MissingIssuer,
	/// Token endpoint is required to validate client assertions.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Endpoints must use HTTPS.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Lifespans must be positive.
	#[error("The {name} lifespan must be positive.")]
	NonPositiveLifespan {
		/// Which lifespan failed validation.
		name: &'static str,
	},
	/// Opaque tokens need enough randomness to resist guessing.
	#[error("Entropy must be at least {min} bytes, got {actual}.")]
	InsufficientEntropy {
		/// Smallest accepted value.
		min: usize,
		/// Supplied value.
		actual: usize,
	},
	/// The JSON document could not be parsed.
	#[error("Failed to parse server configuration at {path}.", path = .source.path())]
	Parse {
		/// Path-aware parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// How freshly minted tokens and consumed codes reach the repositories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
	/// Persist from a spawned background task; failures are logged and counted, never
	/// returned. A token may reach the client before its record exists.
	#[default]
	Detached,
	/// Persist before the response is returned and propagate failures.
	Awaited,
}
impl Persistence {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Persistence::Detached => "detached",
			Persistence::Awaited => "awaited",
		}
	}
}
impl Display for Persistence {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Validated server configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
	issuer: String,
	token_endpoint: Url,
	access_token_lifespan: Duration,
	refresh_token_lifespan: Duration,
	authorize_code_lifespan: Duration,
	id_token_lifespan: Duration,
	entropy: usize,
	persistence: Persistence,
}
impl ServerConfig {
	/// Starts a builder.
	pub fn builder() -> ServerConfigBuilder {
		ServerConfigBuilder::default()
	}

	/// Loads and validates a configuration document.
	///
	/// Lifespans are expressed in whole seconds (`access_token_lifespan_secs`, ...).
	pub fn from_json(json: &str) -> Result<Self, ServerConfigError> {
		let de = &mut serde_json::Deserializer::from_str(json);
		let document: ServerConfigDocument = serde_path_to_error::deserialize(de)
			.map_err(|source| ServerConfigError::Parse { source })?;

		document.into_builder().build()
	}

	/// Issuer identifier placed in every signed token.
	pub fn issuer(&self) -> &str {
		&self.issuer
	}

	/// Token endpoint URL; client assertions must name it as their audience.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Access token lifespan.
	pub fn access_token_lifespan(&self) -> Duration {
		self.access_token_lifespan
	}

	/// Refresh token lifespan.
	pub fn refresh_token_lifespan(&self) -> Duration {
		self.refresh_token_lifespan
	}

	/// Authorization code lifespan.
	pub fn authorize_code_lifespan(&self) -> Duration {
		self.authorize_code_lifespan
	}

	/// ID token lifespan.
	pub fn id_token_lifespan(&self) -> Duration {
		self.id_token_lifespan
	}

	/// Random-value length of opaque tokens, in bytes.
	pub fn entropy(&self) -> usize {
		self.entropy
	}

	/// Persistence mode for new tokens and consumed codes.
	pub fn persistence(&self) -> Persistence {
		self.persistence
	}
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
	issuer: Option<String>,
	token_endpoint: Option<Url>,
	allow_insecure_endpoints: bool,
	access_token_lifespan: Duration,
	refresh_token_lifespan: Duration,
	authorize_code_lifespan: Duration,
	id_token_lifespan: Duration,
	entropy: usize,
	persistence: Persistence,
}
impl ServerConfigBuilder {
	/// Sets the issuer identifier.
	pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuer = Some(issuer.into());

		self
	}

	/// Sets the token endpoint URL.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Accepts plain-HTTP endpoints (local development only).
	pub fn allow_insecure_endpoints(mut self, allow: bool) -> Self {
		self.allow_insecure_endpoints = allow;

		self
	}

	/// Overrides the access token lifespan.
	pub fn access_token_lifespan(mut self, lifespan: Duration) -> Self {
		self.access_token_lifespan = lifespan;

		self
	}

	/// Overrides the refresh token lifespan.
	pub fn refresh_token_lifespan(mut self, lifespan: Duration) -> Self {
		self.refresh_token_lifespan = lifespan;

		self
	}

	/// Overrides the authorization code lifespan.
	pub fn authorize_code_lifespan(mut self, lifespan: Duration) -> Self {
		self.authorize_code_lifespan = lifespan;

		self
	}

	/// Overrides the ID token lifespan.
	pub fn id_token_lifespan(mut self, lifespan: Duration) -> Self {
		self.id_token_lifespan = lifespan;

		self
	}

	/// Overrides the random-value length of opaque tokens.
	pub fn entropy(mut self, bytes: usize) -> Self {
		self.entropy = bytes;

		self
	}

	/// Overrides the persistence mode.
	pub fn persistence(mut self, persistence: Persistence) -> Self {
		self.persistence = persistence;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ServerConfig, ServerConfigError> {
		let issuer = self
			.issuer
			.filter(|issuer| !issuer.trim().is_empty())
			.ok_or(ServerConfigError::MissingIssuer)?;
		let token_endpoint = self.token_endpoint.ok_or(ServerConfigError::MissingTokenEndpoint)?;

		if !self.allow_insecure_endpoints && token_endpoint.scheme() != "https" {
			return Err(ServerConfigError::InsecureEndpoint { url: token_endpoint.to_string() });
		}

		validate_lifespan("access_token", self.access_token_lifespan)?;
		validate_lifespan("refresh_token", self.refresh_token_lifespan)?;
		validate_lifespan("authorize_code", self.authorize_code_lifespan)?;
		validate_lifespan("id_token", self.id_token_lifespan)?;

		if self.entropy < MIN_ENTROPY {
			return Err(ServerConfigError::InsufficientEntropy {
				min: MIN_ENTROPY,
				actual: self.entropy,
			});
		}

		Ok(ServerConfig {
			issuer,
			token_endpoint,
			access_token_lifespan: self.access_token_lifespan,
			refresh_token_lifespan: self.refresh_token_lifespan,
			authorize_code_lifespan: self.authorize_code_lifespan,
			id_token_lifespan: self.id_token_lifespan,
			entropy: self.entropy,
			persistence: self.persistence,
		})
	}
}
impl Default for ServerConfigBuilder {
	fn default() -> Self {
		Self {
			issuer: None,
			token_endpoint: None,
			allow_insecure_endpoints: false,
			access_token_lifespan: DEFAULT_ACCESS_TOKEN_LIFESPAN,
			refresh_token_lifespan: DEFAULT_REFRESH_TOKEN_LIFESPAN,
			authorize_code_lifespan: DEFAULT_AUTHORIZE_CODE_LIFESPAN,
			id_token_lifespan: DEFAULT_ID_TOKEN_LIFESPAN,
			entropy: DEFAULT_ENTROPY,
			persistence: Persistence::default(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerConfigDocument {
	issuer: String,
	token_endpoint: Url,
	#[serde(default)]
	allow_insecure_endpoints: bool,
	access_token_lifespan_secs: Option<i64>,
	refresh_token_lifespan_secs: Option<i64>,
	authorize_code_lifespan_secs: Option<i64>,
	id_token_lifespan_secs: Option<i64>,
	entropy: Option<usize>,
	#[serde(default)]
	persistence: Persistence,
}
impl ServerConfigDocument {
	fn into_builder(self) -> ServerConfigBuilder {
		let mut builder = ServerConfig::builder()
			.issuer(self.issuer)
			.token_endpoint(self.token_endpoint)
			.allow_insecure_endpoints(self.allow_insecure_endpoints)
			.persistence(self.persistence);

		if let Some(secs) = self.access_token_lifespan_secs {
			builder = builder.access_token_lifespan(Duration::seconds(secs));
		}
		if let Some(secs) = self.refresh_token_lifespan_secs {
			builder = builder.refresh_token_lifespan(Duration::seconds(secs));
		}
		if let Some(secs) = self.authorize_code_lifespan_secs {
			builder = builder.authorize_code_lifespan(Duration::seconds(secs));
		}
		if let Some(secs) = self.id_token_lifespan_secs {
			builder = builder.id_token_lifespan(Duration::seconds(secs));
		}
		if let Some(entropy) = self.entropy {
			builder = builder.entropy(entropy);
		}

		builder
	}
}

fn validate_lifespan(name: &'static str, lifespan: Duration) -> Result<(), ServerConfigError> {
	if lifespan.is_positive() {
		Ok(())
	} else {
		Err(ServerConfigError::NonPositiveLifespan { name })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoint(raw: &str) -> Url {
		Url::parse(raw).expect("Endpoint fixture should be a valid URL.")
	}

	#[test]
	fn builder_applies_defaults() {
		let config = ServerConfig::builder()
			.issuer("https://issuer.example.com")
			.token_endpoint(endpoint("https://issuer.example.com/token"))
			.build()
			.expect("Minimal configuration should build.");

		assert_eq!(config.issuer(), "https://issuer.example.com");
		assert_eq!(config.access_token_lifespan(), Duration::hours(1));
		assert_eq!(config.refresh_token_lifespan(), Duration::days(14));
		assert_eq!(config.authorize_code_lifespan(), Duration::minutes(10));
		assert_eq!(config.entropy(), 32);
		assert_eq!(config.persistence(), Persistence::Detached);
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		let missing = ServerConfig::builder()
			.issuer("  ")
			.token_endpoint(endpoint("https://issuer.example.com/token"))
			.build();

		assert!(matches!(missing, Err(ServerConfigError::MissingIssuer)));

		let insecure = ServerConfig::builder()
			.issuer("issuer")
			.token_endpoint(endpoint("http://localhost/token"))
			.build();

		assert!(matches!(insecure, Err(ServerConfigError::InsecureEndpoint { .. })));

		let weak = ServerConfig::builder()
			.issuer("issuer")
			.token_endpoint(endpoint("https://issuer.example.com/token"))
			.entropy(8)
			.build();

		assert!(matches!(weak, Err(ServerConfigError::InsufficientEntropy { min: 16, actual: 8 })));

		let zero = ServerConfig::builder()
			.issuer("issuer")
			.token_endpoint(endpoint("https://issuer.example.com/token"))
			.access_token_lifespan(Duration::ZERO)
			.build();

		assert!(matches!(
			zero,
			Err(ServerConfigError::NonPositiveLifespan { name: "access_token" })
		));
	}

	#[test]
	fn insecure_endpoint_allowed_when_opted_in() {
		let config = ServerConfig::builder()
			.issuer("issuer")
			.token_endpoint(endpoint("http://localhost:8080/token"))
			.allow_insecure_endpoints(true)
			.build()
			.expect("Opted-in insecure endpoint should build.");

		assert_eq!(config.token_endpoint().scheme(), "http");
	}

	#[test]
	fn json_document_loads_and_reports_paths() {
		let config = ServerConfig::from_json(
			r#"{
				"issuer": "https://issuer.example.com",
				"token_endpoint": "https://issuer.example.com/token",
				"access_token_lifespan_secs": 600,
				"persistence": "awaited"
			}"#,
		)
		.expect("Configuration document should load.");

		assert_eq!(config.access_token_lifespan(), Duration::minutes(10));
		assert_eq!(config.persistence(), Persistence::Awaited);

		let err = ServerConfig::from_json(
			r#"{ "issuer": "i", "token_endpoint": "https://e/token", "entropy": "many" }"#,
		)
		.expect_err("String entropy should be rejected.");

		assert!(err.to_string().contains("entropy"));
	}
}
