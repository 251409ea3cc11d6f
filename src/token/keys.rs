//! Server-side signing keys for access and ID tokens.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
// self
use crate::{_prelude::*, error::ConfigError};

/// Parses a JOSE signing algorithm label (`RS256`, `ES384`, ...).
pub fn parse_algorithm(label: &str) -> Result<Algorithm, ConfigError> {
	Algorithm::from_str(label).map_err(|_| ConfigError::UnsupportedAlgorithm { alg: label.into() })
}

/// Signing key with its verification counterpart.
#[derive(Clone)]
pub struct SigningKey {
	kid: String,
	algorithm: Algorithm,
	encoding: EncodingKey,
	decoding: DecodingKey,
}
impl SigningKey {
	/// Builds an HMAC key (`HS256`/`HS384`/`HS512`).
	pub fn hmac(
		kid: impl Into<String>,
		algorithm: Algorithm,
		secret: &[u8],
	) -> Result<Self, ConfigError> {
		expect_family(algorithm, &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512])?;

		Ok(Self {
			kid: kid.into(),
			algorithm,
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
		})
	}

	/// Builds an RSA key (`RS*`/`PS*`) from a private PEM and its public PEM.
	pub fn rsa_pem(
		kid: impl Into<String>,
		algorithm: Algorithm,
		private_pem: &[u8],
		public_pem: &[u8],
	) -> Result<Self, ConfigError> {
		expect_family(
			algorithm,
			&[
				Algorithm::RS256,
				Algorithm::RS384,
				Algorithm::RS512,
				Algorithm::PS256,
				Algorithm::PS384,
				Algorithm::PS512,
			],
		)?;

		let kid = kid.into();
		let encoding = EncodingKey::from_rsa_pem(private_pem)
			.map_err(|source| ConfigError::InvalidKey { kid: kid.clone(), source })?;
		let decoding = DecodingKey::from_rsa_pem(public_pem)
			.map_err(|source| ConfigError::InvalidKey { kid: kid.clone(), source })?;

		Ok(Self { kid, algorithm, encoding, decoding })
	}

	/// Builds an elliptic-curve key (`ES256`/`ES384`) from a PKCS#8 private PEM and its
	/// public PEM.
	pub fn ec_pem(
		kid: impl Into<String>,
		algorithm: Algorithm,
		private_pem: &[u8],
		public_pem: &[u8],
	) -> Result<Self, ConfigError> {
		expect_family(algorithm, &[Algorithm::ES256, Algorithm::ES384])?;

		let kid = kid.into();
		let encoding = EncodingKey::from_ec_pem(private_pem)
			.map_err(|source| ConfigError::InvalidKey { kid: kid.clone(), source })?;
		let decoding = DecodingKey::from_ec_pem(public_pem)
			.map_err(|source| ConfigError::InvalidKey { kid: kid.clone(), source })?;

		Ok(Self { kid, algorithm, encoding, decoding })
	}

	/// Key identifier placed in the JWS header.
	pub fn kid(&self) -> &str {
		&self.kid
	}

	/// Signature algorithm.
	pub fn algorithm(&self) -> Algorithm {
		self.algorithm
	}

	/// Private half.
	pub fn encoding_key(&self) -> &EncodingKey {
		&self.encoding
	}

	/// Public half.
	pub fn decoding_key(&self) -> &DecodingKey {
		&self.decoding
	}
}
impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SigningKey")
			.field("kid", &self.kid)
			.field("algorithm", &self.algorithm)
			.finish_non_exhaustive()
	}
}

/// Ordered collection of server signing keys.
#[derive(Clone, Debug, Default)]
pub struct SigningKeySet(Vec<SigningKey>);
impl SigningKeySet {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a key.
	pub fn with_key(mut self, key: SigningKey) -> Self {
		self.0.push(key);

		self
	}

	/// Number of keys.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// True when the set holds no key.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// First key registered under `kid`.
	pub fn by_kid(&self, kid: &str) -> Option<&SigningKey> {
		self.0.iter().find(|key| key.kid == kid)
	}

	/// First key registered for `algorithm`.
	pub fn by_algorithm(&self, algorithm: Algorithm) -> Option<&SigningKey> {
		self.0.iter().find(|key| key.algorithm == algorithm)
	}

	/// Selects by `kid` when given, otherwise by algorithm.
	pub fn select(&self, kid: Option<&str>, algorithm: Algorithm) -> Result<&SigningKey> {
		let key = match kid {
			Some(kid) => self.by_kid(kid).filter(|key| key.algorithm == algorithm),
			None => self.by_algorithm(algorithm),
		};

		key.ok_or_else(|| {
			Error::server_error(format!("no signing key available for {algorithm:?}."))
		})
	}
}

fn expect_family(algorithm: Algorithm, family: &[Algorithm]) -> Result<(), ConfigError> {
	if family.contains(&algorithm) {
		Ok(())
	} else {
		Err(ConfigError::UnsupportedAlgorithm { alg: format!("{algorithm:?}") })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn selection_prefers_kid_then_algorithm() {
		let keys = test_signing_keys();
		let by_kid =
			keys.select(Some("server-rsa"), Algorithm::RS256).expect("RSA key should exist.");
		let by_alg = keys.select(None, Algorithm::ES256).expect("EC key should exist.");

		assert_eq!(by_kid.kid(), "server-rsa");
		assert_eq!(by_alg.kid(), "server-ec");
		assert!(keys.select(Some("server-rsa"), Algorithm::ES256).is_err());
		assert!(keys.select(None, Algorithm::PS512).is_err());
	}

	#[test]
	fn constructors_reject_foreign_algorithms() {
		assert!(matches!(
			SigningKey::hmac("k", Algorithm::RS256, b"secret"),
			Err(ConfigError::UnsupportedAlgorithm { .. })
		));
		assert!(matches!(
			SigningKey::rsa_pem("k", Algorithm::RS256, b"not a pem", b"not a pem"),
			Err(ConfigError::InvalidKey { .. })
		));
		assert!(parse_algorithm("RS256").is_ok());
		assert!(matches!(
			parse_algorithm("XS999"),
			Err(ConfigError::UnsupportedAlgorithm { alg }) if alg == "XS999"
		));
	}
}
