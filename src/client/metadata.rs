//! OpenID Connect client registration metadata.

// self
use crate::{_prelude::*, model::AuthMethod};

/// Algorithm label disabling signing or encryption.
pub const ALG_NONE: &str = "none";
/// Content encryption applied when a client sets only the key-management algorithm.
pub const DEFAULT_ID_TOKEN_ENC: &str = "A128CBC-HS256";
/// ID token signing algorithm used when the client registers none.
pub const DEFAULT_ID_TOKEN_SIGNING_ALG: &str = "RS256";

/// Subject identifier type requested by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
	/// Same subject for every client.
	#[default]
	Public,
	/// Per-client pseudonymous subject.
	Pairwise,
}

/// OIDC metadata attached to a registered client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcMetadata {
	/// Inline JSON Web Key Set document.
	pub jwks: Option<String>,
	/// URL of the client's JSON Web Key Set.
	pub jwks_uri: Option<Url>,
	/// Subject identifier type.
	pub subject_type: SubjectType,
	/// Sector identifier used for pairwise subjects.
	pub sector_identifier_uri: Option<Url>,
	/// JWS algorithm for ID tokens, or `none`.
	pub id_token_signed_response_alg: String,
	/// JWE key-management algorithm for ID tokens.
	pub id_token_encrypted_response_alg: Option<String>,
	/// JWE content-encryption algorithm for ID tokens.
	pub id_token_encrypted_response_enc: Option<String>,
	/// Token endpoint authentication method.
	pub token_endpoint_auth_method: AuthMethod,
	/// JWS algorithm client assertions must use.
	pub token_endpoint_auth_signing_alg: Option<String>,
	/// Whether `auth_time` is required in ID tokens.
	pub require_auth_time: bool,
	/// Default maximum authentication age in seconds.
	pub default_max_age: Option<u64>,
	/// Default ACR values.
	pub default_acr_values: Vec<String>,
}
impl OidcMetadata {
	/// Returns the `(alg, enc)` pair when ID tokens must be encrypted.
	pub fn id_token_encryption(&self) -> Option<(&str, &str)> {
		let alg = self.id_token_encrypted_response_alg.as_deref()?;

		if alg.is_empty() || alg == ALG_NONE {
			return None;
		}

		let enc = self.id_token_encrypted_response_enc.as_deref().unwrap_or(DEFAULT_ID_TOKEN_ENC);

		if enc == ALG_NONE {
			return None;
		}

		Some((alg, enc))
	}

	/// Returns true when the client publishes keys inline or by URL.
	pub fn has_key_set(&self) -> bool {
		self.jwks.as_deref().is_some_and(|jwks| !jwks.is_empty()) || self.jwks_uri.is_some()
	}
}
impl Default for OidcMetadata {
	fn default() -> Self {
		Self {
			jwks: None,
			jwks_uri: None,
			subject_type: SubjectType::default(),
			sector_identifier_uri: None,
			id_token_signed_response_alg: DEFAULT_ID_TOKEN_SIGNING_ALG.into(),
			id_token_encrypted_response_alg: None,
			id_token_encrypted_response_enc: None,
			token_endpoint_auth_method: AuthMethod::default(),
			token_endpoint_auth_signing_alg: None,
			require_auth_time: false,
			default_max_age: None,
			default_acr_values: Vec::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn encryption_requires_non_none_alg_and_enc() {
		let mut meta = OidcMetadata::default();

		assert!(meta.id_token_encryption().is_none());

		meta.id_token_encrypted_response_alg = Some("RSA-OAEP-256".into());

		assert_eq!(meta.id_token_encryption(), Some(("RSA-OAEP-256", DEFAULT_ID_TOKEN_ENC)));

		meta.id_token_encrypted_response_enc = Some(ALG_NONE.into());

		assert!(meta.id_token_encryption().is_none());
	}

	#[test]
	fn metadata_deserializes_with_defaults() {
		let meta: OidcMetadata = serde_json::from_str(
			r#"{"token_endpoint_auth_method":"private_key_jwt","token_endpoint_auth_signing_alg":"RS256"}"#,
		)
		.expect("Metadata should deserialize.");

		assert_eq!(meta.token_endpoint_auth_method, AuthMethod::PrivateKeyJwt);
		assert_eq!(meta.id_token_signed_response_alg, DEFAULT_ID_TOKEN_SIGNING_ALG);
		assert!(!meta.has_key_set());
	}
}
