//! HMAC-SHA signer behind the opaque token strategies.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{
	Hmac, Mac,
	digest::{InvalidLength, KeyInit},
};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Sha256, Sha384, Sha512};
// self
use crate::{_prelude::*, error::ConfigError};

/// Digest backing an [`HmacSigner`]; fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HmacAlgorithm {
	/// HMAC-SHA256, 32-byte key.
	Sha256,
	/// HMAC-SHA384, 48-byte key.
	Sha384,
	/// HMAC-SHA512, 64-byte key.
	Sha512,
}
impl HmacAlgorithm {
	/// Digest output size in bytes; signing keys must match it exactly.
	pub const fn key_len(self) -> usize {
		match self {
			HmacAlgorithm::Sha256 => 32,
			HmacAlgorithm::Sha384 => 48,
			HmacAlgorithm::Sha512 => 64,
		}
	}

	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			HmacAlgorithm::Sha256 => "HMAC-SHA256",
			HmacAlgorithm::Sha384 => "HMAC-SHA384",
			HmacAlgorithm::Sha512 => "HMAC-SHA512",
		}
	}
}
impl Display for HmacAlgorithm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failure reported by [`HmacSigner::verify`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum HmacVerifyError {
	/// One of the segments is not unpadded base64url.
	#[error("Token segment is not valid base64url.")]
	Malformed,
	/// The recomputed signature differs.
	#[error("Signature mismatch.")]
	Mismatch,
}

/// Generates random values and signs them with a private key.
#[derive(Clone)]
pub struct HmacSigner {
	algorithm: HmacAlgorithm,
	key: Arc<[u8]>,
}
impl HmacSigner {
	/// Creates a signer; the key length must equal the digest output size.
	pub fn new(algorithm: HmacAlgorithm, key: &[u8]) -> Result<Self, ConfigError> {
		if key.len() != algorithm.key_len() {
			return Err(ConfigError::HmacKeyLength { expected: algorithm.key_len() * 8 });
		}

		Ok(Self { algorithm, key: Arc::from(key) })
	}

	/// Shorthand for an HMAC-SHA256 signer.
	pub fn sha256(key: &[u8]) -> Result<Self, ConfigError> {
		Self::new(HmacAlgorithm::Sha256, key)
	}

	/// Shorthand for an HMAC-SHA384 signer.
	pub fn sha384(key: &[u8]) -> Result<Self, ConfigError> {
		Self::new(HmacAlgorithm::Sha384, key)
	}

	/// Shorthand for an HMAC-SHA512 signer.
	pub fn sha512(key: &[u8]) -> Result<Self, ConfigError> {
		Self::new(HmacAlgorithm::Sha512, key)
	}

	/// Digest in use.
	pub fn algorithm(&self) -> HmacAlgorithm {
		self.algorithm
	}

	/// Generates `entropy` random bytes and returns `(value, signature)`, both unpadded
	/// base64url.
	pub fn generate(&self, entropy: usize) -> Result<(String, String)> {
		let mut raw = vec![0_u8; entropy];

		OsRng
			.try_fill_bytes(&mut raw)
			.map_err(|err| Error::server_error(format!("entropy source failed: {err}.")))?;

		let signature = self
			.sign(&raw)
			.map_err(|_| Error::server_error("signing key was rejected by the HMAC primitive."))?;

		Ok((URL_SAFE_NO_PAD.encode(&raw), URL_SAFE_NO_PAD.encode(signature)))
	}

	/// Recomputes the signature of `value` and compares it in constant time.
	pub fn verify(&self, value: &str, signature: &str) -> Result<(), HmacVerifyError> {
		let raw = URL_SAFE_NO_PAD.decode(value).map_err(|_| HmacVerifyError::Malformed)?;
		let expected = URL_SAFE_NO_PAD.decode(signature).map_err(|_| HmacVerifyError::Malformed)?;
		let verified = match self.algorithm {
			HmacAlgorithm::Sha256 =>
				keyed::<Hmac<Sha256>>(&self.key, &raw).map(|mac| mac.verify_slice(&expected).is_ok()),
			HmacAlgorithm::Sha384 =>
				keyed::<Hmac<Sha384>>(&self.key, &raw).map(|mac| mac.verify_slice(&expected).is_ok()),
			HmacAlgorithm::Sha512 =>
				keyed::<Hmac<Sha512>>(&self.key, &raw).map(|mac| mac.verify_slice(&expected).is_ok()),
		};

		match verified {
			Ok(true) => Ok(()),
			_ => Err(HmacVerifyError::Mismatch),
		}
	}

	fn sign(&self, data: &[u8]) -> Result<Vec<u8>, InvalidLength> {
		Ok(match self.algorithm {
			HmacAlgorithm::Sha256 =>
				keyed::<Hmac<Sha256>>(&self.key, data)?.finalize().into_bytes().to_vec(),
			HmacAlgorithm::Sha384 =>
				keyed::<Hmac<Sha384>>(&self.key, data)?.finalize().into_bytes().to_vec(),
			HmacAlgorithm::Sha512 =>
				keyed::<Hmac<Sha512>>(&self.key, data)?.finalize().into_bytes().to_vec(),
		})
	}
}
impl Debug for HmacSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HmacSigner").field("algorithm", &self.algorithm).finish_non_exhaustive()
	}
}

fn keyed<M>(key: &[u8], data: &[u8]) -> Result<M, InvalidLength>
where
	M: Mac + KeyInit,
{
	let mut mac = <M as KeyInit>::new_from_slice(key)?;

	mac.update(data);

	Ok(mac)
}
