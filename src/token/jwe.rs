//! Compact JWE serialization for encrypted ID tokens.
//!
//! Key management: `RSA1_5`, `RSA-OAEP`, `RSA-OAEP-256`. Content encryption:
//! `A128CBC-HS256`, `A256CBC-HS512`, `A128GCM`, `A256GCM`. The protected header carries
//! `alg`, `enc`, `cty: "JWT"`, and the recipient `kid` when known; the ASCII of its
//! base64url form is the additional authenticated data.

// crates.io
use aes::{Aes128, Aes256};
use aes_gcm::{
	Aes128Gcm, Aes256Gcm, KeyInit, Nonce,
	aead::{Aead, Payload},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use hmac::{Hmac, Mac};
use rsa::{
	Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey,
	rand_core::{OsRng, RngCore},
};
use sha2::{Sha256, Sha512};
// self
use crate::_prelude::*;

/// Failures raised while sealing or opening a JWE.
#[derive(Debug, ThisError)]
pub enum JweError {
	/// Key management algorithm is not supported.
	#[error("JWE key management algorithm `{alg}` is not supported.")]
	UnsupportedAlgorithm {
		/// Offending label.
		alg: String,
	},
	/// Content encryption algorithm is not supported.
	#[error("JWE content encryption `{enc}` is not supported.")]
	UnsupportedEncryption {
		/// Offending label.
		enc: String,
	},
	/// Input is not a five-segment compact JWE.
	#[error("JWE is malformed.")]
	Malformed,
	/// Content encryption key could not be wrapped or unwrapped.
	#[error("JWE key wrapping failed.")]
	KeyWrap(#[source] rsa::Error),
	/// Symmetric cipher rejected the key, IV, or ciphertext.
	#[error("JWE content cipher failed.")]
	Cipher,
	/// Authentication tag did not verify.
	#[error("JWE integrity check failed.")]
	Integrity,
}
impl From<JweError> for Error {
	fn from(err: JweError) -> Self {
		Error::server_error(format!("failed to encrypt id_token: {err}"))
	}
}

/// JWE key management algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyManagement {
	/// RSAES-PKCS1-v1_5.
	Rsa1_5,
	/// RSAES-OAEP with SHA-1.
	RsaOaep,
	/// RSAES-OAEP with SHA-256.
	RsaOaep256,
}
impl KeyManagement {
	/// Returns the JOSE label.
	pub const fn as_str(self) -> &'static str {
		match self {
			KeyManagement::Rsa1_5 => "RSA1_5",
			KeyManagement::RsaOaep => "RSA-OAEP",
			KeyManagement::RsaOaep256 => "RSA-OAEP-256",
		}
	}

	fn wrap_key(self, key: &RsaPublicKey, cek: &[u8]) -> Result<Vec<u8>, JweError> {
		let mut rng = OsRng;

		match self {
			KeyManagement::Rsa1_5 => key.encrypt(&mut rng, Pkcs1v15Encrypt, cek),
			KeyManagement::RsaOaep => key.encrypt(&mut rng, Oaep::new::<sha1::Sha1>(), cek),
			KeyManagement::RsaOaep256 => key.encrypt(&mut rng, Oaep::new::<Sha256>(), cek),
		}
		.map_err(JweError::KeyWrap)
	}

	fn unwrap_key(self, key: &RsaPrivateKey, wrapped: &[u8]) -> Result<Vec<u8>, JweError> {
		match self {
			KeyManagement::Rsa1_5 => key.decrypt(Pkcs1v15Encrypt, wrapped),
			KeyManagement::RsaOaep => key.decrypt(Oaep::new::<sha1::Sha1>(), wrapped),
			KeyManagement::RsaOaep256 => key.decrypt(Oaep::new::<Sha256>(), wrapped),
		}
		.map_err(JweError::KeyWrap)
	}
}
impl Display for KeyManagement {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for KeyManagement {
	type Err = JweError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"RSA1_5" => Ok(KeyManagement::Rsa1_5),
			"RSA-OAEP" => Ok(KeyManagement::RsaOaep),
			"RSA-OAEP-256" => Ok(KeyManagement::RsaOaep256),
			other => Err(JweError::UnsupportedAlgorithm { alg: other.into() }),
		}
	}
}

/// JWE content encryption algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentEncryption {
	/// AES-128-CBC with HMAC-SHA256 truncated to 128 bits.
	A128CbcHs256,
	/// AES-256-CBC with HMAC-SHA512 truncated to 256 bits.
	A256CbcHs512,
	/// AES-128-GCM.
	A128Gcm,
	/// AES-256-GCM.
	A256Gcm,
}
impl ContentEncryption {
	/// Returns the JOSE label.
	pub const fn as_str(self) -> &'static str {
		match self {
			ContentEncryption::A128CbcHs256 => "A128CBC-HS256",
			ContentEncryption::A256CbcHs512 => "A256CBC-HS512",
			ContentEncryption::A128Gcm => "A128GCM",
			ContentEncryption::A256Gcm => "A256GCM",
		}
	}

	/// Content encryption key length in bytes.
	pub const fn key_len(self) -> usize {
		match self {
			ContentEncryption::A128CbcHs256 => 32,
			ContentEncryption::A256CbcHs512 => 64,
			ContentEncryption::A128Gcm => 16,
			ContentEncryption::A256Gcm => 32,
		}
	}

	const fn iv_len(self) -> usize {
		match self {
			ContentEncryption::A128CbcHs256 | ContentEncryption::A256CbcHs512 => 16,
			ContentEncryption::A128Gcm | ContentEncryption::A256Gcm => 12,
		}
	}

	fn seal(
		self,
		cek: &[u8],
		iv: &[u8],
		aad: &[u8],
		plaintext: &[u8],
	) -> Result<(Vec<u8>, Vec<u8>), JweError> {
		match self {
			ContentEncryption::A128CbcHs256 => {
				let (mac_key, enc_key) = cek.split_at(16);
				let ciphertext = cbc::Encryptor::<Aes128>::new_from_slices(enc_key, iv)
					.map_err(|_| JweError::Cipher)?
					.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
				let tag = cbc_tag::<Hmac<Sha256>>(mac_key, aad, iv, &ciphertext)?;

				Ok((ciphertext, tag))
			},
			ContentEncryption::A256CbcHs512 => {
				let (mac_key, enc_key) = cek.split_at(32);
				let ciphertext = cbc::Encryptor::<Aes256>::new_from_slices(enc_key, iv)
					.map_err(|_| JweError::Cipher)?
					.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
				let tag = cbc_tag::<Hmac<Sha512>>(mac_key, aad, iv, &ciphertext)?;

				Ok((ciphertext, tag))
			},
			ContentEncryption::A128Gcm => {
				let cipher = Aes128Gcm::new_from_slice(cek).map_err(|_| JweError::Cipher)?;

				split_gcm(cipher.encrypt(Nonce::from_slice(iv), Payload { msg: plaintext, aad }))
			},
			ContentEncryption::A256Gcm => {
				let cipher = Aes256Gcm::new_from_slice(cek).map_err(|_| JweError::Cipher)?;

				split_gcm(cipher.encrypt(Nonce::from_slice(iv), Payload { msg: plaintext, aad }))
			},
		}
	}

	fn open(
		self,
		cek: &[u8],
		iv: &[u8],
		aad: &[u8],
		ciphertext: &[u8],
		tag: &[u8],
	) -> Result<Vec<u8>, JweError> {
		if cek.len() != self.key_len() || iv.len() != self.iv_len() {
			return Err(JweError::Cipher);
		}

		match self {
			ContentEncryption::A128CbcHs256 => {
				let (mac_key, enc_key) = cek.split_at(16);

				verify_cbc_tag::<Hmac<Sha256>>(mac_key, aad, iv, ciphertext, tag)?;

				cbc::Decryptor::<Aes128>::new_from_slices(enc_key, iv)
					.map_err(|_| JweError::Cipher)?
					.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
					.map_err(|_| JweError::Cipher)
			},
			ContentEncryption::A256CbcHs512 => {
				let (mac_key, enc_key) = cek.split_at(32);

				verify_cbc_tag::<Hmac<Sha512>>(mac_key, aad, iv, ciphertext, tag)?;

				cbc::Decryptor::<Aes256>::new_from_slices(enc_key, iv)
					.map_err(|_| JweError::Cipher)?
					.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
					.map_err(|_| JweError::Cipher)
			},
			ContentEncryption::A128Gcm => {
				let cipher = Aes128Gcm::new_from_slice(cek).map_err(|_| JweError::Cipher)?;

				cipher
					.decrypt(Nonce::from_slice(iv), Payload { msg: &sealed(ciphertext, tag), aad })
					.map_err(|_| JweError::Integrity)
			},
			ContentEncryption::A256Gcm => {
				let cipher = Aes256Gcm::new_from_slice(cek).map_err(|_| JweError::Cipher)?;

				cipher
					.decrypt(Nonce::from_slice(iv), Payload { msg: &sealed(ciphertext, tag), aad })
					.map_err(|_| JweError::Integrity)
			},
		}
	}
}
impl Display for ContentEncryption {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ContentEncryption {
	type Err = JweError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"A128CBC-HS256" => Ok(ContentEncryption::A128CbcHs256),
			"A256CBC-HS512" => Ok(ContentEncryption::A256CbcHs512),
			"A128GCM" => Ok(ContentEncryption::A128Gcm),
			"A256GCM" => Ok(ContentEncryption::A256Gcm),
			other => Err(JweError::UnsupportedEncryption { enc: other.into() }),
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct ProtectedHeader {
	alg: String,
	enc: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	cty: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	kid: Option<String>,
}

/// RSA recipient of an encrypted token.
#[derive(Clone, Debug)]
pub struct JweRecipient {
	/// Key identifier echoed in the protected header.
	pub kid: Option<String>,
	/// Public key wrapping the content encryption key.
	pub key: RsaPublicKey,
}

/// Encrypts a nested JWT for `recipient`.
pub fn encrypt(
	plaintext: &[u8],
	alg: KeyManagement,
	enc: ContentEncryption,
	recipient: &JweRecipient,
) -> Result<String, JweError> {
	let header = ProtectedHeader {
		alg: alg.as_str().into(),
		enc: enc.as_str().into(),
		cty: Some("JWT".into()),
		kid: recipient.kid.clone(),
	};
	let protected =
		URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).map_err(|_| JweError::Malformed)?);
	let cek = random_bytes(enc.key_len())?;
	let iv = random_bytes(enc.iv_len())?;
	let wrapped = alg.wrap_key(&recipient.key, &cek)?;
	let (ciphertext, tag) = enc.seal(&cek, &iv, protected.as_bytes(), plaintext)?;

	Ok(format!(
		"{protected}.{}.{}.{}.{}",
		URL_SAFE_NO_PAD.encode(wrapped),
		URL_SAFE_NO_PAD.encode(iv),
		URL_SAFE_NO_PAD.encode(ciphertext),
		URL_SAFE_NO_PAD.encode(tag),
	))
}

/// Decrypts a compact JWE with the recipient's private key.
pub fn decrypt(token: &str, key: &RsaPrivateKey) -> Result<Vec<u8>, JweError> {
	let segments = token.split('.').collect::<Vec<_>>();
	let [protected, wrapped, iv, ciphertext, tag] = segments.as_slice() else {
		return Err(JweError::Malformed);
	};
	let header = serde_json::from_slice::<ProtectedHeader>(&decode_segment(protected)?)
		.map_err(|_| JweError::Malformed)?;
	let alg = header.alg.parse::<KeyManagement>()?;
	let enc = header.enc.parse::<ContentEncryption>()?;
	let cek = alg.unwrap_key(key, &decode_segment(wrapped)?)?;

	enc.open(
		&cek,
		&decode_segment(iv)?,
		protected.as_bytes(),
		&decode_segment(ciphertext)?,
		&decode_segment(tag)?,
	)
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, JweError> {
	URL_SAFE_NO_PAD.decode(segment).map_err(|_| JweError::Malformed)
}

fn random_bytes(len: usize) -> Result<Vec<u8>, JweError> {
	let mut bytes = vec![0_u8; len];

	RngCore::try_fill_bytes(&mut OsRng, &mut bytes).map_err(|_| JweError::Cipher)?;

	Ok(bytes)
}

fn sealed(ciphertext: &[u8], tag: &[u8]) -> Vec<u8> {
	[ciphertext, tag].concat()
}

fn split_gcm(sealed: Result<Vec<u8>, aes_gcm::Error>) -> Result<(Vec<u8>, Vec<u8>), JweError> {
	let mut ciphertext = sealed.map_err(|_| JweError::Cipher)?;
	let tag = ciphertext.split_off(ciphertext.len().saturating_sub(16));

	Ok((ciphertext, tag))
}

fn cbc_mac<M>(mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<M, JweError>
where
	M: Mac + hmac::digest::KeyInit,
{
	let mut mac = <M as Mac>::new_from_slice(mac_key).map_err(|_| JweError::Cipher)?;
	let aad_bits = (aad.len() as u64).saturating_mul(8);

	mac.update(aad);
	mac.update(iv);
	mac.update(ciphertext);
	mac.update(&aad_bits.to_be_bytes());

	Ok(mac)
}

fn cbc_tag<M>(
	mac_key: &[u8],
	aad: &[u8],
	iv: &[u8],
	ciphertext: &[u8],
) -> Result<Vec<u8>, JweError>
where
	M: Mac + hmac::digest::KeyInit,
{
	let full = cbc_mac::<M>(mac_key, aad, iv, ciphertext)?.finalize().into_bytes();

	Ok(full[..mac_key.len()].to_vec())
}

fn verify_cbc_tag<M>(
	mac_key: &[u8],
	aad: &[u8],
	iv: &[u8],
	ciphertext: &[u8],
	tag: &[u8],
) -> Result<(), JweError>
where
	M: Mac + hmac::digest::KeyInit,
{
	if tag.len() != mac_key.len() {
		return Err(JweError::Integrity);
	}

	cbc_mac::<M>(mac_key, aad, iv, ciphertext)?
		.verify_truncated_left(tag)
		.map_err(|_| JweError::Integrity)
}
