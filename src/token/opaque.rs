//! Opaque authorization codes and refresh tokens.
//!
//! Wire form: `base64url(value) + "." + base64url(hmac(value))`, unpadded. Repositories are
//! keyed by the signature segment only, so a leaked table never exposes the value half.

// self
use crate::{
	_prelude::*,
	model::{AuthorizeRequest, Request},
	token::hmac::HmacSigner,
};

/// Mints and verifies authorization codes.
pub trait AuthorizeCodeStrategy
where
	Self: Send + Sync,
{
	/// Returns the storage key of `code`.
	fn compute_identifier(&self, code: &str) -> Result<String>;

	/// Mints a new code for `request`.
	fn new_code(&self, request: &AuthorizeRequest) -> Result<String>;

	/// Verifies the signature of `code`.
	fn validate_code(&self, code: &str, request: &AuthorizeRequest) -> Result<()>;
}

/// Mints and verifies refresh tokens.
pub trait RefreshTokenStrategy
where
	Self: Send + Sync,
{
	/// Returns the storage key of `token`.
	fn compute_identifier(&self, token: &str) -> Result<String>;

	/// Mints a new refresh token for `request`.
	fn new_token(&self, request: &Request) -> Result<String>;

	/// Verifies the signature of `token`.
	fn validate_token(&self, token: &str, request: &Request) -> Result<()>;
}

#[derive(Clone, Debug)]
struct HmacOpaque {
	entropy: usize,
	signer: HmacSigner,
	label: &'static str,
}
impl HmacOpaque {
	fn split<'a>(&self, token: &'a str) -> Result<(&'a str, &'a str)> {
		let mut parts = token.split('.');

		match (parts.next(), parts.next(), parts.next()) {
			(Some(value), Some(signature), None) => Ok((value, signature)),
			_ => Err(Error::invalid_grant(format!("{} is invalid.", self.label))),
		}
	}

	fn identifier(&self, token: &str) -> Result<String> {
		self.split(token).map(|(_, signature)| signature.to_owned())
	}

	fn mint(&self) -> Result<String> {
		let (value, signature) = self.signer.generate(self.entropy)?;

		Ok(format!("{value}.{signature}"))
	}

	fn validate(&self, token: &str) -> Result<()> {
		let (value, signature) = self.split(token)?;

		self.signer.verify(value, signature).map_err(|_| {
			Error::invalid_grant(format!("{} failed to pass verification.", self.label))
		})
	}
}

/// HMAC-backed [`AuthorizeCodeStrategy`].
#[derive(Clone, Debug)]
pub struct HmacAuthorizeCodeStrategy(HmacOpaque);
impl HmacAuthorizeCodeStrategy {
	/// Creates a strategy drawing `entropy` random bytes per code.
	pub fn new(entropy: usize, signer: HmacSigner) -> Self {
		Self(HmacOpaque { entropy, signer, label: "authorize code" })
	}
}
impl AuthorizeCodeStrategy for HmacAuthorizeCodeStrategy {
	fn compute_identifier(&self, code: &str) -> Result<String> {
		self.0.identifier(code)
	}

	fn new_code(&self, _: &AuthorizeRequest) -> Result<String> {
		self.0.mint()
	}

	fn validate_code(&self, code: &str, _: &AuthorizeRequest) -> Result<()> {
		self.0.validate(code)
	}
}

/// HMAC-backed [`RefreshTokenStrategy`].
#[derive(Clone, Debug)]
pub struct HmacRefreshTokenStrategy(HmacOpaque);
impl HmacRefreshTokenStrategy {
	/// Creates a strategy drawing `entropy` random bytes per token.
	pub fn new(entropy: usize, signer: HmacSigner) -> Self {
		Self(HmacOpaque { entropy, signer, label: "refresh token" })
	}
}
impl RefreshTokenStrategy for HmacRefreshTokenStrategy {
	fn compute_identifier(&self, token: &str) -> Result<String> {
		self.0.identifier(token)
	}

	fn new_token(&self, _: &Request) -> Result<String> {
		self.0.mint()
	}

	fn validate_token(&self, token: &str, _: &Request) -> Result<()> {
		self.0.validate(token)
	}
}
