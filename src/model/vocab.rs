//! Protocol vocabulary: response types, grant types, client types, and well-known values.

// self
use crate::_prelude::*;

/// Scope granting refresh tokens (legacy spelling).
pub const SCOPE_OFFLINE: &str = "offline";
/// Scope granting refresh tokens.
pub const SCOPE_OFFLINE_ACCESS: &str = "offline_access";
/// Scope marking an OpenID Connect request.
pub const SCOPE_OPENID: &str = "openid";

/// `response_mode=query`.
pub const RESPONSE_MODE_QUERY: &str = "query";
/// `response_mode=fragment`.
pub const RESPONSE_MODE_FRAGMENT: &str = "fragment";

/// `display=page`.
pub const DISPLAY_PAGE: &str = "page";
/// `display=popup`.
pub const DISPLAY_POPUP: &str = "popup";
/// `display=touch`.
pub const DISPLAY_TOUCH: &str = "touch";
/// `display=wap`.
pub const DISPLAY_WAP: &str = "wap";

/// `prompt=none`.
pub const PROMPT_NONE: &str = "none";
/// `prompt=login`.
pub const PROMPT_LOGIN: &str = "login";
/// `prompt=consent`.
pub const PROMPT_CONSENT: &str = "consent";
/// `prompt=select_account`.
pub const PROMPT_SELECT_ACCOUNT: &str = "select_account";

/// Fixed `client_assertion_type` value denoting a JWT bearer assertion.
pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
	"urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Authorize endpoint response types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
	/// Authorization code.
	Code,
	/// Access token (implicit).
	Token,
	/// ID token (OpenID Connect).
	IdToken,
}
impl ResponseType {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResponseType::Code => "code",
			ResponseType::Token => "token",
			ResponseType::IdToken => "id_token",
		}
	}
}
impl Display for ResponseType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ResponseType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"code" => Ok(Self::Code),
			"token" => Ok(Self::Token),
			"id_token" => Ok(Self::IdToken),
			other => Err(Error::unsupported_response_type(format!(
				"response_type `{other}` is not supported."
			))),
		}
	}
}

/// Token endpoint grant types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant.
	AuthorizationCode,
	/// Implicit grant (authorize endpoint only).
	Implicit,
	/// Resource Owner Password Credentials grant; recognized but never handled.
	Password,
	/// Client Credentials grant.
	ClientCredentials,
	/// Refresh Token grant.
	RefreshToken,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::Implicit => "implicit",
			GrantType::Password => "password",
			GrantType::ClientCredentials => "client_credentials",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for GrantType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"authorization_code" => Ok(Self::AuthorizationCode),
			"implicit" => Ok(Self::Implicit),
			"password" => Ok(Self::Password),
			"client_credentials" => Ok(Self::ClientCredentials),
			"refresh_token" => Ok(Self::RefreshToken),
			other =>
				Err(Error::unsupported_grant_type(format!("grant_type `{other}` is not supported."))),
		}
	}
}

/// Registered client type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
	/// Client able to keep a credential confidential.
	#[default]
	Confidential,
	/// Client unable to keep a credential confidential.
	Public,
}
impl ClientType {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			ClientType::Confidential => "confidential",
			ClientType::Public => "public",
		}
	}
}
impl Display for ClientType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token endpoint client authentication methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	#[default]
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	/// JWT assertion signed with the client secret.
	ClientSecretJwt,
	/// JWT assertion signed with a client-held private key.
	PrivateKeyJwt,
	/// Public client without credentials.
	None,
}
impl AuthMethod {
	/// Returns the registered metadata label.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthMethod::ClientSecretBasic => "client_secret_basic",
			AuthMethod::ClientSecretPost => "client_secret_post",
			AuthMethod::ClientSecretJwt => "client_secret_jwt",
			AuthMethod::PrivateKeyJwt => "private_key_jwt",
			AuthMethod::None => "none",
		}
	}
}
impl Display for AuthMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
