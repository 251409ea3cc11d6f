//! Protocol error taxonomy shared by strategies, handlers, and authenticators.
//!
//! Every failure surfaced to an OAuth client collapses into [`Error`], which renders the
//! stable `{ "error", "error_description" }` payload together with its HTTP status code and
//! optional `WWW-Authenticate` challenge.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical protocol error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The request is missing a parameter or is otherwise malformed.
	#[error("Invalid request: {reason}")]
	InvalidRequest {
		/// Human-readable description rendered as `error_description`.
		reason: String,
	},
	/// Client authentication failed.
	#[error("Invalid client: {reason}")]
	InvalidClient {
		/// Human-readable description rendered as `error_description`.
		reason: String,
		/// Authentication scheme used by the failed attempt, when known.
		scheme: Option<&'static str>,
	},
	/// The grant (code, refresh token) is invalid, expired, or issued to someone else.
	#[error("Invalid grant: {reason}")]
	InvalidGrant {
		/// Human-readable description rendered as `error_description`.
		reason: String,
	},
	/// The client is not allowed to use the requested grant or response type.
	#[error("Unauthorized client: {reason}")]
	UnauthorizedClient {
		/// Human-readable description rendered as `error_description`.
		reason: String,
	},
	/// The grant type is not supported by this server.
	#[error("Unsupported grant type: {reason}")]
	UnsupportedGrantType {
		/// Human-readable description rendered as `error_description`.
		reason: String,
	},
	/// The response type is not supported by this server.
	#[error("Unsupported response type: {reason}")]
	UnsupportedResponseType {
		/// Human-readable description rendered as `error_description`.
		reason: String,
	},
	/// The requested scope is invalid or exceeds what the client may obtain.
	#[error("Invalid scope: {reason}")]
	InvalidScope {
		/// Human-readable description rendered as `error_description`.
		reason: String,
	},
	/// The resource owner or the server denied the request.
	#[error("Access denied: {reason}")]
	AccessDenied {
		/// Human-readable description rendered as `error_description`.
		reason: String,
	},
	/// The server hit an unexpected condition.
	#[error("Server error: {reason}")]
	ServerError {
		/// Human-readable description rendered as `error_description`.
		reason: String,
	},
	/// The server cannot handle the request right now.
	#[error("Temporarily unavailable: {reason}")]
	TemporarilyUnavailable {
		/// Human-readable description rendered as `error_description`.
		reason: String,
	},
	/// Repository failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Construction-time configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A client or collaborator does not expose a capability the operation requires.
	#[error("Capability `{capability}` is not implemented.")]
	NotImplemented {
		/// Name of the missing capability.
		capability: &'static str,
	},
}
impl Error {
	/// Shorthand for [`Error::InvalidRequest`].
	pub fn invalid_request(reason: impl Into<String>) -> Self {
		Self::InvalidRequest { reason: reason.into() }
	}

	/// Shorthand for [`Error::InvalidClient`] without a challenge scheme.
	pub fn invalid_client(reason: impl Into<String>) -> Self {
		Self::InvalidClient { reason: reason.into(), scheme: None }
	}

	/// Shorthand for [`Error::InvalidClient`] carrying a `WWW-Authenticate` scheme.
	pub fn invalid_client_with_scheme(reason: impl Into<String>, scheme: &'static str) -> Self {
		Self::InvalidClient { reason: reason.into(), scheme: Some(scheme) }
	}

	/// Shorthand for [`Error::InvalidGrant`].
	pub fn invalid_grant(reason: impl Into<String>) -> Self {
		Self::InvalidGrant { reason: reason.into() }
	}

	/// Shorthand for [`Error::UnauthorizedClient`].
	pub fn unauthorized_client(reason: impl Into<String>) -> Self {
		Self::UnauthorizedClient { reason: reason.into() }
	}

	/// Shorthand for [`Error::UnsupportedGrantType`].
	pub fn unsupported_grant_type(reason: impl Into<String>) -> Self {
		Self::UnsupportedGrantType { reason: reason.into() }
	}

	/// Shorthand for [`Error::UnsupportedResponseType`].
	pub fn unsupported_response_type(reason: impl Into<String>) -> Self {
		Self::UnsupportedResponseType { reason: reason.into() }
	}

	/// Shorthand for [`Error::InvalidScope`].
	pub fn invalid_scope(reason: impl Into<String>) -> Self {
		Self::InvalidScope { reason: reason.into() }
	}

	/// Shorthand for [`Error::AccessDenied`].
	pub fn access_denied(reason: impl Into<String>) -> Self {
		Self::AccessDenied { reason: reason.into() }
	}

	/// Shorthand for [`Error::ServerError`].
	pub fn server_error(reason: impl Into<String>) -> Self {
		Self::ServerError { reason: reason.into() }
	}

	/// Shorthand for [`Error::TemporarilyUnavailable`] with the stock reason.
	pub fn temporarily_unavailable() -> Self {
		Self::TemporarilyUnavailable { reason: "one or more service is currently unavailable.".into() }
	}

	/// Returns the protocol error kind.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
			Self::InvalidClient { .. } => ErrorKind::InvalidClient,
			Self::InvalidGrant { .. } => ErrorKind::InvalidGrant,
			Self::UnauthorizedClient { .. } => ErrorKind::UnauthorizedClient,
			Self::UnsupportedGrantType { .. } => ErrorKind::UnsupportedGrantType,
			Self::UnsupportedResponseType { .. } => ErrorKind::UnsupportedResponseType,
			Self::InvalidScope { .. } => ErrorKind::InvalidScope,
			Self::AccessDenied { .. } => ErrorKind::AccessDenied,
			Self::TemporarilyUnavailable { .. } => ErrorKind::TemporarilyUnavailable,
			Self::ServerError { .. }
			| Self::Storage(_)
			| Self::Config(_)
			| Self::NotImplemented { .. } => ErrorKind::ServerError,
		}
	}

	/// HTTP status code associated with the error kind.
	pub fn status_code(&self) -> u16 {
		self.kind().status_code()
	}

	/// Human-readable description rendered as `error_description`.
	pub fn reason(&self) -> String {
		match self {
			Self::InvalidRequest { reason }
			| Self::InvalidClient { reason, .. }
			| Self::InvalidGrant { reason }
			| Self::UnauthorizedClient { reason }
			| Self::UnsupportedGrantType { reason }
			| Self::UnsupportedResponseType { reason }
			| Self::InvalidScope { reason }
			| Self::AccessDenied { reason }
			| Self::ServerError { reason }
			| Self::TemporarilyUnavailable { reason } => reason.clone(),
			other => other.to_string(),
		}
	}

	/// Renders the `WWW-Authenticate` header value for challenged `invalid_client` errors.
	pub fn www_authenticate(&self) -> Option<String> {
		match self {
			Self::InvalidClient { reason, scheme: Some(scheme) } => Some(format!(
				"{scheme} error=\"{}\" error_description=\"{reason}\"",
				ErrorKind::InvalidClient.as_str()
			)),
			_ => None,
		}
	}

	/// Builds the stable two-field payload returned to clients.
	pub fn payload(&self) -> ErrorPayload {
		ErrorPayload { error: self.kind().as_str().into(), error_description: self.reason() }
	}
}

/// Protocol error kinds with stable wire labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// `invalid_request`.
	InvalidRequest,
	/// `invalid_client`.
	InvalidClient,
	/// `invalid_grant`.
	InvalidGrant,
	/// `unauthorized_client`.
	UnauthorizedClient,
	/// `unsupported_grant_type`.
	UnsupportedGrantType,
	/// `unsupported_response_type`.
	UnsupportedResponseType,
	/// `invalid_scope`.
	InvalidScope,
	/// `access_denied`.
	AccessDenied,
	/// `server_error`.
	ServerError,
	/// `temporarily_unavailable`.
	TemporarilyUnavailable,
}
impl ErrorKind {
	/// Returns the RFC 6749 error code.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::InvalidRequest => "invalid_request",
			ErrorKind::InvalidClient => "invalid_client",
			ErrorKind::InvalidGrant => "invalid_grant",
			ErrorKind::UnauthorizedClient => "unauthorized_client",
			ErrorKind::UnsupportedGrantType => "unsupported_grant_type",
			ErrorKind::UnsupportedResponseType => "unsupported_response_type",
			ErrorKind::InvalidScope => "invalid_scope",
			ErrorKind::AccessDenied => "access_denied",
			ErrorKind::ServerError => "server_error",
			ErrorKind::TemporarilyUnavailable => "temporarily_unavailable",
		}
	}

	/// Returns the HTTP status code rendered alongside the payload.
	pub const fn status_code(self) -> u16 {
		match self {
			ErrorKind::InvalidClient => 401,
			ErrorKind::AccessDenied => 403,
			ErrorKind::ServerError => 500,
			ErrorKind::TemporarilyUnavailable => 503,
			_ => 400,
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Externally visible error body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	/// Error kind label.
	pub error: String,
	/// Human-readable description.
	pub error_description: String,
}

/// Construction and key-material failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HMAC key length does not match the digest output size.
	#[error("Signing key length must be exactly {expected} bits.")]
	HmacKeyLength {
		/// Required key length in bits.
		expected: usize,
	},
	/// Signing or encryption algorithm label is not recognized.
	#[error("Algorithm `{alg}` is not supported.")]
	UnsupportedAlgorithm {
		/// Offending algorithm label.
		alg: String,
	},
	/// PEM or JWK material could not be decoded.
	#[error("Key material for `{kid}` is invalid.")]
	InvalidKey {
		/// Key identifier of the failing entry.
		kid: String,
		/// Underlying decoding failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Server configuration failed validation.
	#[error(transparent)]
	Server(#[from] crate::config::ServerConfigError),
	/// Client registration failed validation.
	#[error(transparent)]
	Client(#[from] crate::client::StaticClientError),
	/// HTTP client could not be constructed.
	#[cfg(feature = "reqwest")]
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild(#[source] ReqwestError),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn payload_and_status_follow_kind() {
		let err = Error::invalid_grant("authorize code is invalid.");

		assert_eq!(err.status_code(), 400);
		assert_eq!(
			err.payload(),
			ErrorPayload {
				error: "invalid_grant".into(),
				error_description: "authorize code is invalid.".into(),
			}
		);
		assert_eq!(Error::access_denied("nope.").status_code(), 403);
		assert_eq!(Error::temporarily_unavailable().status_code(), 503);
	}

	#[test]
	fn invalid_client_renders_challenge_only_with_scheme() {
		let challenged = Error::invalid_client_with_scheme("authentication failed.", "Basic");

		assert_eq!(challenged.status_code(), 401);
		assert_eq!(
			challenged.www_authenticate().as_deref(),
			Some("Basic error=\"invalid_client\" error_description=\"authentication failed.\"")
		);
		assert!(Error::invalid_client("authentication failed.").www_authenticate().is_none());
	}

	#[test]
	fn internal_failures_render_as_server_error() {
		let storage: Error = StoreError::Backend { message: "database unreachable".into() }.into();

		assert_eq!(storage.kind(), ErrorKind::ServerError);
		assert!(storage.payload().error_description.contains("database unreachable"));

		let missing = Error::NotImplemented { capability: "client_secret" };

		assert_eq!(missing.payload().error, "server_error");
	}

	#[test]
	fn payload_serializes_two_fields() {
		let body = serde_json::to_value(Error::invalid_scope("bad.").payload())
			.expect("Payload should serialize to JSON.");

		assert_eq!(body, serde_json::json!({ "error": "invalid_scope", "error_description": "bad." }));
	}
}
