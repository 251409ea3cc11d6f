//! Structural validation run by the endpoints before any handler.

// self
use crate::{
	_prelude::*,
	model::{
		AuthorizeRequest, DISPLAY_PAGE, DISPLAY_POPUP, DISPLAY_TOUCH, DISPLAY_WAP, GrantType,
		PROMPT_CONSENT, PROMPT_LOGIN, PROMPT_NONE, PROMPT_SELECT_ACCOUNT, RESPONSE_MODE_FRAGMENT,
		RESPONSE_MODE_QUERY, TokenRequest,
	},
};

const PROMPTS: [&str; 4] = [PROMPT_NONE, PROMPT_LOGIN, PROMPT_CONSENT, PROMPT_SELECT_ACCOUNT];

/// Validates authorize requests, including the OpenID Connect parameters.
#[derive(Clone, Debug)]
pub struct AuthorizeRequestValidator {
	response_modes: Vec<String>,
	displays: Vec<String>,
}
impl AuthorizeRequestValidator {
	/// Replaces the accepted `response_mode` values.
	pub fn with_response_modes<I, S>(mut self, modes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.response_modes = modes.into_iter().map(Into::into).collect();

		self
	}

	/// Replaces the accepted `display` values.
	pub fn with_displays<I, S>(mut self, displays: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.displays = displays.into_iter().map(Into::into).collect();

		self
	}

	/// Checks response types against the client registration and the OIDC enumerations.
	pub fn validate(&self, request: &AuthorizeRequest) -> Result<()> {
		if request.response_types().is_empty() {
			return Err(Error::invalid_request("at least one response_type is required"));
		}

		let client = request.client();

		for ty in request.response_types() {
			if !client.supports_response_type(*ty) {
				return Err(Error::unsupported_response_type(format!(
					"client does not support response_type {ty}"
				)));
			}
		}

		let oidc = &request.oidc;

		if !is_allowed(&self.response_modes, oidc.response_mode.as_deref()) {
			return Err(Error::invalid_request("invalid response_mode value"));
		}
		if !is_allowed(&self.displays, oidc.display.as_deref()) {
			return Err(Error::invalid_request("invalid display value"));
		}
		if oidc.prompts.iter().any(|prompt| !PROMPTS.contains(&prompt.as_str())) {
			return Err(Error::invalid_request("invalid prompt value"));
		}
		if oidc.prompts.len() > 1 && oidc.prompts.iter().any(|prompt| prompt == PROMPT_NONE) {
			return Err(Error::invalid_request("'none' prompt must be used alone"));
		}

		Ok(())
	}
}
impl Default for AuthorizeRequestValidator {
	fn default() -> Self {
		Self {
			response_modes: vec![RESPONSE_MODE_QUERY.into(), RESPONSE_MODE_FRAGMENT.into()],
			displays: [DISPLAY_PAGE, DISPLAY_POPUP, DISPLAY_TOUCH, DISPLAY_WAP]
				.into_iter()
				.map(Into::into)
				.collect(),
		}
	}
}

/// Validates token requests.
#[derive(Clone, Debug, Default)]
pub struct TokenRequestValidator;
impl TokenRequestValidator {
	/// Checks grant types against the client registration and the grant's own inputs.
	pub fn validate(&self, request: &TokenRequest) -> Result<()> {
		if request.grant_types().is_empty() {
			return Err(Error::invalid_request("at least one grant_type is required"));
		}

		let client = request.client();

		for grant in request.grant_types() {
			if !client.supports_grant_type(*grant) {
				return Err(Error::unauthorized_client(format!(
					"client does not support grant_type {grant}"
				)));
			}

			match grant {
				GrantType::AuthorizationCode if is_blank(&request.code) => {
					return Err(Error::invalid_request("authorization code is missing"));
				},
				GrantType::RefreshToken if is_blank(&request.refresh_token) => {
					return Err(Error::invalid_request("refresh token is missing"));
				},
				_ => {},
			}
		}

		Ok(())
	}
}

fn is_allowed(allowed: &[String], value: Option<&str>) -> bool {
	match value {
		Some(value) if !value.is_empty() => allowed.iter().any(|candidate| candidate == value),
		_ => true,
	}
}

fn is_blank(value: &Option<String>) -> bool {
	value.as_deref().is_none_or(str::is_empty)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		client::StaticClient,
		error::ErrorKind,
		model::{OAuthSession, Request, ResponseType},
	};

	fn authorize(types: &[ResponseType]) -> AuthorizeRequest {
		AuthorizeRequest::new(test_request(test_client()))
			.with_response_types(types.iter().copied())
	}

	#[test]
	fn response_types_must_be_registered() {
		let validator = AuthorizeRequestValidator::default();

		validator.validate(&authorize(&[ResponseType::Code])).expect("Code is registered.");

		let client = client_arc(
			StaticClient::builder("code-only")
				.redirect_uris([TEST_REDIRECT_URI])
				.response_types([ResponseType::Code]),
		);
		let request = AuthorizeRequest::new(Request::new(client, OAuthSession::new("a")))
			.with_response_types([ResponseType::Code, ResponseType::Token]);
		let err = validator.validate(&request).expect_err("Token is not registered.");

		assert_eq!(err.kind(), ErrorKind::UnsupportedResponseType);
		assert_eq!(err.reason(), "client does not support response_type token");
	}

	#[test]
	fn oidc_enumerations_are_checked() {
		let validator = AuthorizeRequestValidator::default();
		let mut request = authorize(&[ResponseType::Code]);

		request.oidc.response_mode = Some("form_post".into());

		let err = validator.validate(&request).expect_err("form_post is not accepted.");

		assert_eq!(err.reason(), "invalid response_mode value");
		validator
			.clone()
			.with_response_modes(["form_post"])
			.validate(&request)
			.expect("Overridden modes should accept form_post.");

		request.oidc.response_mode = None;
		request.oidc.display = Some("kiosk".into());

		let err = validator.validate(&request).expect_err("kiosk is not a display.");

		assert_eq!(err.reason(), "invalid display value");

		request.oidc.display = Some(DISPLAY_POPUP.into());
		request.oidc.prompts = vec![PROMPT_NONE.into(), PROMPT_LOGIN.into()];

		let err = validator.validate(&request).expect_err("none must stand alone.");

		assert_eq!(err.reason(), "'none' prompt must be used alone");

		request.oidc.prompts = vec!["always".into()];

		let err = validator.validate(&request).expect_err("Unknown prompt should fail.");

		assert_eq!(err.kind(), ErrorKind::InvalidRequest);

		request.oidc.prompts = vec![PROMPT_LOGIN.into(), PROMPT_CONSENT.into()];
		validator.validate(&request).expect("Combined prompts are fine.");
	}

	#[test]
	fn token_requests_need_registered_grants_and_inputs() {
		let validator = TokenRequestValidator;
		let err = validator
			.validate(&TokenRequest::new(test_request(test_client())))
			.expect_err("A grant type is required.");

		assert_eq!(err.reason(), "at least one grant_type is required");

		let request = TokenRequest::new(test_request(test_client()))
			.with_grant_types([GrantType::AuthorizationCode]);
		let err = validator.validate(&request).expect_err("Code is required.");

		assert_eq!(err.reason(), "authorization code is missing");
		validator.validate(&request.with_code("abc.def")).expect("Code grant is complete.");

		let request = TokenRequest::new(test_request(test_client()))
			.with_grant_types([GrantType::Password]);
		let err = validator.validate(&request).expect_err("Password is not registered.");

		assert_eq!(err.kind(), ErrorKind::UnauthorizedClient);
	}
}
