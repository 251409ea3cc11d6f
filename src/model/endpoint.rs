//! Transport-neutral view of an inbound endpoint call.
//!
//! The engine never parses HTTP itself. Callers hand over the method, the raw
//! `Authorization` header, and the decoded parameters; parsers and client authenticators
//! read from this value only.

// self
use crate::_prelude::*;

/// HTTP method of the inbound call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// Any other verb.
	Other,
}
impl Method {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Other => "OTHER",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Method {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(if s.eq_ignore_ascii_case("GET") {
			Method::Get
		} else if s.eq_ignore_ascii_case("POST") {
			Method::Post
		} else {
			Method::Other
		})
	}
}

/// Inputs of an authorize or token endpoint call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointRequest {
	/// HTTP method.
	pub method: Method,
	/// Raw `Authorization` header value.
	pub authorization: Option<String>,
	/// Decoded parameters; the first occurrence of a repeated name wins.
	pub form: BTreeMap<String, String>,
}
impl EndpointRequest {
	/// Creates an empty request.
	pub fn new(method: Method) -> Self {
		Self { method, authorization: None, form: BTreeMap::new() }
	}

	/// Decodes an `application/x-www-form-urlencoded` body.
	pub fn from_form_urlencoded(method: Method, body: &[u8]) -> Self {
		let mut request = Self::new(method);

		for (name, value) in url::form_urlencoded::parse(body) {
			request.form.entry(name.into_owned()).or_insert_with(|| value.into_owned());
		}

		request
	}

	/// Decodes the query string of `url` as a `GET` request.
	pub fn from_query(url: &Url) -> Self {
		Self::from_form_urlencoded(Method::Get, url.query().unwrap_or_default().as_bytes())
	}

	/// Sets the `Authorization` header.
	pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
		self.authorization = Some(value.into());

		self
	}

	/// Sets a parameter, replacing any previous value.
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.form.insert(name.into(), value.into());

		self
	}

	/// Returns the parameter `name` when present and non-empty.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.form.get(name).map(String::as_str).filter(|value| !value.is_empty())
	}

	/// Returns true for `POST` calls.
	pub fn is_post(&self) -> bool {
		self.method == Method::Post
	}
}
