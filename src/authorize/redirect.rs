//! Redirect URI selection.

// self
use crate::{_prelude::*, client::Client};

/// Resolves the effective redirect URI of an authorize request.
///
/// Without a supplied URI the client must have registered exactly one. A supplied URI must
/// match a registered one exactly.
pub fn select_redirect_uri(client: &dyn Client, supplied: Option<&str>) -> Result<String> {
	let registered = client.redirect_uris();

	match supplied.filter(|uri| !uri.is_empty()) {
		None => match registered {
			[only] => Ok(only.clone()),
			[] => Err(Error::invalid_request("no redirect_uri registered, and none provided.")),
			_ => Err(Error::invalid_request("multiple redirect_uri registered, but none selected.")),
		},
		Some(uri) if registered.iter().any(|candidate| candidate == uri) => Ok(uri.to_owned()),
		Some(_) => Err(Error::invalid_request("redirect_uri is not registered for the client.")),
	}
}
