//! Scope acceptance policy.
//!
//! A client may obtain a scope only when it registered it. The default comparison is exact
//! string equality; a [`ScopeComparator`] can widen it, e.g. to hierarchical scopes where
//! registering `photos` admits `photos:read`.

// self
use crate::{_prelude::*, client::Client, model::ScopeSet};

/// Compares a `(registered, requested)` scope pair.
pub type ScopeComparator = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Decides which scopes a client may obtain.
pub trait ScopeStrategy
where
	Self: Send + Sync,
{
	/// Returns true when `client` may obtain `scope`.
	fn accepts(&self, client: &dyn Client, scope: &str) -> bool;

	/// Returns true when `client` may obtain every scope in `scopes`.
	fn accepts_all(&self, client: &dyn Client, scopes: &ScopeSet) -> bool {
		scopes.iter().all(|scope| self.accepts(client, scope))
	}

	/// Like [`accepts_all`](Self::accepts_all), failing with `invalid_scope`.
	fn require_all(&self, client: &dyn Client, scopes: &ScopeSet) -> Result<()> {
		if self.accepts_all(client, scopes) {
			Ok(())
		} else {
			Err(Error::invalid_scope("one or more scope is not granted by the client."))
		}
	}
}

/// [`ScopeStrategy`] matching requested scopes against the client's registered scopes.
#[derive(Clone, Default)]
pub struct RegisteredScopeStrategy {
	comparator: Option<ScopeComparator>,
}
impl RegisteredScopeStrategy {
	/// Creates an exact-match strategy.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces exact matching with `comparator`.
	pub fn with_comparator<F>(mut self, comparator: F) -> Self
	where
		F: Fn(&str, &str) -> bool + Send + Sync + 'static,
	{
		self.comparator = Some(Arc::new(comparator));

		self
	}
}
impl ScopeStrategy for RegisteredScopeStrategy {
	fn accepts(&self, client: &dyn Client, scope: &str) -> bool {
		client.scopes().iter().any(|registered| match &self.comparator {
			Some(comparator) => comparator(registered, scope),
			None => registered == scope,
		})
	}
}
impl Debug for RegisteredScopeStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisteredScopeStrategy")
			.field("comparator", &self.comparator.is_some())
			.finish()
	}
}
