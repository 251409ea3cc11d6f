//! Client lookup contract and an in-memory registry.

// self
use crate::{_prelude::*, client::Client};

/// Future returned by [`ClientLookup`] implementations.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Resolves registered clients by identifier.
pub trait ClientLookup
where
	Self: Send + Sync,
{
	/// Returns the client registered under `id`.
	///
	/// Unknown identifiers must fail with `invalid_client`.
	fn find_by_id<'a>(&'a self, id: &'a str) -> ClientFuture<'a, Arc<dyn Client>>;
}

type ClientMap = Arc<RwLock<HashMap<String, Arc<dyn Client>>>>;

/// Thread-safe client registry for tests and single-process deployments.
#[derive(Clone, Debug, Default)]
pub struct MemoryClientLookup(ClientMap);
impl MemoryClientLookup {
	/// Registers (or replaces) a client.
	pub fn register(&self, client: Arc<dyn Client>) {
		self.0.write().insert(client.id().to_owned(), client);
	}

	/// Builder-style registration.
	pub fn with_client(self, client: Arc<dyn Client>) -> Self {
		self.register(client);

		self
	}

	fn find_now(map: ClientMap, id: &str) -> Result<Arc<dyn Client>> {
		map.read().get(id).cloned().ok_or_else(|| Error::invalid_client("client not found."))
	}
}
impl ClientLookup for MemoryClientLookup {
	fn find_by_id<'a>(&'a self, id: &'a str) -> ClientFuture<'a, Arc<dyn Client>> {
		let map = self.0.clone();

		Box::pin(async move { Self::find_now(map, id) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{client::StaticClient, error::ErrorKind};

	#[tokio::test]
	async fn registered_clients_resolve_and_unknown_fail() {
		let client = StaticClient::builder("client-a").build().expect("Client should build.");
		let lookup = MemoryClientLookup::default().with_client(Arc::new(client));
		let found = lookup.find_by_id("client-a").await.expect("Client should resolve.");

		assert_eq!(found.id(), "client-a");

		let err = lookup.find_by_id("missing").await.expect_err("Unknown client must fail.");

		assert_eq!(err.kind(), ErrorKind::InvalidClient);
	}
}
