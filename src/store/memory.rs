//! Thread-safe in-memory repositories for local development and tests.

// self
use crate::{
	_prelude::*,
	model::{AuthorizeRequest, Request, RequestId, Session},
	store::{
		AccessTokenRepository, AuthorizeCodeRepository, RefreshTokenRepository, StoreFuture,
	},
};

#[derive(Debug, Default)]
struct Tables {
	codes: HashMap<String, AuthorizeRequest>,
	access: HashMap<String, Request>,
	refresh: HashMap<String, Request>,
}

type StoreMap = Arc<RwLock<Tables>>;

/// In-process backend implementing every repository contract.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored authorization codes.
	pub fn code_count(&self) -> usize {
		self.0.read().codes.len()
	}

	/// Number of stored access tokens.
	pub fn access_token_count(&self) -> usize {
		self.0.read().access.len()
	}

	/// Number of stored refresh tokens.
	pub fn refresh_token_count(&self) -> usize {
		self.0.read().refresh.len()
	}
}
impl AuthorizeCodeRepository for MemoryStore {
	fn get_request<'a>(&'a self, code_id: &'a str) -> StoreFuture<'a, Option<AuthorizeRequest>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().codes.get(code_id).cloned()) })
	}

	fn save(&self, code_id: String, request: AuthorizeRequest) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().codes.insert(code_id, request);

			Ok(())
		})
	}

	fn delete<'a>(&'a self, code_id: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().codes.remove(code_id);

			Ok(())
		})
	}
}
impl AccessTokenRepository for MemoryStore {
	fn save(&self, token_id: String, request: Request) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().access.insert(token_id, request);

			Ok(())
		})
	}

	fn get_session<'a>(&'a self, token_id: &'a str) -> StoreFuture<'a, Option<Session>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().access.get(token_id).map(|r| r.session.clone())) })
	}

	fn delete<'a>(&'a self, token_id: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().access.remove(token_id);

			Ok(())
		})
	}

	fn delete_by_request_id<'a>(&'a self, request_id: &'a RequestId) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let request_id = request_id.to_owned();

		Box::pin(async move {
			map.write().access.retain(|_, request| *request.id() != request_id);

			Ok(())
		})
	}
}
impl RefreshTokenRepository for MemoryStore {
	fn save(&self, token_id: String, request: Request) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().refresh.insert(token_id, request);

			Ok(())
		})
	}

	fn get_request<'a>(&'a self, token_id: &'a str) -> StoreFuture<'a, Option<Request>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().refresh.get(token_id).cloned()) })
	}

	fn delete<'a>(&'a self, token_id: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().refresh.remove(token_id);

			Ok(())
		})
	}

	fn delete_by_request_id<'a>(&'a self, request_id: &'a RequestId) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let request_id = request_id.to_owned();

		Box::pin(async move {
			map.write().refresh.retain(|_, request| *request.id() != request_id);

			Ok(())
		})
	}
}
