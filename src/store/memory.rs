//! Thread-safe in-memory [`TokenStore`] for tests and short-lived sessions.

// self
use crate::{
	_prelude::*,
	auth::{TokenKey, TokenSecret},
	store::{StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<TokenKey, TokenSecret>>>;

/// Storage backend that keeps both tokens in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Synchronous read used by tests to inspect the stored value.
	pub fn get(&self, key: TokenKey) -> Option<TokenSecret> {
		self.0.read().get(&key).cloned()
	}

	/// Number of stored tokens.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether no token is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenStore for MemoryStore {
	fn load(&self, key: TokenKey) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn save(&self, key: TokenKey, secret: TokenSecret) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key, secret);

			Ok(())
		})
	}

	fn remove(&self, key: TokenKey) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(&key)) })
	}
}
