//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{TokenKey, TokenSecret},
	store::{StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<TokenKey, TokenSecret>>>;

/// Thread-safe storage backend that keeps tokens in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns how many keys are currently stored.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether the store holds no tokens at all.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenStore for MemoryStore {
	fn get(&self, key: TokenKey) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn set(&self, key: TokenKey, value: TokenSecret) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key, value);

			Ok(())
		})
	}

	fn remove(&self, key: TokenKey) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(&key);

			Ok(())
		})
	}
}
