//! Storage contracts and built-in store implementations for session tokens.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{SessionTokens, TokenKey, TokenSecret},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value persistence for the access and refresh tokens.
///
/// Each call is atomic on its own; the pipeline never needs a multi-key transaction.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Reads the secret stored under `key`.
	fn get(&self, key: TokenKey) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Stores or replaces the secret under `key`.
	fn set(&self, key: TokenKey, value: TokenSecret) -> StoreFuture<'_, ()>;

	/// Removes the secret under `key`; removing an absent key succeeds.
	fn remove(&self, key: TokenKey) -> StoreFuture<'_, ()>;

	/// Persists both halves of a freshly minted session.
	fn save_session(&self, tokens: SessionTokens) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.set(TokenKey::AccessToken, tokens.access).await?;
			self.set(TokenKey::RefreshToken, tokens.refresh).await
		})
	}

	/// Removes both tokens, attempting every key even if one removal fails.
	fn clear_session(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut first_err = None;

			for key in TokenKey::ALL {
				if let Err(e) = self.remove(key).await {
					first_err.get_or_insert(e);
				}
			}

			first_err.map_or(Ok(()), Err)
		})
	}
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_pipeline_error_with_source() {
		let store_error = StoreError::Backend { message: "quota exceeded".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("quota exceeded"));

		let source = StdError::source(&error)
			.expect("Pipeline error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[tokio::test]
	async fn session_helpers_write_and_clear_both_keys() {
		let store = MemoryStore::default();

		store
			.save_session(SessionTokens::new("T1", "R1"))
			.await
			.expect("Saving a session should succeed.");

		assert_eq!(
			store.get(TokenKey::AccessToken).await.expect("Read should succeed."),
			Some(TokenSecret::new("T1"))
		);
		assert_eq!(
			store.get(TokenKey::RefreshToken).await.expect("Read should succeed."),
			Some(TokenSecret::new("R1"))
		);

		store.clear_session().await.expect("Clearing a session should succeed.");

		for key in TokenKey::ALL {
			assert_eq!(store.get(key).await.expect("Read should succeed."), None);
		}
	}
}
