//! Bearer-token request pipeline for movie catalog clients: attaches stored credentials, shares a
//! single in-flight refresh across every request that hits a 401, replays each failed request once,
//! and tears the session down when recovery is impossible.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod nav;
pub mod obs;
pub mod pipeline;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		descriptor::BackendDescriptor,
		http::ReqwestTransport,
		nav::{Navigator, RecordingNavigator},
		pipeline::AuthPipeline,
		store::{MemoryStore, TokenStore},
	};

	/// Pipeline type alias used by reqwest-backed integration tests.
	pub type ReqwestTestPipeline = AuthPipeline<ReqwestTransport>;

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs an [`AuthPipeline`] backed by an in-memory store, a recording navigator, and the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_pipeline(
		descriptor: BackendDescriptor,
	) -> (ReqwestTestPipeline, Arc<MemoryStore>, Arc<RecordingNavigator>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let navigator_backend = Arc::new(RecordingNavigator::default());
		let navigator: Arc<dyn Navigator> = navigator_backend.clone();
		let pipeline =
			AuthPipeline::with_transport(store, descriptor, navigator, test_reqwest_transport());

		(pipeline, store_backend, navigator_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::OnceCell as AsyncOnceCell;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
