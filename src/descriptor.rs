//! Backend descriptor: where the first-party API lives and which paths carry the session
//! endpoints.
//!
//! Descriptors are plain serde values so hosts can load them from JSON. Deserialization runs the
//! same validation as [`BackendDescriptor::builder`], so a decoded descriptor is always usable.

/// Builder API for assembling backend descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Endpoint paths exposed by the first-party backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEndpoints {
	/// Token refresh endpoint.
	pub refresh: String,
	/// Credential sign-in endpoint.
	pub signin: String,
	/// Account creation endpoint.
	pub signup: String,
	/// Session sign-out endpoint.
	pub signout: String,
	/// Current-user profile endpoint.
	pub profile: String,
}
impl Default for BackendEndpoints {
	fn default() -> Self {
		Self {
			refresh: "/v1/auth/refresh".into(),
			signin: "/v1/auth/signin".into(),
			signup: "/v1/auth/signup".into(),
			signout: "/v1/auth/signout".into(),
			profile: "/v1/users/me".into(),
		}
	}
}

/// Immutable backend descriptor consumed by the pipeline and session helpers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBackendDescriptor")]
pub struct BackendDescriptor {
	/// Base URL every endpoint path is appended to.
	pub base_url: Url,
	/// Session endpoint paths.
	pub endpoints: BackendEndpoints,
	/// Route the navigator receives when the session is torn down.
	pub login_route: String,
}
impl BackendDescriptor {
	/// Default login route used for teardown redirects.
	pub const DEFAULT_LOGIN_ROUTE: &'static str = "/login-page";

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> BackendDescriptorBuilder {
		BackendDescriptorBuilder::new(base_url)
	}

	/// Appends `path` (which may carry a query string) to the base URL.
	///
	/// Unlike [`Url::join`], any path prefix on the base URL is preserved.
	pub fn resolve(&self, path: &str) -> Result<Url> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let joined = format!("{base}/{}", path.trim_start_matches('/'));

		Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidUrl { path: path.to_owned(), source }.into())
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url> {
		self.resolve(&self.endpoints.refresh)
	}

	/// Whether `url` targets the refresh endpoint (same origin and path, query ignored).
	pub fn is_refresh_endpoint(&self, url: &Url) -> bool {
		match self.refresh_url() {
			Ok(refresh) => refresh.origin() == url.origin() && refresh.path() == url.path(),
			Err(_) => false,
		}
	}
}

/// Unvalidated wire shape; endpoints and the login route fall back to the defaults.
#[derive(Deserialize)]
struct RawBackendDescriptor {
	base_url: Url,
	#[serde(default)]
	endpoints: BackendEndpoints,
	#[serde(default = "default_login_route")]
	login_route: String,
}
impl TryFrom<RawBackendDescriptor> for BackendDescriptor {
	type Error = DescriptorError;

	fn try_from(raw: RawBackendDescriptor) -> Result<Self, Self::Error> {
		let descriptor =
			Self { base_url: raw.base_url, endpoints: raw.endpoints, login_route: raw.login_route };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

fn default_login_route() -> String {
	BackendDescriptor::DEFAULT_LOGIN_ROUTE.into()
}
