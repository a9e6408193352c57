// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	descriptor::{BackendDescriptor, BackendEndpoints},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DescriptorError {
	/// Base URL must use HTTPS unless it points at a loopback host.
	#[error("The base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL cannot carry a query or fragment.
	#[error("The base URL must not carry a query or fragment: {url}.")]
	BaseUrlHasQuery {
		/// Base URL that failed validation.
		url: String,
	},
	/// Endpoint paths and routes must be absolute.
	#[error("The {field} path must start with `/`: {path}.")]
	RelativePath {
		/// Which field failed validation.
		field: &'static str,
		/// Offending value.
		path: String,
	},
}

/// Builder for [`BackendDescriptor`] values.
#[derive(Debug)]
pub struct BackendDescriptorBuilder {
	/// Base URL for the backend.
	pub base_url: Url,
	/// Endpoint paths.
	pub endpoints: BackendEndpoints,
	/// Route used for teardown redirects.
	pub login_route: String,
}
impl BackendDescriptorBuilder {
	/// Creates a new builder seeded with the default endpoint layout.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			endpoints: BackendEndpoints::default(),
			login_route: BackendDescriptor::DEFAULT_LOGIN_ROUTE.into(),
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.refresh = path.into();

		self
	}

	/// Overrides the sign-in endpoint path.
	pub fn signin_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.signin = path.into();

		self
	}

	/// Overrides the sign-up endpoint path.
	pub fn signup_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.signup = path.into();

		self
	}

	/// Overrides the sign-out endpoint path.
	pub fn signout_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.signout = path.into();

		self
	}

	/// Overrides the profile endpoint path.
	pub fn profile_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.profile = path.into();

		self
	}

	/// Overrides the login route used for teardown redirects.
	pub fn login_route(mut self, route: impl Into<String>) -> Self {
		self.login_route = route.into();

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<BackendDescriptor, DescriptorError> {
		let descriptor = BackendDescriptor {
			base_url: self.base_url,
			endpoints: self.endpoints,
			login_route: self.login_route,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl BackendDescriptor {
	/// Validates invariants for the descriptor.
	pub fn validate(&self) -> Result<(), DescriptorError> {
		validate_base(&self.base_url)?;

		let BackendEndpoints { refresh, signin, signup, signout, profile } = &self.endpoints;

		validate_path("refresh", refresh)?;
		validate_path("signin", signin)?;
		validate_path("signup", signup)?;
		validate_path("signout", signout)?;
		validate_path("profile", profile)?;
		validate_path("login route", &self.login_route)?;

		Ok(())
	}
}

pub(crate) fn validate_base(url: &Url) -> Result<(), DescriptorError> {
	if url.query().is_some() || url.fragment().is_some() {
		return Err(DescriptorError::BaseUrlHasQuery { url: url.to_string() });
	}
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(DescriptorError::InsecureBaseUrl { url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

fn validate_path(field: &'static str, path: &str) -> Result<(), DescriptorError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(DescriptorError::RelativePath { field, path: path.to_owned() })
	}
}
