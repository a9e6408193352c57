//! Pipeline-level error types shared across transports, stores, and session helpers.

// crates.io
use ::http::StatusCode;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Upstream answered with a non-success status.
	#[error(transparent)]
	Status(#[from] StatusError),
	/// Response body could not be decoded into the expected shape.
	#[error("Response body from a {status} reply is malformed.")]
	Decode {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the decoded response.
		status: u16,
	},
	/// The shared refresh cycle failed; every waiter observes the same value.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
}
impl Error {
	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Status(err) => Some(err.status),
			Self::Refresh(RefreshError::Rejected { status }) => StatusCode::from_u16(*status).ok(),
			_ => None,
		}
	}

	/// Whether the error is a terminal authentication failure.
	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(StatusCode::UNAUTHORIZED)
	}

	/// Whether the error stems from a refresh attempted without a stored refresh token.
	pub fn is_missing_refresh_token(&self) -> bool {
		matches!(self, Self::Refresh(RefreshError::MissingRefreshToken))
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A path could not be joined onto the configured base URL.
	#[error("Path `{path}` does not form a valid URL.")]
	InvalidUrl {
		/// Path that failed to resolve.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header value contains bytes that HTTP forbids.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name.
		name: &'static str,
		/// Underlying header failure.
		#[source]
		source: ::http::header::InvalidHeaderValue,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Encode(#[from] serde_json::Error),
	/// Backend descriptor validation failed.
	#[error(transparent)]
	Descriptor(#[from] crate::descriptor::DescriptorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Non-success HTTP reply surfaced unchanged to the caller.
#[derive(Clone, Debug, ThisError)]
#[error("Request to {url} failed with status {status}.")]
pub struct StatusError {
	/// Status returned by upstream.
	pub status: StatusCode,
	/// URL the request targeted.
	pub url: Url,
}

/// Outcome of a failed refresh cycle.
///
/// Cloneable so that every request waiting on the same cycle receives an identical value.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// No refresh token is stored; the refresh endpoint was never called.
	#[error("No refresh token is stored for this session.")]
	MissingRefreshToken,
	/// The refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the session with status {status}.")]
	Rejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
	},
	/// The refresh request never produced a response.
	#[error("Refresh request failed in transport: {message}.")]
	Transport {
		/// Rendered transport error.
		message: String,
	},
	/// Reading or writing tokens failed during the refresh.
	#[error("Token store failed during refresh: {message}.")]
	Storage {
		/// Rendered store error.
		message: String,
	},
	/// The refresh endpoint replied with an unreadable token pair.
	#[error("Refresh endpoint returned a malformed token pair: {message}.")]
	Malformed {
		/// Rendered decoding error.
		message: String,
	},
	/// The refresh request could not be constructed.
	#[error("Refresh request could not be built: {message}.")]
	Config {
		/// Rendered configuration error.
		message: String,
	},
}
impl From<Error> for RefreshError {
	fn from(e: Error) -> Self {
		match e {
			Error::Refresh(inner) => inner,
			Error::Status(status) => Self::Rejected { status: status.status.as_u16() },
			Error::Storage(store) => Self::Storage { message: store.to_string() },
			Error::Transport(transport) => Self::Transport { message: render_chain(&transport) },
			Error::Decode { source, .. } => Self::Malformed { message: source.to_string() },
			Error::Config(config) => Self::Config { message: config.to_string() },
		}
	}
}

fn render_chain(err: &dyn StdError) -> String {
	let mut rendered = err.to_string();
	let mut cursor = err.source();

	while let Some(source) = cursor {
		rendered.push_str(": ");
		rendered.push_str(&source.to_string());

		cursor = source.source();
	}

	rendered
}
