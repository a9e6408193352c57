//! Transport primitives for pipeline requests.
//!
//! The module exposes [`ApiRequest`] and [`ApiResponse`] as plain values plus the [`HttpTransport`]
//! trait, the pipeline's only dependency on an HTTP stack. Requests are owned values so the
//! pipeline can keep the original descriptor around and replay it after a refresh. A transport
//! reports every reply it receives, successful or not, as `Ok(ApiResponse)`; `Err` is reserved for
//! failures where no response exists (DNS, TCP, TLS, timeouts).

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, StatusError, TransportError},
};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of sending an [`ApiRequest`].
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back every clone of
/// a pipeline, and the returned future must be `Send` so callers may spawn pipeline requests onto
/// multi-threaded executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends the request and resolves with whatever reply upstream produced.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// Outgoing request descriptor: method, URL, headers, and optional body.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Request headers.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a bodiless request with the `accept: application/json` default.
	pub fn new(method: Method, url: Url) -> Self {
		let mut headers = HeaderMap::new();

		headers.insert(::http::header::ACCEPT, HeaderValue::from_static("application/json"));

		Self { method, url, headers, body: None }
	}

	/// `GET` request helper.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// `POST` request helper.
	pub fn post(url: Url) -> Self {
		Self::new(Method::POST, url)
	}

	/// `DELETE` request helper.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::DELETE, url)
	}

	/// Sets or replaces a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Serializes `body` as JSON and sets the content type.
	pub fn json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body).map_err(ConfigError::from)?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(bytes);

		Ok(self)
	}

	/// Replaces the `Authorization` header with a bearer credential.
	pub fn set_bearer(&mut self, token: &TokenSecret) -> Result<()> {
		let mut value = HeaderValue::from_str(&token.bearer())
			.map_err(|source| ConfigError::InvalidHeader { name: "authorization", source })?;

		value.set_sensitive(true);
		self.headers.insert(AUTHORIZATION, value);

		Ok(())
	}

	/// Builder form of [`ApiRequest::set_bearer`].
	pub fn bearer(mut self, token: &TokenSecret) -> Result<Self> {
		self.set_bearer(token)?;

		Ok(self)
	}

	/// Returns the current `Authorization` header, if it is valid UTF-8.
	pub fn authorization(&self) -> Option<&str> {
		self.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok())
	}
}

/// Reply received from upstream, buffered in full.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// Response status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Buffered body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from its parts.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { source, status: self.status.as_u16() })
	}

	/// Describes this reply as a [`StatusError`] for `url`.
	pub fn status_error(&self, url: &Url) -> StatusError {
		StatusError { status: self.status, url: url.clone() }
	}

	/// Converts a non-success reply into a [`StatusError`] for `url`.
	pub fn error_for_status(self, url: &Url) -> Result<Self, StatusError> {
		if self.is_success() { Ok(self) } else { Err(self.status_error(url)) }
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, url, headers, body } = request;
			let mut builder = client.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}
