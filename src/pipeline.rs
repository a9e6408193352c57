//! Authenticated request pipeline with bearer injection, single-flight refresh, and replay-once
//! recovery.
//!
//! Every call to [`AuthPipeline::request`] reads the stored access token and attaches it as a
//! bearer credential. When upstream answers `401`, the request joins the pipeline's shared refresh
//! cycle (starting one if none is in flight), then replays exactly once with the new token. A
//! failed cycle tears the session down once, no matter how many requests were waiting on it, and
//! every waiter receives the same [`RefreshError`](crate::error::RefreshError).

mod metrics;
mod refresh;

pub use metrics::RefreshMetrics;

// crates.io
use ::http::StatusCode;
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::{TokenKey, TokenSecret},
	descriptor::BackendDescriptor,
	http::{ApiRequest, ApiResponse, HttpTransport},
	nav::Navigator,
	obs::{self, OpKind, PipelineEvent},
	store::TokenStore,
};
use refresh::RefreshCycle;

#[cfg(feature = "reqwest")]
/// Pipeline specialized for the crate's default reqwest transport.
pub type ReqwestPipeline = AuthPipeline<ReqwestTransport>;

/// Wraps an [`HttpTransport`] with token injection and refresh-and-replay recovery.
///
/// Cloning is cheap and clones share the token store, metrics, and in-flight refresh slot, so a
/// single pipeline constructed at startup can be handed to every caller.
pub struct AuthPipeline<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, including refreshes.
	pub transport: Arc<T>,
	/// Token store holding the access and refresh tokens.
	pub store: Arc<dyn TokenStore>,
	/// Navigator that receives the login redirect on teardown.
	pub navigator: Arc<dyn Navigator>,
	/// Backend descriptor supplying the base URL, refresh path, and login route.
	pub descriptor: BackendDescriptor,
	/// Shared counters for refresh cycles.
	pub refresh_metrics: Arc<RefreshMetrics>,
	in_flight: Arc<Mutex<Option<Arc<RefreshCycle>>>>,
}
impl<T> AuthPipeline<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a pipeline over the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn TokenStore>,
		descriptor: BackendDescriptor,
		navigator: Arc<dyn Navigator>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			navigator,
			descriptor,
			refresh_metrics: Default::default(),
			in_flight: Default::default(),
		}
	}

	/// Sends `request`, recovering transparently from one expired access token.
	///
	/// Non-success statuses are returned as [`Error::Status`]; a failed refresh is returned as
	/// [`Error::Refresh`]; transport failures pass through unchanged.
	pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
		obs::observe(OpKind::Request, "request", self.drive(RequestContext::new(request))).await
	}

	/// Sends `request` with bearer injection but without refresh recovery.
	///
	/// Meant for public endpoints (sign-in, sign-up) where a `401` reports bad credentials rather
	/// than an expired session.
	pub async fn send_public(&self, request: ApiRequest) -> Result<ApiResponse> {
		let ctx = RequestContext::new(request);

		obs::observe(OpKind::Request, "send_public", async {
			let response = self.dispatch(&ctx).await?;

			Ok(response.error_for_status(ctx.url())?)
		})
		.await
	}

	/// Resolves a backend path against the descriptor's base URL.
	pub fn resolve(&self, path: &str) -> Result<Url> {
		self.descriptor.resolve(path)
	}

	/// Builds a `GET` request for a backend path.
	pub fn get(&self, path: &str) -> Result<ApiRequest> {
		Ok(ApiRequest::get(self.resolve(path)?))
	}

	/// Builds a `POST` request for a backend path with a JSON body.
	pub fn post_json<B>(&self, path: &str, body: &B) -> Result<ApiRequest>
	where
		B: ?Sized + Serialize,
	{
		ApiRequest::post(self.resolve(path)?).json(body)
	}

	/// Builds a `DELETE` request for a backend path.
	pub fn delete(&self, path: &str) -> Result<ApiRequest> {
		Ok(ApiRequest::delete(self.resolve(path)?))
	}

	/// Whether a refresh cycle is currently outstanding.
	pub fn refresh_in_flight(&self) -> bool {
		self.in_flight.lock().is_some()
	}

	async fn drive(&self, mut ctx: RequestContext) -> Result<ApiResponse> {
		loop {
			let response = self.dispatch(&ctx).await?;

			if response.status != StatusCode::UNAUTHORIZED {
				return Ok(response.error_for_status(ctx.url())?);
			}
			// Terminal: the refresh endpoint refused the session, or the replay was refused too.
			if ctx.retried || self.descriptor.is_refresh_endpoint(ctx.url()) {
				// Replays minted by one cycle share a single teardown.
				if ctx.cycle.as_ref().is_none_or(|cycle| cycle.claim_teardown()) {
					self.teardown(ctx.url()).await;
				}

				return Err(response.status_error(ctx.url()).into());
			}

			ctx.retried = true;

			let (cycle, outcome) = self.shared_refresh(ctx.url()).await;
			let token = outcome?;

			obs::emit(PipelineEvent::Replay, ctx.url());

			ctx.replay_token = Some(token);
			ctx.cycle = Some(cycle);
		}
	}

	/// Outbound interception followed by the raw transport call.
	async fn dispatch(&self, ctx: &RequestContext) -> Result<ApiResponse> {
		let mut request = ctx.request.clone();
		let token = match &ctx.replay_token {
			Some(token) => Some(token.clone()),
			None => self.store.get(TokenKey::AccessToken).await?,
		};

		if let Some(token) = token {
			request.set_bearer(&token)?;
		}

		Ok(self.transport.execute(request).await?)
	}

	/// Clears both tokens and redirects to the login route.
	async fn teardown(&self, trigger: &Url) {
		if let Err(e) = self.store.clear_session().await {
			obs::emit_teardown_failure(&e);
		}

		self.refresh_metrics.record_teardown();
		obs::emit(PipelineEvent::Teardown, trigger);
		self.navigator.redirect(&self.descriptor.login_route);
	}
}
#[cfg(feature = "reqwest")]
impl AuthPipeline<ReqwestTransport> {
	/// Creates a pipeline that provisions its own reqwest transport.
	pub fn new(
		store: Arc<dyn TokenStore>,
		descriptor: BackendDescriptor,
		navigator: Arc<dyn Navigator>,
	) -> Self {
		Self::with_transport(store, descriptor, navigator, ReqwestTransport::default())
	}
}
impl<T> Clone for AuthPipeline<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			navigator: self.navigator.clone(),
			descriptor: self.descriptor.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			in_flight: self.in_flight.clone(),
		}
	}
}
impl<T> Debug for AuthPipeline<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthPipeline")
			.field("descriptor", &self.descriptor)
			.field("refresh_in_flight", &self.refresh_in_flight())
			.finish()
	}
}

/// A caller's request plus the pipeline's bookkeeping for it.
#[derive(Clone, Debug)]
struct RequestContext {
	request: ApiRequest,
	/// Set once the request has consumed its single replay.
	retried: bool,
	/// Token minted by the refresh cycle this request waited on.
	replay_token: Option<TokenSecret>,
	/// The cycle that minted `replay_token`.
	cycle: Option<Arc<RefreshCycle>>,
}
impl RequestContext {
	fn new(request: ApiRequest) -> Self {
		Self { request, retried: false, replay_token: None, cycle: None }
	}

	fn url(&self) -> &Url {
		&self.request.url
	}
}
