//! Walks a session through expiry, shared refresh, and teardown over an in-process transport.
//!
//! 1. Implement [`HttpTransport`] so the demo runs without a network.
//! 2. Sign in, let the access token expire, and fire two profile lookups at once; both wait on the
//!    same refresh and replay with the new token.
//! 3. Revoke the refresh token on the "server" and watch the next expiry end in a login redirect.

// std
use std::sync::{
	Arc,
	atomic::{AtomicBool, AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
use parking_lot::Mutex;
use url::Url;
// self
use token_relay::{
	descriptor::BackendDescriptor,
	error::TransportError,
	http::{ApiRequest, ApiResponse, HttpTransport, TransportFuture},
	http_types::StatusCode,
	nav::{FnNavigator, Navigator},
	pipeline::AuthPipeline,
	session::{Credentials, SessionClient},
	store::{MemoryStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let backend = Arc::new(DemoBackend::default());
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let navigator: Arc<dyn Navigator> =
		Arc::new(FnNavigator(|route: &str| println!("Redirecting to {route}.")));
	let descriptor = BackendDescriptor::builder(Url::parse("https://movies.example.com")?).build()?;
	let pipeline: AuthPipeline<DemoBackend> = AuthPipeline::with_transport(store, descriptor, navigator, backend.clone());
	let session = SessionClient::new(pipeline.clone());
	let signed_in = session.signin(&Credentials::new("mina@example.com", "pw12345678")).await?;

	println!("Signed in as {} ({:?}).", signed_in.name, session.state().await?);

	backend.expire();

	let (a, b) = tokio::join!(session.profile(), session.profile());

	println!("Both lookups recovered: {} and {}.", a?.email, b?.email);
	println!(
		"Refresh calls so far: {} (attempts {}, joins {}).",
		backend.refreshes.load(Ordering::SeqCst),
		pipeline.refresh_metrics.attempts(),
		pipeline.refresh_metrics.joins()
	);

	backend.revoke();
	backend.expire();

	match session.profile().await {
		Ok(profile) => println!("Unexpectedly loaded {}.", profile.email),
		Err(e) => println!("Session ended: {e}"),
	}

	println!("State after teardown: {:?}.", session.state().await?);

	Ok(())
}

/// Tiny first-party backend that accepts one access token at a time.
#[derive(Debug, Default)]
struct DemoBackend {
	accepted: Mutex<Option<String>>,
	generation: AtomicUsize,
	refreshes: AtomicUsize,
	revoked: AtomicBool,
}
impl DemoBackend {
	fn expire(&self) {
		*self.accepted.lock() = None;
	}

	fn revoke(&self) {
		self.revoked.store(true, Ordering::SeqCst);
	}

	fn mint(&self) -> String {
		let n = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		let access = format!("access-{n}");

		*self.accepted.lock() = Some(access.clone());

		format!("{{\"accessToken\":\"{access}\",\"refreshToken\":\"refresh-{n}\"}}")
	}

	fn route(&self, request: &ApiRequest) -> ApiResponse {
		let authorized = match (request.authorization(), self.accepted.lock().as_deref()) {
			(Some(header), Some(token)) => header.strip_prefix("Bearer ") == Some(token),
			_ => false,
		};

		match request.url.path() {
			"/v1/auth/signin" => {
				let tokens = self.mint();
				let data = tokens.replacen('{', "{\"id\":1,\"name\":\"mina\",", 1);

				envelope(StatusCode::CREATED, &data)
			},
			"/v1/auth/refresh" => {
				self.refreshes.fetch_add(1, Ordering::SeqCst);

				if self.revoked.load(Ordering::SeqCst) {
					ApiResponse::new(StatusCode::UNAUTHORIZED, Vec::new())
				} else {
					envelope(StatusCode::OK, &self.mint())
				}
			},
			"/v1/users/me" if authorized => envelope(
				StatusCode::OK,
				"{\"id\":1,\"name\":\"mina\",\"email\":\"mina@example.com\"}",
			),
			_ => ApiResponse::new(StatusCode::UNAUTHORIZED, Vec::new()),
		}
	}
}
impl HttpTransport for DemoBackend {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			// Yield so overlapping lookups both see the expired token before the refresh lands.
			tokio::task::yield_now().await;

			Ok::<_, TransportError>(self.route(&request))
		})
	}
}

fn envelope(status: StatusCode, data: &str) -> ApiResponse {
	let body = format!(
		"{{\"status\":true,\"statusCode\":{},\"message\":\"ok\",\"data\":{data}}}",
		status.as_u16()
	);

	ApiResponse::new(status, body.into_bytes())
}
