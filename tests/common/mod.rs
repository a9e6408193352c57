//! Scripted in-process backend shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	io,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
// self
use token_relay::{
	descriptor::BackendDescriptor,
	error::TransportError,
	http::{ApiRequest, ApiResponse, HttpTransport, TransportFuture},
	http_types::{Method, StatusCode},
	nav::{Navigator, RecordingNavigator},
	pipeline::AuthPipeline,
	store::{MemoryStore, TokenStore},
	url::Url,
};

pub const BASE_URL: &str = "https://api.movies.test";
pub const REFRESH_PATH: &str = "/v1/auth/refresh";

/// How the refresh endpoint answers.
#[derive(Clone, Copy, Debug)]
pub enum RefreshReply {
	/// Mint `T{n}`/`R{n}` where `n` is one more than the previous generation.
	Rotate,
	/// Answer with the given status and an empty JSON object.
	Reject(u16),
	/// Drop the connection.
	Drop,
}

/// One request as the backend received it.
#[derive(Clone, Debug)]
pub struct Seen {
	pub method: Method,
	pub path: String,
	pub authorization: Option<String>,
	pub body: Option<String>,
}

/// Backend that accepts exactly one access token at a time.
///
/// Paths under `/status/{code}` answer with that code and `/offline` fails in transport; every
/// other path requires `Bearer <accepted>`.
#[derive(Debug)]
pub struct FakeBackend {
	accepted: Mutex<String>,
	generation: AtomicUsize,
	refresh_reply: RefreshReply,
	refresh_open: AtomicBool,
	reject_everything: AtomicBool,
	unauthorized: AtomicUsize,
	refresh_calls: AtomicUsize,
	seen: Mutex<Vec<Seen>>,
}
impl FakeBackend {
	/// Backend that refuses every token until the first refresh.
	pub fn new(refresh_reply: RefreshReply) -> Self {
		Self {
			accepted: Mutex::new(String::new()),
			generation: AtomicUsize::new(1),
			refresh_reply,
			refresh_open: AtomicBool::new(true),
			reject_everything: AtomicBool::new(false),
			unauthorized: AtomicUsize::new(0),
			refresh_calls: AtomicUsize::new(0),
			seen: Mutex::new(Vec::new()),
		}
	}

	/// Holds refresh replies until [`FakeBackend::open_refresh`] is called.
	pub fn hold_refresh(self) -> Self {
		self.refresh_open.store(false, Ordering::SeqCst);

		self
	}

	/// Refuses every protected request, even with a freshly minted token.
	pub fn reject_everything(self) -> Self {
		self.reject_everything.store(true, Ordering::SeqCst);

		self
	}

	pub fn open_refresh(&self) {
		self.refresh_open.store(true, Ordering::SeqCst);
	}

	/// Forgets the accepted token so the next protected call is refused.
	pub fn expire(&self) {
		self.accepted.lock().clear();
	}

	pub fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	pub fn unauthorized(&self) -> usize {
		self.unauthorized.load(Ordering::SeqCst)
	}

	pub fn seen(&self) -> Vec<Seen> {
		self.seen.lock().clone()
	}

	/// Authorization headers of every non-refresh request, in arrival order.
	pub fn protected_authorizations(&self) -> Vec<Option<String>> {
		self.seen
			.lock()
			.iter()
			.filter(|seen| seen.path != REFRESH_PATH)
			.map(|seen| seen.authorization.clone())
			.collect()
	}

	async fn wait_until_open(&self) {
		for _ in 0..5_000 {
			if self.refresh_open.load(Ordering::SeqCst) {
				return;
			}

			tokio::time::sleep(Duration::from_millis(1)).await;
		}

		panic!("Refresh gate was never opened.");
	}

	fn answer_refresh(&self) -> Result<ApiResponse, TransportError> {
		match self.refresh_reply {
			RefreshReply::Rotate => {
				let n = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

				*self.accepted.lock() = format!("T{n}");

				Ok(json(
					StatusCode::OK,
					format!(
						"{{\"status\":true,\"statusCode\":200,\"message\":\"ok\",\"data\":{{\"accessToken\":\"T{n}\",\"refreshToken\":\"R{n}\"}}}}"
					),
				))
			},
			RefreshReply::Reject(status) => Ok(json(
				StatusCode::from_u16(status).expect("Scripted status should be valid."),
				"{}".into(),
			)),
			RefreshReply::Drop => Err(TransportError::Io(io::Error::new(
				io::ErrorKind::ConnectionReset,
				"peer hung up",
			))),
		}
	}
}
impl HttpTransport for FakeBackend {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let path = request.url.path().to_owned();
			let authorization = request.authorization().map(str::to_owned);

			self.seen.lock().push(Seen {
				method: request.method.clone(),
				path: path.clone(),
				authorization: authorization.clone(),
				body: request.body.as_ref().map(|body| String::from_utf8_lossy(body).into_owned()),
			});

			if path == REFRESH_PATH {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);
				self.wait_until_open().await;

				return self.answer_refresh();
			}
			if path == "/offline" {
				return Err(TransportError::Io(io::Error::new(
					io::ErrorKind::TimedOut,
					"request timed out",
				)));
			}
			if let Some(code) = path.strip_prefix("/status/") {
				let status = code
					.parse::<u16>()
					.ok()
					.and_then(|code| StatusCode::from_u16(code).ok())
					.expect("Scripted status path should carry a valid code.");

				return Ok(json(status, "{}".into()));
			}

			let expected = format!("Bearer {}", self.accepted.lock());
			let refused = self.reject_everything.load(Ordering::SeqCst)
				|| authorization.as_deref() != Some(expected.as_str());

			if refused {
				self.unauthorized.fetch_add(1, Ordering::SeqCst);

				return Ok(json(StatusCode::UNAUTHORIZED, "{\"message\":\"Unauthorized\"}".into()));
			}

			Ok(json(StatusCode::OK, format!("{{\"path\":\"{path}\"}}")))
		})
	}
}

fn json(status: StatusCode, body: String) -> ApiResponse {
	ApiResponse::new(status, body.into_bytes())
}

pub fn descriptor() -> BackendDescriptor {
	BackendDescriptor::builder(Url::parse(BASE_URL).expect("Fixture base URL should parse."))
		.build()
		.expect("Fixture descriptor should build.")
}

/// Pipeline over `backend` with an in-memory store and a recording navigator.
pub fn pipeline(
	backend: Arc<FakeBackend>,
) -> (AuthPipeline<FakeBackend>, Arc<MemoryStore>, Arc<RecordingNavigator>) {
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn TokenStore> = store_backend.clone();
	let navigator_backend = Arc::new(RecordingNavigator::default());
	let navigator: Arc<dyn Navigator> = navigator_backend.clone();
	let pipeline = AuthPipeline::with_transport(store, descriptor(), navigator, backend);

	(pipeline, store_backend, navigator_backend)
}

/// Polls `condition` until it holds, panicking after roughly five seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
	for _ in 0..5_000 {
		if condition() {
			return;
		}

		tokio::time::sleep(Duration::from_millis(1)).await;
	}

	panic!("Condition did not hold in time.");
}
