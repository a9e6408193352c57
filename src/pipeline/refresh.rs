//! Single-flight refresh cycles.
//!
//! The pipeline owns one slot that is either empty or points at the cycle currently in flight. The
//! first request to find it empty installs a new cycle; everyone else clones the `Arc` and awaits
//! the same [`AsyncOnceCell`], so exactly one caller drives the refresh call and every waiter reads
//! the settled value. The cycle clears the slot as it settles, before waiters observe the outcome,
//! so a later `401` always starts from a clean state.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{SessionTokens, TokenKey, TokenSecret},
	error::RefreshError,
	http::{ApiRequest, HttpTransport},
	obs::{self, OpKind, PipelineEvent},
	pipeline::{AuthPipeline, RequestContext},
};

/// Settles once into the new access token or the shared failure.
#[derive(Debug, Default)]
pub(crate) struct RefreshCycle {
	outcome: AsyncOnceCell<Result<TokenSecret, RefreshError>>,
	torn_down: AtomicBool,
}
impl RefreshCycle {
	/// Returns `true` for the first caller only; later callers must skip the teardown.
	pub(crate) fn claim_teardown(&self) -> bool {
		!self.torn_down.swap(true, Ordering::AcqRel)
	}
}

#[derive(Serialize)]
struct RefreshBody<'a> {
	refresh: &'a str,
}

/// Refresh endpoints either return the pair bare or inside the backend's response envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum RefreshPayload {
	Enveloped { data: SessionTokens },
	Bare(SessionTokens),
}
impl RefreshPayload {
	fn into_tokens(self) -> SessionTokens {
		match self {
			Self::Enveloped { data } => data,
			Self::Bare(tokens) => tokens,
		}
	}
}

impl<T> AuthPipeline<T>
where
	T: ?Sized + HttpTransport,
{
	/// Joins the in-flight refresh cycle, starting one when none is outstanding.
	///
	/// The cycle handle is returned alongside the outcome so replays that are refused again can
	/// share its single teardown.
	pub(super) async fn shared_refresh(
		&self,
		trigger: &Url,
	) -> (Arc<RefreshCycle>, Result<TokenSecret, RefreshError>) {
		let (cycle, started) = {
			let mut slot = self.in_flight.lock();

			match slot.as_ref() {
				Some(cycle) => (cycle.clone(), false),
				None => {
					let cycle = Arc::new(RefreshCycle::default());

					*slot = Some(cycle.clone());

					(cycle, true)
				},
			}
		};

		if started {
			self.refresh_metrics.record_attempt();
			obs::emit(PipelineEvent::RefreshStarted, trigger);
		} else {
			self.refresh_metrics.record_join();
			obs::emit(PipelineEvent::RefreshJoined, trigger);
		}

		let outcome = cycle.outcome.get_or_init(|| self.run_cycle(&cycle)).await.clone();

		(cycle, outcome)
	}

	async fn run_cycle(&self, cycle: &Arc<RefreshCycle>) -> Result<TokenSecret, RefreshError> {
		let result = obs::observe(OpKind::Refresh, "rotate_tokens", self.rotate_tokens())
			.await
			.map_err(RefreshError::from);

		match &result {
			Ok(_) => self.refresh_metrics.record_success(),
			Err(_) => {
				self.refresh_metrics.record_failure();

				if cycle.claim_teardown() {
					match self.descriptor.refresh_url() {
						Ok(url) => self.teardown(&url).await,
						Err(_) => self.teardown(&self.descriptor.base_url).await,
					}
				}
			},
		}

		{
			let mut slot = self.in_flight.lock();

			if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, cycle)) {
				*slot = None;
			}
		}

		result
	}

	/// Exchanges the stored refresh token for a new pair and persists it.
	async fn rotate_tokens(&self) -> Result<TokenSecret> {
		let refresh = self
			.store
			.get(TokenKey::RefreshToken)
			.await?
			.ok_or(RefreshError::MissingRefreshToken)?;
		let url = self.descriptor.refresh_url()?;
		let request = ApiRequest::post(url.clone()).json(&RefreshBody { refresh: refresh.expose() })?;
		let response = self.dispatch(&RequestContext::new(request)).await?.error_for_status(&url)?;
		let tokens = response.json::<RefreshPayload>()?.into_tokens();
		let access = tokens.access.clone();

		self.store.save_session(tokens).await?;

		Ok(access)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn payload_accepts_bare_and_enveloped_pairs() {
		let bare: RefreshPayload =
			serde_json::from_str("{\"accessToken\":\"T2\",\"refreshToken\":\"R2\"}")
				.expect("Bare pair should decode.");

		assert_eq!(bare.into_tokens(), SessionTokens::new("T2", "R2"));

		let enveloped: RefreshPayload = serde_json::from_str(
			"{\"status\":true,\"statusCode\":200,\"message\":\"ok\",\"data\":{\"accessToken\":\"T3\",\"refreshToken\":\"R3\"}}",
		)
		.expect("Enveloped pair should decode.");

		assert_eq!(enveloped.into_tokens(), SessionTokens::new("T3", "R3"));
	}

	#[test]
	fn teardown_is_claimed_once_per_cycle() {
		let cycle = RefreshCycle::default();

		assert!(cycle.claim_teardown());
		assert!(!cycle.claim_teardown());
		assert!(!cycle.claim_teardown());
	}

	#[test]
	fn refresh_body_uses_backend_field_name() {
		let body = serde_json::to_string(&RefreshBody { refresh: "R1" })
			.expect("Refresh body should serialize.");

		assert_eq!(body, "{\"refresh\":\"R1\"}");
	}
}
