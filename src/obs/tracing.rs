// self
use crate::{_prelude::*, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by pipeline operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("token_relay.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Pipeline milestones worth an event in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PipelineEvent {
	/// This caller started a refresh cycle.
	RefreshStarted,
	/// This caller joined a refresh cycle already in flight.
	RefreshJoined,
	/// A request is being replayed with a fresh token.
	Replay,
	/// Tokens were cleared and the login redirect issued.
	Teardown,
}

/// Emits a pipeline event (when tracing is enabled).
pub(crate) fn emit(event: PipelineEvent, url: &Url) {
	#[cfg(feature = "tracing")]
	{
		match event {
			PipelineEvent::RefreshStarted =>
				tracing::debug!(url = %url, "starting shared token refresh"),
			PipelineEvent::RefreshJoined =>
				tracing::debug!(url = %url, "joining in-flight token refresh"),
			PipelineEvent::Replay =>
				tracing::debug!(url = %url, "replaying request with new token"),
			PipelineEvent::Teardown =>
				tracing::warn!(url = %url, "session torn down; redirecting to login"),
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, url);
	}
}

/// Emits a warning for a teardown step that failed without masking the original error.
pub(crate) fn emit_teardown_failure(err: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %err, "failed to clear stored tokens during teardown");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}
