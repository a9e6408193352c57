//! Optional observability helpers for pipeline operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_relay.op` with the `op` and `stage`
//!   fields, plus events when refresh cycles start, are joined, or tear the session down.
//! - Enable `metrics` to increment the `token_relay_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// A caller request flowing through the pipeline.
	Request,
	/// A shared refresh cycle.
	Refresh,
	/// Sign-in, sign-up, sign-out, or profile helpers.
	Session,
	/// Movie-metadata API calls.
	Catalog,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Request => "request",
			OpKind::Refresh => "refresh",
			OpKind::Session => "session",
			OpKind::Catalog => "catalog",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the attempt, runs `fut` inside a span, and records its outcome.
pub(crate) async fn observe<T, Fut>(kind: OpKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OpSpan::new(kind, stage);

	record_op_outcome(kind, OpOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_op_outcome(kind, OpOutcome::Success),
		Err(_) => record_op_outcome(kind, OpOutcome::Failure),
	}

	result
}
