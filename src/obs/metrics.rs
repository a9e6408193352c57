// self
use crate::obs::{OpKind, OpOutcome};

/// Counter incremented per operation, labeled by `op` and `outcome`.
pub const OP_TOTAL: &str = "token_relay_op_total";

/// Label pairs attached to [`OP_TOTAL`] for one observation.
pub fn op_labels(kind: OpKind, outcome: OpOutcome) -> [(&'static str, &'static str); 2] {
	[("op", kind.as_str()), ("outcome", outcome.as_str())]
}

/// Bumps [`OP_TOTAL`] on the global recorder when the `metrics` feature is on.
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		let [(op_key, op), (outcome_key, outcome)] = op_labels(kind, outcome);

		metrics::counter!(OP_TOTAL, op_key => op, outcome_key => outcome).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = op_labels(kind, outcome);
	}
}
