// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh cycles.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	joins: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	teardowns: AtomicU64,
}
impl RefreshMetrics {
	/// Returns how many refresh cycles were started (one refresh call each).
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns how many requests joined a cycle someone else started.
	pub fn joins(&self) -> u64 {
		self.joins.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles that produced a new access token.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles that failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns how many times the session was torn down.
	pub fn teardowns(&self) -> u64 {
		self.teardowns.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_teardown(&self) {
		self.teardowns.fetch_add(1, Ordering::Relaxed);
	}
}
