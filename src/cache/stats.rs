// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token cache lookups.
#[derive(Debug, Default)]
pub struct CacheStats {
	hits: AtomicU64,
	refreshes: AtomicU64,
	failures: AtomicU64,
}
impl CacheStats {
	/// Returns the number of lookups served from the cached token.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns the number of successful credential acquisitions.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of failed credential acquisitions.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
