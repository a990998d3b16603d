//! Observability helpers for client requests and token lookups.
//!
//! # Feature Flags
//!
//! - Spans named `function_app_client.request` carry the `method` and `endpoint` fields and are
//!   always emitted through `tracing`.
//! - Enable `metrics` to increment `function_app_client_request_total` (labeled by `outcome`) for
//!   every classified request and `function_app_client_token_total` (labeled by `cache`) for every
//!   token lookup.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// How a token lookup was served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOutcome {
	/// Cached token still had enough validity left.
	Hit,
	/// A new token was acquired from the credential source.
	Refresh,
	/// The credential source failed.
	Failure,
}
impl CacheOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheOutcome::Hit => "hit",
			CacheOutcome::Refresh => "refresh",
			CacheOutcome::Failure => "failure",
		}
	}
}
impl Display for CacheOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
