// self
use crate::{executor::OutcomeKind, obs::CacheOutcome};

/// Records a classified request outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(kind: OutcomeKind) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("function_app_client_request_total", "outcome" => kind.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = kind;
	}
}

/// Records how a token lookup was served via the global metrics recorder (when enabled).
pub fn record_token_lookup(outcome: CacheOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("function_app_client_token_total", "cache" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
