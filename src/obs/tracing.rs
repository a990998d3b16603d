// crates.io
use reqwest::Method;
use tracing::{Instrument, instrument::Instrumented};
// self
use crate::_prelude::*;

/// Span wrapping a single function-app request.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the request method and endpoint.
	pub fn new(method: &Method, endpoint: &str) -> Self {
		let span = tracing::info_span!(
			"function_app_client.request",
			method = method.as_str(),
			endpoint
		);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
