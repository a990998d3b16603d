//! Authenticated request execution and outcome classification.
//!
//! [`RequestExecutor::execute`] performs exactly one HTTP call per invocation and never retries.
//! Every transport-level result is returned as an [`Outcome`]: callers pattern-match on
//! [`RequestFailure`] to tell a remote rejection (peer status and body preserved) apart from a
//! request that never completed. Only failures that stop the call before it reaches the wire
//! (no token, unserializable payload) surface as [`Error`].

// std
use std::io::ErrorKind;
// crates.io
use reqwest::{
	Method, Response,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	config::BaseUrl,
	credential::CredentialSource,
	error::CredentialError,
	obs::{self, RequestSpan},
};

/// Query parameters appended to the request URL.
pub type QueryParams = BTreeMap<String, String>;

/// Status reported for requests that timed out.
pub const TIMEOUT_STATUS: u16 = 408;
/// Status reported for requests that could not reach the function app.
pub const CONNECTION_FAILURE_STATUS: u16 = 503;
/// Status reported for any other request failure.
pub const REQUEST_FAILURE_STATUS: u16 = 400;

/// Description of one function-app call.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestSpec {
	/// HTTP method.
	pub method: Method,
	/// Endpoint path relative to the base URL.
	pub endpoint: String,
	/// Query parameters.
	pub query: QueryParams,
	/// JSON request body.
	pub json_body: Option<serde_json::Value>,
	/// Per-call timeout; the client default applies when unset.
	pub timeout: Option<StdDuration>,
}
impl RequestSpec {
	/// Creates a request without query parameters or body.
	pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
		Self {
			method,
			endpoint: endpoint.into(),
			query: QueryParams::new(),
			json_body: None,
			timeout: None,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(Method::GET, endpoint)
	}

	/// Shorthand for a `POST` request.
	pub fn post(endpoint: impl Into<String>) -> Self {
		Self::new(Method::POST, endpoint)
	}

	/// Replaces the query parameters.
	pub fn with_query(mut self, query: QueryParams) -> Self {
		self.query = query;

		self
	}

	/// Adds or replaces a single query parameter.
	pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.insert(key.into(), value.into());

		self
	}

	/// Sets the JSON body.
	pub fn with_json(mut self, body: serde_json::Value) -> Self {
		self.json_body = Some(body);

		self
	}

	/// Serializes `payload` into the JSON body.
	pub fn with_payload<T>(self, payload: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_value(payload).map_err(Error::Payload)?;

		Ok(self.with_json(body))
	}

	/// Overrides the client's default timeout for this call.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}

/// Response received from the function app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionResponse {
	/// HTTP status code returned by the peer.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body as text.
	pub body: String,
}
impl FunctionResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body as JSON, reporting the path of the first mismatching field.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_str(&self.body);

		serde_path_to_error::deserialize(&mut de)
	}
}

/// Why a request did not yield a successful response.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RequestFailure {
	/// No response arrived within the configured timeout.
	#[error("{message}")]
	Timeout {
		/// Human-readable description.
		message: String,
	},
	/// The function app could not be reached (DNS, refused or reset connection).
	#[error("Connection failed: {message}.")]
	Connection {
		/// Human-readable description.
		message: String,
	},
	/// The function app answered with a non-2xx status.
	#[error("Function app returned HTTP {}.", .0.status)]
	Remote(FunctionResponse),
	/// Any other transport-layer failure.
	#[error("Request failed: {message}.")]
	Other {
		/// Human-readable description.
		message: String,
	},
}
impl RequestFailure {
	/// Peer status for remote errors; 408, 503, or 400 for the local classes.
	pub fn status(&self) -> u16 {
		match self {
			Self::Timeout { .. } => TIMEOUT_STATUS,
			Self::Connection { .. } => CONNECTION_FAILURE_STATUS,
			Self::Remote(response) => response.status,
			Self::Other { .. } => REQUEST_FAILURE_STATUS,
		}
	}

	/// Peer body for remote errors; the failure description otherwise.
	pub fn body(&self) -> &str {
		match self {
			Self::Timeout { message } | Self::Connection { message } | Self::Other { message } =>
				message,
			Self::Remote(response) => &response.body,
		}
	}

	/// Returns the classification label.
	pub fn kind(&self) -> OutcomeKind {
		match self {
			Self::Timeout { .. } => OutcomeKind::Timeout,
			Self::Connection { .. } => OutcomeKind::ConnectionFailure,
			Self::Remote(_) => OutcomeKind::RemoteHttpError,
			Self::Other { .. } => OutcomeKind::RequestFailure,
		}
	}
}

/// Classified result of one function-app call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
	/// The function app answered with a 2xx status.
	Success(FunctionResponse),
	/// The call failed or was rejected.
	Failure(RequestFailure),
}
impl Outcome {
	/// Status code of the response or of the failure class.
	pub fn status(&self) -> u16 {
		match self {
			Self::Success(response) => response.status,
			Self::Failure(failure) => failure.status(),
		}
	}

	/// Response body, or the failure description when no body exists.
	pub fn body(&self) -> &str {
		match self {
			Self::Success(response) => &response.body,
			Self::Failure(failure) => failure.body(),
		}
	}

	/// Returns the classification label.
	pub fn kind(&self) -> OutcomeKind {
		match self {
			Self::Success(_) => OutcomeKind::Success,
			Self::Failure(failure) => failure.kind(),
		}
	}

	/// Returns `true` for [`Outcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	/// Returns the peer's response, successful or not, when one was received.
	pub fn response(&self) -> Option<&FunctionResponse> {
		match self {
			Self::Success(response) | Self::Failure(RequestFailure::Remote(response)) =>
				Some(response),
			Self::Failure(_) => None,
		}
	}

	/// Converts into a standard [`Result`] for `?`-style propagation.
	pub fn into_result(self) -> Result<FunctionResponse, RequestFailure> {
		match self {
			Self::Success(response) => Ok(response),
			Self::Failure(failure) => Err(failure),
		}
	}
}

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
	/// 2xx response.
	Success,
	/// Timed out.
	Timeout,
	/// Function app unreachable.
	ConnectionFailure,
	/// Non-2xx response.
	RemoteHttpError,
	/// Any other failure.
	RequestFailure,
}
impl OutcomeKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OutcomeKind::Success => "success",
			OutcomeKind::Timeout => "timeout",
			OutcomeKind::ConnectionFailure => "connection_failure",
			OutcomeKind::RemoteHttpError => "remote_http_error",
			OutcomeKind::RequestFailure => "request_failure",
		}
	}
}
impl Display for OutcomeKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Sends bearer-authenticated requests to one function app.
pub struct RequestExecutor<S>
where
	S: ?Sized + CredentialSource,
{
	http_client: ReqwestClient,
	base_url: BaseUrl,
	default_timeout: StdDuration,
	tokens: TokenCache<S>,
}
impl<S> RequestExecutor<S>
where
	S: ?Sized + CredentialSource,
{
	/// Creates an executor that resolves endpoints against `base_url` and authenticates with
	/// tokens from `tokens`.
	pub fn new(
		http_client: ReqwestClient,
		base_url: BaseUrl,
		default_timeout: StdDuration,
		tokens: TokenCache<S>,
	) -> Self {
		Self { http_client, base_url, default_timeout, tokens }
	}

	/// Token cache backing this executor.
	pub fn token_cache(&self) -> &TokenCache<S> {
		&self.tokens
	}

	/// Performs one authenticated call and classifies its result.
	///
	/// Returns [`Error::Credential`] without touching the network when no token can be
	/// obtained within the call's timeout; every other outcome, including local transport
	/// failures, is an [`Outcome`].
	pub async fn execute(&self, spec: RequestSpec) -> Result<Outcome> {
		let span = RequestSpan::new(&spec.method, &spec.endpoint);

		span.instrument(async move {
			let timeout = spec.timeout.unwrap_or(self.default_timeout);
			let outcome = match self.base_url.join(&spec.endpoint) {
				Ok(url) => self.send(&spec, url, timeout).await?,
				Err(e) => Outcome::Failure(RequestFailure::Other {
					message: format!("endpoint `{}` does not form a valid URL: {e}", spec.endpoint),
				}),
			};

			log_outcome(&spec, timeout, &outcome);
			obs::record_request_outcome(outcome.kind());

			Ok(outcome)
		})
		.await
	}

	async fn send(&self, spec: &RequestSpec, url: Url, timeout: StdDuration) -> Result<Outcome> {
		let token = self.tokens.get_token_within(timeout).await?;
		let bearer = token.secret.bearer_header().map_err(|_| CredentialError::MalformedToken)?;
		let mut request = self
			.http_client
			.request(spec.method.clone(), url)
			.header(AUTHORIZATION, bearer)
			.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
			.timeout(timeout);

		if !spec.query.is_empty() {
			request = request.query(&spec.query);
		}
		if let Some(body) = &spec.json_body {
			request = request.body(serde_json::to_vec(body).map_err(Error::Payload)?);
		}

		let outcome = match request.send().await {
			Ok(response) => read_response(response, timeout).await,
			Err(e) => Outcome::Failure(classify_transport_error(&e, timeout)),
		};

		Ok(outcome)
	}
}
impl<S> Debug for RequestExecutor<S>
where
	S: ?Sized + CredentialSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestExecutor")
			.field("base_url", &self.base_url)
			.field("default_timeout", &self.default_timeout)
			.field("tokens", &self.tokens)
			.finish()
	}
}

async fn read_response(response: Response, timeout: StdDuration) -> Outcome {
	let status = response.status();
	let headers = response.headers().to_owned();

	match response.text().await {
		Ok(body) => {
			let response = FunctionResponse { status: status.as_u16(), headers, body };

			if status.is_success() {
				Outcome::Success(response)
			} else {
				Outcome::Failure(RequestFailure::Remote(response))
			}
		},
		Err(e) => Outcome::Failure(classify_transport_error(&e, timeout)),
	}
}

fn classify_transport_error(err: &ReqwestError, timeout: StdDuration) -> RequestFailure {
	if err.is_timeout() {
		return RequestFailure::Timeout { message: format!("Request timed out after {timeout:?}.") };
	}

	let message = render_chain(err);

	if err.is_connect() || has_connection_io_error(err) {
		RequestFailure::Connection { message }
	} else {
		RequestFailure::Other { message }
	}
}

fn has_connection_io_error(err: &ReqwestError) -> bool {
	let mut source = err.source();

	while let Some(inner) = source {
		if let Some(io) = inner.downcast_ref::<std::io::Error>() {
			return matches!(
				io.kind(),
				ErrorKind::ConnectionRefused
					| ErrorKind::ConnectionReset
					| ErrorKind::ConnectionAborted
					| ErrorKind::NotConnected
					| ErrorKind::BrokenPipe
					| ErrorKind::UnexpectedEof
			);
		}

		source = inner.source();
	}

	false
}

fn render_chain(err: &dyn StdError) -> String {
	let mut rendered = err.to_string();
	let mut source = err.source();

	while let Some(inner) = source {
		let text = inner.to_string();

		// reqwest and hyper often repeat the inner message in the outer one.
		if !rendered.contains(&text) {
			rendered.push_str(": ");
			rendered.push_str(&text);
		}

		source = inner.source();
	}

	rendered
}

fn log_outcome(spec: &RequestSpec, timeout: StdDuration, outcome: &Outcome) {
	let method = spec.method.as_str();
	let endpoint = spec.endpoint.as_str();

	match outcome {
		Outcome::Success(response) =>
			tracing::debug!(status = response.status, "{method} {endpoint}: {}", response.status),
		Outcome::Failure(RequestFailure::Timeout { .. }) =>
			tracing::error!("Request to {endpoint} timed out after {timeout:?}."),
		Outcome::Failure(RequestFailure::Connection { message }) =>
			tracing::error!("Connection failed for {endpoint}: {message}."),
		Outcome::Failure(RequestFailure::Remote(response)) => tracing::error!(
			status = response.status,
			"HTTP {} error for {endpoint}: {}",
			response.status,
			response.body
		),
		Outcome::Failure(RequestFailure::Other { message }) =>
			tracing::error!("Request to {endpoint} failed: {message}."),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str) -> FunctionResponse {
		FunctionResponse { status, headers: HeaderMap::new(), body: body.into() }
	}

	#[test]
	fn failure_classes_report_fixed_statuses() {
		let timeout = RequestFailure::Timeout { message: "slow".into() };
		let connection = RequestFailure::Connection { message: "refused".into() };
		let other = RequestFailure::Other { message: "bad".into() };
		let remote = RequestFailure::Remote(response(404, "{\"error\":\"not found\"}"));

		assert_eq!(timeout.status(), 408);
		assert_eq!(connection.status(), 503);
		assert_eq!(other.status(), 400);
		assert_eq!(remote.status(), 404);
		assert_eq!(remote.body(), "{\"error\":\"not found\"}");
		assert_eq!(remote.kind(), OutcomeKind::RemoteHttpError);
		assert_eq!(remote.to_string(), "Function app returned HTTP 404.");
	}

	#[test]
	fn outcome_exposes_peer_response_only_when_received() {
		let success = Outcome::Success(response(200, "ok"));
		let remote = Outcome::Failure(RequestFailure::Remote(response(500, "boom")));
		let timeout = Outcome::Failure(RequestFailure::Timeout { message: "slow".into() });

		assert!(success.is_success());
		assert_eq!(success.response().map(|r| r.body.as_str()), Some("ok"));
		assert_eq!(remote.response().map(|r| r.status), Some(500));
		assert!(timeout.response().is_none());
		assert_eq!(timeout.kind().as_str(), "timeout");
		assert!(remote.into_result().is_err());
	}

	#[test]
	fn request_spec_builders_compose() {
		let spec = RequestSpec::post("process_numbers")
			.with_query_param("mode", "fast")
			.with_payload(&serde_json::json!({ "numbers": [1, 2, 3] }))
			.expect("JSON payload should serialize.")
			.with_timeout(StdDuration::from_secs(5));

		assert_eq!(spec.method, Method::POST);
		assert_eq!(spec.query.get("mode").map(String::as_str), Some("fast"));
		assert_eq!(spec.json_body, Some(serde_json::json!({ "numbers": [1, 2, 3] })));
		assert_eq!(spec.timeout, Some(StdDuration::from_secs(5)));
	}

	#[test]
	fn payloads_that_cannot_be_json_are_rejected() {
		let mut map = BTreeMap::new();

		map.insert(vec![1_u8], 1_u8);

		let err = RequestSpec::post("process_numbers")
			.with_payload(&map)
			.expect_err("Non-string map keys cannot be JSON.");

		assert!(matches!(err, Error::Payload(_)));
	}

	#[test]
	fn json_decoding_reports_field_path() {
		#[derive(Debug, Deserialize)]
		struct Count {
			#[allow(dead_code)]
			count: u64,
		}

		let err = response(200, "{\"count\":\"three\"}")
			.json::<Count>()
			.expect_err("String count should fail to decode.");

		assert_eq!(err.path().to_string(), "count");
	}

	#[test]
	fn render_chain_skips_repeated_messages() {
		#[derive(Debug, ThisError)]
		#[error("outer: inner reset")]
		struct Outer(#[source] std::io::Error);

		let err = Outer(std::io::Error::new(ErrorKind::ConnectionReset, "inner reset"));

		assert_eq!(render_chain(&err), "outer: inner reset");
	}
}
