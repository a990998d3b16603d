//! Function-app client facade.
//!
//! [`FunctionAppClient`] binds a [`ClientConfig`] to a [`RequestExecutor`] and offers `get`/`post`
//! shorthands. It never touches tokens itself; the executor's [`TokenCache`] owns that state and
//! is the only thing that changes between calls.

// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	config::ClientConfig,
	credential::CredentialSource,
	error::ConfigError,
	executor::{Outcome, QueryParams, RequestExecutor, RequestSpec},
};

/// Bearer-authenticated client for one function app.
pub struct FunctionAppClient<S = dyn CredentialSource>
where
	S: ?Sized + CredentialSource,
{
	config: ClientConfig,
	executor: RequestExecutor<S>,
}
impl<S> FunctionAppClient<S>
where
	S: ?Sized + CredentialSource,
{
	/// Creates a client with its own reqwest transport.
	pub fn new(config: ClientConfig, credential: impl Into<Arc<S>>) -> Result<Self> {
		let http_client = ReqwestClient::builder().build().map_err(ConfigError::from)?;

		Ok(Self::with_http_client(config, credential, http_client))
	}

	/// Creates a client that reuses a caller-built reqwest transport.
	pub fn with_http_client(
		config: ClientConfig,
		credential: impl Into<Arc<S>>,
		http_client: ReqwestClient,
	) -> Self {
		let tokens = TokenCache::new(credential, config.scope.clone(), config.expiry_buffer);
		let executor =
			RequestExecutor::new(http_client, config.base_url.clone(), config.timeout, tokens);

		Self { config, executor }
	}

	/// Configuration this client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Token cache shared by every call made through this client.
	pub fn token_cache(&self) -> &TokenCache<S> {
		self.executor.token_cache()
	}

	/// Performs an arbitrary request.
	pub async fn execute(&self, spec: RequestSpec) -> Result<Outcome> {
		self.executor.execute(spec).await
	}

	/// Sends a `GET` request with the default timeout.
	pub async fn get(&self, endpoint: &str, params: Option<QueryParams>) -> Result<Outcome> {
		self.execute(get_spec(endpoint, params)).await
	}

	/// Sends a `GET` request that gives up after `timeout`.
	pub async fn get_with_timeout(
		&self,
		endpoint: &str,
		params: Option<QueryParams>,
		timeout: StdDuration,
	) -> Result<Outcome> {
		self.execute(get_spec(endpoint, params).with_timeout(timeout)).await
	}

	/// Sends a `POST` request with `payload` as its JSON body and the default timeout.
	pub async fn post<T>(
		&self,
		endpoint: &str,
		payload: Option<&T>,
		params: Option<QueryParams>,
	) -> Result<Outcome>
	where
		T: ?Sized + Serialize,
	{
		self.execute(post_spec(endpoint, payload, params)?).await
	}

	/// Sends a `POST` request that gives up after `timeout`.
	pub async fn post_with_timeout<T>(
		&self,
		endpoint: &str,
		payload: Option<&T>,
		params: Option<QueryParams>,
		timeout: StdDuration,
	) -> Result<Outcome>
	where
		T: ?Sized + Serialize,
	{
		self.execute(post_spec(endpoint, payload, params)?.with_timeout(timeout)).await
	}
}
impl<S> Debug for FunctionAppClient<S>
where
	S: ?Sized + CredentialSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FunctionAppClient")
			.field("config", &self.config)
			.field("executor", &self.executor)
			.finish()
	}
}

fn get_spec(endpoint: &str, params: Option<QueryParams>) -> RequestSpec {
	RequestSpec::get(endpoint).with_query(params.unwrap_or_default())
}

fn post_spec<T>(
	endpoint: &str,
	payload: Option<&T>,
	params: Option<QueryParams>,
) -> Result<RequestSpec>
where
	T: ?Sized + Serialize,
{
	let spec = RequestSpec::post(endpoint).with_query(params.unwrap_or_default());

	match payload {
		Some(payload) => spec.with_payload(payload),
		None => Ok(spec),
	}
}
