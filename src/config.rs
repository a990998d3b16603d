//! Client configuration and its resolution from environment variables.
//!
//! The library never reads `.env` files; binaries load them before calling
//! [`ClientConfig::from_env`].

// self
use crate::{_prelude::*, auth::Scope, error::ConfigError};

/// Selects the environment variable `CALLER_APP_ENV` uses to pick the base URL.
pub const DEPLOYMENT_VAR: &str = "CALLER_APP_ENV";
/// Base URL of a function app running on the developer machine.
pub const LOCAL_BASE_URL_VAR: &str = "CALLER_APP_URL_BASE_LOCAL";
/// Base URL of the function app deployed to Azure.
pub const AZURE_BASE_URL_VAR: &str = "CALLER_APP_URL_BASE_AZURE";
/// Client id of the function app's Entra ID app registration.
pub const APP_CLIENT_ID_VAR: &str = "AZURE_FUNCTION_APP_CLIENT_ID";

/// Where the target function app runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Deployment {
	/// Function host started locally (`func start`).
	Local,
	/// Function app hosted in Azure.
	Azure,
}
impl Deployment {
	/// Interprets a `CALLER_APP_ENV` value; only `LOCAL` selects [`Deployment::Local`].
	pub fn from_setting(value: Option<&str>) -> Self {
		match value {
			Some("LOCAL") => Self::Local,
			_ => Self::Azure,
		}
	}

	/// Environment variable holding the base URL for this deployment.
	pub const fn base_url_var(self) -> &'static str {
		match self {
			Self::Local => LOCAL_BASE_URL_VAR,
			Self::Azure => AZURE_BASE_URL_VAR,
		}
	}

	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Local => "local",
			Self::Azure => "azure",
		}
	}
}
impl Display for Deployment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Validated function-app base URL with trailing slashes removed.
///
/// [`BaseUrl::join`] always places exactly one `/` between the base and an endpoint, whichever
/// side carried the separator.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BaseUrl(String);
impl BaseUrl {
	/// Validates `value` as an absolute `http`/`https` URL without query or fragment.
	pub fn new(value: impl AsRef<str>) -> Result<Self, ConfigError> {
		let trimmed = value.as_ref().trim().trim_end_matches('/');

		if trimmed.is_empty() {
			return Err(ConfigError::EmptyBaseUrl);
		}

		let parsed = Url::parse(trimmed)
			.map_err(|source| ConfigError::InvalidBaseUrl { value: trimmed.to_owned(), source })?;

		if !matches!(parsed.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { scheme: parsed.scheme().to_owned() });
		}
		if parsed.query().is_some() || parsed.fragment().is_some() {
			return Err(ConfigError::BaseUrlHasQuery { value: trimmed.to_owned() });
		}

		Ok(Self(trimmed.to_owned()))
	}

	/// Resolves `endpoint` against the base URL.
	pub fn join(&self, endpoint: &str) -> Result<Url, url::ParseError> {
		Url::parse(&format!("{}/{}", self.0, endpoint.trim_start_matches('/')))
	}

	/// Returns the normalized base URL.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for BaseUrl {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "BaseUrl({})", self.0)
	}
}
impl Display for BaseUrl {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for BaseUrl {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

/// Immutable settings shared by every request a client makes.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Function-app base URL.
	pub base_url: BaseUrl,
	/// Scope requested from the credential source.
	pub scope: Scope,
	/// Minimum validity a cached token must have left to be reused.
	pub expiry_buffer: Duration,
	/// Default per-request timeout.
	pub timeout: StdDuration,
}
impl ClientConfig {
	/// Default [`ClientConfig::expiry_buffer`].
	pub const DEFAULT_EXPIRY_BUFFER: Duration = Duration::minutes(5);
	/// Default [`ClientConfig::timeout`].
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Creates a configuration with the default expiry buffer and timeout.
	pub fn new(base_url: BaseUrl, scope: Scope) -> Self {
		Self {
			base_url,
			scope,
			expiry_buffer: Self::DEFAULT_EXPIRY_BUFFER,
			timeout: Self::DEFAULT_TIMEOUT,
		}
	}

	/// Resolves the configuration from the process environment.
	///
	/// `CALLER_APP_ENV=LOCAL` selects `CALLER_APP_URL_BASE_LOCAL`; any other value (or none)
	/// selects `CALLER_APP_URL_BASE_AZURE`. The scope is derived from
	/// `AZURE_FUNCTION_APP_CLIENT_ID`.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Same as [`ClientConfig::from_env`] with a caller-supplied variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let deployment = Deployment::from_setting(optional_var(&lookup, DEPLOYMENT_VAR).as_deref());
		let base_url = BaseUrl::new(require_var(&lookup, deployment.base_url_var())?)?;
		let scope = Scope::for_application(require_var(&lookup, APP_CLIENT_ID_VAR)?)?;

		tracing::debug!(%deployment, %base_url, "Resolved function app configuration.");

		Ok(Self::new(base_url, scope))
	}

	/// Overrides the expiry buffer (defaults to 5 minutes); negative values clamp to zero.
	pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
		self.expiry_buffer = if buffer.is_negative() { Duration::ZERO } else { buffer };

		self
	}

	/// Overrides the default per-request timeout (defaults to 30 seconds).
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}
}

pub(crate) fn optional_var<F>(lookup: &F, name: &str) -> Option<String>
where
	F: Fn(&str) -> Option<String>,
{
	lookup(name).filter(|value| !value.trim().is_empty())
}

pub(crate) fn require_var<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	optional_var(lookup, name).ok_or(ConfigError::MissingVariable { name })
}
