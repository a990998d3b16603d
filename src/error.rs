//! Client-level error types for failures that prevent a request from being attempted.
//!
//! Anything that happens once the function-app request is on the wire is reported as an
//! [`Outcome`](crate::executor::Outcome) instead; [`Error`] means no HTTP attempt was made.

// self
use crate::{_prelude::*, auth::ScopeError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical hard failure exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The credential source could not produce a bearer token.
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// The request payload could not be serialized as JSON.
	#[error("Request payload could not be serialized as JSON.")]
	Payload(#[source] serde_json::Error),
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL is empty or whitespace.
	#[error("Base URL cannot be empty.")]
	EmptyBaseUrl,
	/// Base URL cannot be parsed.
	#[error("Base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Offending value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than `http` or `https`.
	#[error("Base URL scheme `{scheme}` is not supported.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// Base URL carries a query string or fragment that endpoint joins would discard.
	#[error("Base URL `{value}` must not carry a query or fragment.")]
	BaseUrlHasQuery {
		/// Offending value.
		value: String,
	},
	/// Identity authority URL cannot be parsed.
	#[error("Identity authority URL is invalid.")]
	InvalidAuthority {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Scope cannot be validated.
	#[error("Scope is invalid.")]
	InvalidScope(#[from] ScopeError),
	/// Required environment variable is not set.
	#[error("Environment variable `{name}` is not set.")]
	MissingVariable {
		/// Variable name.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised by a [`CredentialSource`](crate::credential::CredentialSource).
#[derive(Debug, ThisError)]
pub enum CredentialError {
	/// Identity provider did not answer within the configured timeout.
	#[error("Token request timed out after {timeout:?}.")]
	Timeout {
		/// Timeout that elapsed.
		timeout: StdDuration,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the identity provider.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the identity provider.")]
	Io(#[from] std::io::Error),
	/// Identity provider refused to issue a token.
	#[error("Identity provider rejected the token request: {reason}.")]
	Rejected {
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Identity provider responded with JSON that could not be parsed.
	#[error("Identity provider returned a malformed token response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token response omitted `expires_in`.
	#[error("Token response is missing expires_in.")]
	MissingExpiresIn,
	/// Token response carried a zero or unrepresentable `expires_in`.
	#[error("The expires_in value is outside the supported range.")]
	ExpiresInOutOfRange,
	/// Issued token contains characters that cannot be sent in an `Authorization` header.
	#[error("Issued token cannot be used as a bearer header.")]
	MalformedToken,
	/// The source cannot produce any token.
	#[error("Credential is unavailable: {reason}.")]
	Unavailable {
		/// Human-readable reason.
		reason: String,
	},
}
impl CredentialError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Returns `true` when retrying the same request later may succeed.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Timeout { .. } | Self::Transport { .. } | Self::Io(_) => true,
			Self::Rejected { status, .. } => matches!(status, Some(429) | Some(500..=599)),
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn transient_classification_follows_status() {
		let throttled = CredentialError::Rejected {
			reason: "slow down".into(),
			status: Some(429),
			retry_after: Some(Duration::seconds(3)),
		};
		let denied = CredentialError::Rejected {
			reason: "nope".into(),
			status: Some(401),
			retry_after: None,
		};

		assert!(throttled.is_transient());
		assert!(!denied.is_transient());
		assert!(CredentialError::Timeout { timeout: StdDuration::from_secs(1) }.is_transient());
		assert!(!CredentialError::MissingExpiresIn.is_transient());
	}

	#[test]
	fn credential_errors_convert_into_client_errors() {
		let err = Error::from(CredentialError::Unavailable { reason: "no identity".into() });

		assert!(matches!(err, Error::Credential(CredentialError::Unavailable { .. })));
		assert_eq!(err.to_string(), "Credential is unavailable: no identity.");
	}
}
