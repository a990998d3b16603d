//! Microsoft Entra ID client-credentials grant for service principals holding a client secret.

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, Scope as OAuthScope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Scope},
	config,
	credential::{CredentialFuture, CredentialSource},
	error::{ConfigError, CredentialError},
	http::{IdentityHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const BODY_PREVIEW_LEN: usize = 256;

/// Acquires tokens from the Entra ID v2.0 token endpoint with a client id + secret pair.
///
/// Each fetch performs one `client_credentials` exchange; caching is left to the
/// [`TokenCache`](crate::cache::TokenCache). The client secret travels in the request body as
/// Entra ID expects, and the requested scope is passed through verbatim.
#[derive(Clone)]
pub struct ClientSecretCredential {
	oauth_client: ConfiguredBasicClient,
	http_client: IdentityHttpClient,
	token_url: Url,
	client_id: String,
	timeout: StdDuration,
}
impl ClientSecretCredential {
	/// Public-cloud authority host.
	pub const DEFAULT_AUTHORITY: &'static str = "https://login.microsoftonline.com";
	/// Upper bound on a single token exchange.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Creates a credential against the public-cloud authority.
	pub fn new(
		tenant_id: impl AsRef<str>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		Self::with_authority(Self::DEFAULT_AUTHORITY, tenant_id, client_id, client_secret)
	}

	/// Creates a credential against a custom authority host (sovereign clouds, test doubles).
	pub fn with_authority(
		authority: impl AsRef<str>,
		tenant_id: impl AsRef<str>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let authority = authority.as_ref().trim_end_matches('/');
		let tenant_id = tenant_id.as_ref().trim_matches('/');
		let raw = format!("{authority}/{tenant_id}/oauth2/v2.0/token");
		let token_url =
			Url::parse(&raw).map_err(|source| ConfigError::InvalidAuthority { source })?;
		let client_id = client_id.into();
		let oauth_client = BasicClient::new(ClientId::new(client_id.clone()))
			.set_client_secret(ClientSecret::new(client_secret.into()))
			.set_token_uri(TokenUrl::from_url(token_url.clone()))
			.set_auth_type(AuthType::RequestBody);

		Ok(Self {
			oauth_client,
			http_client: IdentityHttpClient::default(),
			token_url,
			client_id,
			timeout: Self::DEFAULT_TIMEOUT,
		})
	}

	/// Reads `AZURE_TENANT_ID`, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`, and the optional
	/// `AZURE_AUTHORITY_HOST` from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Same as [`ClientSecretCredential::from_env`] with a caller-supplied variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let tenant_id = config::require_var(&lookup, "AZURE_TENANT_ID")?;
		let client_id = config::require_var(&lookup, "AZURE_CLIENT_ID")?;
		let client_secret = config::require_var(&lookup, "AZURE_CLIENT_SECRET")?;
		let authority = config::optional_var(&lookup, "AZURE_AUTHORITY_HOST")
			.unwrap_or_else(|| Self::DEFAULT_AUTHORITY.to_owned());

		Self::with_authority(authority, tenant_id, client_id, client_secret)
	}

	/// Replaces the transport used for token exchanges.
	pub fn with_http_client(mut self, http_client: IdentityHttpClient) -> Self {
		self.http_client = http_client;

		self
	}

	/// Overrides the per-exchange timeout (defaults to 30 seconds).
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Token endpoint this credential calls.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}
}
impl CredentialSource for ClientSecretCredential {
	fn fetch_token<'a>(&'a self, scope: &'a Scope) -> CredentialFuture<'a> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.instrumented(meta.clone(), self.timeout);

			tracing::debug!(client_id = %self.client_id, %scope, "Requesting token from Entra ID.");

			let response = self
				.oauth_client
				.exchange_client_credentials()
				.add_scope(OAuthScope::new(scope.to_string()))
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(self.timeout, meta.take(), err))?;

			map_token_response(&response, OffsetDateTime::now_utc())
		})
	}
}
impl Debug for ClientSecretCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientSecretCredential")
			.field("token_url", &self.token_url.as_str())
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("timeout", &self.timeout)
			.finish()
	}
}

fn map_token_response(
	response: &BasicTokenResponse,
	issued_at: OffsetDateTime,
) -> Result<AccessToken, CredentialError> {
	let expires_in = response.expires_in().ok_or(CredentialError::MissingExpiresIn)?;
	let expires_in =
		Duration::try_from(expires_in).map_err(|_| CredentialError::ExpiresInOutOfRange)?;

	if !expires_in.is_positive() {
		return Err(CredentialError::ExpiresInOutOfRange);
	}

	let expires_at =
		issued_at.checked_add(expires_in).ok_or(CredentialError::ExpiresInOutOfRange)?;

	Ok(AccessToken::new(response.access_token().secret().to_owned(), expires_at))
}

fn map_request_error(
	timeout: StdDuration,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> CredentialError {
	let status = meta.as_ref().and_then(|value| value.status);
	let retry_after = meta.as_ref().and_then(|value| value.retry_after);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let reason = match response.error_description() {
				Some(description) => format!("{}: {description}", response.error().as_ref()),
				None => response.error().as_ref().to_owned(),
			};

			CredentialError::Rejected { reason, status, retry_after }
		},
		RequestTokenError::Request(error) => map_transport_error(timeout, error),
		RequestTokenError::Parse(source, body) => match status {
			Some(code) if !(200..300).contains(&code) =>
				CredentialError::Rejected { reason: body_preview(&body), status, retry_after },
			_ => CredentialError::MalformedResponse { source, status },
		},
		RequestTokenError::Other(message) =>
			CredentialError::Rejected { reason: message, status, retry_after },
	}
}

fn map_transport_error(
	timeout: StdDuration,
	err: HttpClientError<ReqwestError>,
) -> CredentialError {
	match err {
		HttpClientError::Reqwest(inner) if inner.is_timeout() =>
			CredentialError::Timeout { timeout },
		HttpClientError::Reqwest(inner) => CredentialError::transport(*inner),
		HttpClientError::Http(inner) => CredentialError::transport(inner),
		HttpClientError::Io(inner) => CredentialError::Io(inner),
		HttpClientError::Other(message) => CredentialError::Unavailable { reason: message },
		_ => CredentialError::Unavailable { reason: "unrecognized HTTP client failure".into() },
	}
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return "empty response body".into();
	}

	trimmed.chars().take(BODY_PREVIEW_LEN).collect()
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn token_response(payload: &str) -> BasicTokenResponse {
		serde_json::from_str(payload).expect("Token response fixture should deserialize.")
	}

	#[test]
	fn token_url_follows_entra_layout() {
		let credential = ClientSecretCredential::with_authority(
			"https://login.example.com/",
			"contoso",
			"client",
			"secret",
		)
		.expect("Credential should build for a valid authority.");

		assert_eq!(
			credential.token_url().as_str(),
			"https://login.example.com/contoso/oauth2/v2.0/token"
		);
		assert!(matches!(
			ClientSecretCredential::with_authority("not a url", "t", "c", "s"),
			Err(ConfigError::InvalidAuthority { .. })
		));
	}

	#[test]
	fn from_lookup_requires_service_principal_variables() {
		let err = ClientSecretCredential::from_lookup(|name| match name {
			"AZURE_TENANT_ID" => Some("tenant".into()),
			_ => None,
		})
		.expect_err("Missing client id should be reported.");

		assert!(matches!(err, ConfigError::MissingVariable { name: "AZURE_CLIENT_ID" }));

		let credential = ClientSecretCredential::from_lookup(|name| match name {
			"AZURE_TENANT_ID" => Some("tenant".into()),
			"AZURE_CLIENT_ID" => Some("client".into()),
			"AZURE_CLIENT_SECRET" => Some("secret".into()),
			_ => None,
		})
		.expect("Complete environment should build a credential.");

		assert_eq!(
			credential.token_url().as_str(),
			"https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
		);
		assert!(!format!("{credential:?}").contains("secret\""));
	}

	#[test]
	fn token_response_expiry_is_relative_to_issue_instant() {
		let issued_at = macros::datetime!(2025-01-01 00:00 UTC);
		let response = token_response(
			"{\"access_token\":\"abc\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
		);
		let token = map_token_response(&response, issued_at)
			.expect("Token response with expires_in should map.");

		assert_eq!(token.secret.expose(), "abc");
		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 00:59:59 UTC));
	}

	#[test]
	fn token_response_without_usable_expiry_is_rejected() {
		let issued_at = macros::datetime!(2025-01-01 00:00 UTC);
		let missing = token_response("{\"access_token\":\"abc\",\"token_type\":\"Bearer\"}");
		let zero = token_response(
			"{\"access_token\":\"abc\",\"token_type\":\"Bearer\",\"expires_in\":0}",
		);

		assert!(matches!(
			map_token_response(&missing, issued_at),
			Err(CredentialError::MissingExpiresIn)
		));
		assert!(matches!(
			map_token_response(&zero, issued_at),
			Err(CredentialError::ExpiresInOutOfRange)
		));
	}

	#[test]
	fn body_preview_truncates_and_labels_empty_bodies() {
		assert_eq!(body_preview(b"   "), "empty response body");
		assert_eq!(body_preview("x".repeat(1000).as_bytes()).len(), BODY_PREVIEW_LEN);
	}
}
