#![allow(dead_code)]

// crates.io
use reqwest::Client as ReqwestClient;
use time::Duration;
// self
use function_app_client::{
	auth::Scope,
	client::FunctionAppClient,
	config::{BaseUrl, ClientConfig},
	credential::{CredentialSource, StaticCredential},
};

/// Scope shared by the integration tests.
pub const TEST_SCOPE: &str = "api://00000000-0000-0000-0000-000000000000/.default";

/// Builds a reqwest client suitable for talking to httpmock servers.
pub fn test_reqwest_client() -> ReqwestClient {
	ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.build()
		.expect("Test reqwest client should build.")
}

/// Configuration pointing at `base_url` with the test scope.
pub fn test_config(base_url: &str) -> ClientConfig {
	ClientConfig::new(
		BaseUrl::new(base_url).expect("Test base URL should be valid."),
		Scope::new(TEST_SCOPE).expect("Test scope should be valid."),
	)
}

/// Builds a client against `base_url` backed by `credential`.
pub fn build_test_client<S>(base_url: &str, credential: S) -> FunctionAppClient<S>
where
	S: CredentialSource,
{
	FunctionAppClient::with_http_client(test_config(base_url), credential, test_reqwest_client())
}

/// Builds a client that always presents `token`.
pub fn build_static_test_client(
	base_url: &str,
	token: &str,
) -> FunctionAppClient<StaticCredential> {
	build_test_client(base_url, StaticCredential::new(token, Duration::hours(1)))
}
