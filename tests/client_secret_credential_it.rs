mod common;

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use function_app_client::{
	auth::Scope,
	credential::{ClientSecretCredential, CredentialSource},
	error::CredentialError,
	http::IdentityHttpClient,
};

const TENANT_ID: &str = "contoso";
const CLIENT_ID: &str = "caller-app";
const CLIENT_SECRET: &str = "caller-secret";
const TOKEN_PATH: &str = "/contoso/oauth2/v2.0/token";

fn build_credential(server: &MockServer) -> ClientSecretCredential {
	ClientSecretCredential::with_authority(server.base_url(), TENANT_ID, CLIENT_ID, CLIENT_SECRET)
		.expect("Mock authority should form a valid token URL.")
		.with_http_client(IdentityHttpClient::with_client(test_reqwest_client()))
}

fn test_scope() -> Scope {
	Scope::new(TEST_SCOPE).expect("Test scope should be valid.")
}

#[tokio::test]
async fn client_credentials_exchange_returns_token_with_expiry() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("grant_type", "client_credentials")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET)
				.form_urlencoded_tuple("scope", TEST_SCOPE);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"entra-token\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await;
	let credential = build_credential(&server);
	let before = OffsetDateTime::now_utc();
	let token = credential
		.fetch_token(&test_scope())
		.await
		.expect("Token exchange should succeed against the mock authority.");

	assert_eq!(token.secret.expose(), "entra-token");
	assert!(token.expires_at >= before + Duration::seconds(3599));
	assert!(token.expires_at <= OffsetDateTime::now_utc() + Duration::seconds(3599));
	assert_eq!(credential.token_url().path(), TOKEN_PATH);

	mock.assert_async().await;
}

#[tokio::test]
async fn rejected_client_secret_surfaces_oauth_error() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(401).header("content-type", "application/json").body(
				"{\"error\":\"invalid_client\",\"error_description\":\"Bad client secret.\"}",
			);
		})
		.await;
	let err = build_credential(&server)
		.fetch_token(&test_scope())
		.await
		.expect_err("Invalid client secret should be rejected.");

	match &err {
		CredentialError::Rejected { reason, status, .. } => {
			assert!(reason.contains("invalid_client"), "Unexpected reason: {reason}.");
			assert_eq!(*status, Some(401));
		},
		other => panic!("Expected a rejection, got {other:?}."),
	}
	assert!(!err.is_transient());

	mock.assert_async().await;
}

#[tokio::test]
async fn throttled_exchange_reports_retry_after() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(429)
				.header("content-type", "application/json")
				.header("retry-after", "7")
				.body("{\"error\":\"temporarily_unavailable\"}");
		})
		.await;
	let err = build_credential(&server)
		.fetch_token(&test_scope())
		.await
		.expect_err("Throttled exchange should fail.");

	match err {
		CredentialError::Rejected { status, retry_after, .. } => {
			assert_eq!(status, Some(429));
			assert_eq!(retry_after, Some(Duration::seconds(7)));
		},
		other => panic!("Expected a rejection, got {other:?}."),
	}
}

#[tokio::test]
async fn slow_authority_times_out() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"late\",\"token_type\":\"Bearer\",\"expires_in\":3599}")
				.delay(StdDuration::from_secs(2));
		})
		.await;
	let err = build_credential(&server)
		.with_timeout(StdDuration::from_millis(200))
		.fetch_token(&test_scope())
		.await
		.expect_err("Slow authority should time out.");

	assert!(matches!(err, CredentialError::Timeout { .. }), "Unexpected error: {err:?}.");
	assert!(err.is_transient());
}

#[tokio::test]
async fn function_calls_reuse_one_entra_token() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"shared-token\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/alive").header("authorization", "Bearer shared-token");
			then.status(200).body("alive");
		})
		.await;
	let client = build_test_client(&server.url("/api"), build_credential(&server));

	for _ in 0..3 {
		let outcome = client.get("alive", None).await.expect("Token exchange should succeed.");

		assert!(outcome.is_success());
	}

	token_mock.assert_calls_async(1).await;
	api_mock.assert_calls_async(3).await;
}
