//! Fixed-token credential for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Scope, TokenSecret},
	credential::{CredentialFuture, CredentialSource},
};

/// Hands out the same token for every scope, valid for `lifetime` from the moment of each fetch.
///
/// Useful against a function app running locally with authentication disabled, where any bearer
/// value is accepted.
#[derive(Clone, Debug)]
pub struct StaticCredential {
	secret: TokenSecret,
	lifetime: Duration,
}
impl StaticCredential {
	/// Creates a credential that always returns `token`.
	pub fn new(token: impl Into<String>, lifetime: Duration) -> Self {
		Self { secret: TokenSecret::new(token), lifetime }
	}
}
impl CredentialSource for StaticCredential {
	fn fetch_token<'a>(&'a self, _scope: &'a Scope) -> CredentialFuture<'a> {
		let token = AccessToken {
			secret: self.secret.clone(),
			expires_at: OffsetDateTime::now_utc() + self.lifetime,
		};

		Box::pin(async move { Ok(token) })
	}
}
