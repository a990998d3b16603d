//! Credential sources that mint bearer tokens for a scope.
//!
//! The [`TokenCache`](crate::cache::TokenCache) is the only caller; it decides when a new token
//! is needed and treats the source as opaque. Sources may cache internally, but the client never
//! relies on it.

mod client_secret;
mod fixed;

pub use client_secret::*;
pub use fixed::*;

// self
use crate::{_prelude::*, auth::{AccessToken, Scope}, error::CredentialError};

/// Boxed future returned by [`CredentialSource::fetch_token`].
pub type CredentialFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AccessToken, CredentialError>> + 'a + Send>>;

/// Contract implemented by anything able to mint bearer tokens.
pub trait CredentialSource
where
	Self: Send + Sync,
{
	/// Acquires a token valid for `scope`, paired with its absolute expiry.
	fn fetch_token<'a>(&'a self, scope: &'a Scope) -> CredentialFuture<'a>;
}
impl<T> CredentialSource for Arc<T>
where
	T: ?Sized + CredentialSource,
{
	fn fetch_token<'a>(&'a self, scope: &'a Scope) -> CredentialFuture<'a> {
		<T as CredentialSource>::fetch_token(self.as_ref(), scope)
	}
}
impl<T> CredentialSource for Box<T>
where
	T: ?Sized + CredentialSource,
{
	fn fetch_token<'a>(&'a self, scope: &'a Scope) -> CredentialFuture<'a> {
		<T as CredentialSource>::fetch_token(self.as_ref(), scope)
	}
}
