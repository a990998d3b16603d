//! Single-slot token cache with expiry-aware refresh.
//!
//! [`TokenCache`] keeps at most one [`AccessToken`] and reuses it while more than the configured
//! expiry buffer of validity remains. Lookups are serialized through one async mutex that stays
//! held across the credential call, so concurrent misses queue behind a single acquisition and
//! then reuse its result instead of racing to overwrite the slot.

mod stats;

pub use stats::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Scope},
	credential::CredentialSource,
	error::CredentialError,
	obs::{self, CacheOutcome},
};

/// Caches the bearer token minted by a [`CredentialSource`] for one scope.
pub struct TokenCache<S>
where
	S: ?Sized + CredentialSource,
{
	source: Arc<S>,
	scope: Scope,
	expiry_buffer: Duration,
	slot: AsyncMutex<Option<AccessToken>>,
	stats: CacheStats,
}
impl<S> TokenCache<S>
where
	S: ?Sized + CredentialSource,
{
	/// Creates an empty cache that requests `scope` from `source`.
	pub fn new(source: impl Into<Arc<S>>, scope: Scope, expiry_buffer: Duration) -> Self {
		Self {
			source: source.into(),
			scope,
			expiry_buffer,
			slot: AsyncMutex::new(None),
			stats: CacheStats::default(),
		}
	}

	/// Returns a token with more than the expiry buffer of validity left, acquiring a new one
	/// when the cached token is missing or too close to expiry.
	///
	/// On failure the previous token, if any, stays cached.
	pub async fn get_token(&self) -> Result<AccessToken, CredentialError> {
		self.resolve(OffsetDateTime::now_utc).await
	}

	/// Same as [`TokenCache::get_token`] but gives up after `timeout`, covering both the wait for
	/// the slot and the credential call.
	///
	/// An elapsed lookup fails with [`CredentialError::Timeout`] and releases the slot, so the next
	/// caller can try again.
	pub async fn get_token_within(
		&self,
		timeout: StdDuration,
	) -> Result<AccessToken, CredentialError> {
		match tokio::time::timeout(timeout, self.get_token()).await {
			Ok(result) => result,
			Err(_) => {
				tracing::error!(
					scope = %self.scope,
					"Token acquisition timed out after {timeout:?}."
				);
				self.stats.record_failure();
				obs::record_token_lookup(CacheOutcome::Failure);

				Err(CredentialError::Timeout { timeout })
			},
		}
	}

	/// Same as [`TokenCache::get_token`] but evaluates freshness at `instant`.
	pub async fn get_token_at(
		&self,
		instant: OffsetDateTime,
	) -> Result<AccessToken, CredentialError> {
		self.resolve(|| instant).await
	}

	/// Returns a snapshot of the cached token without refreshing it.
	pub async fn cached(&self) -> Option<AccessToken> {
		self.slot.lock().await.clone()
	}

	/// Drops the cached token so the next lookup acquires a new one.
	pub async fn invalidate(&self) {
		self.slot.lock().await.take();
	}

	/// Scope requested from the credential source.
	pub fn scope(&self) -> &Scope {
		&self.scope
	}

	/// Minimum validity a cached token must keep to be reused.
	pub fn expiry_buffer(&self) -> Duration {
		self.expiry_buffer
	}

	/// Lookup counters.
	pub fn stats(&self) -> &CacheStats {
		&self.stats
	}

	async fn resolve<F>(&self, clock: F) -> Result<AccessToken, CredentialError>
	where
		F: Fn() -> OffsetDateTime,
	{
		let mut slot = self.slot.lock().await;
		// Sampled after the lock so queued callers judge the token their predecessor stored.
		let now = clock();

		if let Some(current) =
			slot.as_ref().filter(|token| token.is_usable_at(now, self.expiry_buffer))
		{
			tracing::debug!(expires_at = %current.expires_at, "Using cached token.");
			self.stats.record_hit();
			obs::record_token_lookup(CacheOutcome::Hit);

			return Ok(current.clone());
		}

		match slot.as_ref() {
			Some(stale) if stale.is_expired_at(now) =>
				tracing::debug!(expires_at = %stale.expires_at, "Cached token expired."),
			Some(stale) => tracing::debug!(
				expires_at = %stale.expires_at,
				"Cached token is inside the expiry buffer."
			),
			None => tracing::debug!("No cached token."),
		}
		tracing::debug!(scope = %self.scope, "Acquiring new token.");

		match <S as CredentialSource>::fetch_token(self.source.as_ref(), &self.scope).await {
			Ok(token) => {
				*slot = Some(token.clone());

				self.stats.record_refresh();
				obs::record_token_lookup(CacheOutcome::Refresh);

				Ok(token)
			},
			Err(e) => {
				tracing::error!(scope = %self.scope, error = %e, "Token acquisition failed.");
				self.stats.record_failure();
				obs::record_token_lookup(CacheOutcome::Failure);

				Err(e)
			},
		}
	}
}
impl<S> Debug for TokenCache<S>
where
	S: ?Sized + CredentialSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("scope", &self.scope)
			.field("expiry_buffer", &self.expiry_buffer)
			.field("stats", &self.stats)
			.finish()
	}
}
