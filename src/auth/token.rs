//! Bearer tokens issued by a credential source.

pub mod secret;

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Bearer token paired with the absolute instant it stops being valid.
///
/// Secret and expiry always travel together: a token is only ever replaced wholesale.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Bearer token secret; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Instant after which the identity provider no longer honors the token.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Pairs a raw token string with its expiry instant.
	pub fn new(secret: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { secret: TokenSecret::new(secret), expires_at }
	}

	/// Returns the validity left at `instant` (negative once expired).
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}

	/// Returns `true` if more than `buffer` of validity remains at `instant`.
	///
	/// The comparison is strict: a token with exactly `buffer` left is no longer usable.
	pub fn is_usable_at(&self, instant: OffsetDateTime, buffer: Duration) -> bool {
		self.remaining_at(instant) > buffer
	}

	/// Returns `true` if the token has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("secret", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn usability_boundary_is_strict() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let buffer = Duration::minutes(5);
		let exact = AccessToken::new("exact", now + buffer);
		let fresh = AccessToken::new("fresh", now + buffer + Duration::seconds(1));

		assert!(!exact.is_usable_at(now, buffer));
		assert!(fresh.is_usable_at(now, buffer));
		assert!(!exact.is_expired_at(now));
		assert!(exact.is_expired_at(now + buffer));
	}

	#[test]
	fn debug_redacts_secret() {
		let token = AccessToken::new("super-secret", macros::datetime!(2025-01-01 00:00 UTC));
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("super-secret"));
		assert!(rendered.contains("<redacted>"));
	}
}
