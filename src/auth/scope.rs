//! Scope identifiers requested from the identity provider.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

const SCOPE_MAX_LEN: usize = 512;

/// Errors emitted when validating a scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ScopeError {
	/// The scope was empty.
	#[error("Scope cannot be empty.")]
	Empty,
	/// The scope contains whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
	/// The scope exceeded the allowed character count.
	#[error("Scope exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Resource scope a bearer token is requested for.
///
/// Function apps protected by Entra ID expect the `.default` scope of the app registration,
/// built with [`Scope::for_application`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope(String);
impl Scope {
	/// Creates a new scope after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, ScopeError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Derives the `.default` scope for the app registration identified by `app_client_id`.
	pub fn for_application(app_client_id: impl AsRef<str>) -> Result<Self, ScopeError> {
		let app_client_id = app_client_id.as_ref();

		if app_client_id.is_empty() {
			return Err(ScopeError::Empty);
		}

		Self::new(format!("api://{app_client_id}/.default"))
	}

	/// Returns the scope as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Deref for Scope {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Scope {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<Scope> for String {
	fn from(value: Scope) -> Self {
		value.0
	}
}
impl TryFrom<String> for Scope {
	type Error = ScopeError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Scope({})", self.0)
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for Scope {
	type Err = ScopeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), ScopeError> {
	if view.is_empty() {
		return Err(ScopeError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(ScopeError::ContainsWhitespace { scope: view.to_owned() });
	}
	if view.len() > SCOPE_MAX_LEN {
		return Err(ScopeError::TooLong { max: SCOPE_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn application_scope_uses_default_suffix() {
		let scope = Scope::for_application("6f1c2a4e-0b1d-4c55-9d8e-1234567890ab")
			.expect("Application scope should be valid.");

		assert_eq!(scope.as_str(), "api://6f1c2a4e-0b1d-4c55-9d8e-1234567890ab/.default");
		assert_eq!(Scope::for_application(""), Err(ScopeError::Empty));
		assert!(matches!(
			Scope::for_application("app id"),
			Err(ScopeError::ContainsWhitespace { .. })
		));
	}

	#[test]
	fn validation_rejects_whitespace_and_length() {
		assert_eq!(Scope::new(""), Err(ScopeError::Empty));
		assert!(Scope::new(" api://x/.default").is_err(), "Leading whitespace must be rejected.");

		let exact = "a".repeat(SCOPE_MAX_LEN);

		Scope::new(&exact).expect("Exact length should succeed.");

		assert_eq!(
			Scope::new("a".repeat(SCOPE_MAX_LEN + 1)),
			Err(ScopeError::TooLong { max: SCOPE_MAX_LEN })
		);
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let scope: Scope = serde_json::from_str("\"api://app/.default\"")
			.expect("Scope should deserialize successfully.");

		assert_eq!(scope.as_ref(), "api://app/.default");
		assert!(serde_json::from_str::<Scope>("\"with space\"").is_err());
	}
}
