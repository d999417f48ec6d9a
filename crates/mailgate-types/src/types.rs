//! Common types used throughout the Mailgate pipeline.

use serde::{Deserialize, Serialize};

// UserId //
//********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for UserId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for UserId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(UserId(i64::deserialize(deserializer)?))
	}
}

// RequestCtx //
//************//

/// Execution context for one pipeline run.
///
/// Immutable for the duration of the run and threaded through every step.
/// `user` identifies the acting principal; `internal` marks calls that
/// originate from inside the process rather than an external caller.
#[derive(Clone, Debug, Default)]
pub struct RequestCtx {
	pub user: Option<UserId>,
	pub internal: bool,
}

impl RequestCtx {
	/// Context for an authenticated external caller
	pub fn for_user(user: UserId) -> Self {
		Self { user: Some(user), internal: false }
	}

	/// Context for internal call sites (no acting user)
	pub fn internal() -> Self {
		Self { user: None, internal: true }
	}
}


// vim: ts=4
