//! Error taxonomy for the mail-dispatch pipeline.
//!
//! Every failure propagates unchanged to the caller of the public
//! operation. The core performs no local recovery, retry, or translation;
//! the only failure side effect is the operator warning emitted by the
//! dispatcher for delivery failures in direct mode.

pub type MgResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// The authorization gate refused the requested action
	PermissionDenied,

	/// A required user or configuration record is missing
	NotFound,

	/// The transport failed to hand off the message
	Delivery(String),

	/// Template rendering failed (propagated from the content renderer)
	Render(String),

	/// A message or request failed validation before entering the transport
	ValidationError(String),

	/// Missing or inconsistent configuration
	ConfigError(String),
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::NotFound => write!(f, "not found"),
			Error::Delivery(msg) => write!(f, "delivery error: {}", msg),
			Error::Render(msg) => write!(f, "render error: {}", msg),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::ValidationError(err.to_string())
	}
}


// vim: ts=4
