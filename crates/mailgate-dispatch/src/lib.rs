//! Mail-dispatch pipeline
//!
//! This crate provides:
//! - An ordered, short-circuiting pipeline runner for dependent steps
//! - A mail dispatcher with the public send / send-test / send-contact workflows
//! - SMTP delivery with lettre behind a pluggable `Transport` trait
//! - Template rendering with variable substitution (Handlebars)
//! - Operator warnings for delivery failures in direct-transport mode

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod dispatcher;
pub mod pipeline;
pub mod sender;
pub mod settings;
pub mod template;

pub use dispatcher::{ContactForm, MailDispatcher, TEST_EMAIL_SUBJECT};
pub use pipeline::{Pipeline, Step};
pub use sender::{DeliveryResult, SmtpSender, Transport};
pub use settings::MailSettings;
pub use template::{ContentRenderer, RenderedContent, TemplateEngine, TemplateId};

mod prelude;

use crate::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// A fully-formed email message
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
	/// Recipient addresses (at least one)
	pub to: Vec<String>,
	pub reply_to: Option<String>,
	pub subject: String,
	pub html: String,
	pub text: String,
}

impl MailMessage {
	/// Checks the invariant every message must satisfy before it enters
	/// the transport: at least one recipient and non-empty subject and
	/// bodies.
	pub fn validate(&self) -> MgResult<()> {
		if self.to.is_empty() {
			return Err(Error::ValidationError("message has no recipients".into()));
		}
		if self.subject.is_empty() {
			return Err(Error::ValidationError("message subject is empty".into()));
		}
		if self.html.is_empty() || self.text.is_empty() {
			return Err(Error::ValidationError("message body is empty".into()));
		}
		Ok(())
	}
}

/// One entry of a mail request: the message plus transport-internal
/// options that are stripped before the request is returned to the caller
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailEnvelope {
	pub message: MailMessage,
	/// Opaque per-message transport options; internal, removed by
	/// response formatting
	#[serde(default)]
	pub options: Option<serde_json::Value>,
	/// Delivery status, attached by response formatting on success
	#[serde(default)]
	pub status: Option<DeliveryStatus>,
}

impl MailEnvelope {
	pub fn new(message: MailMessage) -> Self {
		Self { message, options: None, status: None }
	}
}

/// A mail-sending request. Callers supply exactly one envelope; on
/// success the same request comes back with `status` attached and
/// internal fields stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailRequest {
	pub mail: Vec<MailEnvelope>,
}

impl MailRequest {
	/// A request carrying a single message
	pub fn single(message: MailMessage) -> Self {
		Self { mail: vec![MailEnvelope::new(message)] }
	}
}

/// Caller-visible delivery status attached to an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatus {
	pub message: String,
}


// vim: ts=4
