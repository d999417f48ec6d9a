//! Outbound mail configuration.
//!
//! Settings are deserialized once at startup and handed to the
//! constructors of the SMTP sender and the template engine. Direct mode
//! is derived, not configured: a deployment without a relay host talks
//! straight to the local mail exchange, which is less reliable and makes
//! delivery failures raise an operator warning.

use serde::Deserialize;

/// TLS mode for the SMTP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
	None,
	StartTls,
	Tls,
}

/// Configuration for outbound mail
#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
	/// SMTP relay host. When absent, mail is handed to the local mail
	/// exchange directly (direct mode).
	pub host: Option<String>,

	#[serde(default = "default_port")]
	pub port: u16,

	pub username: Option<String>,
	pub password: Option<String>,

	/// Sender address for all outbound mail
	pub from_address: String,

	/// Optional display name for the sender
	pub from_name: Option<String>,

	#[serde(default = "default_tls")]
	pub tls_mode: TlsMode,

	#[serde(default = "default_timeout")]
	pub timeout_seconds: u64,

	/// Directory containing the `.html.hbs` / `.txt.hbs` template pairs
	pub template_dir: String,
}

fn default_port() -> u16 {
	587
}

fn default_tls() -> TlsMode {
	TlsMode::StartTls
}

fn default_timeout() -> u64 {
	10
}

impl MailSettings {
	/// True when no relay is configured and mail goes straight to a mail
	/// exchange
	pub fn uses_direct(&self) -> bool {
		self.host.is_none()
	}

	/// Sender mailbox string, with display name when configured
	pub fn from_mailbox(&self) -> String {
		match &self.from_name {
			Some(name) => format!("{} <{}>", name, self.from_address),
			None => self.from_address.clone(),
		}
	}
}


// vim: ts=4
