//! SMTP delivery using lettre.
//!
//! The dispatcher only depends on the `Transport` trait; `SmtpSender` is
//! the production implementation. A sender is constructed once at process
//! start and shared; `send` takes `&self` and keeps no per-call state, so
//! concurrent deliveries are safe.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::AsyncSmtpTransport;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use crate::prelude::*;
use crate::settings::{MailSettings, TlsMode};
use crate::MailMessage;

/// Port used in direct mode when talking to the local mail exchange
const DIRECT_MODE_PORT: u16 = 25;

/// The transport's report for one accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
	/// Human-readable status, e.g. the SMTP response line
	pub message: String,
}

/// Hands a fully-formed message to an external delivery mechanism
#[async_trait]
pub trait Transport: Send + Sync {
	/// Delivers one message.
	///
	/// Fails with `Error::Delivery` when the underlying mechanism refuses
	/// the hand-off, `Error::ValidationError` when the message violates
	/// the transport invariant.
	async fn send(&self, message: &MailMessage) -> MgResult<DeliveryResult>;

	/// Whether this transport operates without a relay, talking directly
	/// to a mail exchange. Used only to decide whether delivery failures
	/// raise an operator warning.
	fn uses_direct(&self) -> bool;
}

/// SMTP transport built from `MailSettings`
pub struct SmtpSender {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from: Mailbox,
	uses_direct: bool,
}

impl SmtpSender {
	/// Builds the sender from settings. Relay host, credentials, and TLS
	/// mode are fixed here for the lifetime of the process.
	pub fn new(settings: &MailSettings) -> MgResult<Self> {
		let from: Mailbox = settings
			.from_mailbox()
			.parse()
			.map_err(|_| Error::ConfigError(format!("invalid from address: {}", settings.from_address)))?;

		let uses_direct = settings.uses_direct();
		let host = settings.host.as_deref().unwrap_or("localhost");
		let port = if uses_direct { DIRECT_MODE_PORT } else { settings.port };

		// Direct mode talks to the local mail exchange without TLS
		let tls = if uses_direct {
			Tls::None
		} else {
			match settings.tls_mode {
				TlsMode::None => Tls::None,
				TlsMode::StartTls => Tls::Opportunistic(
					TlsParameters::new(host.to_string())
						.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?,
				),
				TlsMode::Tls => Tls::Wrapper(
					TlsParameters::new(host.to_string())
						.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?,
				),
			}
		};

		let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
			.port(port)
			.timeout(Some(Duration::from_secs(settings.timeout_seconds)))
			.tls(tls);

		if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
		}

		Ok(Self { transport: builder.build(), from, uses_direct })
	}

	/// Builds a lettre Message from our MailMessage
	fn build_message(&self, message: &MailMessage) -> MgResult<Message> {
		message.validate()?;

		let mut builder = Message::builder().from(self.from.clone());

		for to in &message.to {
			let mailbox: Mailbox = to
				.parse()
				.map_err(|_| Error::ValidationError(format!("invalid recipient address: {}", to)))?;
			builder = builder.to(mailbox);
		}

		if let Some(reply_to) = &message.reply_to {
			let mailbox: Mailbox = reply_to.parse().map_err(|_| {
				Error::ValidationError(format!("invalid reply-to address: {}", reply_to))
			})?;
			builder = builder.reply_to(mailbox);
		}

		builder
			.subject(&message.subject)
			.multipart(MultiPart::alternative_plain_html(
				message.text.clone(),
				message.html.clone(),
			))
			.map_err(|e| Error::ValidationError(format!("failed to build email: {}", e)))
	}
}

#[async_trait]
impl Transport for SmtpSender {
	async fn send(&self, message: &MailMessage) -> MgResult<DeliveryResult> {
		let email = self.build_message(message)?;
		debug!("Sending email to {:?} (direct: {})", message.to, self.uses_direct);

		match self.transport.send(email).await {
			Ok(response) => {
				let status = response.first_line().unwrap_or("message accepted").to_string();
				info!("Email sent to {:?} ({})", message.to, status);
				Ok(DeliveryResult { message: status })
			}
			Err(e) => {
				warn!("Failed to send email to {:?}: {}", message.to, e);
				Err(Error::Delivery(e.to_string()))
			}
		}
	}

	fn uses_direct(&self) -> bool {
		self.uses_direct
	}
}


// vim: ts=4
