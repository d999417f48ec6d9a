//! Mail dispatcher: the public send / send-test / send-contact workflows.
//!
//! The dispatcher composes the pipeline runner, the transport, the
//! content renderer, and the collaborator adapters. All collaborators are
//! injected at construction and held for the dispatcher's lifetime; there
//! is no lazily-initialized global state.
//!
//! Every delivery goes through the failure-notification hook: when the
//! transport runs in direct mode and refuses a hand-off, one operator
//! warning is recorded before the original delivery error is re-raised.
//! The warning itself is best-effort and never masks that error.

use async_trait::async_trait;
use std::sync::Arc;

use mailgate_types::auth_adapter::AuthAdapter;
use mailgate_types::meta_adapter::{ADMIN_USER_ID, MetaAdapter};
use mailgate_types::notify_adapter::{Notification, NotifyAdapter};

use crate::pipeline::{Pipeline, Step};
use crate::prelude::*;
use crate::sender::{DeliveryResult, SmtpSender, Transport};
use crate::settings::MailSettings;
use crate::template::{ContentRenderer, TemplateEngine, TemplateId};
use crate::{DeliveryStatus, MailMessage, MailRequest};

use serde::{Deserialize, Serialize};

/// Resource name the authorization gate is consulted for
const MAIL_RESOURCE: &str = "mail";

/// Subject of the operator-triggered test email
pub const TEST_EMAIL_SUBJECT: &str = "Test Mailgate Email";

/// Where the delivery-failure warning points operators to
const MAIL_CONFIG_DOCS_URL: &str = "https://mailgate.dev/docs/mail-config";

/// Contact-form submission, as posted by the frontend
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
	pub first_name: String,
	pub last_name: String,
	/// Address the confirmation email is sent to
	pub email: String,
	/// Address the administrator's reply should go to
	pub contact: String,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub schedule: Option<String>,
	/// Message body typed by the submitter
	pub text: String,
}

/// Value threaded through the `send` pipeline
struct SendState {
	request: MailRequest,
	result: Option<DeliveryResult>,
}

/// Authorization gate: aborts the pipeline before any mail is touched
struct PermissionStep {
	auth_adapter: Arc<dyn AuthAdapter>,
}

#[async_trait]
impl Step<SendState, RequestCtx> for PermissionStep {
	async fn execute(&self, input: SendState, ctx: &RequestCtx) -> MgResult<SendState> {
		self.auth_adapter.check_permission(ctx, MAIL_RESOURCE, "send").await?;
		Ok(input)
	}
}

/// Delivers the request's message through the failure-notification hook
struct DeliverStep {
	transport: Arc<dyn Transport>,
	notify_adapter: Arc<dyn NotifyAdapter>,
}

#[async_trait]
impl Step<SendState, RequestCtx> for DeliverStep {
	async fn execute(&self, mut input: SendState, _ctx: &RequestCtx) -> MgResult<SendState> {
		let envelope = input
			.request
			.mail
			.first()
			.ok_or_else(|| Error::ValidationError("mail request contains no message".into()))?;

		let result =
			deliver(&*self.transport, &*self.notify_adapter, &envelope.message).await?;
		input.result = Some(result);
		Ok(input)
	}
}

/// Strips transport-internal fields and attaches the delivery status
struct FormatStep;

#[async_trait]
impl Step<SendState, RequestCtx> for FormatStep {
	async fn execute(&self, mut input: SendState, _ctx: &RequestCtx) -> MgResult<SendState> {
		let result = input
			.result
			.take()
			.ok_or_else(|| Error::ValidationError("no delivery result to format".into()))?;

		if let Some(envelope) = input.request.mail.first_mut() {
			envelope.options = None;
			envelope.status = Some(DeliveryStatus { message: result.message });
		}
		Ok(input)
	}
}

/// Delivery wrapper shared by every workflow.
///
/// On a delivery failure in direct mode, records one operator warning and
/// re-raises the original error. A failing notification sink is logged
/// and never replaces the delivery error.
async fn deliver(
	transport: &dyn Transport,
	notify_adapter: &dyn NotifyAdapter,
	message: &MailMessage,
) -> MgResult<DeliveryResult> {
	match transport.send(message).await {
		Ok(result) => Ok(result),
		Err(err) => {
			if matches!(err, Error::Delivery(_)) && transport.uses_direct() {
				let warning = Notification::warn(format!(
					"Mailgate is currently unable to send email. See {} for instructions.",
					MAIL_CONFIG_DOCS_URL
				));
				if let Err(notify_err) = notify_adapter.add_notification(warning).await {
					warn!("Failed to record delivery warning: {}", notify_err);
				}
			}
			Err(err)
		}
	}
}

/// Orchestrates authorization, content generation, and delivery
pub struct MailDispatcher {
	transport: Arc<dyn Transport>,
	renderer: Arc<dyn ContentRenderer>,
	auth_adapter: Arc<dyn AuthAdapter>,
	meta_adapter: Arc<dyn MetaAdapter>,
	notify_adapter: Arc<dyn NotifyAdapter>,
}

impl MailDispatcher {
	pub fn new(
		transport: Arc<dyn Transport>,
		renderer: Arc<dyn ContentRenderer>,
		auth_adapter: Arc<dyn AuthAdapter>,
		meta_adapter: Arc<dyn MetaAdapter>,
		notify_adapter: Arc<dyn NotifyAdapter>,
	) -> Self {
		Self { transport, renderer, auth_adapter, meta_adapter, notify_adapter }
	}

	/// Wires the production transport and template engine from settings
	pub fn from_settings(
		settings: &MailSettings,
		auth_adapter: Arc<dyn AuthAdapter>,
		meta_adapter: Arc<dyn MetaAdapter>,
		notify_adapter: Arc<dyn NotifyAdapter>,
	) -> MgResult<Self> {
		let transport = Arc::new(SmtpSender::new(settings)?);
		let renderer = Arc::new(TemplateEngine::new(&settings.template_dir));
		Ok(Self::new(transport, renderer, auth_adapter, meta_adapter, notify_adapter))
	}

	/// Sends the single message of `request`.
	///
	/// Pipeline: permission check, delivery, response formatting. On
	/// success the request comes back with `status` attached and
	/// internal fields stripped; on delivery failure formatting is
	/// skipped and the error propagates unchanged.
	pub async fn send(&self, request: MailRequest, ctx: &RequestCtx) -> MgResult<MailRequest> {
		let pipeline = Pipeline::new()
			.step(PermissionStep { auth_adapter: self.auth_adapter.clone() })
			.step(DeliverStep {
				transport: self.transport.clone(),
				notify_adapter: self.notify_adapter.clone(),
			})
			.step(FormatStep);

		let state = pipeline.run(SendState { request, result: None }, ctx).await?;
		Ok(state.request)
	}

	/// Sends a test email to the acting user.
	///
	/// No permission gate: invoked only from already-authorized internal
	/// call sites.
	pub async fn send_test(&self, ctx: &RequestCtx) -> MgResult<DeliveryResult> {
		let user_id = ctx.user.ok_or(Error::NotFound)?;
		let user = self.meta_adapter.read_user(user_id).await?;

		let content = self.renderer.render(TemplateId::Test, &serde_json::json!({})).await?;
		let message = MailMessage {
			to: vec![user.email.into()],
			reply_to: None,
			subject: TEST_EMAIL_SUBJECT.to_string(),
			html: content.html,
			text: content.text,
		};

		debug!("Sending test email to user {}", user_id);
		deliver(&*self.transport, &*self.notify_adapter, &message).await
	}

	/// Handles a contact-form submission: one email to the administrator,
	/// then a confirmation to the submitter.
	///
	/// The two sends are independent deliveries: a confirmation failure
	/// does not roll back the admin email, but any earlier failure aborts
	/// the remainder of the workflow.
	pub async fn send_contact(&self, form: ContactForm, _ctx: &RequestCtx) -> MgResult<()> {
		let admin = self.meta_adapter.read_user(ADMIN_USER_ID).await?;
		let site = self.meta_adapter.read_site_config().await?;

		let data = serde_json::json!({
			"blog_name": site.title,
			"first_name": form.first_name,
			"last_name": form.last_name,
			"email": form.email,
			"phone": form.phone,
			"schedule": form.schedule,
			"message": form.text,
		});

		let content = self.renderer.render(TemplateId::Contact, &data).await?;
		let admin_message = MailMessage {
			to: vec![admin.email.into()],
			reply_to: Some(form.contact.clone()),
			subject: format!("{} Contact", site.title),
			html: content.html,
			text: content.text,
		};
		deliver(&*self.transport, &*self.notify_adapter, &admin_message).await?;

		let content = self.renderer.render(TemplateId::ContactConfirm, &data).await?;
		let confirm_message = MailMessage {
			to: vec![form.email.clone()],
			reply_to: None,
			subject: format!("{} Contact Confirmation", site.title),
			html: content.html,
			text: content.text,
		};
		deliver(&*self.transport, &*self.notify_adapter, &confirm_message).await?;

		info!("Contact emails dispatched for {}", form.email);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::template::RenderedContent;
	use mailgate_types::meta_adapter::{SiteConfig, UserRecord};
	use std::collections::HashMap;
	use std::sync::Mutex;

	#[derive(Debug, Default)]
	struct RecordingTransport {
		sent: Mutex<Vec<MailMessage>>,
		fail: bool,
		direct: bool,
	}

	impl RecordingTransport {
		fn sent_count(&self) -> usize {
			self.sent.lock().unwrap().len()
		}

		fn sent_at(&self, index: usize) -> MailMessage {
			self.sent.lock().unwrap()[index].clone()
		}
	}

	#[async_trait]
	impl Transport for RecordingTransport {
		async fn send(&self, message: &MailMessage) -> MgResult<DeliveryResult> {
			self.sent.lock().unwrap().push(message.clone());
			if self.fail {
				Err(Error::Delivery("connection refused".to_string()))
			} else {
				Ok(DeliveryResult { message: "250 OK".to_string() })
			}
		}

		fn uses_direct(&self) -> bool {
			self.direct
		}
	}

	#[derive(Debug)]
	struct StaticAuth {
		allow: bool,
	}

	#[async_trait]
	impl AuthAdapter for StaticAuth {
		async fn check_permission(
			&self,
			_ctx: &RequestCtx,
			_resource: &str,
			_action: &str,
		) -> MgResult<()> {
			if self.allow { Ok(()) } else { Err(Error::PermissionDenied) }
		}
	}

	#[derive(Debug)]
	struct FakeMeta {
		users: HashMap<i64, UserRecord>,
		title: String,
	}

	impl FakeMeta {
		fn with_users(users: &[(i64, &str)]) -> Self {
			let users = users
				.iter()
				.map(|(id, email)| {
					(*id, UserRecord { user_id: UserId(*id), email: (*email).into(), name: None })
				})
				.collect();
			Self { users, title: "MySite".to_string() }
		}
	}

	#[async_trait]
	impl MetaAdapter for FakeMeta {
		async fn read_user(&self, user_id: UserId) -> MgResult<UserRecord> {
			self.users.get(&user_id.0).cloned().ok_or(Error::NotFound)
		}

		async fn read_site_config(&self) -> MgResult<SiteConfig> {
			Ok(SiteConfig { title: self.title.clone().into(), url: None })
		}
	}

	#[derive(Debug, Default)]
	struct RecordingNotify {
		notifications: Mutex<Vec<Notification>>,
		fail: bool,
	}

	#[async_trait]
	impl NotifyAdapter for RecordingNotify {
		async fn add_notification(&self, notification: Notification) -> MgResult<()> {
			if self.fail {
				return Err(Error::ConfigError("sink unavailable".to_string()));
			}
			self.notifications.lock().unwrap().push(notification);
			Ok(())
		}
	}

	struct FakeRenderer {
		fail_on: Option<TemplateId>,
	}

	#[async_trait]
	impl ContentRenderer for FakeRenderer {
		async fn render(
			&self,
			template: TemplateId,
			_data: &serde_json::Value,
		) -> MgResult<RenderedContent> {
			if self.fail_on == Some(template) {
				return Err(Error::Render(format!("template not found: {}", template)));
			}
			Ok(RenderedContent {
				html: format!("<p>{}</p>", template),
				text: template.to_string(),
			})
		}
	}

	struct Harness {
		dispatcher: MailDispatcher,
		transport: Arc<RecordingTransport>,
		notify: Arc<RecordingNotify>,
	}

	struct HarnessOpts {
		allow: bool,
		fail_delivery: bool,
		direct: bool,
		fail_notify: bool,
		fail_render: Option<TemplateId>,
		users: Vec<(i64, &'static str)>,
	}

	impl Default for HarnessOpts {
		fn default() -> Self {
			Self {
				allow: true,
				fail_delivery: false,
				direct: false,
				fail_notify: false,
				fail_render: None,
				users: vec![(1, "admin@x.com"), (7, "a@example.com")],
			}
		}
	}

	fn harness(opts: HarnessOpts) -> Harness {
		let transport = Arc::new(RecordingTransport {
			sent: Mutex::new(Vec::new()),
			fail: opts.fail_delivery,
			direct: opts.direct,
		});
		let notify = Arc::new(RecordingNotify {
			notifications: Mutex::new(Vec::new()),
			fail: opts.fail_notify,
		});
		let dispatcher = MailDispatcher::new(
			transport.clone(),
			Arc::new(FakeRenderer { fail_on: opts.fail_render }),
			Arc::new(StaticAuth { allow: opts.allow }),
			Arc::new(FakeMeta::with_users(&opts.users)),
			notify.clone(),
		);
		Harness { dispatcher, transport, notify }
	}

	fn request() -> MailRequest {
		let mut request = MailRequest::single(MailMessage {
			to: vec!["user@example.com".to_string()],
			reply_to: None,
			subject: "Hello".to_string(),
			html: "<p>Hi</p>".to_string(),
			text: "Hi".to_string(),
		});
		request.mail[0].options = Some(serde_json::json!({ "raw": true }));
		request
	}

	fn contact_form() -> ContactForm {
		ContactForm {
			first_name: "Jo".to_string(),
			last_name: "Doe".to_string(),
			email: "jo@x.com".to_string(),
			contact: "jo@x.com".to_string(),
			phone: None,
			schedule: None,
			text: "hi".to_string(),
		}
	}

	#[tokio::test]
	async fn test_send_attaches_status_and_strips_options() {
		let h = harness(HarnessOpts::default());
		let ctx = RequestCtx::for_user(UserId(7));

		let response = h.dispatcher.send(request(), &ctx).await.unwrap();

		assert_eq!(
			response.mail[0].status,
			Some(DeliveryStatus { message: "250 OK".to_string() })
		);
		assert!(response.mail[0].options.is_none());
		assert_eq!(h.transport.sent_count(), 1);
	}

	#[tokio::test]
	async fn test_send_denied_never_touches_transport() {
		let h = harness(HarnessOpts { allow: false, ..Default::default() });
		let ctx = RequestCtx::for_user(UserId(7));

		let err = h.dispatcher.send(request(), &ctx).await.unwrap_err();
		assert!(matches!(err, Error::PermissionDenied));
		assert_eq!(h.transport.sent_count(), 0);
	}

	#[tokio::test]
	async fn test_send_empty_request_is_rejected() {
		let h = harness(HarnessOpts::default());
		let ctx = RequestCtx::for_user(UserId(7));

		let err = h
			.dispatcher
			.send(MailRequest { mail: Vec::new() }, &ctx)
			.await
			.unwrap_err();
		assert!(matches!(err, Error::ValidationError(_)));
		assert_eq!(h.transport.sent_count(), 0);
	}

	#[tokio::test]
	async fn test_direct_mode_failure_emits_one_warning() {
		let h = harness(HarnessOpts { fail_delivery: true, direct: true, ..Default::default() });
		let ctx = RequestCtx::for_user(UserId(7));

		let err = h.dispatcher.send(request(), &ctx).await.unwrap_err();
		assert!(matches!(err, Error::Delivery(_)));

		let notifications = h.notify.notifications.lock().unwrap();
		assert_eq!(notifications.len(), 1);
		assert!(notifications[0].message.contains("unable to send email"));
		assert!(notifications[0].message.contains("mail-config"));
		assert!(notifications[0].internal);
	}

	#[tokio::test]
	async fn test_relay_mode_failure_emits_no_warning() {
		let h = harness(HarnessOpts { fail_delivery: true, direct: false, ..Default::default() });
		let ctx = RequestCtx::for_user(UserId(7));

		let err = h.dispatcher.send(request(), &ctx).await.unwrap_err();
		assert!(matches!(err, Error::Delivery(_)));
		assert!(h.notify.notifications.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_notification_failure_never_masks_delivery_error() {
		let h = harness(HarnessOpts {
			fail_delivery: true,
			direct: true,
			fail_notify: true,
			..Default::default()
		});
		let ctx = RequestCtx::for_user(UserId(7));

		let err = h.dispatcher.send(request(), &ctx).await.unwrap_err();
		match err {
			Error::Delivery(msg) => assert_eq!(msg, "connection refused"),
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_send_twice_yields_independent_deliveries() {
		let h = harness(HarnessOpts::default());
		let ctx = RequestCtx::for_user(UserId(7));

		let first = h.dispatcher.send(request(), &ctx).await.unwrap();
		let second = h.dispatcher.send(request(), &ctx).await.unwrap();

		assert_eq!(h.transport.sent_count(), 2);
		assert_eq!(first.mail[0].status, second.mail[0].status);
	}

	#[tokio::test]
	async fn test_send_test_sends_to_resolved_user() {
		let h = harness(HarnessOpts::default());
		let ctx = RequestCtx::for_user(UserId(7));

		let result = h.dispatcher.send_test(&ctx).await.unwrap();
		assert_eq!(result.message, "250 OK");

		let sent = h.transport.sent_at(0);
		assert_eq!(sent.to, vec!["a@example.com".to_string()]);
		assert_eq!(sent.subject, TEST_EMAIL_SUBJECT);
		assert!(!sent.html.is_empty());
		assert!(!sent.text.is_empty());
	}

	#[tokio::test]
	async fn test_send_test_unknown_user_is_not_found() {
		let h = harness(HarnessOpts::default());
		let ctx = RequestCtx::for_user(UserId(99));

		let err = h.dispatcher.send_test(&ctx).await.unwrap_err();
		assert!(matches!(err, Error::NotFound));
		assert_eq!(h.transport.sent_count(), 0);
	}

	#[tokio::test]
	async fn test_send_test_requires_acting_user() {
		let h = harness(HarnessOpts::default());

		let err = h.dispatcher.send_test(&RequestCtx::internal()).await.unwrap_err();
		assert!(matches!(err, Error::NotFound));
	}

	#[tokio::test]
	async fn test_send_contact_sends_admin_then_confirmation() {
		let h = harness(HarnessOpts::default());

		h.dispatcher.send_contact(contact_form(), &RequestCtx::default()).await.unwrap();
		assert_eq!(h.transport.sent_count(), 2);

		let admin = h.transport.sent_at(0);
		assert_eq!(admin.to, vec!["admin@x.com".to_string()]);
		assert_eq!(admin.reply_to, Some("jo@x.com".to_string()));
		assert_eq!(admin.subject, "MySite Contact");

		let confirm = h.transport.sent_at(1);
		assert_eq!(confirm.to, vec!["jo@x.com".to_string()]);
		assert!(confirm.reply_to.is_none());
		assert_eq!(confirm.subject, "MySite Contact Confirmation");
	}

	#[tokio::test]
	async fn test_send_contact_admin_lookup_failure_sends_nothing() {
		let h = harness(HarnessOpts { users: vec![(7, "a@example.com")], ..Default::default() });

		let err = h
			.dispatcher
			.send_contact(contact_form(), &RequestCtx::default())
			.await
			.unwrap_err();
		assert!(matches!(err, Error::NotFound));
		assert_eq!(h.transport.sent_count(), 0);
	}

	#[tokio::test]
	async fn test_send_contact_render_failure_sends_nothing() {
		let h = harness(HarnessOpts {
			fail_render: Some(TemplateId::Contact),
			..Default::default()
		});

		let err = h
			.dispatcher
			.send_contact(contact_form(), &RequestCtx::default())
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Render(_)));
		assert_eq!(h.transport.sent_count(), 0);
	}

	#[tokio::test]
	async fn test_send_contact_confirm_render_failure_after_admin_send() {
		let h = harness(HarnessOpts {
			fail_render: Some(TemplateId::ContactConfirm),
			..Default::default()
		});

		let err = h
			.dispatcher
			.send_contact(contact_form(), &RequestCtx::default())
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Render(_)));
		// The admin email went out; the confirmation was never rendered
		assert_eq!(h.transport.sent_count(), 1);
	}

	#[tokio::test]
	async fn test_send_contact_admin_send_failure_skips_confirmation() {
		let h = harness(HarnessOpts { fail_delivery: true, ..Default::default() });

		let err = h
			.dispatcher
			.send_contact(contact_form(), &RequestCtx::default())
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Delivery(_)));
		assert_eq!(h.transport.sent_count(), 1);
	}
}

// vim: ts=4
