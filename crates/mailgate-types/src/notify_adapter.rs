//! Adapter for the operator-facing notification sink.
//!
//! Fire-and-forget from the dispatcher's perspective: a failed
//! notification is logged and never allowed to mask the error that
//! triggered it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
	Warn,
	Info,
}

/// A structured notification record for operators
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Notification {
	#[serde(rename = "type")]
	pub typ: NotificationType,
	pub message: Box<str>,
	/// Internal notifications are created by the system itself, not a user
	pub internal: bool,
}

impl Notification {
	/// An internal operator warning
	pub fn warn(message: impl Into<Box<str>>) -> Self {
		Self { typ: NotificationType::Warn, message: message.into(), internal: true }
	}
}

#[async_trait]
pub trait NotifyAdapter: Debug + Send + Sync {
	/// Records a notification
	async fn add_notification(&self, notification: Notification) -> MgResult<()>;
}


// vim: ts=4
