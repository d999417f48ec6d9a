//! Adapter for the authorization gate.
//!
//! The dispatch core consults this as a single pass/fail check before any
//! mail is touched. Policy evaluation itself (roles, scopes, ownership)
//! lives behind the adapter.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

#[async_trait]
pub trait AuthAdapter: Debug + Send + Sync {
	/// Verifies that the context's principal may perform `action` on
	/// `resource` (e.g. "send" on "mail").
	///
	/// Returns `Error::PermissionDenied` on refusal.
	async fn check_permission(
		&self,
		ctx: &RequestCtx,
		resource: &str,
		action: &str,
	) -> MgResult<()>;
}

// vim: ts=4
