//! Adapter for the user and site-configuration store.
//!
//! The dispatch core uses this to resolve the acting user's email address,
//! the configured administrator account, and the site display title. The
//! backing store (SQL, config file, remote service) is the adapter's
//! concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::prelude::*;

/// The well-known administrator account record
pub const ADMIN_USER_ID: UserId = UserId(1);

/// A user record as resolved by the store
#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
	pub user_id: UserId,
	pub email: Box<str>,
	pub name: Option<Box<str>>,
}

/// Site-wide configuration relevant to outbound mail
#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
	/// Display name of the site, used in generated subjects
	pub title: Box<str>,
	pub url: Option<Box<str>>,
}

#[async_trait]
pub trait MetaAdapter: Debug + Send + Sync {
	/// Resolves a user by id
	///
	/// Returns `Error::NotFound` if no such record exists.
	async fn read_user(&self, user_id: UserId) -> MgResult<UserRecord>;

	/// Reads the site configuration
	async fn read_site_config(&self) -> MgResult<SiteConfig>;
}

// vim: ts=4
