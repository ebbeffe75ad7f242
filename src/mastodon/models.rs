//! Mastodon entities as served by the gateway
//!
//! `Remote*` types mirror the upstream JSON loosely (every field optional
//! or defaulted); the public types are what the gateway hands out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reference::StatusReference;

/// Account with a fully-qualified handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    /// Always `user@host`
    pub acct: String,
    pub avatar: String,
    pub url: String,
}

/// Status with its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    /// HTML content
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub url: String,
    pub account: Account,
}

/// One page of a cursor-paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page, `None` on the last page
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Account as returned by `/api/v1/accounts/...` style endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RemoteAccount {
    pub id: String,
    pub username: String,
    pub acct: String,
    pub avatar: String,
    pub avatar_static: String,
    pub url: String,
}

impl RemoteAccount {
    /// Convert, qualifying the handle against the server it came from
    pub fn into_account(self, reference: &StatusReference) -> Account {
        let avatar = if self.avatar_static.is_empty() {
            self.avatar
        } else {
            self.avatar_static
        };

        Account {
            acct: reference.qualify_acct(&self.acct),
            id: self.id,
            username: self.username,
            avatar,
            url: self.url,
        }
    }
}

/// Status as returned by `/api/v1/statuses/:id`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RemoteStatus {
    pub id: String,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub account: RemoteAccount,
}

impl RemoteStatus {
    pub fn into_status(self, reference: &StatusReference) -> Status {
        Status {
            id: self.id,
            content: self.content,
            created_at: self.created_at,
            url: self.url.unwrap_or_default(),
            account: self.account.into_account(reference),
        }
    }
}

/// Body of `/api/v1/statuses/:id/context`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RemoteContext {
    pub descendants: Vec<RemoteStatus>,
}
