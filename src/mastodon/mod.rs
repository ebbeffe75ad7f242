//! Mastodon module
//!
//! Handles:
//! - Status reference normalization
//! - Account handle qualification
//! - Remote Mastodon API access

mod client;
mod models;
mod reference;

#[cfg(test)]
pub use client::MockMastodonClient;
pub use client::{HttpMastodonClient, MastodonClient};
pub use models::{Account, Page, Status};
pub use reference::{StatusReference, normalize_acct};
