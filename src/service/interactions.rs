//! Interaction aggregation
//!
//! Fetches replies, favourites and boosts of an authorized status and merges
//! them into one response.

use std::sync::Arc;

use serde::Serialize;

use crate::error::AppError;
use crate::mastodon::{Account, MastodonClient, Page, Status, StatusReference};

/// Everything the gateway knows about the reactions to a status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interactions {
    pub descendants: Vec<Status>,
    #[serde(rename = "favorited_by")]
    pub favourited_by: Vec<Account>,
    pub boosted_by: Vec<Account>,
}

/// Paginated account listings attached to a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountListing {
    FavouritedBy,
    BoostedBy,
}

impl AccountListing {
    fn label(self) -> &'static str {
        match self {
            AccountListing::FavouritedBy => "favourited_by",
            AccountListing::BoostedBy => "boosted_by",
        }
    }
}

/// Interaction service
///
/// Callers must have authorized the reference beforehand.
pub struct InteractionService {
    client: Arc<dyn MastodonClient>,
    /// Upper bound on pages followed per account listing
    max_pages: usize,
}

impl InteractionService {
    /// Create new interaction service
    pub fn new(client: Arc<dyn MastodonClient>, max_pages: usize) -> Self {
        Self {
            client,
            max_pages: max_pages.max(1),
        }
    }

    /// Replies below the status, in upstream order
    pub async fn descendants(&self, reference: &StatusReference) -> Result<Vec<Status>, AppError> {
        self.client.fetch_descendants(reference).await
    }

    /// Accounts that favourited the status, all pages
    pub async fn favourited_by(
        &self,
        reference: &StatusReference,
    ) -> Result<Vec<Account>, AppError> {
        self.collect_accounts(reference, AccountListing::FavouritedBy)
            .await
    }

    /// Accounts that boosted the status, all pages
    pub async fn boosted_by(&self, reference: &StatusReference) -> Result<Vec<Account>, AppError> {
        self.collect_accounts(reference, AccountListing::BoostedBy)
            .await
    }

    /// Replies, favourites and boosts in one go
    ///
    /// The three fetches run concurrently and all of them run to completion.
    /// If any of them fails the whole call fails and the partial data is
    /// dropped; the first error in field order is returned.
    ///
    /// # Errors
    /// The first failing sub-fetch's error
    pub async fn interactions(&self, reference: &StatusReference) -> Result<Interactions, AppError> {
        let (descendants, favourited_by, boosted_by) = tokio::join!(
            self.descendants(reference),
            self.favourited_by(reference),
            self.boosted_by(reference),
        );

        for (part, error) in [
            ("descendants", descendants.as_ref().err()),
            ("favourited_by", favourited_by.as_ref().err()),
            ("boosted_by", boosted_by.as_ref().err()),
        ] {
            if let Some(error) = error {
                tracing::warn!(reference = %reference, part, %error, "Interaction fetch failed");
            }
        }

        Ok(Interactions {
            descendants: descendants?,
            favourited_by: favourited_by?,
            boosted_by: boosted_by?,
        })
    }

    async fn fetch_page(
        &self,
        reference: &StatusReference,
        listing: AccountListing,
        cursor: Option<String>,
    ) -> Result<Page<Account>, AppError> {
        match listing {
            AccountListing::FavouritedBy => self.client.fetch_favourited_by(reference, cursor).await,
            AccountListing::BoostedBy => self.client.fetch_boosted_by(reference, cursor).await,
        }
    }

    /// Follow page cursors until the upstream reports no next page
    async fn collect_accounts(
        &self,
        reference: &StatusReference,
        listing: AccountListing,
    ) -> Result<Vec<Account>, AppError> {
        let mut accounts = Vec::new();
        let mut cursor = None;

        for _ in 0..self.max_pages {
            let page = self.fetch_page(reference, listing, cursor).await?;
            accounts.extend(page.items);

            match page.next.filter(|next| !next.is_empty()) {
                Some(next) => cursor = Some(next),
                None => return Ok(accounts),
            }
        }

        tracing::warn!(
            reference = %reference,
            listing = listing.label(),
            max_pages = self.max_pages,
            "Pagination limit reached"
        );
        Err(AppError::TooManyPages(self.max_pages))
    }
}
