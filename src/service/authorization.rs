//! Root-author authorization
//!
//! Decides whether a thread may be served by checking the author of its root
//! status against the configured allow-list. Decisions are cached per
//! canonical status reference.

use std::sync::Arc;

use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::error::AppError;
use crate::mastodon::{MastodonClient, StatusReference};

/// Allow-list check with a bounded LRU decision cache
///
/// Cached decisions never expire. A status that could not be fetched is
/// cached as denied, so an upstream outage keeps denying that status until
/// its entry is evicted.
///
/// The capacity bound is enforced by moka's maintenance pass, which runs
/// lazily; it is forced after every insert so the bound and the size gauge
/// hold once `is_authorized` returns.
pub struct AuthorizationGate {
    /// Fully-qualified handles (user@host)
    allowed_root_accounts: Vec<String>,
    /// Canonical reference -> decision
    decisions: Cache<String, bool>,
    client: Arc<dyn MastodonClient>,
}

impl AuthorizationGate {
    /// Create new authorization gate
    ///
    /// # Arguments
    /// * `allowed_root_accounts` - Allowed handles; empty allows everything
    /// * `cache_capacity` - Maximum number of cached decisions
    /// * `client` - Used to resolve the root author on cache miss
    pub fn new(
        allowed_root_accounts: Vec<String>,
        cache_capacity: u64,
        client: Arc<dyn MastodonClient>,
    ) -> Self {
        let decisions = Cache::builder()
            .max_capacity(cache_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            allowed_root_accounts,
            decisions,
            client,
        }
    }

    /// Check whether the root author of `reference` is allowed
    pub async fn is_authorized(&self, reference: &StatusReference) -> bool {
        use crate::metrics::{
            AUTHORIZATION_CACHE_SIZE, AUTHORIZATION_DECISIONS_TOTAL, CACHE_HITS_TOTAL,
            CACHE_MISSES_TOTAL,
        };

        if self.allowed_root_accounts.is_empty() {
            AUTHORIZATION_DECISIONS_TOTAL
                .with_label_values(&["open", "allowed"])
                .inc();
            return true;
        }

        let key = reference.canonical();
        if let Some(allowed) = self.decisions.get(key).await {
            CACHE_HITS_TOTAL.with_label_values(&["authorization"]).inc();
            AUTHORIZATION_DECISIONS_TOTAL
                .with_label_values(&["cache", outcome_label(allowed)])
                .inc();
            tracing::debug!(reference = %reference, allowed, "Authorization cache hit");
            return allowed;
        }
        CACHE_MISSES_TOTAL
            .with_label_values(&["authorization"])
            .inc();

        let allowed = match self.client.fetch_status(reference).await {
            Ok(status) => {
                let allowed = self.is_allowed_account(&status.account.acct);
                tracing::debug!(
                    reference = %reference,
                    root_author = %status.account.acct,
                    allowed,
                    "Resolved root author"
                );
                allowed
            }
            Err(error) => {
                tracing::warn!(
                    reference = %reference,
                    %error,
                    "Could not resolve root status; caching denial"
                );
                false
            }
        };

        self.decisions.insert(key.to_string(), allowed).await;
        self.decisions.run_pending_tasks().await;
        AUTHORIZATION_CACHE_SIZE.set(self.decisions.entry_count() as i64);
        AUTHORIZATION_DECISIONS_TOTAL
            .with_label_values(&["remote", outcome_label(allowed)])
            .inc();

        allowed
    }

    /// Like [`is_authorized`](Self::is_authorized), as a `Result`
    ///
    /// # Errors
    /// `AppError::AuthorizationDenied` for denied and unresolvable statuses alike
    pub async fn authorize(&self, reference: &StatusReference) -> Result<(), AppError> {
        if self.is_authorized(reference).await {
            Ok(())
        } else {
            Err(AppError::AuthorizationDenied)
        }
    }

    /// Number of allow-list entries
    pub fn allowed_root_account_count(&self) -> usize {
        self.allowed_root_accounts.len()
    }

    fn is_allowed_account(&self, acct: &str) -> bool {
        self.allowed_root_accounts
            .iter()
            .any(|allowed| allowed == acct)
    }
}

fn outcome_label(allowed: bool) -> &'static str {
    if allowed { "allowed" } else { "denied" }
}
