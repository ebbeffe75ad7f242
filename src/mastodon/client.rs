//! Remote Mastodon API client
//!
//! The gateway only needs four read-only calls per status. They sit behind
//! the `MastodonClient` trait so the authorization and aggregation logic can
//! run against any implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::LINK;
use serde::de::DeserializeOwned;
use url::Url;

use super::models::{Account, Page, RemoteAccount, RemoteContext, RemoteStatus, Status};
use super::reference::StatusReference;
use crate::config::UpstreamConfig;
use crate::error::AppError;

/// Read access to the statuses of a remote Mastodon server
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MastodonClient: Send + Sync {
    /// Fetch a single status together with its author
    async fn fetch_status(&self, reference: &StatusReference) -> Result<Status, AppError>;

    /// Fetch the replies below a status, in upstream order
    async fn fetch_descendants(
        &self,
        reference: &StatusReference,
    ) -> Result<Vec<Status>, AppError>;

    /// Fetch one page of accounts that favourited a status
    async fn fetch_favourited_by(
        &self,
        reference: &StatusReference,
        cursor: Option<String>,
    ) -> Result<Page<Account>, AppError>;

    /// Fetch one page of accounts that boosted a status
    async fn fetch_boosted_by(
        &self,
        reference: &StatusReference,
        cursor: Option<String>,
    ) -> Result<Page<Account>, AppError>;
}

/// `MastodonClient` speaking the Mastodon REST API over HTTP
pub struct HttpMastodonClient {
    http_client: reqwest::Client,
}

impl HttpMastodonClient {
    /// Create a client with its own connection pool
    ///
    /// # Errors
    /// Returns error if the TLS backend cannot be initialized
    pub fn new(config: &UpstreamConfig) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self::with_http_client(http_client))
    }

    /// Wrap an existing reqwest client
    pub fn with_http_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn status_url(reference: &StatusReference, suffix: Option<&str>) -> String {
        match suffix {
            Some(suffix) => format!(
                "{}/api/v1/statuses/{}/{}",
                reference.origin(),
                reference.id(),
                suffix
            ),
            None => format!("{}/api/v1/statuses/{}", reference.origin(), reference.id()),
        }
    }

    /// GET `url` and decode the JSON body, returning the `Link` header too
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        cursor: Option<&str>,
    ) -> Result<(T, Option<String>), AppError> {
        use crate::metrics::{UPSTREAM_REQUEST_DURATION_SECONDS, UPSTREAM_REQUESTS_TOTAL};

        let mut request = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(max_id) = cursor {
            request = request.query(&[("max_id", max_id)]);
        }

        let started = Instant::now();
        let result = request.send().await;
        UPSTREAM_REQUEST_DURATION_SECONDS
            .with_label_values(&[endpoint])
            .observe(started.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                UPSTREAM_REQUESTS_TOTAL
                    .with_label_values(&[endpoint, "error"])
                    .inc();
                tracing::debug!(%url, %error, "Upstream request failed");
                return Err(error.into());
            }
        };

        let status = response.status();
        UPSTREAM_REQUESTS_TOTAL
            .with_label_values(&[endpoint, status.as_str()])
            .inc();
        tracing::debug!(%url, status = status.as_u16(), "Upstream responded");

        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "{url} responded with {status}"
            )));
        }

        let link = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.json::<T>().await?;

        Ok((body, link))
    }

    async fn fetch_accounts(
        &self,
        endpoint: &'static str,
        reference: &StatusReference,
        cursor: Option<String>,
    ) -> Result<Page<Account>, AppError> {
        let url = Self::status_url(reference, Some(endpoint));
        let (accounts, link): (Vec<RemoteAccount>, _) =
            self.get_json(endpoint, &url, cursor.as_deref()).await?;

        Ok(Page {
            items: accounts
                .into_iter()
                .map(|account| account.into_account(reference))
                .collect(),
            next: link.as_deref().and_then(next_page_cursor),
        })
    }
}

#[async_trait]
impl MastodonClient for HttpMastodonClient {
    async fn fetch_status(&self, reference: &StatusReference) -> Result<Status, AppError> {
        let url = Self::status_url(reference, None);
        let (status, _): (RemoteStatus, _) = self.get_json("status", &url, None).await?;
        Ok(status.into_status(reference))
    }

    async fn fetch_descendants(
        &self,
        reference: &StatusReference,
    ) -> Result<Vec<Status>, AppError> {
        let url = Self::status_url(reference, Some("context"));
        let (context, _): (RemoteContext, _) = self.get_json("context", &url, None).await?;
        Ok(context
            .descendants
            .into_iter()
            .map(|status| status.into_status(reference))
            .collect())
    }

    async fn fetch_favourited_by(
        &self,
        reference: &StatusReference,
        cursor: Option<String>,
    ) -> Result<Page<Account>, AppError> {
        self.fetch_accounts("favourited_by", reference, cursor).await
    }

    async fn fetch_boosted_by(
        &self,
        reference: &StatusReference,
        cursor: Option<String>,
    ) -> Result<Page<Account>, AppError> {
        self.fetch_accounts("reblogged_by", reference, cursor).await
    }
}

/// Extract the `max_id` of the `rel="next"` entry of a `Link` header
///
/// Mastodon paginates account listings with headers like
/// `<https://host/api/v1/statuses/1/favourited_by?max_id=42>; rel="next", <...>; rel="prev"`.
pub(crate) fn next_page_cursor(link: &str) -> Option<String> {
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let param = param.trim();
            param
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
                .unwrap_or(false)
        });
        if !is_next {
            return None;
        }

        Url::parse(target)
            .ok()?
            .query_pairs()
            .find(|(key, _)| key == "max_id")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_cursor_from_link_header() {
        let link = r#"<https://chaos.social/api/v1/statuses/1/favourited_by?max_id=4242>; rel="next", <https://chaos.social/api/v1/statuses/1/favourited_by?min_id=4300>; rel="prev""#;
        assert_eq!(next_page_cursor(link), Some("4242".to_string()));
    }

    #[test]
    fn prev_only_link_ends_pagination() {
        let link = r#"<https://chaos.social/api/v1/statuses/1/favourited_by?min_id=4300>; rel="prev""#;
        assert_eq!(next_page_cursor(link), None);
    }

    #[test]
    fn malformed_link_is_ignored() {
        assert_eq!(next_page_cursor(""), None);
        assert_eq!(next_page_cursor("garbage; rel=\"next\""), None);
        assert_eq!(
            next_page_cursor("<https://chaos.social/x?since_id=1>; rel=\"next\""),
            None
        );
    }

    #[test]
    fn status_urls() {
        let reference = StatusReference::parse("https://chaos.social/@zerok/123").unwrap();
        assert_eq!(
            HttpMastodonClient::status_url(&reference, None),
            "https://chaos.social/api/v1/statuses/123"
        );
        assert_eq!(
            HttpMastodonClient::status_url(&reference, Some("context")),
            "https://chaos.social/api/v1/statuses/123/context"
        );
    }
}
