//! Status reference normalization
//!
//! Turns user-supplied status URLs such as
//! `https://chaos.social/@zerok/105475673515689340?foo=bar` into a canonical
//! form that doubles as upstream address and cache key.

use std::fmt;

use url::Url;

use crate::error::AppError;

/// Number of `/`-separated path segments kept in the canonical form
///
/// The leading empty segment counts, so `/@user/123` is `["", "@user", "123"]`.
const CANONICAL_SEGMENTS: usize = 3;

/// Normalized reference to a status on a remote server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusReference {
    /// `scheme://host[:port]`
    origin: String,
    /// `host[:port]`, used to qualify local handles
    authority: String,
    /// Status identifier on the origin server
    id: String,
    /// origin + first three path segments + trailing `/`
    canonical: String,
}

impl StatusReference {
    /// Parse and normalize a raw status reference
    ///
    /// Query parameters, fragments and any path segment past the status id
    /// are dropped.
    ///
    /// # Errors
    /// `AppError::Normalization` if the input is not an absolute URL with a
    /// host, or its path does not carry a status id.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let url = Url::parse(raw.trim()).map_err(|e| AppError::Normalization(e.to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| AppError::Normalization("status URL has no host".to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let origin = format!("{}://{}", url.scheme(), authority);

        let segments: Vec<&str> = url.path().split('/').take(CANONICAL_SEGMENTS).collect();
        if segments.len() < CANONICAL_SEGMENTS {
            return Err(AppError::Normalization(
                "not enough segments in the status URL".to_string(),
            ));
        }

        let id = segments[CANONICAL_SEGMENTS - 1];
        if id.is_empty() {
            return Err(AppError::Normalization(
                "status URL does not contain a status id".to_string(),
            ));
        }

        let canonical = format!("{}{}/", origin, segments.join("/"));

        Ok(Self {
            origin,
            authority,
            id: id.to_string(),
            canonical,
        })
    }

    /// Server base URL (`scheme://host[:port]`)
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Status identifier on the origin server
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical string, stable across equivalent inputs
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Qualify a handle returned by this reference's server
    ///
    /// See [`normalize_acct`].
    pub fn qualify_acct(&self, acct: &str) -> String {
        qualify(&self.authority, acct)
    }
}

impl fmt::Display for StatusReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Bring an account handle into `user@host` form
///
/// Handles that already contain `@` point at a foreign server and are kept
/// as they are. Local handles get the host of `server` appended.
///
/// # Errors
/// `AppError::Normalization` if `server` is not a URL with a host.
pub fn normalize_acct(server: &str, acct: &str) -> Result<String, AppError> {
    if acct.contains('@') {
        return Ok(acct.to_string());
    }

    let url = Url::parse(server).map_err(|e| AppError::Normalization(e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| AppError::Normalization("server URL has no host".to_string()))?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    Ok(qualify(&authority, acct))
}

fn qualify(authority: &str, acct: &str) -> String {
    if acct.contains('@') {
        acct.to_string()
    } else {
        format!("{acct}@{authority}")
    }
}
