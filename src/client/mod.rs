// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Paywall HTTP Client
//!
//! Typed client for the reader-facing endpoints. Reads of access state,
//! balance and transaction history are cached by query key (the request
//! path and query string). A successful unlock drops every cached key the
//! unlock made stale, so the next read goes to the server. Every
//! invalidation bumps a generation counter; a read that was in flight
//! across an invalidation returns its value but does not cache it.
//!
//! Server errors (5xx) and transport failures are retried with exponential
//! backoff. Everything else is returned as is. Retrying an unlock is safe:
//! a duplicate attempt fails with `AlreadyUnlocked` and debits nothing.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ErrorBody;
use crate::models::{ChapterId, TransactionListResponse, UnlockResponse};
use crate::paywall::invalidation::{self, BALANCE_PATH, TRANSACTIONS_PATH};
use crate::paywall::AccessDecision;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("chapter already unlocked")]
    AlreadyUnlocked,

    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("server error ({status}): {message}")]
    Internal { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// Only server-side failures and transport errors are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal { .. } | Self::Transport(_))
    }

    fn from_response(status: StatusCode, body: Option<ErrorBody>) -> Self {
        let code = body.as_ref().map(|b| b.code.as_str()).unwrap_or_default();
        let message = body
            .as_ref()
            .map(|b| b.message.clone())
            .unwrap_or_else(|| status.to_string());

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::PAYMENT_REQUIRED => Self::InsufficientBalance(message),
            StatusCode::CONFLICT if code == "already_unlocked" => Self::AlreadyUnlocked,
            s if s.is_server_error() => Self::Internal {
                status: s.as_u16(),
                message,
            },
            _ => Self::Validation(message),
        }
    }
}

/// Exponential backoff for retryable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[derive(Default)]
struct ResponseCache {
    entries: HashMap<String, Value>,
    generation: u64,
}

/// Client for one authenticated user.
pub struct PaywallClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    retry: RetryPolicy,
    cache: Mutex<ResponseCache>,
}

impl PaywallClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            token: token.into(),
            retry: RetryPolicy::default(),
            cache: Mutex::new(ResponseCache::default()),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // =========================================================================
    // Reads (cached)
    // =========================================================================

    pub async fn access(&self, chapter_id: &ChapterId) -> Result<AccessDecision, ClientError> {
        self.cached_get(invalidation::access_path(chapter_id)).await
    }

    pub async fn balance(&self) -> Result<u64, ClientError> {
        let value: Value = self.cached_get(BALANCE_PATH.to_string()).await?;
        value
            .get("balance")
            .and_then(Value::as_u64)
            .ok_or_else(|| ClientError::Decode("missing balance".to_string()))
    }

    pub async fn transactions(
        &self,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<TransactionListResponse, ClientError> {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(cursor) = cursor {
            query.append_pair("cursor", cursor);
        }
        if let Some(limit) = limit {
            query.append_pair("limit", &limit.to_string());
        }
        let query = query.finish();
        let key = if query.is_empty() {
            TRANSACTIONS_PATH.to_string()
        } else {
            format!("{TRANSACTIONS_PATH}?{query}")
        };
        self.cached_get(key).await
    }

    // =========================================================================
    // Unlock
    // =========================================================================

    /// Unlock a chapter and drop every cached read it made stale.
    ///
    /// `AlreadyUnlocked` also drops them: the cached state was evidently out
    /// of date, for instance because an earlier attempt's response was lost.
    pub async fn unlock(&self, chapter_id: &ChapterId) -> Result<UnlockResponse, ClientError> {
        let path = invalidation::unlock_path(chapter_id);
        let result: Result<UnlockResponse, ClientError> =
            self.send_with_retry(Method::POST, &path).await;

        let mut stale = invalidation::stale_after_unlock(chapter_id);
        match &result {
            Ok(response) => stale.extend(response.invalidates.iter().cloned()),
            Err(ClientError::AlreadyUnlocked) => {}
            Err(_) => return result,
        }
        for path in &stale {
            self.invalidate(path);
        }
        result
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// Drop `path` and every cached variant of it with a query string.
    pub fn invalidate(&self, path: &str) {
        let prefix = format!("{path}?");
        let mut cache = self.lock_cache();
        cache.generation += 1;
        cache
            .entries
            .retain(|key, _| key != path && !key.starts_with(&prefix));
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.lock_cache().entries.contains_key(key)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn cached_get<T: DeserializeOwned>(&self, key: String) -> Result<T, ClientError> {
        let (hit, generation) = {
            let cache = self.lock_cache();
            (cache.entries.get(&key).cloned(), cache.generation)
        };
        if let Some(value) = hit {
            debug!(key = %key, "Client cache hit");
            return serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()));
        }

        let value: Value = self.send_with_retry(Method::GET, &key).await?;
        let typed = serde_json::from_value(value.clone())
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        let mut cache = self.lock_cache();
        if cache.generation == generation {
            cache.entries.insert(key, value);
        } else {
            debug!(key = %key, "Read overlapped an invalidation, not caching");
        }
        Ok(typed)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn send_with_retry<T: DeserializeOwned>(
        &self,
        method: Method,
        path_and_query: &str,
    ) -> Result<T, ClientError> {
        let url = self.base_url.join(path_and_query)?;
        let mut attempt = 0;
        loop {
            match self.send_once(method.clone(), url.clone()).await {
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(url = %url, attempt, error = %e, delay_ms = delay.as_millis() as u64, "Retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(&self, method: Method, url: Url) -> Result<T, ClientError> {
        let response = self
            .http
            .request(method, url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        let body = response.json::<ErrorBody>().await.ok();
        Err(ClientError::from_response(status, body))
    }
}
