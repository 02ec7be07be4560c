// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Paywall Service
//!
//! Entitlement checks, unlocks, the currency ledger and the chapter catalog.
//!
//! All database work runs on the blocking pool. A spawned blocking task runs
//! to completion even if the request that started it is dropped, so an
//! unlock either commits and invalidates the cache, or does nothing.

pub mod access;
pub mod cache;
pub mod invalidation;

use std::sync::Arc;

use tracing::{info, warn};

pub use access::{decide, AccessDecision, AccessType};
pub use cache::AccessCache;

use crate::models::{
    Chapter, ChapterId, CreditResponse, TransactionListResponse, UnlockResponse,
    MAX_CREDIT_AMOUNT,
};
use crate::storage::{PaywallDb, PaywallDbError};

/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Service-level error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum PaywallError {
    #[error("{0}")]
    NotFound(String),

    #[error("chapter already unlocked")]
    AlreadyUnlocked,

    #[error("insufficient balance: have {balance}, need {cost}")]
    InsufficientBalance { balance: u64, cost: u64 },

    #[error("free chapters cannot be unlocked")]
    ChapterIsFree,

    #[error("chapter already published: {0}")]
    ChapterExists(String),

    #[error("{0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PaywallDbError> for PaywallError {
    fn from(e: PaywallDbError) -> Self {
        match e {
            PaywallDbError::ChapterNotFound(id) => Self::NotFound(format!("Chapter not found: {id}")),
            PaywallDbError::ChapterExists(id) => Self::ChapterExists(id),
            PaywallDbError::ChapterIsFree(_) => Self::ChapterIsFree,
            PaywallDbError::AlreadyUnlocked { .. } => Self::AlreadyUnlocked,
            PaywallDbError::InsufficientBalance { balance, cost } => {
                Self::InsufficientBalance { balance, cost }
            }
            PaywallDbError::BalanceOverflow => {
                Self::Validation("Credit would overflow the balance".to_string())
            }
            PaywallDbError::AmountOutOfRange(amount) => {
                Self::Validation(format!("Amount out of range: {amount}"))
            }
            PaywallDbError::InvalidCursor => Self::Validation("Invalid cursor".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Run database work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, PaywallError>
where
    F: FnOnce() -> Result<T, PaywallError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PaywallError::Internal(format!("blocking task failed: {e}")))?
}

/// Paywall operations over the embedded database and the access cache.
#[derive(Clone)]
pub struct Paywall {
    db: Arc<PaywallDb>,
    cache: Arc<AccessCache>,
}

impl Paywall {
    pub fn new(db: Arc<PaywallDb>, cache: Arc<AccessCache>) -> Self {
        Self { db, cache }
    }

    /// Current access state of `chapter_id` for `user_id`. Read-only.
    pub async fn check_access(
        &self,
        user_id: &str,
        chapter_id: &ChapterId,
    ) -> Result<AccessDecision, PaywallError> {
        if let Some(decision) = self.cache.get(user_id, chapter_id) {
            return Ok(decision);
        }

        let generation = self.cache.generation();
        let db = Arc::clone(&self.db);
        let (user, chapter) = (user_id.to_string(), chapter_id.clone());
        let (stored, record) =
            blocking(move || Ok(db.access_snapshot(&user, &chapter)?)).await?;

        let decision = decide(&stored, record.is_some());
        self.cache
            .put(user_id, chapter_id, decision.clone(), generation);
        Ok(decision)
    }

    /// Unlock a paid chapter: debit, record and ledger entry, all or nothing.
    pub async fn unlock(
        &self,
        user_id: &str,
        chapter_id: &ChapterId,
    ) -> Result<UnlockResponse, PaywallError> {
        let db = Arc::clone(&self.db);
        let cache = Arc::clone(&self.cache);
        let (user, chapter) = (user_id.to_string(), chapter_id.clone());

        let result = blocking(move || {
            let receipt = db.unlock(&user, &chapter)?;
            cache.invalidate(&user, &chapter);
            Ok(receipt)
        })
        .await;

        match result {
            Ok(receipt) => {
                info!(
                    user_id = %user_id,
                    chapter_id = %chapter_id,
                    cost = receipt.record.cost_paid,
                    new_balance = receipt.new_balance,
                    "Chapter unlocked"
                );
                Ok(UnlockResponse {
                    new_balance: receipt.new_balance,
                    unlock_record: receipt.record,
                    invalidates: invalidation::stale_after_unlock(chapter_id),
                })
            }
            Err(e) => {
                if !matches!(e, PaywallError::Internal(_)) {
                    warn!(user_id = %user_id, chapter_id = %chapter_id, error = %e, "Unlock rejected");
                }
                Err(e)
            }
        }
    }

    /// Current balance (0 for users who never held currency).
    pub async fn balance(&self, user_id: &str) -> Result<u64, PaywallError> {
        let db = Arc::clone(&self.db);
        let user = user_id.to_string();
        blocking(move || Ok(db.balance(&user)?)).await
    }

    /// Newest-first page of ledger entries.
    pub async fn transactions(
        &self,
        user_id: &str,
        cursor: Option<String>,
        limit: Option<usize>,
    ) -> Result<TransactionListResponse, PaywallError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(PaywallError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }

        let db = Arc::clone(&self.db);
        let user = user_id.to_string();
        let (transactions, next_cursor) =
            blocking(move || Ok(db.list_ledger(&user, cursor.as_deref(), limit)?)).await?;

        Ok(TransactionListResponse {
            transactions,
            next_cursor,
        })
    }

    /// Grant currency to a user.
    pub async fn credit(&self, user_id: &str, amount: u64) -> Result<CreditResponse, PaywallError> {
        if amount == 0 || amount > MAX_CREDIT_AMOUNT {
            return Err(PaywallError::Validation(format!(
                "amount must be between 1 and {MAX_CREDIT_AMOUNT}"
            )));
        }

        let db = Arc::clone(&self.db);
        let user = user_id.to_string();
        let (new_balance, entry) = blocking(move || Ok(db.credit(&user, amount)?)).await?;

        info!(user_id = %user_id, amount, new_balance, "Balance credited");
        Ok(CreditResponse { new_balance, entry })
    }

    /// Publish a validated chapter.
    pub async fn publish(&self, chapter: Chapter) -> Result<Chapter, PaywallError> {
        let db = Arc::clone(&self.db);
        let chapter = blocking(move || {
            db.insert_chapter(&chapter)?;
            Ok(chapter)
        })
        .await?;

        info!(
            chapter_id = %chapter.chapter_id,
            work_id = %chapter.work_id,
            unlock_cost = chapter.unlock_cost,
            "Chapter published"
        );
        Ok(chapter)
    }

    pub async fn health_check(&self) -> Result<(), PaywallError> {
        let db = Arc::clone(&self.db);
        blocking(move || Ok(db.health_check()?)).await
    }
}
