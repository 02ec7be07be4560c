// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Request, response and stored record types. All API types derive
//! `Serialize`, `Deserialize` and `ToSchema` and use camelCase field names
//! on the wire, which is what the reader frontend consumes.
//!
//! ## Model Categories
//!
//! - **Identifiers**: validated chapter/work identifiers
//! - **Chapters**: published chapters with an immutable unlock cost
//! - **Unlocks**: the (user, chapter) entitlement record
//! - **Ledger**: immutable balance-affecting events
//! - **Images**: blob store responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum length of a chapter or work identifier.
pub const MAX_ID_LEN: usize = 64;

/// Upper bound on a chapter's unlock cost, in currency units.
pub const MAX_UNLOCK_COST: u64 = 1_000_000;

/// Upper bound on a single admin credit, in currency units.
pub const MAX_CREDIT_AMOUNT: u64 = 1_000_000_000;

/// Longest accepted user id, from a token `sub` or an admin path.
pub const MAX_USER_ID_LEN: usize = 256;

// =============================================================================
// Identifiers
// =============================================================================

/// Reasons an identifier fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("{0} is required")]
    Empty(&'static str),

    #[error("{0} must be at most 64 characters")]
    TooLong(&'static str),

    #[error("{0} may only contain letters, digits, '-' and '_'")]
    InvalidCharacter(&'static str),
}

/// Validate an identifier: 1..=64 characters of `[A-Za-z0-9_-]`.
pub fn validate_identifier(kind: &'static str, raw: &str) -> Result<(), IdError> {
    if raw.is_empty() {
        return Err(IdError::Empty(kind));
    }
    if raw.len() > MAX_ID_LEN {
        return Err(IdError::TooLong(kind));
    }
    if !raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(IdError::InvalidCharacter(kind));
    }
    Ok(())
}

/// Validated chapter identifier.
///
/// Construct with [`ChapterId::parse`] at the API boundary. Deserialization
/// is transparent and only used for records this service wrote itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ChapterId(String);

impl ChapterId {
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        validate_identifier("chapterId", raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Chapter Models
// =============================================================================

/// Whether a chapter is readable by everyone or must be unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    Free,
    Paid,
}

/// A published chapter.
///
/// The unlock cost is fixed at publish time and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Chapter identifier.
    #[schema(value_type = String)]
    pub chapter_id: ChapterId,
    /// Identifier of the work (series) this chapter belongs to.
    pub work_id: String,
    /// Currency units required to unlock. Always 0 for free chapters.
    pub unlock_cost: u64,
    /// Free or paid.
    pub access_tier: AccessTier,
    /// When the chapter was published.
    pub published_at: DateTime<Utc>,
}

impl Chapter {
    pub fn is_free(&self) -> bool {
        self.access_tier == AccessTier::Free
    }
}

/// Request to publish a chapter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishChapterRequest {
    pub chapter_id: String,
    pub work_id: String,
    #[serde(default)]
    pub unlock_cost: u64,
    pub access_tier: AccessTier,
}

impl PublishChapterRequest {
    /// Validate the request and build the chapter record.
    pub fn into_chapter(self) -> Result<Chapter, String> {
        let chapter_id = ChapterId::parse(&self.chapter_id).map_err(|e| e.to_string())?;
        validate_identifier("workId", &self.work_id).map_err(|e| e.to_string())?;

        match self.access_tier {
            AccessTier::Free if self.unlock_cost != 0 => {
                return Err("Free chapters must have an unlock cost of 0".to_string());
            }
            AccessTier::Paid if self.unlock_cost == 0 => {
                return Err("Paid chapters must have an unlock cost of at least 1".to_string());
            }
            AccessTier::Paid if self.unlock_cost > MAX_UNLOCK_COST => {
                return Err(format!("Unlock cost may not exceed {MAX_UNLOCK_COST}"));
            }
            _ => {}
        }

        Ok(Chapter {
            chapter_id,
            work_id: self.work_id,
            unlock_cost: self.unlock_cost,
            access_tier: self.access_tier,
            published_at: Utc::now(),
        })
    }
}

// =============================================================================
// Unlock Models
// =============================================================================

/// A user's permanent entitlement to a paid chapter.
///
/// At most one exists per (user, chapter) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRecord {
    pub user_id: String,
    #[schema(value_type = String)]
    pub chapter_id: ChapterId,
    /// Currency units debited for this unlock.
    pub cost_paid: u64,
    pub created_at: DateTime<Utc>,
}

/// Successful unlock response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    /// Balance after the debit.
    pub new_balance: u64,
    /// The created unlock record.
    pub unlock_record: UnlockRecord,
    /// API paths whose cached reads are stale after this unlock.
    pub invalidates: Vec<String>,
}

// =============================================================================
// Ledger Models
// =============================================================================

/// What caused a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// Debit for unlocking a chapter.
    ChapterUnlock,
    /// Currency granted to the user.
    Credit,
}

/// An immutable balance-affecting event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub entry_id: String,
    pub user_id: String,
    pub kind: LedgerEntryKind,
    /// Signed change to the balance (negative for debits).
    pub delta: i64,
    /// Balance immediately after this entry was applied.
    pub balance_after: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub chapter_id: Option<ChapterId>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    fn new(user_id: &str, kind: LedgerEntryKind, delta: i64, balance_after: u64) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            delta,
            balance_after,
            chapter_id: None,
            created_at: Utc::now(),
        }
    }

    /// Debit entry for a chapter unlock. `delta` must be negative.
    pub fn chapter_unlock(user_id: &str, chapter_id: &ChapterId, delta: i64, balance_after: u64) -> Self {
        let mut entry = Self::new(user_id, LedgerEntryKind::ChapterUnlock, delta, balance_after);
        entry.chapter_id = Some(chapter_id.clone());
        entry
    }

    /// Credit entry.
    pub fn credit(user_id: &str, delta: i64, balance_after: u64) -> Self {
        Self::new(user_id, LedgerEntryKind::Credit, delta, balance_after)
    }
}

/// Current balance response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub balance: u64,
}

/// Transaction history page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListResponse {
    /// Entries, newest first.
    pub transactions: Vec<LedgerEntry>,
    /// Cursor for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Request to credit a user's balance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditRequest {
    pub amount: u64,
}

/// Result of a credit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditResponse {
    pub new_balance: u64,
    pub entry: LedgerEntry,
}

// =============================================================================
// Image Models
// =============================================================================

/// Response after storing an image.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    /// Store key, `{folder}/{filename}`.
    pub key: String,
}

/// Keys stored under a folder.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageListResponse {
    pub keys: Vec<String>,
}
