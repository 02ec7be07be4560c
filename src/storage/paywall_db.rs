// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded paywall database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `chapters`: chapter_id → serialized Chapter
//! - `balances`: user_id → balance (u64)
//! - `unlocks`: composite key (user|chapter_id) → serialized UnlockRecord
//! - `ledger`: composite key (user|!seq) → serialized LedgerEntry
//! - `counters`: name → u64 (ledger sequence)
//!
//! `user` in composite keys is the user id prefixed by its big-endian u32
//! length, so one user's key range can never overlap another's.
//!
//! ## Atomicity
//!
//! redb allows a single write transaction at a time. Every balance mutation
//! reads its preconditions and applies all of its writes inside one write
//! transaction; a failed precondition aborts it with nothing written.

use std::ops::Bound;
use std::path::Path;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

use crate::models::{Chapter, ChapterId, LedgerEntry, UnlockRecord};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: chapter_id → serialized Chapter (JSON bytes).
const CHAPTERS: TableDefinition<&str, &[u8]> = TableDefinition::new("chapters");

/// Current balance per user. Absent means 0.
const BALANCES: TableDefinition<&str, u64> = TableDefinition::new("balances");

/// Unlock records keyed by `user_prefix | chapter_id`.
const UNLOCKS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("unlocks");

/// Ledger entries keyed by `user_prefix | !seq_be` for newest-first range scans.
const LEDGER: TableDefinition<&[u8], &[u8]> = TableDefinition::new("ledger");

/// Named counters.
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

const LEDGER_SEQ: &str = "ledger_seq";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PaywallDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("chapter not found: {0}")]
    ChapterNotFound(String),

    #[error("chapter already published: {0}")]
    ChapterExists(String),

    #[error("chapter {0} is free and cannot be unlocked")]
    ChapterIsFree(String),

    #[error("chapter {chapter_id} already unlocked by {user_id}")]
    AlreadyUnlocked { user_id: String, chapter_id: String },

    #[error("insufficient balance: have {balance}, need {cost}")]
    InsufficientBalance { balance: u64, cost: u64 },

    #[error("balance would overflow")]
    BalanceOverflow,

    #[error("amount out of range: {0}")]
    AmountOutOfRange(u64),

    #[error("invalid cursor")]
    InvalidCursor,
}

pub type PaywallDbResult<T> = Result<T, PaywallDbError>;

/// Everything a successful unlock wrote.
#[derive(Debug, Clone)]
pub struct UnlockReceipt {
    pub new_balance: u64,
    pub record: UnlockRecord,
    pub entry: LedgerEntry,
}

// =============================================================================
// Key Helpers
// =============================================================================

/// Length-prefixed user id, the common prefix of all per-user keys.
fn user_prefix(user_id: &str) -> Vec<u8> {
    let bytes = user_id.as_bytes();
    let mut key = Vec::with_capacity(4 + bytes.len() + 8);
    key.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    key.extend_from_slice(bytes);
    key
}

fn unlock_key(user_id: &str, chapter_id: &ChapterId) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(chapter_id.as_str().as_bytes());
    key
}

/// Inverted sequence so that a forward scan yields newest entries first.
fn ledger_key(user_id: &str, seq: u64) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(&(!seq).to_be_bytes());
    key
}

/// Upper bound for a range scan over one user's ledger.
fn ledger_prefix_end(user_id: &str) -> Vec<u8> {
    let mut end = user_prefix(user_id);
    end.extend_from_slice(&[0xFF; 9]);
    end
}

fn encode_cursor(key: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(key)
}

/// Decode a cursor and check it points into `user_id`'s ledger range.
fn decode_cursor(user_id: &str, cursor: &str) -> PaywallDbResult<Vec<u8>> {
    let key = Base64UrlUnpadded::decode_vec(cursor).map_err(|_| PaywallDbError::InvalidCursor)?;
    let prefix = user_prefix(user_id);
    if key.len() != prefix.len() + 8 || !key.starts_with(&prefix) {
        return Err(PaywallDbError::InvalidCursor);
    }
    Ok(key)
}

/// Convert an unsigned amount into a ledger delta.
fn signed(amount: u64) -> PaywallDbResult<i64> {
    i64::try_from(amount).map_err(|_| PaywallDbError::AmountOutOfRange(amount))
}

// =============================================================================
// PaywallDb
// =============================================================================

/// Embedded ACID store for chapters, balances, unlocks and the ledger.
pub struct PaywallDb {
    db: Database,
}

impl PaywallDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> PaywallDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CHAPTERS)?;
            let _ = write_txn.open_table(BALANCES)?;
            let _ = write_txn.open_table(UNLOCKS)?;
            let _ = write_txn.open_table(LEDGER)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Verify that a read transaction can be opened.
    pub fn health_check(&self) -> PaywallDbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(CHAPTERS)?;
        Ok(())
    }

    // =========================================================================
    // Chapters
    // =========================================================================

    /// Publish a chapter. A chapter id can only be published once.
    pub fn insert_chapter(&self, chapter: &Chapter) -> PaywallDbResult<()> {
        let json = serde_json::to_vec(chapter)?;
        let id = chapter.chapter_id.as_str();

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHAPTERS)?;
            if table.get(id)?.is_some() {
                drop(table);
                write_txn.abort()?;
                return Err(PaywallDbError::ChapterExists(id.to_string()));
            }
            table.insert(id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a chapter.
    #[cfg(test)]
    pub fn get_chapter(&self, chapter_id: &ChapterId) -> PaywallDbResult<Option<Chapter>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHAPTERS)?;
        match table.get(chapter_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Read a chapter and the user's unlock record from one snapshot.
    pub fn access_snapshot(
        &self,
        user_id: &str,
        chapter_id: &ChapterId,
    ) -> PaywallDbResult<(Chapter, Option<UnlockRecord>)> {
        let read_txn = self.db.begin_read()?;
        let chapters = read_txn.open_table(CHAPTERS)?;
        let chapter: Chapter = match chapters.get(chapter_id.as_str())? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(PaywallDbError::ChapterNotFound(chapter_id.to_string())),
        };

        let unlocks = read_txn.open_table(UNLOCKS)?;
        let key = unlock_key(user_id, chapter_id);
        let record = match unlocks.get(key.as_slice())? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };

        Ok((chapter, record))
    }

    /// Look up a user's unlock record for a chapter.
    #[cfg(test)]
    pub fn get_unlock(
        &self,
        user_id: &str,
        chapter_id: &ChapterId,
    ) -> PaywallDbResult<Option<UnlockRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(UNLOCKS)?;
        let key = unlock_key(user_id, chapter_id);
        match table.get(key.as_slice())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Balances
    // =========================================================================

    /// Current balance of a user (0 if the user has never held currency).
    pub fn balance(&self, user_id: &str) -> PaywallDbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BALANCES)?;
        Ok(table.get(user_id)?.map(|v| v.value()).unwrap_or(0))
    }

    /// Credit a user's balance and append a ledger entry.
    pub fn credit(&self, user_id: &str, amount: u64) -> PaywallDbResult<(u64, LedgerEntry)> {
        let write_txn = self.db.begin_write()?;
        match Self::apply_credit(&write_txn, user_id, amount) {
            Ok(result) => {
                write_txn.commit()?;
                Ok(result)
            }
            Err(e) => {
                write_txn.abort()?;
                Err(e)
            }
        }
    }

    fn apply_credit(
        txn: &WriteTransaction,
        user_id: &str,
        amount: u64,
    ) -> PaywallDbResult<(u64, LedgerEntry)> {
        let delta = signed(amount)?;
        let mut balances = txn.open_table(BALANCES)?;
        let balance = balances.get(user_id)?.map(|v| v.value()).unwrap_or(0);
        let new_balance = balance
            .checked_add(amount)
            .ok_or(PaywallDbError::BalanceOverflow)?;
        balances.insert(user_id, new_balance)?;

        let entry = LedgerEntry::credit(user_id, delta, new_balance);
        Self::append_ledger(txn, &entry)?;
        Ok((new_balance, entry))
    }

    // =========================================================================
    // Unlock
    // =========================================================================

    /// Unlock a paid chapter for a user.
    ///
    /// In one write transaction: checks that the chapter exists and is paid,
    /// that no unlock record exists and that the balance covers the cost;
    /// then debits the balance, inserts the record and appends the ledger
    /// entry. Any failed check aborts the transaction.
    pub fn unlock(&self, user_id: &str, chapter_id: &ChapterId) -> PaywallDbResult<UnlockReceipt> {
        let write_txn = self.db.begin_write()?;
        match Self::apply_unlock(&write_txn, user_id, chapter_id) {
            Ok(receipt) => {
                write_txn.commit()?;
                Ok(receipt)
            }
            Err(e) => {
                write_txn.abort()?;
                Err(e)
            }
        }
    }

    fn apply_unlock(
        txn: &WriteTransaction,
        user_id: &str,
        chapter_id: &ChapterId,
    ) -> PaywallDbResult<UnlockReceipt> {
        let chapter: Chapter = {
            let chapters = txn.open_table(CHAPTERS)?;
            let value = chapters
                .get(chapter_id.as_str())?
                .ok_or_else(|| PaywallDbError::ChapterNotFound(chapter_id.to_string()))?;
            serde_json::from_slice(value.value())?
        };
        if chapter.is_free() {
            return Err(PaywallDbError::ChapterIsFree(chapter_id.to_string()));
        }

        let key = unlock_key(user_id, chapter_id);
        let mut unlocks = txn.open_table(UNLOCKS)?;
        if unlocks.get(key.as_slice())?.is_some() {
            return Err(PaywallDbError::AlreadyUnlocked {
                user_id: user_id.to_string(),
                chapter_id: chapter_id.to_string(),
            });
        }

        let cost = chapter.unlock_cost;
        let delta = signed(cost)?;
        let mut balances = txn.open_table(BALANCES)?;
        let balance = balances.get(user_id)?.map(|v| v.value()).unwrap_or(0);
        let new_balance = balance
            .checked_sub(cost)
            .ok_or(PaywallDbError::InsufficientBalance { balance, cost })?;
        balances.insert(user_id, new_balance)?;

        let record = UnlockRecord {
            user_id: user_id.to_string(),
            chapter_id: chapter_id.clone(),
            cost_paid: cost,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&record)?;
        unlocks.insert(key.as_slice(), json.as_slice())?;

        let entry = LedgerEntry::chapter_unlock(user_id, chapter_id, -delta, new_balance);
        Self::append_ledger(txn, &entry)?;

        Ok(UnlockReceipt {
            new_balance,
            record,
            entry,
        })
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    fn append_ledger(txn: &WriteTransaction, entry: &LedgerEntry) -> PaywallDbResult<()> {
        let mut counters = txn.open_table(COUNTERS)?;
        let seq = counters.get(LEDGER_SEQ)?.map(|v| v.value()).unwrap_or(0) + 1;
        counters.insert(LEDGER_SEQ, seq)?;

        let mut ledger = txn.open_table(LEDGER)?;
        let key = ledger_key(&entry.user_id, seq);
        let json = serde_json::to_vec(entry)?;
        ledger.insert(key.as_slice(), json.as_slice())?;
        Ok(())
    }

    /// Paginated, newest-first listing of a user's ledger entries.
    ///
    /// Returns `(entries, next_cursor)`; the cursor is only present when more
    /// entries follow.
    pub fn list_ledger(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> PaywallDbResult<(Vec<LedgerEntry>, Option<String>)> {
        let prefix = user_prefix(user_id);
        let prefix_end = ledger_prefix_end(user_id);
        let cursor_key = cursor.map(|c| decode_cursor(user_id, c)).transpose()?;

        let lower: Bound<&[u8]> = match &cursor_key {
            Some(key) => Bound::Excluded(key.as_slice()),
            None => Bound::Included(prefix.as_slice()),
        };
        let upper: Bound<&[u8]> = Bound::Excluded(prefix_end.as_slice());

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LEDGER)?;

        let mut entries = Vec::with_capacity(limit);
        let mut last_key: Option<Vec<u8>> = None;
        let mut has_more = false;

        for item in table.range::<&[u8]>((lower, upper))? {
            let (key, value) = item?;
            if entries.len() >= limit {
                has_more = true;
                break;
            }
            entries.push(serde_json::from_slice(value.value())?);
            last_key = Some(key.value().to_vec());
        }

        let next_cursor = if has_more {
            last_key.map(|k| encode_cursor(&k))
        } else {
            None
        };

        Ok((entries, next_cursor))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessTier, LedgerEntryKind};
    use std::sync::Arc;

    fn temp_db() -> (PaywallDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = PaywallDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn chapter(id: &str, tier: AccessTier, cost: u64) -> Chapter {
        Chapter {
            chapter_id: ChapterId::parse(id).unwrap(),
            work_id: "work-1".to_string(),
            unlock_cost: cost,
            access_tier: tier,
            published_at: Utc::now(),
        }
    }

    fn id(raw: &str) -> ChapterId {
        ChapterId::parse(raw).unwrap()
    }

    #[test]
    fn insert_and_get_chapter() {
        let (db, _dir) = temp_db();
        let ch = chapter("ch-1", AccessTier::Paid, 30);
        db.insert_chapter(&ch).unwrap();

        assert_eq!(db.get_chapter(&id("ch-1")).unwrap(), Some(ch));
        assert_eq!(db.get_chapter(&id("missing")).unwrap(), None);
    }

    #[test]
    fn chapter_can_only_be_published_once() {
        let (db, _dir) = temp_db();
        db.insert_chapter(&chapter("ch-1", AccessTier::Paid, 30)).unwrap();

        let err = db
            .insert_chapter(&chapter("ch-1", AccessTier::Paid, 5))
            .unwrap_err();
        assert!(matches!(err, PaywallDbError::ChapterExists(_)));
        assert_eq!(db.get_chapter(&id("ch-1")).unwrap().unwrap().unlock_cost, 30);
    }

    #[test]
    fn unlock_debits_records_and_logs() {
        let (db, _dir) = temp_db();
        db.insert_chapter(&chapter("ch-1", AccessTier::Paid, 30)).unwrap();
        db.credit("user_1", 100).unwrap();

        let receipt = db.unlock("user_1", &id("ch-1")).unwrap();
        assert_eq!(receipt.new_balance, 70);
        assert_eq!(receipt.record.cost_paid, 30);
        assert_eq!(db.balance("user_1").unwrap(), 70);
        assert!(db.get_unlock("user_1", &id("ch-1")).unwrap().is_some());

        let (entries, cursor) = db.list_ledger("user_1", None, 10).unwrap();
        assert!(cursor.is_none());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, LedgerEntryKind::ChapterUnlock);
        assert_eq!(entries[0].delta, -30);
        assert_eq!(entries[0].balance_after, 70);
        assert_eq!(entries[1].kind, LedgerEntryKind::Credit);
    }

    #[test]
    fn second_unlock_is_rejected_without_debit() {
        let (db, _dir) = temp_db();
        db.insert_chapter(&chapter("ch-1", AccessTier::Paid, 30)).unwrap();
        db.credit("user_1", 100).unwrap();
        db.unlock("user_1", &id("ch-1")).unwrap();

        let err = db.unlock("user_1", &id("ch-1")).unwrap_err();
        assert!(matches!(err, PaywallDbError::AlreadyUnlocked { .. }));
        assert_eq!(db.balance("user_1").unwrap(), 70);
        assert_eq!(db.list_ledger("user_1", None, 10).unwrap().0.len(), 2);
    }

    #[test]
    fn insufficient_balance_leaves_no_trace() {
        let (db, _dir) = temp_db();
        db.insert_chapter(&chapter("ch-1", AccessTier::Paid, 10)).unwrap();
        db.credit("user_1", 5).unwrap();

        let err = db.unlock("user_1", &id("ch-1")).unwrap_err();
        assert!(matches!(
            err,
            PaywallDbError::InsufficientBalance { balance: 5, cost: 10 }
        ));
        assert_eq!(db.balance("user_1").unwrap(), 5);
        assert!(db.get_unlock("user_1", &id("ch-1")).unwrap().is_none());
        assert_eq!(db.list_ledger("user_1", None, 10).unwrap().0.len(), 1);
    }

    #[test]
    fn free_and_missing_chapters_cannot_be_unlocked() {
        let (db, _dir) = temp_db();
        db.insert_chapter(&chapter("free-1", AccessTier::Free, 0)).unwrap();
        db.credit("user_1", 100).unwrap();

        assert!(matches!(
            db.unlock("user_1", &id("free-1")).unwrap_err(),
            PaywallDbError::ChapterIsFree(_)
        ));
        assert!(matches!(
            db.unlock("user_1", &id("nope")).unwrap_err(),
            PaywallDbError::ChapterNotFound(_)
        ));
        assert_eq!(db.balance("user_1").unwrap(), 100);
    }

    #[test]
    fn concurrent_unlocks_debit_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(PaywallDb::open(&dir.path().join("test.redb")).unwrap());
        db.insert_chapter(&chapter("ch-1", AccessTier::Paid, 30)).unwrap();
        db.credit("user_1", 100).unwrap();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let db = Arc::clone(&db);
                    scope.spawn(move || db.unlock("user_1", &id("ch-1")))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(PaywallDbError::AlreadyUnlocked { .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(db.balance("user_1").unwrap(), 70);
    }

    #[test]
    fn concurrent_unlocks_of_different_chapters_never_overdraw() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(PaywallDb::open(&dir.path().join("test.redb")).unwrap());
        for i in 0..5 {
            db.insert_chapter(&chapter(&format!("ch-{i}"), AccessTier::Paid, 30))
                .unwrap();
        }
        db.credit("user_1", 100).unwrap();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..5)
                .map(|i| {
                    let db = Arc::clone(&db);
                    scope.spawn(move || db.unlock("user_1", &id(&format!("ch-{i}"))))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 3);
        assert_eq!(db.balance("user_1").unwrap(), 10);
    }

    #[test]
    fn ledger_pagination_is_newest_first() {
        let (db, _dir) = temp_db();
        for amount in 1..=5 {
            db.credit("user_1", amount).unwrap();
        }
        db.credit("user_2", 99).unwrap();

        let (page1, cursor1) = db.list_ledger("user_1", None, 2).unwrap();
        assert_eq!(page1.iter().map(|e| e.delta).collect::<Vec<_>>(), vec![5, 4]);
        assert!(cursor1.is_some());

        let (page2, cursor2) = db.list_ledger("user_1", cursor1.as_deref(), 2).unwrap();
        assert_eq!(page2.iter().map(|e| e.delta).collect::<Vec<_>>(), vec![3, 2]);

        let (page3, cursor3) = db.list_ledger("user_1", cursor2.as_deref(), 2).unwrap();
        assert_eq!(page3.iter().map(|e| e.delta).collect::<Vec<_>>(), vec![1]);
        assert!(cursor3.is_none());
    }

    #[test]
    fn exact_page_has_no_cursor() {
        let (db, _dir) = temp_db();
        db.credit("user_1", 1).unwrap();
        db.credit("user_1", 2).unwrap();

        let (entries, cursor) = db.list_ledger("user_1", None, 2).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(cursor.is_none());
    }

    #[test]
    fn cursor_from_another_user_is_rejected() {
        let (db, _dir) = temp_db();
        for amount in 1..=3 {
            db.credit("user_1", amount).unwrap();
        }
        let (_, cursor) = db.list_ledger("user_1", None, 1).unwrap();

        let err = db.list_ledger("user_2", cursor.as_deref(), 1).unwrap_err();
        assert!(matches!(err, PaywallDbError::InvalidCursor));
        assert!(matches!(
            db.list_ledger("user_1", Some("!!not-base64!!"), 1).unwrap_err(),
            PaywallDbError::InvalidCursor
        ));
    }

    #[test]
    fn user_key_ranges_do_not_overlap() {
        // "ab" + chapter "c" must not collide with "a" + chapter "bc".
        assert_ne!(unlock_key("ab", &id("c")), unlock_key("a", &id("bc")));
        assert!(ledger_key("u", 1) < ledger_prefix_end("u"));
        assert!(ledger_key("u", 2) < ledger_key("u", 1), "newer entries sort first");
    }

    #[test]
    fn credit_overflow_is_rejected() {
        let (db, _dir) = temp_db();
        db.credit("user_1", i64::MAX as u64).unwrap();
        db.credit("user_1", i64::MAX as u64).unwrap();

        let err = db.credit("user_1", i64::MAX as u64).unwrap_err();
        assert!(matches!(err, PaywallDbError::BalanceOverflow));
        assert!(matches!(
            db.credit("user_1", u64::MAX).unwrap_err(),
            PaywallDbError::AmountOutOfRange(_)
        ));
    }
}
