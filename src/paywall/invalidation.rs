// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resource paths made stale by a mutation.
//!
//! Shared by the unlock response (`invalidates`) and the HTTP client, which
//! uses the same paths as its cache keys.

use crate::models::ChapterId;

pub const BALANCE_PATH: &str = "/api/currency/balance";
pub const TRANSACTIONS_PATH: &str = "/api/currency/transactions";

/// Path of the access-state resource for a chapter.
pub fn access_path(chapter_id: &ChapterId) -> String {
    format!("/api/chapters/{chapter_id}/access")
}

/// Path of the unlock action for a chapter.
pub fn unlock_path(chapter_id: &ChapterId) -> String {
    format!("/api/chapters/{chapter_id}/unlock")
}

/// Everything a client must re-fetch after unlocking `chapter_id`.
pub fn stale_after_unlock(chapter_id: &ChapterId) -> Vec<String> {
    vec![
        access_path(chapter_id),
        BALANCE_PATH.to_string(),
        TRANSACTIONS_PATH.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_invalidates_access_balance_and_history() {
        let id = ChapterId::parse("ch-7").unwrap();
        assert_eq!(
            stale_after_unlock(&id),
            vec![
                "/api/chapters/ch-7/access",
                "/api/currency/balance",
                "/api/currency/transactions",
            ]
        );
    }
}
