// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access decisions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Chapter;

/// How a user came to (not) have access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Readable by everyone.
    Free,
    /// Paid and not unlocked by this user.
    Paid,
    /// Paid and unlocked by this user.
    Unlocked,
}

/// Whether a user may read a chapter right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub has_access: bool,
    pub access_type: AccessType,
    /// 0 for free chapters, otherwise the chapter's unlock cost.
    pub unlock_cost: u64,
    pub already_unlocked: bool,
}

/// Decide access from the chapter and whether an unlock record exists.
///
/// A record on a free chapter is ignored.
pub fn decide(chapter: &Chapter, unlocked: bool) -> AccessDecision {
    if chapter.is_free() {
        return AccessDecision {
            has_access: true,
            access_type: AccessType::Free,
            unlock_cost: 0,
            already_unlocked: false,
        };
    }

    AccessDecision {
        has_access: unlocked,
        access_type: if unlocked {
            AccessType::Unlocked
        } else {
            AccessType::Paid
        },
        unlock_cost: chapter.unlock_cost,
        already_unlocked: unlocked,
    }
}
