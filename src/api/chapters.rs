// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chapter access and unlock endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{no_store, NoStore};
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{ChapterId, UnlockResponse},
    paywall::AccessDecision,
    state::AppState,
};

/// Check whether the authenticated user may read a chapter.
///
/// Read-only: never debits or records anything.
#[utoipa::path(
    get,
    path = "/api/chapters/{chapter_id}/access",
    tag = "Chapters",
    security(("bearer_auth" = [])),
    params(
        ("chapter_id" = String, Path, description = "Chapter identifier")
    ),
    responses(
        (status = 200, description = "Current access state", body = AccessDecision),
        (status = 400, description = "Malformed chapter id", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Chapter not found", body = ErrorBody)
    )
)]
pub async fn get_access(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
) -> Result<NoStore<AccessDecision>, ApiError> {
    let chapter_id = ChapterId::parse(&chapter_id)?;
    let decision = state.paywall.check_access(&user.user_id, &chapter_id).await?;
    Ok(no_store(decision))
}

/// Spend currency to unlock a paid chapter.
///
/// Debits the balance, records the unlock and appends a ledger entry in one
/// transaction. Retrying after a lost response is safe: the retry fails with
/// 409 and debits nothing.
#[utoipa::path(
    post,
    path = "/api/chapters/{chapter_id}/unlock",
    tag = "Chapters",
    security(("bearer_auth" = [])),
    params(
        ("chapter_id" = String, Path, description = "Chapter identifier")
    ),
    responses(
        (status = 200, description = "Chapter unlocked", body = UnlockResponse),
        (status = 400, description = "Free chapter or malformed id", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 402, description = "Insufficient balance", body = ErrorBody),
        (status = 404, description = "Chapter not found", body = ErrorBody),
        (status = 409, description = "Already unlocked", body = ErrorBody)
    )
)]
pub async fn unlock_chapter(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
) -> Result<NoStore<UnlockResponse>, ApiError> {
    let chapter_id = ChapterId::parse(&chapter_id)?;
    let response = state.paywall.unlock(&user.user_id, &chapter_id).await?;
    Ok(no_store(response))
}
