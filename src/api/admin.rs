// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin endpoints: chapter publishing and currency grants.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::AdminOnly,
    error::{ApiError, ErrorBody},
    models::{Chapter, CreditRequest, CreditResponse, PublishChapterRequest, MAX_USER_ID_LEN},
    state::AppState,
};

/// Publish a chapter. The unlock cost is fixed from then on.
#[utoipa::path(
    post,
    path = "/api/admin/chapters",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = PublishChapterRequest,
    responses(
        (status = 201, description = "Chapter published", body = Chapter),
        (status = 400, description = "Invalid chapter", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Admin role required", body = ErrorBody),
        (status = 409, description = "Chapter already published", body = ErrorBody)
    )
)]
pub async fn publish_chapter(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    request: Result<Json<PublishChapterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Chapter>), ApiError> {
    let Json(request) = request.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let chapter = request.into_chapter().map_err(ApiError::bad_request)?;

    let chapter = state.paywall.publish(chapter).await?;
    tracing::debug!(admin = %admin.user_id, chapter_id = %chapter.chapter_id, "Publish accepted");
    Ok((StatusCode::CREATED, Json(chapter)))
}

/// Grant currency to a user.
#[utoipa::path(
    post,
    path = "/api/admin/users/{user_id}/credit",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = String, Path, description = "User to credit")
    ),
    request_body = CreditRequest,
    responses(
        (status = 200, description = "Balance credited", body = CreditResponse),
        (status = 400, description = "Invalid amount", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Admin role required", body = ErrorBody)
    )
)]
pub async fn credit_user(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    request: Result<Json<CreditRequest>, JsonRejection>,
) -> Result<Json<CreditResponse>, ApiError> {
    if user_id.trim().is_empty() || user_id.len() > MAX_USER_ID_LEN {
        return Err(ApiError::bad_request("Invalid user id"));
    }
    let Json(request) = request.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let response = state.paywall.credit(&user_id, request.amount).await?;
    tracing::debug!(admin = %admin.user_id, user_id = %user_id, "Credit accepted");
    Ok(Json(response))
}
