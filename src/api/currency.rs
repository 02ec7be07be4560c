// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance and transaction history endpoints.

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;
use utoipa::IntoParams;

use super::{no_store, NoStore};
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{BalanceResponse, TransactionListResponse},
    state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionQuery {
    /// Cursor returned by the previous page.
    pub cursor: Option<String>,
    /// Page size, 1 to 100 (default 50).
    pub limit: Option<usize>,
}

/// Current balance of the authenticated user.
#[utoipa::path(
    get,
    path = "/api/currency/balance",
    tag = "Currency",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn get_balance(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<NoStore<BalanceResponse>, ApiError> {
    let balance = state.paywall.balance(&user.user_id).await?;
    Ok(no_store(BalanceResponse { balance }))
}

/// Ledger entries of the authenticated user, newest first.
#[utoipa::path(
    get,
    path = "/api/currency/transactions",
    tag = "Currency",
    security(("bearer_auth" = [])),
    params(TransactionQuery),
    responses(
        (status = 200, description = "Transaction page", body = TransactionListResponse),
        (status = 400, description = "Invalid cursor or limit", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn list_transactions(
    Auth(user): Auth,
    State(state): State<AppState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<NoStore<TransactionListResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let page = state
        .paywall
        .transactions(&user.user_id, query.cursor, query.limit)
        .await?;
    Ok(no_store(page))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::auth::extractor::test_tokens::{admin, reader};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn unknown_user_has_zero_balance() {
        let app = TestApp::new().await;
        let (status, body) = app.get("/api/currency/balance", Some(&reader("nobody"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], 0);
    }

    #[tokio::test]
    async fn transactions_paginate() {
        let app = TestApp::new().await;
        let boss = admin("boss");
        for amount in [10, 20, 30] {
            app.credit(&boss, "user_1", amount).await;
        }
        let user = reader("user_1");

        let (status, page1) = app.get("/api/currency/transactions?limit=2", Some(&user)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page1["transactions"].as_array().unwrap().len(), 2);
        assert_eq!(page1["transactions"][0]["delta"], 30);
        let cursor = page1["nextCursor"].as_str().unwrap().to_string();

        let (_, page2) = app
            .get(
                &format!("/api/currency/transactions?limit=2&cursor={cursor}"),
                Some(&user),
            )
            .await;
        assert_eq!(page2["transactions"].as_array().unwrap().len(), 1);
        assert_eq!(page2["transactions"][0]["delta"], 10);
        assert!(page2.get("nextCursor").is_none());
    }

    #[tokio::test]
    async fn bad_query_is_400() {
        let app = TestApp::new().await;
        let user = reader("user_1");
        for uri in [
            "/api/currency/transactions?limit=0",
            "/api/currency/transactions?limit=500",
            "/api/currency/transactions?limit=abc",
            "/api/currency/transactions?cursor=zzz",
        ] {
            let (status, body) = app.get(uri, Some(&user)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["code"], "validation_error");
        }
    }
}
