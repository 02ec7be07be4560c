// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::IdError;
use crate::paywall::PaywallError;
use crate::storage::StorageError;

/// Message returned for every 5xx. Details go to the log only.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

/// JSON failure body: `{"message": "...", "code": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn payment_required(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYMENT_REQUIRED, "insufficient_balance", message)
    }

    /// Log `detail` and return a generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            message: self.message,
            code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}

impl From<PaywallError> for ApiError {
    fn from(e: PaywallError) -> Self {
        match e {
            PaywallError::NotFound(msg) => Self::not_found(msg),
            PaywallError::AlreadyUnlocked => {
                Self::conflict("already_unlocked", "Chapter already unlocked")
            }
            PaywallError::InsufficientBalance { balance, cost } => Self::payment_required(
                format!("Insufficient balance: have {balance}, need {cost}"),
            ),
            PaywallError::ChapterIsFree => Self::bad_request("Free chapters cannot be unlocked"),
            PaywallError::ChapterExists(id) => {
                Self::conflict("chapter_exists", format!("Chapter already published: {id}"))
            }
            PaywallError::Validation(msg) => Self::bad_request(msg),
            PaywallError::Internal(detail) => Self::internal(detail),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(key) => Self::not_found(format!("Image not found: {key}")),
            StorageError::UnknownFolder(_) | StorageError::InvalidFilename(_) => {
                Self::bad_request(e.to_string())
            }
            StorageError::Io(_) | StorageError::IntegrityViolation => Self::internal(e),
        }
    }
}

impl From<IdError> for ApiError {
    fn from(e: IdError) -> Self {
        Self::bad_request(e.to_string())
    }
}
