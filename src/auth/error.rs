// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization failures.
//!
//! A request without a usable identity is a 401; an identity lacking the
//! required role is a 403. Key source and configuration failures are 500s
//! whose detail only reaches the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::roles::Role;
use crate::error::ApiError;

#[derive(Debug)]
pub enum AuthError {
    MissingAuthHeader,
    /// Header present but not `Bearer <token>`.
    InvalidAuthHeader,
    /// Undecodable token, or claims that do not name a user.
    MalformedToken,
    InvalidSignature,
    TokenExpired,
    TokenNotYetValid,
    InvalidIssuer,
    InvalidAudience,
    /// No key in the JWKS matches the token's `kid` and `alg`.
    UnknownSigningKey,
    InsufficientPermissions { required: Role },
    /// The JWKS endpoint is unreachable or served nothing usable.
    KeySource(String),
    /// Verification cannot run with the current configuration.
    Misconfigured(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Self::KeySource(_) | Self::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "missing_auth_header",
            Self::InvalidAuthHeader => "invalid_auth_header",
            Self::MalformedToken => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::TokenNotYetValid => "token_not_yet_valid",
            Self::InvalidIssuer => "invalid_issuer",
            Self::InvalidAudience => "invalid_audience",
            Self::UnknownSigningKey => "unknown_signing_key",
            Self::InsufficientPermissions { .. } => "insufficient_permissions",
            Self::KeySource(_) | Self::Misconfigured(_) => "internal_error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAuthHeader => f.write_str("Authorization header is required"),
            Self::InvalidAuthHeader => f.write_str("Expected 'Authorization: Bearer <token>'"),
            Self::MalformedToken => f.write_str("Token is malformed"),
            Self::InvalidSignature => f.write_str("Token signature is invalid"),
            Self::TokenExpired => f.write_str("Token has expired"),
            Self::TokenNotYetValid => f.write_str("Token is not yet valid"),
            Self::InvalidIssuer => f.write_str("Token issuer is not accepted"),
            Self::InvalidAudience => f.write_str("Token audience is not accepted"),
            Self::UnknownSigningKey => f.write_str("Token was not signed by a known key"),
            Self::InsufficientPermissions { required } => {
                write!(f, "The {required} role is required")
            }
            Self::KeySource(detail) => write!(f, "Signing keys unavailable: {detail}"),
            Self::Misconfigured(detail) => write!(f, "Token verification misconfigured: {detail}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => ApiError::internal(e),
            status => ApiError::new(status, e.error_code(), e.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::INTERNAL_MESSAGE;
    use axum::body::to_bytes;

    async fn rendered(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn identity_failures_are_401() {
        for err in [
            AuthError::MissingAuthHeader,
            AuthError::MalformedToken,
            AuthError::TokenExpired,
            AuthError::UnknownSigningKey,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED, "{err}");
        }
    }

    #[tokio::test]
    async fn missing_header_body() {
        let (status, body) = rendered(AuthError::MissingAuthHeader).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "missing_auth_header");
        assert_eq!(body["message"], "Authorization header is required");
    }

    #[tokio::test]
    async fn forbidden_names_the_role() {
        let (status, body) = rendered(AuthError::InsufficientPermissions {
            required: Role::Admin,
        })
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "The admin role is required");
    }

    #[tokio::test]
    async fn key_source_failure_hides_details() {
        let (status, body) = rendered(AuthError::KeySource("connect to 10.0.0.3 refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_MESSAGE);
        assert_eq!(body["code"], "internal_error");
    }
}
