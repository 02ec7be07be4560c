// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the caller identity derived from them.
//!
//! Issuer, audience and expiry are checked by `jsonwebtoken` against the raw
//! payload, so only the claims the paywall reads are deserialized here.

use serde::Deserialize;

use super::{error::AuthError, roles::Role};
use crate::models::MAX_USER_ID_LEN;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Canonical user id.
    pub sub: String,

    #[serde(default)]
    pub exp: Option<i64>,

    #[serde(default)]
    pub sid: Option<String>,

    /// Unknown or missing means `reader`.
    #[serde(default)]
    pub role: Option<String>,
}

/// The verified caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
    pub session_id: Option<String>,
}

impl TryFrom<TokenClaims> for AuthenticatedUser {
    type Error = AuthError;

    /// Balances, unlocks and ledger rows are keyed by `sub`, so a token
    /// whose `sub` is blank or oversized names no user and is rejected.
    fn try_from(claims: TokenClaims) -> Result<Self, AuthError> {
        if claims.sub.trim().is_empty() || claims.sub.len() > MAX_USER_ID_LEN {
            return Err(AuthError::MalformedToken);
        }

        Ok(Self {
            role: claims.role.as_deref().and_then(Role::parse).unwrap_or_default(),
            user_id: claims.sub,
            session_id: claims.sid,
        })
    }
}

impl AuthenticatedUser {
    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }
}
