// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication
//!
//! Readers sign in with an external identity provider and call the paywall
//! with `Authorization: Bearer <JWT>`. This module only verifies those
//! tokens: signature against the provider JWKS, expiry with 60 seconds of
//! skew, and issuer and audience when configured. The `sub` claim becomes
//! the user id that balances and unlocks are keyed by; the `role` claim
//! gates admin and editor endpoints.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod roles;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, EditorOnly};
pub use jwks::JwksManager;
pub use roles::Role;
