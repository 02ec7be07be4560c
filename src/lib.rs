// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AmourScans chapter paywall service.
//!
//! Readers spend an in-app currency to unlock paid chapters of serialized
//! works. Unlocks, balances and the transaction ledger live in one embedded
//! redb database so every unlock is a single atomic transaction.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token verification and roles
//! - `client` - HTTP client with response caching and retry
//! - `email` - Transactional email templates and log-only mailer
//! - `paywall` - Access decisions, unlock flow and the decision cache
//! - `storage` - redb database and image file store

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod email;
pub mod error;
pub mod logging;
pub mod models;
pub mod paywall;
pub mod state;
pub mod storage;
