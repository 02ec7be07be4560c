// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives under a single data directory:
//!
//! ```text
//! <DATA_DIR>/
//!   paywall.redb        # chapters, balances, unlocks, ledger (ACID)
//!   uploads/
//!     covers/{filename}
//!     chapters/{filename}
//! ```
//!
//! Everything that must change atomically (balances, unlock records, ledger
//! entries) is in redb. Images are plain files.

pub mod image_store;
pub mod paths;
pub mod paywall_db;

pub use image_store::{ImageFolder, ImageKey, ImageStore, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use paywall_db::{PaywallDb, PaywallDbError, PaywallDbResult, UnlockReceipt};
