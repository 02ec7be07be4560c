// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the data directory layout.

use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory.
pub const DATA_ROOT: &str = "./data";

/// File name of the embedded paywall database.
pub const DATABASE_FILE: &str = "paywall.redb";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the redb database holding chapters, balances, unlocks and the ledger.
    pub fn database(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    // ========== Image Paths ==========

    /// Root of the image blob store.
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    /// Directory for one image folder (`covers`, `chapters`).
    pub fn image_folder(&self, folder: &str) -> PathBuf {
        self.uploads_dir().join(folder)
    }

    /// Path to a stored image.
    pub fn image_file(&self, folder: &str, filename: &str) -> PathBuf {
        self.image_folder(folder).join(filename)
    }
}
