// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::JwksManager;
use crate::config::CacheSettings;
use crate::paywall::{AccessCache, Paywall};
use crate::storage::{ImageStore, PaywallDb, PaywallDbError, StorageError, StoragePaths};

/// Token verification settings.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// JWKS manager; `None` selects development decoding.
    pub jwks: Option<Arc<JwksManager>>,
    /// Expected `iss` claim.
    pub issuer: Option<String>,
    /// Expected `aud` claim.
    pub audience: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Database(#[from] PaywallDbError),

    #[error("failed to initialize image store: {0}")]
    Images(#[from] StorageError),
}

#[derive(Clone)]
pub struct AppState {
    pub paywall: Paywall,
    pub images: Arc<ImageStore>,
    pub auth_config: AuthConfig,
}

impl AppState {
    /// Open the database and image store under `paths`.
    pub async fn open(paths: StoragePaths, cache: CacheSettings) -> Result<Self, StateError> {
        let db = Arc::new(PaywallDb::open(&paths.database())?);
        let access_cache = Arc::new(AccessCache::new(cache.capacity, cache.ttl));

        let images = ImageStore::new(paths);
        images.init().await?;

        Ok(Self {
            paywall: Paywall::new(db, access_cache),
            images: Arc::new(images),
            auth_config: AuthConfig::default(),
        })
    }

    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = auth_config;
        self
    }

    /// State with default cache settings and development auth.
    #[cfg(test)]
    pub async fn open_for_tests(paths: StoragePaths) -> Self {
        Self::open(paths, CacheSettings::default())
            .await
            .expect("failed to open test state")
    }
}
