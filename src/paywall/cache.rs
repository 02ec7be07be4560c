// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for access decisions.
//!
//! Readers take a generation stamp before reading the database and pass it
//! to `put`. Every invalidation bumps the generation, so a read that started
//! before an unlock committed can never re-insert its pre-unlock decision.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::access::AccessDecision;
use crate::models::ChapterId;

type CacheKey = (String, ChapterId);

struct CacheEntry {
    decision: AccessDecision,
    inserted_at: Instant,
}

struct Inner {
    entries: LruCache<CacheKey, CacheEntry>,
    generation: u64,
}

/// In-process cache of (user, chapter) access decisions.
pub struct AccessCache {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl AccessCache {
    /// - `capacity`: max number of (user, chapter) pairs; 0 is treated as 1.
    /// - `ttl`: time-to-live for each entry.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
                generation: 0,
            }),
            ttl,
        }
    }

    /// Current generation. Take this before reading the source of truth.
    pub fn generation(&self) -> u64 {
        self.inner.lock().map(|inner| inner.generation).unwrap_or(0)
    }

    /// Cached decision, or `None` if absent or expired.
    pub fn get(&self, user_id: &str, chapter_id: &ChapterId) -> Option<AccessDecision> {
        let key = (user_id.to_string(), chapter_id.clone());
        let mut inner = self.inner.lock().ok()?;
        if let Some(entry) = inner.entries.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.decision.clone());
            }
            inner.entries.pop(&key);
        }
        None
    }

    /// Store a decision read at `generation`. Ignored if an invalidation
    /// happened since.
    pub fn put(
        &self,
        user_id: &str,
        chapter_id: &ChapterId,
        decision: AccessDecision,
        generation: u64,
    ) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if inner.generation != generation {
            return false;
        }
        inner.entries.put(
            (user_id.to_string(), chapter_id.clone()),
            CacheEntry {
                decision,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Drop the entry for a (user, chapter) pair and bump the generation.
    pub fn invalidate(&self, user_id: &str, chapter_id: &ChapterId) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.generation = inner.generation.wrapping_add(1);
            inner.entries.pop(&(user_id.to_string(), chapter_id.clone()));
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
