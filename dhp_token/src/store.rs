// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Expiring key-value store.
//!
//! Backs short-lived lookups such as idempotency keys. Time is always passed
//! in by the caller, so behavior under expiry is fully deterministic in
//! tests.
//!
//! The store is not internally synchronized; callers wrap it in a lock the
//! same way other shared storages are handled.

use std::{borrow::Borrow, collections::HashMap, hash::Hash};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at_ms: u64,
}

/// Map whose entries stop being observable once their deadline passes.
///
/// Expired entries are skipped by reads and reclaimed by [`Self::purge_expired`];
/// there is no background timer.
#[derive(Debug, Clone)]
pub struct ExpiringStore<K, V> {
    entries: HashMap<K, Entry<V>>,
}

impl<K, V> Default for ExpiringStore<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> ExpiringStore<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts `value`, alive until `expires_at_ms` inclusive. Replaces any
    /// previous entry under the same key, live or not.
    pub fn insert(&mut self, key: K, value: V, expires_at_ms: u64) {
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at_ms,
            },
        );
    }

    /// Returns the live value under `key`, if any.
    pub fn get<Q>(&self, key: &Q, now_ms: u64) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries
            .get(key)
            .filter(|e| e.expires_at_ms >= now_ms)
            .map(|e| &e.value)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.remove(key).map(|e| e.value)
    }

    /// Drops every entry whose deadline has passed. Returns how many were
    /// reclaimed. Safe to call at any frequency; it only tightens state.
    pub fn purge_expired(&mut self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at_ms >= now_ms);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
