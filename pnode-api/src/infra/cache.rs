// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use parking_lot::RwLock;
use std::{
    collections::HashMap,
    hash::Hash,
    time::{Duration, Instant},
};

/// TTL response cache for one data kind.
///
/// Values are servable via [TtlCache::get] while younger than the TTL; writes overwrite
/// unconditionally (last-write-wins). There is no eviction beyond overwrite.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, Entry<V>>>,
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Value for `key` if present and younger than the TTL.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_within(key, self.ttl)
    }

    /// Value for `key` if present and younger than `max_age`.
    pub fn get_within(&self, key: &K, max_age: Duration) -> Option<V> {
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < max_age)
            .map(|entry| entry.value.clone())
    }

    /// Value for `key` regardless of age (stale fallback).
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries
            .read()
            .get(key)
            .map(|entry| entry.value.clone())
    }

    /// Store `value` stamped now, overwriting any previous entry.
    pub fn insert(&self, key: K, value: V) {
        self.entries.write().insert(
            key,
            Entry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Pretend the entry for `key` was fetched `age` ago.
    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &K, age: Duration) {
        if let Some(entry) = self.entries.write().get_mut(key) {
            entry.fetched_at = Instant::now() - age;
        }
    }
}
