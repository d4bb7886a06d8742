//! Decision cache keyed by (principal, permission)

use std::collections::HashMap;

use super::decision::DecisionReason;
use crate::types::{Permission, UserId};

/// Composite cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    principal: UserId,
    permission: Permission,
}

impl CacheKey {
    pub(crate) fn new(principal_id: &str, permission: &str) -> Self {
        Self {
            principal: UserId::from(principal_id),
            permission: Permission::from(permission),
        }
    }
}

/// Memo of every decision computed since the last clear
///
/// Stores allow and deny outcomes alike. There is no capacity bound and no
/// expiry: entries only disappear on `clear`. Not synchronized on its own;
/// the resolver keeps it under the same lock as the principal and catalog.
#[derive(Debug, Default)]
pub(crate) struct DecisionCache {
    entries: HashMap<CacheKey, DecisionReason>,
    hits: usize,
    misses: usize,
    clears: usize,
}

impl DecisionCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&mut self, key: &CacheKey) -> Option<DecisionReason> {
        match self.entries.get(key) {
            Some(reason) => {
                self.hits += 1;
                Some(*reason)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub(crate) fn put(&mut self, key: CacheKey, reason: DecisionReason) {
        self.entries.insert(key, reason);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.clears += 1;
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            clears: self.clears,
            entries: self.entries.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub clears: usize,
    pub entries: usize,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
