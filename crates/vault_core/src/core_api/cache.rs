use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::filter::FilterOptions;
use crate::fingerprint::Fingerprint;
use crate::perks::PerkExplosion;
use crate::table::Table;

use super::types::CacheStats;

#[derive(Debug, Clone)]
pub(crate) enum CachedView {
    Table(Arc<Table>),
    Perks(Arc<PerkExplosion>),
    Options(Arc<FilterOptions>),
}

/// Content-addressed store of computed views, evicting the oldest entry
/// once full.
#[derive(Debug)]
pub(crate) struct ViewCache {
    capacity: usize,
    entries: HashMap<Fingerprint, CachedView>,
    order: VecDeque<Fingerprint>,
    hits: u64,
    misses: u64,
}

impl ViewCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub(crate) fn get(&mut self, view: &str, key: &Fingerprint) -> Option<CachedView> {
        match self.entries.get(key) {
            Some(hit) => {
                self.hits += 1;
                tracing::debug!(view, key = %key.short(), "view cache hit");
                Some(hit.clone())
            }
            None => {
                self.misses += 1;
                tracing::debug!(view, key = %key.short(), "view cache miss");
                None
            }
        }
    }

    pub(crate) fn insert(&mut self, key: Fingerprint, value: CachedView) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key, value).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            capacity: self.capacity,
        }
    }
}
