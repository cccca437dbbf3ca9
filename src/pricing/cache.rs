use crate::pricing::QuoteLadder;
use portable_atomic::{AtomicI64, Ordering};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Time source for cache expiry. Injected so tests control time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        let ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now_ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set_ms(&self, ms: i64) {
        self.now_ms.store(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    quotes: Arc<QuoteLadder>,
    created_at_ms: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub entries: Vec<CacheEntryStats>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryStats {
    pub key: String,
    pub age_ms: i64,
    pub quote_count: usize,
    pub expired: bool,
}

/// Premium cache keyed by serialized request.
///
/// Expiry is checked lazily on read: a stale entry is reported absent and
/// replaced by the next insert under the same key. Nothing is evicted in
/// the background. With no capacity the map grows without bound until
/// `clear()`; with a capacity the oldest entry makes room for a new key.
#[derive(Debug)]
pub struct PremiumCache {
    entries: HashMap<String, CacheEntry>,
    ttl_ms: i64,
    capacity: Option<usize>,
}

impl PremiumCache {
    pub fn new(ttl: Duration, capacity: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            capacity: capacity.filter(|&c| c > 0),
        }
    }

    #[inline]
    fn is_expired(&self, entry: &CacheEntry, now_ms: i64) -> bool {
        now_ms.saturating_sub(entry.created_at_ms) >= self.ttl_ms
    }

    /// Fresh entry for `key`, if any.
    pub fn get(&self, key: &str, now_ms: i64) -> Option<Arc<QuoteLadder>> {
        self.entries
            .get(key)
            .filter(|entry| !self.is_expired(entry, now_ms))
            .map(|entry| Arc::clone(&entry.quotes))
    }

    pub fn insert(&mut self, key: String, quotes: Arc<QuoteLadder>, now_ms: i64) {
        if let Some(cap) = self.capacity {
            if !self.entries.contains_key(&key) && self.entries.len() >= cap {
                self.make_room(cap, now_ms);
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                quotes,
                created_at_ms: now_ms,
            },
        );
    }

    fn make_room(&mut self, cap: usize, now_ms: i64) {
        let ttl_ms = self.ttl_ms;
        self.entries
            .retain(|_, e| now_ms.saturating_sub(e.created_at_ms) < ttl_ms);

        while self.entries.len() >= cap {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.created_at_ms)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    tracing::debug!(key = %k, "evicting oldest premium cache entry");
                    self.entries.remove(&k);
                }
                None => break,
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self, now_ms: i64) -> CacheStats {
        let mut entries: Vec<CacheEntryStats> = self
            .entries
            .iter()
            .map(|(key, entry)| CacheEntryStats {
                key: key.clone(),
                age_ms: now_ms.saturating_sub(entry.created_at_ms),
                quote_count: entry.quotes.len(),
                expired: self.is_expired(entry, now_ms),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            size: self.entries.len(),
            entries,
        }
    }
}
