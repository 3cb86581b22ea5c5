// メモリ内LRUキャッシュ: キャッシュキー → 翻訳文
//
// Bounded in-memory store shared by all translation workers of a process.
// One mutex guards the whole store; entries are evicted least recently used
// first once the capacity is reached.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Least-recently-used map from cache key to translated text.
#[derive(Debug)]
pub struct LruStore {
    capacity: usize,
    entries: HashMap<String, (String, u64)>,
    /// Recency tick → key; the first entry is the least recently used.
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl LruStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Look up `key`, marking it as most recently used.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let tick = self.next_tick();
        let (value, old_tick) = self.entries.get_mut(key)?;
        self.recency.remove(&*old_tick);
        *old_tick = tick;
        let value = value.clone();
        self.recency.insert(tick, key.to_string());
        Some(value)
    }

    /// Insert or replace `key`, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: &str, value: String) {
        let tick = self.next_tick();
        if let Some((_, old_tick)) = self.entries.remove(key) {
            self.recency.remove(&old_tick);
        } else if self.entries.len() >= self.capacity
            && let Some((_, evicted)) = self.recency.pop_first()
        {
            self.entries.remove(&evicted);
        }
        self.entries.insert(key.to_string(), (value, tick));
        self.recency.insert(tick, key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Thread-safe translation cache with hit/miss counters.
#[derive(Debug)]
pub struct TranslationCache {
    store: Mutex<LruStore>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            store: Mutex::new(LruStore::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// キャッシュから翻訳文を取得する。キャッシュミスの場合は None を返す。
    pub fn get(&self, key: &str) -> Option<String> {
        let found = self.lock().get(key);
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn insert(&self, key: &str, value: String) {
        self.lock().insert(key, value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
