//! Thread-Safe Storage Engine
//!
//! This module implements the key space: a concurrent map from key to [`Entry`]
//! with lazy, read-time expiry and no background sweeper.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: Keys are spread over independent shards, each behind its
//!    own `RwLock`. Any single-key operation takes exactly one shard lock, so every
//!    operation on the same key is totally ordered.
//! 2. **Readers vs Writers**: `get`, `exists` and the reporting helpers take shared
//!    locks. `set`, `delete`, `expire` and `clear` take exclusive locks.
//! 3. **Lazy Expiry**: The engine never filters by expiry on its own. Callers
//!    decide (GET does, EXISTS does not) and may ask for an expired key to be
//!    evicted with [`StorageEngine::evict_if_expired`].
//! 4. **Snapshots Out**: `get` returns a clone of the entry. Nothing outside the
//!    engine ever holds a reference into the map.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `clear` acquires every shard's write lock (in shard order) before removing
//! anything, so no reader can observe a half-cleared key space.

use crate::storage::entry::{DataType, Entry};
use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Number of shards for the storage engine.
/// More shards = less lock contention, but more memory overhead.
const NUM_SHARDS: usize = 64;

/// Rough per-entry bookkeeping cost used by [`StorageEngine::memory_info`].
const ENTRY_OVERHEAD: usize = 64;

type ShardMap = HashMap<Bytes, Entry>;

/// A single shard containing a portion of the key space.
#[derive(Debug, Default)]
struct Shard {
    data: RwLock<ShardMap>,
}

impl Shard {
    // Poisoned means a writer panicked mid-update; treat it as fatal.
    fn read(&self) -> RwLockReadGuard<'_, ShardMap> {
        self.data.read().expect("storage shard lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, ShardMap> {
        self.data.write().expect("storage shard lock poisoned")
    }
}

/// The shared key space.
///
/// Wrap it in an `Arc` and hand a clone to every connection task. All
/// operations take `&self` and are safe to call from any thread.
///
/// # Example
///
/// ```
/// use kvstore::storage::{DataType, StorageEngine};
/// use bytes::Bytes;
///
/// let engine = StorageEngine::new();
///
/// engine.set(Bytes::from("name"), Bytes::from("alice"), DataType::String);
///
/// let entry = engine.get(b"name").unwrap();
/// assert_eq!(entry.value, Bytes::from("alice"));
/// assert!(engine.exists(b"name"));
/// assert!(engine.delete(b"name"));
/// assert!(engine.is_empty());
/// ```
pub struct StorageEngine {
    shards: Vec<Shard>,

    /// Statistics: total read operations
    get_count: AtomicU64,

    /// Statistics: total write operations
    set_count: AtomicU64,

    /// Statistics: total delete operations
    del_count: AtomicU64,

    /// Statistics: expired keys evicted on access
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .field("del_count", &self.del_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates an empty storage engine.
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Shard::default()).collect();

        Self {
            shards,
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Determines which shard a key belongs to.
    #[inline]
    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Stores `value` under `key` with the given type and no expiry.
    ///
    /// Any existing entry, including its expiry, is replaced.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new key was created, `false` if an existing key was replaced.
    pub fn set(&self, key: Bytes, value: Bytes, data_type: DataType) -> bool {
        self.set_entry(key, Entry::new(value, data_type))
    }

    /// Stores a pre-built entry under `key`, replacing whatever was there.
    ///
    /// This is how callers install an entry that already carries an expiry.
    pub fn set_entry(&self, key: Bytes, entry: Entry) -> bool {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let mut data = self.shard(&key).write();
        data.insert(key, entry).is_none()
    }

    /// Returns a snapshot of the entry stored under `key`.
    ///
    /// Expired entries are returned as-is; deciding what an expired entry means
    /// is up to the caller.
    pub fn get(&self, key: &[u8]) -> Option<Entry> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let data = self.shard(key).read();
        data.get(key).cloned()
    }

    /// Removes `key`.
    ///
    /// # Returns
    ///
    /// Returns `true` if something was removed, expired or not.
    pub fn delete(&self, key: &[u8]) -> bool {
        self.del_count.fetch_add(1, Ordering::Relaxed);

        let mut data = self.shard(key).write();
        data.remove(key).is_some()
    }

    /// Raw presence check. Does not look at expiry.
    pub fn exists(&self, key: &[u8]) -> bool {
        let data = self.shard(key).read();
        data.contains_key(key)
    }

    /// Sets the expiry deadline of an existing key, leaving its value and
    /// creation time untouched.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was present, `false` otherwise.
    pub fn expire(&self, key: &[u8], deadline: Instant) -> bool {
        let mut data = self.shard(key).write();

        match data.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(deadline);
                true
            }
            None => false,
        }
    }

    /// Removes `key` if, and only if, it is expired at the time the write lock
    /// is held.
    ///
    /// A reader that saw an expired snapshot may race with a writer that just
    /// replaced the key; re-checking under the lock keeps the fresh value.
    pub fn evict_if_expired(&self, key: &[u8]) -> bool {
        let mut data = self.shard(key).write();

        let expired = data.get(key).is_some_and(Entry::is_expired);
        if expired {
            data.remove(key);
            self.expired_count.fetch_add(1, Ordering::Relaxed);
        }
        expired
    }

    /// Removes every key.
    pub fn clear(&self) {
        let mut guards: Vec<_> = self.shards.iter().map(Shard::write).collect();
        for data in guards.iter_mut() {
            data.clear();
        }
    }

    /// Returns the number of keys currently in the map, expired ones included.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Returns true if the key space is empty.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Returns how many keys carry an expiry deadline.
    pub fn expiring_count(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .values()
                    .filter(|entry| entry.expires_at.is_some())
                    .count()
            })
            .sum()
    }

    /// Returns the mean remaining TTL over live keys that carry a deadline,
    /// or None when no such key exists.
    pub fn avg_ttl(&self) -> Option<Duration> {
        let mut total = Duration::ZERO;
        let mut count = 0u32;

        for shard in &self.shards {
            for ttl in shard.read().values().filter_map(Entry::ttl) {
                if !ttl.is_zero() {
                    total += ttl;
                    count += 1;
                }
            }
        }

        total.checked_div(count)
    }

    /// Returns operation counters.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }

    /// Returns memory usage information (approximate).
    pub fn memory_info(&self) -> MemoryInfo {
        let mut keys = 0usize;
        let mut used_memory = 0usize;

        for shard in &self.shards {
            let data = shard.read();
            for (key, entry) in data.iter() {
                keys += 1;
                used_memory += key.len() + entry.value.len() + ENTRY_OVERHEAD;
            }
        }

        MemoryInfo { keys, used_memory }
    }
}

/// Operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Total GET operations
    pub get_ops: u64,
    /// Total SET operations
    pub set_ops: u64,
    /// Total DEL operations
    pub del_ops: u64,
    /// Expired keys evicted on access
    pub expired: u64,
}

/// Memory usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    /// Number of keys
    pub keys: usize,
    /// Approximate memory used in bytes
    pub used_memory: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_str(engine: &StorageEngine, key: &str, value: &str) -> bool {
        engine.set(Bytes::from(key.to_string()), Bytes::from(value.to_string()), DataType::String)
    }

    #[test]
    fn test_set_and_get() {
        let engine = StorageEngine::new();

        assert!(set_str(&engine, "key", "value"));
        let entry = engine.get(b"key").unwrap();
        assert_eq!(entry.value, Bytes::from("value"));
        assert_eq!(entry.data_type, DataType::String);
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_get_nonexistent() {
        let engine = StorageEngine::new();
        assert!(engine.get(b"nonexistent").is_none());
    }

    #[test]
    fn test_set_replaces_entry_and_expiry() {
        let engine = StorageEngine::new();

        let entry = Entry::string(Bytes::from("old")).with_expiry(Instant::now());
        assert!(engine.set_entry(Bytes::from("key"), entry));
        assert!(!set_str(&engine, "key", "new"));

        let entry = engine.get(b"key").unwrap();
        assert_eq!(entry.value, Bytes::from("new"));
        assert!(entry.expires_at.is_none());
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_delete() {
        let engine = StorageEngine::new();

        set_str(&engine, "key", "value");
        assert!(engine.delete(b"key"));
        assert!(engine.get(b"key").is_none());
        assert!(!engine.delete(b"key"));
    }

    #[test]
    fn test_exists_ignores_expiry() {
        let engine = StorageEngine::new();

        assert!(!engine.exists(b"key"));
        let past = Instant::now();
        std::thread::sleep(Duration::from_millis(5));
        engine.set_entry(Bytes::from("key"), Entry::string(Bytes::from("v")).with_expiry(past));

        assert!(engine.exists(b"key"));
        assert!(engine.get(b"key").unwrap().is_expired());
    }

    #[test]
    fn test_expire_updates_only_deadline() {
        let engine = StorageEngine::new();

        set_str(&engine, "key", "value");
        let before = engine.get(b"key").unwrap();
        let deadline = Instant::now() + Duration::from_secs(60);

        assert!(engine.expire(b"key", deadline));
        let after = engine.get(b"key").unwrap();
        assert_eq!(after.value, before.value);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.expires_at, Some(deadline));

        assert!(!engine.expire(b"missing", deadline));
        assert!(!engine.exists(b"missing"));
    }

    #[test]
    fn test_evict_if_expired() {
        let engine = StorageEngine::new();

        set_str(&engine, "live", "value");
        assert!(!engine.evict_if_expired(b"live"));
        assert!(engine.exists(b"live"));

        let past = Instant::now();
        std::thread::sleep(Duration::from_millis(5));
        engine.set_entry(Bytes::from("dead"), Entry::string(Bytes::from("v")).with_expiry(past));

        assert!(engine.evict_if_expired(b"dead"));
        assert!(!engine.exists(b"dead"));
        assert!(!engine.evict_if_expired(b"dead"));
        assert_eq!(engine.stats().expired, 1);
    }

    #[test]
    fn test_clear() {
        let engine = StorageEngine::new();

        for i in 0..100 {
            set_str(&engine, &format!("key{}", i), "value");
        }
        assert_eq!(engine.len(), 100);

        engine.clear();
        assert_eq!(engine.len(), 0);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_expiring_count_and_memory() {
        let engine = StorageEngine::new();

        set_str(&engine, "a", "1");
        let deadline = Instant::now() + Duration::from_secs(10);
        engine.set_entry(Bytes::from("b"), Entry::string(Bytes::from("22")).with_expiry(deadline));

        assert_eq!(engine.expiring_count(), 1);

        let mem = engine.memory_info();
        assert_eq!(mem.keys, 2);
        assert_eq!(mem.used_memory, (1 + 1 + ENTRY_OVERHEAD) + (1 + 2 + ENTRY_OVERHEAD));
    }

    #[test]
    fn test_stats_counters() {
        let engine = StorageEngine::new();

        set_str(&engine, "a", "1");
        engine.get(b"a");
        engine.get(b"b");
        engine.delete(b"a");

        let stats = engine.stats();
        assert_eq!(stats.set_ops, 1);
        assert_eq!(stats.get_ops, 2);
        assert_eq!(stats.del_ops, 1);
        assert_eq!(stats.expired, 0);
    }

    #[test]
    fn test_avg_ttl() {
        let engine = StorageEngine::new();
        assert_eq!(engine.avg_ttl(), None);

        set_str(&engine, "forever", "v");
        assert_eq!(engine.avg_ttl(), None);

        let now = Instant::now();
        for (key, secs) in [("a", 100), ("b", 300)] {
            let entry = Entry::string(Bytes::from("v")).with_expiry(now + Duration::from_secs(secs));
            engine.set_entry(Bytes::from(key), entry);
        }
        // Already past its deadline, so it does not count
        engine.set_entry(Bytes::from("dead"), Entry::string(Bytes::from("v")).with_expiry(now));

        let avg = engine.avg_ttl().unwrap();
        assert!(avg <= Duration::from_secs(200));
        assert!(avg > Duration::from_secs(199));
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        for i in 0..10 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    engine.set(Bytes::from(key.clone()), Bytes::from("value"), DataType::String);
                    assert!(engine.get(key.as_bytes()).is_some());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 1000);
    }

    #[test]
    fn test_concurrent_writers_same_key() {
        use std::sync::Arc;
        use std::thread;

        let engine = Arc::new(StorageEngine::new());
        let mut handles = vec![];

        for i in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(thread::spawn(move || {
                let value = Bytes::from(format!("writer-{}", i));
                for _ in 0..200 {
                    engine.set(Bytes::from("shared"), value.clone(), DataType::String);
                    let seen = engine.get(b"shared").unwrap();
                    // Whole values only: never a torn write.
                    assert!(seen.value.starts_with(b"writer-"));
                    assert_eq!(seen.value.len(), 8);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 1);
    }
}
