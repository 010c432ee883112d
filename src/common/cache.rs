use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::trace;

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Process-local keyed cache with a fixed time-to-live.
///
/// Entries are only as fresh as the last write through this instance; writers
/// elsewhere must call [`TtlCache::invalidate`] or [`TtlCache::invalidate_all`].
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<K, Entry<V>>>>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    trace!("Cache hit for {:?}", key);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // expired
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.stored_at.elapsed() >= self.ttl)
        {
            entries.remove(key);
        }
        None
    }

    pub async fn insert(&self, key: K, value: V) {
        self.entries.write().await.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.write().await.remove(key);
    }

    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        if !entries.is_empty() {
            trace!("Invalidating {} cache entries", entries.len());
        }
        entries.clear();
    }

    /// Drops expired entries and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(5));
        cache.insert("admin", 1).await;

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(cache.get(&"admin").await, Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&"admin").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_drops_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1u32, "a").await;
        cache.insert(2u32, "b").await;

        cache.invalidate(&1).await;
        assert_eq!(cache.get(&1).await, None);
        assert_eq!(cache.get(&2).await, Some("b"));

        cache.invalidate_all().await;
        assert_eq!(cache.get(&2).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_removes_only_expired() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.insert("old", 1).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.insert("new", 2).await;
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.get(&"new").await, Some(2));
    }
}
