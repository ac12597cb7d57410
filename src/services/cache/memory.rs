use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::services::cache::client::{CacheClient, CacheResult};

/// In-process cache backend.
///
/// Expiry is lazy: an entry past its deadline is dropped on the next read of
/// that key. Good enough for tests and single-process dev setups; production
/// deployments should use `ValkeyClient`.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.lock();

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_within_ttl() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("tokens:abc", "payload", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(
            cache.get_string("tokens:abc").await.unwrap().as_deref(),
            Some("payload")
        );
        assert_eq!(cache.get_string("tokens:other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("tokens:abc", "payload", Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get_string("tokens:abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_is_last_writer_wins() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("k", "first", Duration::from_secs(5))
            .await
            .unwrap();
        cache
            .set_with_ttl("k", "second", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(
            cache.get_string("k").await.unwrap().as_deref(),
            Some("second")
        );
    }
}
