// 进程内缓存后端，按条目过期
// 实现缓存操作所依赖的 Redis 命令子集，供测试或无 Redis 环境使用

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::backend::CacheBackend;
use super::error::CacheError;

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired_at(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(expires) if now >= expires)
    }
}

/// 内存缓存后端
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 键是否存在且未过期
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.lock()
            .map(|entries| entries.get(key).is_some_and(|e| !e.is_expired_at(now)))
            .unwrap_or(false)
    }

    /// 未过期的键数量
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .map(|entries| entries.values().filter(|e| !e.is_expired_at(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清除所有已过期的条目，返回清除的数量
    ///
    /// 读取时只会惰性删除被访问的键，从不再被读取的键需要定期清理。
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        match self.lock() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, e| !e.is_expired_at(now));
                before - entries.len()
            }
            Err(err) => {
                tracing::warn!("Skipping memory cache cleanup: {}", err);
                0
            }
        }
    }

    /// 按固定间隔在后台清理过期条目
    pub fn spawn_cleanup(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // 第一次 tick 立即返回
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.cleanup_expired();
                if removed > 0 {
                    tracing::debug!("Removed {} expired memory cache entries", removed);
                }
            }
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Unavailable(format!("memory cache lock poisoned: {e}")))
    }
}

fn wrong_type(key: &str) -> CacheError {
    CacheError::Unavailable(format!(
        "WRONGTYPE operation against key `{key}` holding the wrong kind of value"
    ))
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        if entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            entries.remove(key);
            return Ok(None);
        }
        match entries.get(key) {
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let (current, expires_at) = match entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => (0, None),
            Some(Entry {
                value: Value::Text(text),
                expires_at,
            }) => {
                let current = text.parse::<i64>().map_err(|_| {
                    CacheError::Unavailable(format!("value at `{key}` is not an integer"))
                })?;
                (current, *expires_at)
            }
            Some(_) => return Err(wrong_type(key)),
            None => (0, None),
        };
        let next = current + 1;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(next.to_string()),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn sadd(&self, key: &str, member: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        if entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            entries.remove(key);
        }
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Set(BTreeSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Set(members) => {
                members.insert(member.to_string());
            }
            Value::Text(_) => return Err(wrong_type(key)),
        }
        entry.expires_at = Some(now + ttl);
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => Ok(Vec::new()),
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => Ok(members.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_none_for_missing_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set_ex("k", "v", Duration::from_millis(30))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(!cache.contains("k"));
    }

    #[tokio::test]
    async fn incr_starts_from_zero() {
        let cache = MemoryCache::new();
        assert_eq!(cache.incr("counter").await.unwrap(), 1);
        assert_eq!(cache.incr("counter").await.unwrap(), 2);
        assert_eq!(cache.get("counter").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn sets_collect_members_and_del_removes_them() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.sadd("idx", "a", ttl).await.unwrap();
        cache.sadd("idx", "b", ttl).await.unwrap();
        cache.sadd("idx", "a", ttl).await.unwrap();
        assert_eq!(cache.smembers("idx").await.unwrap(), vec!["a", "b"]);

        cache.del(&["idx".to_string()]).await.unwrap();
        assert!(cache.smembers("idx").await.unwrap().is_empty());
    }

    fn raw_entries(cache: &MemoryCache) -> usize {
        cache.entries.lock().unwrap().len()
    }

    #[tokio::test]
    async fn cleanup_drops_expired_keys_that_are_never_read_again() {
        let cache = MemoryCache::new();
        for i in 0..100 {
            cache
                .set_ex(&format!("old:{i}"), "v", Duration::from_millis(1))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        for i in 0..100 {
            cache
                .set_ex(&format!("new:{i}"), "v", Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 100);
        assert_eq!(raw_entries(&cache), 200);

        assert_eq!(cache.cleanup_expired(), 100);
        assert_eq!(raw_entries(&cache), 100);
        assert!(cache.contains("new:0"));
    }

    #[tokio::test]
    async fn background_cleanup_runs_on_an_interval() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set_ex("short", "v", Duration::from_millis(1))
            .await
            .unwrap();
        let handle = cache.spawn_cleanup(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(raw_entries(&cache), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn text_commands_reject_sets() {
        let cache = MemoryCache::new();
        cache
            .sadd("idx", "a", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(cache.get("idx").await.is_err());
    }
}
