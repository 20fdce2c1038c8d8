use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use super::error::CacheError;

/// 缓存后端的最小命令集
///
/// 读取未命中返回 `Ok(None)`，与错误严格区分。
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn del(&self, keys: &[String]) -> Result<(), CacheError>;

    /// 原子自增并返回新值，键不存在时从0开始
    async fn incr(&self, key: &str) -> Result<i64, CacheError>;

    /// 向集合添加成员并刷新集合的过期时间
    async fn sadd(&self, key: &str, member: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError>;
}

/// Redis 缓存后端
#[derive(Clone)]
pub struct RedisCache {
    client: Arc<RedisClient>,
}

impl RedisCache {
    /// 创建新的 Redis 缓存后端实例
    pub fn new(client: Arc<RedisClient>) -> Self {
        Self { client }
    }

    pub fn open(url: &str) -> Result<Self, CacheError> {
        let client = RedisClient::open(url)?;
        Ok(Self::new(Arc::new(client)))
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<(), CacheError> {
        // DEL 不接受空参数
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(keys).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let count: i64 = conn.incr(key, 1).await?;
        Ok(count)
    }

    async fn sadd(&self, key: &str, member: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .sadd(key, member)
            .ignore()
            .expire(key, ttl_secs(ttl) as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }
}
