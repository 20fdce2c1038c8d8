use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::backend::CacheBackend;
use crate::cache::error::CacheError;
use crate::cache::keys;
use crate::models::{Category, Comment, Conditions, Id, Page, PageRequest, Post, Tag, User};

/// 可被缓存的实体：确定键前缀与主键
pub trait CacheEntity: Serialize + DeserializeOwned + Send + Sync {
    /// 键前缀，如 `post:`
    const PREFIX: &'static str;

    fn id(&self) -> Id;
}

impl CacheEntity for User {
    const PREFIX: &'static str = "user:";

    fn id(&self) -> Id {
        self.id
    }
}

impl CacheEntity for Post {
    const PREFIX: &'static str = "post:";

    fn id(&self) -> Id {
        self.id
    }
}

impl CacheEntity for Category {
    const PREFIX: &'static str = "category:";

    fn id(&self) -> Id {
        self.id
    }
}

impl CacheEntity for Tag {
    const PREFIX: &'static str = "tag:";

    fn id(&self) -> Id {
        self.id
    }
}

impl CacheEntity for Comment {
    const PREFIX: &'static str = "comment:";

    fn id(&self) -> Id {
        self.id
    }
}

/// 单一实体类型的读穿缓存
///
/// 只认识自己的键空间，不感知其他实体的缓存。
pub struct EntityCache<T> {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            ttl: self.ttl,
            _entity: PhantomData,
        }
    }
}

impl<T: CacheEntity> EntityCache<T> {
    /// 创建实体缓存操作实例
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            _entity: PhantomData,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 缓存实体快照
    pub async fn set(&self, entity: &T) -> Result<(), CacheError> {
        let key = keys::entity_key(T::PREFIX, entity.id());
        self.put_json(&key, entity, self.ttl).await
    }

    /// 获取实体快照，未命中返回 `None`
    pub async fn get(&self, id: Id) -> Result<Option<T>, CacheError> {
        self.get_json(&keys::entity_key(T::PREFIX, id)).await
    }

    /// 删除实体快照
    pub async fn delete(&self, id: Id) -> Result<(), CacheError> {
        self.backend
            .del(&[keys::entity_key(T::PREFIX, id)])
            .await
    }

    /// 聚合列表哨兵键（id = 0），同时也是列表键的索引集合
    pub fn sentinel(&self) -> String {
        keys::sentinel_key(T::PREFIX)
    }

    /// 根据查询条件与分页生成列表缓存键
    pub fn list_key(&self, conditions: &Conditions, page: PageRequest) -> String {
        let fp = keys::fingerprint(conditions, &[&page.page, &page.page_size]);
        keys::list_key(T::PREFIX, &fp)
    }

    /// 缓存一页列表结果，并把键登记到索引中
    pub async fn set_list(
        &self,
        index: &str,
        key: &str,
        page: &Page<T>,
    ) -> Result<(), CacheError> {
        self.put_json(key, page, self.ttl).await?;
        self.backend.sadd(index, key, self.ttl).await
    }

    /// 获取缓存的列表页，未命中返回 `None`
    pub async fn get_list(&self, key: &str) -> Result<Option<Page<T>>, CacheError> {
        self.get_json(key).await
    }

    /// 清除索引登记的所有列表键以及索引本身
    pub async fn invalidate_index(&self, index: &str) -> Result<(), CacheError> {
        let mut stale = self.backend.smembers(index).await?;
        stale.push(index.to_string());
        tracing::debug!("Invalidating {} cached list keys under {}", stale.len() - 1, index);
        self.backend.del(&stale).await
    }

    /// 清除该实体的所有聚合列表缓存
    pub async fn invalidate_lists(&self) -> Result<(), CacheError> {
        self.invalidate_index(&self.sentinel()).await
    }

    pub(crate) fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub(crate) fn scoped_key(&self, scope: &str, id: Id, args: &[&dyn Display]) -> String {
        keys::detail_key(&format!("{}{}:", T::PREFIX, scope), id, args)
    }

    pub(crate) async fn put_json<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        self.backend.set_ex(key, &json, ttl).await
    }

    pub(crate) async fn get_json<V: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<V>, CacheError> {
        match self.backend.get(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
