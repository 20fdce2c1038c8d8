use std::sync::Arc;

use chrono::Utc;

use super::error::{OrMissing, ServiceResult};
use super::{ensure_unique, first_failure, list_through, read_through, require_text};
use crate::cache::{CacheError, EntityCache};
use crate::database::{PostStore, RepoError, TagStore};
use crate::models::tag::normalize_names;
use crate::models::{Id, NewTag, Page, Post, Tag, UpdateTag};

/// 标签服务
///
/// 文章快照内嵌标签，因此标签改名或删除时同时清除相关文章的缓存。
pub struct TagService {
    store: Arc<dyn TagStore>,
    posts: Arc<dyn PostStore>,
    cache: EntityCache<Tag>,
    post_cache: EntityCache<Post>,
}

impl TagService {
    pub fn new(
        store: Arc<dyn TagStore>,
        posts: Arc<dyn PostStore>,
        cache: EntityCache<Tag>,
        post_cache: EntityCache<Post>,
    ) -> Self {
        Self {
            store,
            posts,
            cache,
            post_cache,
        }
    }

    /// 清除引用了该标签的文章快照、文章标签列表以及文章列表缓存
    async fn purge_posts(&self, post_ids: &[Id]) -> Vec<Result<(), CacheError>> {
        let mut results = Vec::with_capacity(post_ids.len() * 2 + 1);
        for &post_id in post_ids {
            results.push(self.post_cache.delete(post_id).await);
            results.push(self.cache.delete_post_tags(post_id).await);
        }
        results.push(self.post_cache.invalidate_lists().await);
        results
    }

    pub async fn create(&self, new: NewTag) -> ServiceResult<Tag> {
        let name = new.name.trim().to_string();
        require_text("tag name", &name)?;
        ensure_unique("tag name", None, self.store.find_by_name(&name)).await?;

        let now = Utc::now();
        let tag = Tag {
            id: 0,
            name,
            created_at: now,
            updated_at: now,
        };
        let tag = self.store.create(&tag).await?;
        self.cache.set(&tag).await?;
        self.cache.invalidate_lists().await?;

        tracing::info!("Created tag {} ({})", tag.id, tag.name);
        Ok(tag)
    }

    pub async fn update(&self, id: Id, mut changes: UpdateTag) -> ServiceResult<Tag> {
        if let Some(name) = changes.name.take() {
            let name = name.trim().to_string();
            require_text("tag name", &name)?;
            ensure_unique("tag name", Some(id), self.store.find_by_name(&name)).await?;
            changes.name = Some(name);
        }

        let post_ids = self.posts.ids_by_tag(id).await?;
        let tag = self
            .store
            .update(id, &changes, Utc::now())
            .await
            .or_missing("tag")?;
        self.cache.set(&tag).await?;
        self.cache.invalidate_lists().await?;
        for result in self.purge_posts(&post_ids).await {
            result?;
        }

        tracing::info!("Updated tag {}", id);
        Ok(tag)
    }

    pub async fn delete(&self, id: Id) -> ServiceResult<()> {
        // 删除后关联随之消失，需先取出受影响的文章
        let post_ids = self.posts.ids_by_tag(id).await?;
        self.store.delete(id).await.or_missing("tag")?;

        let mut results = vec![
            self.cache.delete(id).await,
            self.cache.invalidate_lists().await,
        ];
        results.extend(self.purge_posts(&post_ids).await);
        tracing::info!("Deleted tag {}", id);
        first_failure("tag", id, results)
    }

    pub async fn get(&self, id: Id) -> ServiceResult<Tag> {
        read_through(&self.cache, id, "tag", || self.store.find_by_id(id)).await
    }

    /// 全部标签，按ID排序
    pub async fn list_all(&self) -> ServiceResult<Vec<Tag>> {
        let index = self.cache.sentinel();
        let page = list_through(&self.cache, &index, self.cache.all_key(), || async {
            let tags = self.store.list_all().await?;
            let total = tags.len() as u64;
            Ok::<_, RepoError>(Page { items: tags, total })
        })
        .await?;
        Ok(page.items)
    }

    /// 文章的标签集合，先查缓存，未命中时从文章读取
    pub async fn post_tags(&self, post_id: Id) -> ServiceResult<Vec<Tag>> {
        if let Some(tags) = self.cache.get_post_tags(post_id).await? {
            return Ok(tags);
        }

        let post = self.posts.find_by_id(post_id).await.or_missing("post")?;
        if let Err(err) = self.cache.set_post_tags(post_id, &post.tags).await {
            tracing::warn!("Failed to cache tags of post {}: {}", post_id, err);
        }
        Ok(post.tags)
    }

    /// 按名称解析标签，不存在的自动创建；同名标签只会有一条
    pub async fn find_or_create(&self, names: &[String]) -> ServiceResult<Vec<Tag>> {
        let names = normalize_names(names);
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let tags = self.store.find_or_create_by_names(&names).await?;
        self.cache.invalidate_lists().await?;
        Ok(tags)
    }
}
