use std::sync::Arc;

use chrono::Utc;

use super::error::{OrMissing, ServiceResult};
use super::{check_page, first_failure, list_through, read_through, require_text};
use crate::cache::EntityCache;
use crate::config::ServiceSettings;
use crate::database::store::single;
use crate::database::{CategoryStore, PostStore, TagStore};
use crate::models::tag::normalize_names;
use crate::models::{Conditions, Id, NewPost, Page, PageRequest, Post, Tag, UpdatePost};

/// 文章服务，负责标签解析与浏览量批量同步
pub struct PostService {
    store: Arc<dyn PostStore>,
    tags: Arc<dyn TagStore>,
    categories: Arc<dyn CategoryStore>,
    cache: EntityCache<Post>,
    tag_cache: EntityCache<Tag>,
    settings: Arc<ServiceSettings>,
}

impl PostService {
    pub fn new(
        store: Arc<dyn PostStore>,
        tags: Arc<dyn TagStore>,
        categories: Arc<dyn CategoryStore>,
        cache: EntityCache<Post>,
        tag_cache: EntityCache<Tag>,
        settings: Arc<ServiceSettings>,
    ) -> Self {
        Self {
            store,
            tags,
            categories,
            cache,
            tag_cache,
            settings,
        }
    }

    /// 按名称解析标签，新建标签后清除标签列表缓存
    async fn resolve_tags(&self, names: &[String]) -> ServiceResult<Vec<Tag>> {
        let names = normalize_names(names);
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let tags = self.tags.find_or_create_by_names(&names).await?;
        self.tag_cache.invalidate_lists().await?;
        Ok(tags)
    }

    async fn ensure_category(&self, category_id: Id) -> ServiceResult<()> {
        self.categories
            .find_by_id(category_id)
            .await
            .or_missing("category")?;
        Ok(())
    }

    /// 创建文章，`tag_names` 中的标签不存在时自动创建
    pub async fn create(&self, new: NewPost, tag_names: &[String]) -> ServiceResult<Post> {
        require_text("title", &new.title)?;
        self.ensure_category(new.category_id).await?;
        let tags = self.resolve_tags(tag_names).await?;

        let now = Utc::now();
        let post = Post {
            id: 0,
            title: new.title,
            content: new.content,
            summary: new.summary,
            cover: new.cover,
            status: new.status,
            pinned: new.pinned,
            view_count: 0,
            user_id: new.user_id,
            category_id: new.category_id,
            tags,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let post = self.store.create(&post).await?;
        self.cache.set(&post).await?;
        self.cache.invalidate_lists().await?;

        tracing::info!("Created post {} by user {}", post.id, post.user_id);
        Ok(post)
    }

    /// 部分更新文章；`tag_names` 为 `Some` 时整体替换标签集合（空列表即清空）
    pub async fn update(
        &self,
        id: Id,
        changes: UpdatePost,
        tag_names: Option<Vec<String>>,
    ) -> ServiceResult<Post> {
        if let Some(title) = &changes.title {
            require_text("title", title)?;
        }
        if let Some(category_id) = changes.category_id {
            self.ensure_category(category_id).await?;
        }
        let tags = match tag_names {
            Some(names) => Some(self.resolve_tags(&names).await?),
            None => None,
        };

        let post = self
            .store
            .update(id, &changes, tags.as_deref(), Utc::now())
            .await
            .or_missing("post")?;
        self.cache.set(&post).await?;
        if tags.is_some() {
            self.tag_cache.delete_post_tags(id).await?;
        }
        self.cache.invalidate_lists().await?;

        tracing::info!("Updated post {}", id);
        Ok(post)
    }

    pub async fn delete(&self, id: Id) -> ServiceResult<()> {
        self.store.delete(id, Utc::now()).await.or_missing("post")?;

        let results = vec![
            self.cache.delete(id).await,
            self.cache.delete_view_count(id).await,
            self.tag_cache.delete_post_tags(id).await,
            self.cache.invalidate_lists().await,
        ];
        tracing::info!("Deleted post {}", id);
        first_failure("post", id, results)
    }

    pub async fn get(&self, id: Id) -> ServiceResult<Post> {
        read_through(&self.cache, id, "post", || self.store.find_by_id(id)).await
    }

    /// 阅读文章：读取并计一次浏览
    ///
    /// 返回的 `view_count` 包含尚未同步到数据库的浏览次数。
    pub async fn view(&self, id: Id) -> ServiceResult<Post> {
        let post = self.get(id).await?;
        let count = self.increment_view_count(id).await?;
        let pending = count % self.settings.view_count_batch.max(1);

        let mut post = if pending == 0 {
            self.get(id).await?
        } else {
            post
        };
        post.view_count += pending;
        Ok(post)
    }

    /// 浏览量加一并返回缓存中的累计值
    ///
    /// 累计值每到批量大小的整数倍时，数据库中的浏览量原子地加上一个批量，
    /// 同时删除文章快照以便下次读取拿到新值。
    pub async fn increment_view_count(&self, id: Id) -> ServiceResult<u64> {
        let batch = self.settings.view_count_batch.max(1);
        let count = self.cache.incr_view_count(id).await?;

        if count % batch == 0 {
            self.store
                .increment_view_count(id, batch)
                .await
                .or_missing("post")?;
            self.cache.delete(id).await?;
            tracing::debug!("Flushed {} views of post {} (total {})", batch, id, count);
        }
        Ok(count)
    }

    /// 条件分页查询，支持 `user_id`、`category_id`、`tag_id`、`status`、`pinned`
    pub async fn list(&self, conditions: Conditions, page: PageRequest) -> ServiceResult<Page<Post>> {
        let page = check_page(page, &self.settings)?;
        let key = self.cache.list_key(&conditions, page);
        let index = self.cache.sentinel();
        list_through(&self.cache, &index, key, || self.store.list(page, &conditions)).await
    }

    pub async fn list_by_category(&self, category_id: Id, page: PageRequest) -> ServiceResult<Page<Post>> {
        self.list(single("category_id", category_id), page).await
    }

    pub async fn list_by_tag(&self, tag_id: Id, page: PageRequest) -> ServiceResult<Page<Post>> {
        self.list(single("tag_id", tag_id), page).await
    }

    pub async fn list_by_user(&self, user_id: Id, page: PageRequest) -> ServiceResult<Page<Post>> {
        self.list(single("user_id", user_id), page).await
    }
}
