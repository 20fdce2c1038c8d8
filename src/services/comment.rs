use std::sync::Arc;

use chrono::Utc;

use super::error::{OrMissing, ServiceError, ServiceResult};
use super::{check_page, first_failure, list_through, read_through, require_text};
use crate::cache::EntityCache;
use crate::config::ServiceSettings;
use crate::database::{CommentStore, PostStore};
use crate::models::{Comment, CommentStatus, Id, NewComment, Page, PageRequest, UpdateComment};

/// 评论服务
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    posts: Arc<dyn PostStore>,
    cache: EntityCache<Comment>,
    settings: Arc<ServiceSettings>,
}

impl CommentService {
    pub fn new(
        store: Arc<dyn CommentStore>,
        posts: Arc<dyn PostStore>,
        cache: EntityCache<Comment>,
        settings: Arc<ServiceSettings>,
    ) -> Self {
        Self {
            store,
            posts,
            cache,
            settings,
        }
    }

    /// 发表评论；回复时父评论必须存在且属于同一篇文章
    pub async fn create(&self, new: NewComment) -> ServiceResult<Comment> {
        require_text("content", &new.content)?;
        self.posts
            .find_by_id(new.post_id)
            .await
            .or_missing("post")?;

        if let Some(parent_id) = new.parent_id {
            let parent = self
                .store
                .find_by_id(parent_id)
                .await
                .or_missing("parent comment")?;
            if parent.post_id != new.post_id {
                return Err(ServiceError::InvalidInput(format!(
                    "parent comment {} belongs to post {}, not {}",
                    parent_id, parent.post_id, new.post_id
                )));
            }
        }

        let now = Utc::now();
        let comment = Comment {
            id: 0,
            content: new.content,
            post_id: new.post_id,
            user_id: new.user_id,
            parent_id: new.parent_id,
            status: CommentStatus::Approved,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let comment = self.store.create(&comment).await?;
        self.cache.set(&comment).await?;
        self.cache.invalidate_for(&comment).await?;

        tracing::info!(
            "Created comment {} on post {} by user {}",
            comment.id,
            comment.post_id,
            comment.user_id
        );
        Ok(comment)
    }

    pub async fn update(&self, id: Id, changes: UpdateComment) -> ServiceResult<Comment> {
        if let Some(content) = &changes.content {
            require_text("content", content)?;
        }

        let comment = self
            .store
            .update(id, &changes, Utc::now())
            .await
            .or_missing("comment")?;
        self.cache.set(&comment).await?;
        self.cache.invalidate_for(&comment).await?;

        tracing::info!("Updated comment {}", id);
        Ok(comment)
    }

    pub async fn delete(&self, id: Id) -> ServiceResult<()> {
        let comment = self.store.find_by_id(id).await.or_missing("comment")?;
        self.store.delete(id, Utc::now()).await.or_missing("comment")?;

        let results = vec![
            self.cache.delete(id).await,
            self.cache.invalidate_for(&comment).await,
        ];
        tracing::info!("Deleted comment {}", id);
        first_failure("comment", id, results)
    }

    pub async fn get(&self, id: Id) -> ServiceResult<Comment> {
        read_through(&self.cache, id, "comment", || self.store.find_by_id(id)).await
    }

    /// 文章下的评论，最新的在前
    pub async fn list_by_post(&self, post_id: Id, page: PageRequest) -> ServiceResult<Page<Comment>> {
        let page = check_page(page, &self.settings)?;
        let key = self.cache.post_list_key(post_id, page);
        let index = self.cache.post_index(post_id);
        list_through(&self.cache, &index, key, || self.store.list_by_post(post_id, page)).await
    }

    /// 用户发表的评论，最新的在前
    pub async fn list_by_user(&self, user_id: Id, page: PageRequest) -> ServiceResult<Page<Comment>> {
        let page = check_page(page, &self.settings)?;
        let key = self.cache.user_list_key(user_id, page);
        let index = self.cache.user_index(user_id);
        list_through(&self.cache, &index, key, || self.store.list_by_user(user_id, page)).await
    }
}
