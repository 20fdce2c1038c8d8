// 存储接口：各实体的持久化增删改查，不含缓存逻辑
// 按ID或唯一字段查询不到有效记录时返回 `RepoError::NotFound`；
// 更新按字段传入 `Option`，`None` 表示保持不变

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepoError;
use crate::models::{
    Category, Comment, Conditions, Id, Page, PageRequest, Post, Scalar, Tag, UpdateCategory,
    UpdateComment, UpdatePost, UpdateTag, UpdateUser, User,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// 插入用户（忽略 `user.id`），返回落库后的记录
    async fn create(&self, user: &User) -> Result<User, RepoError>;

    async fn update(
        &self,
        id: Id,
        changes: &UpdateUser,
        at: DateTime<Utc>,
    ) -> Result<User, RepoError>;

    async fn update_password(
        &self,
        id: Id,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepoError>;

    async fn delete(&self, id: Id) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Id) -> Result<User, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<User, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError>;

    async fn list(&self, page: PageRequest) -> Result<Page<User>, RepoError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create(&self, category: &Category) -> Result<Category, RepoError>;

    async fn update(
        &self,
        id: Id,
        changes: &UpdateCategory,
        at: DateTime<Utc>,
    ) -> Result<Category, RepoError>;

    async fn delete(&self, id: Id) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Id) -> Result<Category, RepoError>;

    async fn find_by_name(&self, name: &str) -> Result<Category, RepoError>;

    async fn list(&self, page: PageRequest) -> Result<Page<Category>, RepoError>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    async fn create(&self, tag: &Tag) -> Result<Tag, RepoError>;

    async fn update(&self, id: Id, changes: &UpdateTag, at: DateTime<Utc>)
    -> Result<Tag, RepoError>;

    async fn delete(&self, id: Id) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Id) -> Result<Tag, RepoError>;

    async fn find_by_name(&self, name: &str) -> Result<Tag, RepoError>;

    async fn list_all(&self) -> Result<Vec<Tag>, RepoError>;

    /// 按名称解析标签，不存在的自动创建，已有的直接复用；结果顺序与 `names` 一致
    async fn find_or_create_by_names(&self, names: &[String]) -> Result<Vec<Tag>, RepoError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// 插入文章及其标签关联
    async fn create(&self, post: &Post) -> Result<Post, RepoError>;

    /// 部分更新；`tags` 为 `Some` 时整体替换标签关联
    async fn update(
        &self,
        id: Id,
        changes: &UpdatePost,
        tags: Option<&[Tag]>,
        at: DateTime<Utc>,
    ) -> Result<Post, RepoError>;

    /// 软删除
    async fn delete(&self, id: Id, at: DateTime<Utc>) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Id) -> Result<Post, RepoError>;

    /// 条件分页查询，置顶优先，其次按创建时间倒序
    ///
    /// 支持的条件：`user_id`、`category_id`、`tag_id`、`status`、`pinned`
    async fn list(&self, page: PageRequest, conditions: &Conditions)
    -> Result<Page<Post>, RepoError>;

    /// 由数据库原子执行 `view_count = view_count + delta`
    async fn increment_view_count(&self, id: Id, delta: u64) -> Result<(), RepoError>;

    /// 关联了某个标签的未删除文章ID
    async fn ids_by_tag(&self, tag_id: Id) -> Result<Vec<Id>, RepoError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create(&self, comment: &Comment) -> Result<Comment, RepoError>;

    async fn update(
        &self,
        id: Id,
        changes: &UpdateComment,
        at: DateTime<Utc>,
    ) -> Result<Comment, RepoError>;

    /// 软删除
    async fn delete(&self, id: Id, at: DateTime<Utc>) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Id) -> Result<Comment, RepoError>;

    /// 最新的在前
    async fn list_by_post(&self, post_id: Id, page: PageRequest)
    -> Result<Page<Comment>, RepoError>;

    /// 最新的在前
    async fn list_by_user(&self, user_id: Id, page: PageRequest)
    -> Result<Page<Comment>, RepoError>;
}

/// 只含一个条件的查询条件
pub fn single(name: &str, id: Id) -> Conditions {
    let mut conditions = Conditions::new();
    conditions.insert(name.to_string(), Scalar::from(id));
    conditions
}
