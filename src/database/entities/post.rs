use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{parse_column, to_id};
use crate::database::error::RepoError;
use crate::models::{Post, Tag};

/// 文章数据库实体
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub cover: String,
    pub status: String,
    pub pinned: bool,
    pub view_count: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 文章-标签关联查询结果
#[derive(Debug, FromRow)]
pub struct PostTagRow {
    pub post_id: i64,
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostTagRow {
    pub fn into_tag(self) -> Result<Tag, RepoError> {
        Ok(Tag {
            id: to_id(self.id)?,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PostRow {
    /// 组装领域模型，标签由调用方单独查询
    pub fn into_post(self, tags: Vec<Tag>) -> Result<Post, RepoError> {
        Ok(Post {
            id: to_id(self.id)?,
            title: self.title,
            content: self.content,
            summary: self.summary,
            cover: self.cover,
            status: parse_column(&self.status)?,
            pinned: self.pinned,
            view_count: u64::try_from(self.view_count).unwrap_or(0),
            user_id: to_id(self.user_id)?,
            category_id: to_id(self.category_id)?,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}
