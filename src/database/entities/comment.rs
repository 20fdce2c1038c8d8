use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{parse_column, to_id};
use crate::database::error::RepoError;
use crate::models::Comment;

/// 评论数据库实体
#[derive(Debug, FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = RepoError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: to_id(row.id)?,
            content: row.content,
            post_id: to_id(row.post_id)?,
            user_id: to_id(row.user_id)?,
            parent_id: row.parent_id.map(to_id).transpose()?,
            status: parse_column(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}
