use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::entities::{CommentRow, to_db_id, to_id};
use crate::database::error::RepoError;
use crate::database::store::CommentStore;
use crate::models::{Comment, Id, Page, PageRequest, UpdateComment};

const COMMENT_COLUMNS: &str =
    "id, content, post_id, user_id, parent_id, status, created_at, updated_at, deleted_at";

/// 评论存储
pub struct CommentOperation {
    db: Arc<PgPool>,
}

impl CommentOperation {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }

    /// 按外键列分页，最新的在前
    async fn list_by(
        &self,
        column: &str,
        id: Id,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        let id = to_db_id(id)?;
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM comments WHERE {column} = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_one(&*self.db)
        .await?;

        if total == 0 {
            return Ok(Page::empty());
        }

        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS} FROM comments
            WHERE {column} = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&*self.db)
        .await?;

        let items = rows
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: to_id(total)?,
        })
    }
}

#[async_trait]
impl CommentStore for CommentOperation {
    async fn create(&self, comment: &Comment) -> Result<Comment, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            INSERT INTO comments (content, post_id, user_id, parent_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(&comment.content)
        .bind(to_db_id(comment.post_id)?)
        .bind(to_db_id(comment.user_id)?)
        .bind(comment.parent_id.map(to_db_id).transpose()?)
        .bind(comment.status.as_str())
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdateComment,
        at: DateTime<Utc>,
    ) -> Result<Comment, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            UPDATE comments
            SET content = COALESCE($2, content),
                status = COALESCE($3, status),
                updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(to_db_id(id)?)
        .bind(changes.content.as_deref())
        .bind(changes.status.map(|s| s.as_str()))
        .bind(at)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn delete(&self, id: Id, at: DateTime<Utc>) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE comments SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(to_db_id(id)?)
        .bind(at)
        .execute(&*self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<Comment, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(to_db_id(id)?)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn list_by_post(
        &self,
        post_id: Id,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        self.list_by("post_id", post_id, page).await
    }

    async fn list_by_user(
        &self,
        user_id: Id,
        page: PageRequest,
    ) -> Result<Page<Comment>, RepoError> {
        self.list_by("user_id", user_id, page).await
    }
}
