use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::entities::{TagRow, to_db_id};
use crate::database::error::RepoError;
use crate::database::store::TagStore;
use crate::models::{Id, Tag, UpdateTag};

const TAG_COLUMNS: &str = "id, name, created_at, updated_at";

/// 标签存储
pub struct TagOperation {
    db: Arc<PgPool>,
}

impl TagOperation {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagStore for TagOperation {
    async fn create(&self, tag: &Tag) -> Result<Tag, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(&format!(
            "INSERT INTO tags (name, created_at, updated_at) VALUES ($1, $2, $3) RETURNING {TAG_COLUMNS}"
        ))
        .bind(&tag.name)
        .bind(tag.created_at)
        .bind(tag.updated_at)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdateTag,
        at: DateTime<Utc>,
    ) -> Result<Tag, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(&format!(
            "UPDATE tags SET name = COALESCE($2, name), updated_at = $3 WHERE id = $1 RETURNING {TAG_COLUMNS}"
        ))
        .bind(to_db_id(id)?)
        .bind(changes.name.as_deref())
        .bind(at)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(to_db_id(id)?)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<Tag, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE id = $1"
        ))
        .bind(to_db_id(id)?)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn find_by_name(&self, name: &str) -> Result<Tag, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE name = $1"
        ))
        .bind(name)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn list_all(&self) -> Result<Vec<Tag>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags ORDER BY id"
        ))
        .fetch_all(&*self.db)
        .await?;
        rows.into_iter().map(Tag::try_from).collect()
    }

    async fn find_or_create_by_names(&self, names: &[String]) -> Result<Vec<Tag>, RepoError> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let mut tags = Vec::with_capacity(names.len());

        for name in names {
            // 并发创建同名标签时由唯一约束兜底
            sqlx::query(
                "INSERT INTO tags (name, created_at, updated_at) VALUES ($1, $2, $2) ON CONFLICT (name) DO NOTHING",
            )
            .bind(name)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let row = sqlx::query_as::<_, TagRow>(&format!(
                "SELECT {TAG_COLUMNS} FROM tags WHERE name = $1"
            ))
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;
            tags.push(Tag::try_from(row)?);
        }

        tx.commit().await?;
        Ok(tags)
    }
}
