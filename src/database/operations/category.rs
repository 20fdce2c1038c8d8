use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::entities::{CategoryRow, to_db_id};
use crate::database::error::RepoError;
use crate::database::store::CategoryStore;
use crate::models::{Category, Id, Page, PageRequest, UpdateCategory};

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";

/// 分类存储
pub struct CategoryOperation {
    db: Arc<PgPool>,
}

impl CategoryOperation {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryStore for CategoryOperation {
    async fn create(&self, category: &Category) -> Result<Category, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r#"
            INSERT INTO categories (name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdateCategory,
        at: DateTime<Utc>,
    ) -> Result<Category, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = $4
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(to_db_id(id)?)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(at)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(to_db_id(id)?)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<Category, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(to_db_id(id)?)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn find_by_name(&self, name: &str) -> Result<Category, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = $1"
        ))
        .bind(name)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Category>, RepoError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&*self.db)
            .await?;

        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&*self.db)
        .await?;

        let items = rows
            .into_iter()
            .map(Category::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: total.max(0) as u64,
        })
    }
}
