use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::database::entities::{PostRow, PostTagRow, to_db_id, to_id};
use crate::database::error::RepoError;
use crate::database::store::PostStore;
use crate::models::{Conditions, Id, Page, PageRequest, Post, Scalar, Tag, UpdatePost};

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.summary, p.cover, p.status, p.pinned, p.view_count, p.user_id, p.category_id, p.created_at, p.updated_at, p.deleted_at";

/// 文章存储，维护文章与标签的关联
pub struct PostOperation {
    db: Arc<PgPool>,
}

impl PostOperation {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }

    /// 批量加载文章标签，按文章ID分组
    async fn load_tags(&self, post_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>, RepoError> {
        let mut grouped: HashMap<i64, Vec<Tag>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = sqlx::query_as::<_, PostTagRow>(
            r#"
            SELECT pt.post_id, t.id, t.name, t.created_at, t.updated_at
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.id
            "#,
        )
        .bind(post_ids)
        .fetch_all(&*self.db)
        .await?;

        for row in rows {
            let post_id = row.post_id;
            grouped.entry(post_id).or_default().push(row.into_tag()?);
        }
        Ok(grouped)
    }

    async fn assemble(&self, rows: Vec<PostRow>) -> Result<Vec<Post>, RepoError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut tags = self.load_tags(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let post_tags = tags.remove(&row.id).unwrap_or_default();
                row.into_post(post_tags)
            })
            .collect()
    }

    async fn replace_tags(
        tx: &mut Transaction<'_, Postgres>,
        post_id: i64,
        tags: &[Tag],
    ) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut **tx)
            .await?;

        if tags.is_empty() {
            return Ok(());
        }

        let tag_ids = tags
            .iter()
            .map(|t| to_db_id(t.id))
            .collect::<Result<Vec<_>, _>>()?;
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(post_id)
            .bind(&tag_ids)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

/// 将条件映射追加为 WHERE 子句，只接受白名单中的列
fn push_conditions(
    builder: &mut QueryBuilder<'_, Postgres>,
    conditions: &Conditions,
) -> Result<(), RepoError> {
    builder.push(" WHERE p.deleted_at IS NULL");

    let mut names: Vec<&String> = conditions.keys().collect();
    names.sort();

    for name in names {
        let value = &conditions[name];
        match name.as_str() {
            "user_id" => {
                builder.push(" AND p.user_id = ").push_bind(int_condition(name, value)?);
            }
            "category_id" => {
                builder
                    .push(" AND p.category_id = ")
                    .push_bind(int_condition(name, value)?);
            }
            "tag_id" => {
                builder
                    .push(" AND EXISTS (SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = ")
                    .push_bind(int_condition(name, value)?)
                    .push(")");
            }
            "status" => {
                builder.push(" AND p.status = ").push_bind(value.to_string());
            }
            "pinned" => {
                let pinned = value.as_bool().ok_or_else(|| {
                    RepoError::InvalidInput(format!("condition `{name}` expects a boolean"))
                })?;
                builder.push(" AND p.pinned = ").push_bind(pinned);
            }
            other => {
                return Err(RepoError::InvalidInput(format!(
                    "unsupported post condition `{other}`"
                )));
            }
        }
    }
    Ok(())
}

fn int_condition(name: &str, value: &Scalar) -> Result<i64, RepoError> {
    value
        .as_i64()
        .ok_or_else(|| RepoError::InvalidInput(format!("condition `{name}` expects an integer")))
}

#[async_trait]
impl PostStore for PostOperation {
    async fn create(&self, post: &Post) -> Result<Post, RepoError> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts AS p (title, content, summary, cover, status, pinned, view_count, user_id, category_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, $9, $10)
            RETURNING p.id, p.title, p.content, p.summary, p.cover, p.status, p.pinned, p.view_count, p.user_id, p.category_id, p.created_at, p.updated_at, p.deleted_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.summary)
        .bind(&post.cover)
        .bind(post.status.as_str())
        .bind(post.pinned)
        .bind(to_db_id(post.user_id)?)
        .bind(to_db_id(post.category_id)?)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_tags(&mut tx, row.id, &post.tags).await?;
        tx.commit().await?;

        tracing::debug!("Inserted post row {} with {} tags", row.id, post.tags.len());
        row.into_post(post.tags.clone())
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdatePost,
        tags: Option<&[Tag]>,
        at: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let db_id = to_db_id(id)?;
        let category_id = changes.category_id.map(to_db_id).transpose()?;
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts AS p
            SET title = COALESCE($2, p.title),
                content = COALESCE($3, p.content),
                summary = COALESCE($4, p.summary),
                cover = COALESCE($5, p.cover),
                status = COALESCE($6, p.status),
                pinned = COALESCE($7, p.pinned),
                category_id = COALESCE($8, p.category_id),
                updated_at = $9
            WHERE p.id = $1 AND p.deleted_at IS NULL
            RETURNING p.id, p.title, p.content, p.summary, p.cover, p.status, p.pinned, p.view_count, p.user_id, p.category_id, p.created_at, p.updated_at, p.deleted_at
            "#,
        )
        .bind(db_id)
        .bind(changes.title.as_deref())
        .bind(changes.content.as_deref())
        .bind(changes.summary.as_deref())
        .bind(changes.cover.as_deref())
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.pinned)
        .bind(category_id)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(tags) = tags {
            Self::replace_tags(&mut tx, db_id, tags).await?;
        }
        tx.commit().await?;

        let mut posts = self.assemble(vec![row]).await?;
        posts.pop().ok_or(RepoError::NotFound)
    }

    async fn delete(&self, id: Id, at: DateTime<Utc>) -> Result<(), RepoError> {
        let result =
            sqlx::query("UPDATE posts SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
                .bind(to_db_id(id)?)
                .bind(at)
                .execute(&*self.db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<Post, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1 AND p.deleted_at IS NULL"
        ))
        .bind(to_db_id(id)?)
        .fetch_one(&*self.db)
        .await?;

        let mut posts = self.assemble(vec![row]).await?;
        posts.pop().ok_or(RepoError::NotFound)
    }

    async fn list(
        &self,
        page: PageRequest,
        conditions: &Conditions,
    ) -> Result<Page<Post>, RepoError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_conditions(&mut count, conditions)?;
        let total: i64 = count.build_query_scalar().fetch_one(&*self.db).await?;

        if total == 0 {
            return Ok(Page::empty());
        }

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM posts p"));
        push_conditions(&mut select, conditions)?;
        select
            .push(" ORDER BY p.pinned DESC, p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows: Vec<PostRow> = select.build_query_as().fetch_all(&*self.db).await?;
        let items = self.assemble(rows).await?;
        Ok(Page {
            items,
            total: to_id(total)?,
        })
    }

    async fn increment_view_count(&self, id: Id, delta: u64) -> Result<(), RepoError> {
        let delta = i64::try_from(delta)
            .map_err(|_| RepoError::InvalidInput(format!("view delta {delta} out of range")))?;
        let result = sqlx::query(
            "UPDATE posts SET view_count = view_count + $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(to_db_id(id)?)
        .bind(delta)
        .execute(&*self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn ids_by_tag(&self, tag_id: Id) -> Result<Vec<Id>, RepoError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT pt.post_id
            FROM post_tags pt
            JOIN posts p ON p.id = pt.post_id
            WHERE pt.tag_id = $1 AND p.deleted_at IS NULL
            ORDER BY pt.post_id
            "#,
        )
        .bind(to_db_id(tag_id)?)
        .fetch_all(&*self.db)
        .await?;
        ids.into_iter().map(to_id).collect()
    }
}
