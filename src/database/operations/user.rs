use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::entities::{UserRow, to_db_id};
use crate::database::error::RepoError;
use crate::database::store::UserStore;
use crate::models::{Id, Page, PageRequest, UpdateUser, User};

const USER_COLUMNS: &str = "id, username, password_hash, email, nickname, avatar, bio, role, status, created_at, updated_at";

/// 用户存储，处理所有与用户相关的数据库操作
pub struct UserOperation {
    db: Arc<PgPool>,
}

impl UserOperation {
    /// 创建新的用户存储实例
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }
}

#[async_trait]
impl UserStore for UserOperation {
    async fn create(&self, user: &User) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, password_hash, email, nickname, avatar, bio, role, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&user.avatar)
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&*self.db)
        .await?;

        tracing::debug!("Inserted user row {}", row.id);
        row.try_into()
    }

    async fn update(
        &self,
        id: Id,
        changes: &UpdateUser,
        at: DateTime<Utc>,
    ) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                nickname = COALESCE($4, nickname),
                avatar = COALESCE($5, avatar),
                bio = COALESCE($6, bio),
                role = COALESCE($7, role),
                status = COALESCE($8, status),
                updated_at = $9
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(to_db_id(id)?)
        .bind(changes.username.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.nickname.as_deref())
        .bind(changes.avatar.as_deref())
        .bind(changes.bio.as_deref())
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.status.map(|s| s.as_str()))
        .bind(at)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn update_password(
        &self,
        id: Id,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(to_db_id(id)?)
        .bind(password_hash)
        .bind(at)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn delete(&self, id: Id) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(to_db_id(id)?)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Id) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(to_db_id(id)?)
        .fetch_one(&*self.db)
        .await?;
        row.try_into()
    }

    async fn find_by_username(&self, username: &str) -> Result<User, RepoError> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError> {
        self.find_one("email", email).await
    }

    async fn list(&self, page: PageRequest) -> Result<Page<User>, RepoError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&*self.db)
            .await?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&*self.db)
        .await?;

        let items = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: total.max(0) as u64,
        })
    }
}
