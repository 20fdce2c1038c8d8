use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{parse_column, to_id};
use crate::database::error::RepoError;
use crate::models::User;

/// 用户数据库实体
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub nickname: String,
    pub avatar: String,
    pub bio: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: to_id(row.id)?,
            username: row.username,
            password_hash: row.password_hash,
            email: row.email,
            nickname: row.nickname,
            avatar: row.avatar,
            bio: row.bio,
            role: parse_column(&row.role)?,
            status: parse_column(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
