use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::to_id;
use crate::database::error::RepoError;
use crate::models::Tag;

/// 标签数据库实体
#[derive(Debug, FromRow)]
pub struct TagRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TagRow> for Tag {
    type Error = RepoError;

    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        Ok(Tag {
            id: to_id(row.id)?,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
