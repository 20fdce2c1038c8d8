use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Id, Tag};

/// 文章状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Published,
    Draft,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Published => "published",
            PostStatus::Draft => "draft",
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(PostStatus::Published),
            "draft" => Ok(PostStatus::Draft),
            other => Err(format!("unknown post status `{other}`")),
        }
    }
}

/// 文章
///
/// `tags` 随快照一起写入缓存；`view_count` 为最近一次同步到数据库的浏览量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub cover: String,
    pub status: PostStatus,
    pub pinned: bool,
    pub view_count: u64,
    pub user_id: Id,
    pub category_id: Id,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 新建文章输入，作者ID由调用方根据已认证身份填写
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub cover: String,
    pub status: PostStatus,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub user_id: Id,
    pub category_id: Id,
}

/// 文章部分更新，`None` 表示保持不变
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub cover: Option<String>,
    pub status: Option<PostStatus>,
    pub pinned: Option<bool>,
    pub category_id: Option<Id>,
}
