use serde::Deserialize;

use crate::models::{Conditions, Id, NewPost, PostStatus, Scalar, UpdatePost};
use crate::routes::PageQuery;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(flatten)]
    pub post: NewPost,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// `tags` 缺省表示不修改标签，给出空数组表示清空
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(flatten)]
    pub changes: UpdatePost,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// 文章列表过滤条件
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub user_id: Option<Id>,
    pub category_id: Option<Id>,
    pub tag_id: Option<Id>,
    pub status: Option<PostStatus>,
    pub pinned: Option<bool>,
}

impl PostListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }

    pub fn conditions(&self) -> Conditions {
        let mut conditions = Conditions::new();
        if let Some(id) = self.user_id {
            conditions.insert("user_id".into(), Scalar::from(id));
        }
        if let Some(id) = self.category_id {
            conditions.insert("category_id".into(), Scalar::from(id));
        }
        if let Some(id) = self.tag_id {
            conditions.insert("tag_id".into(), Scalar::from(id));
        }
        if let Some(status) = self.status {
            conditions.insert("status".into(), Scalar::from(status.as_str()));
        }
        if let Some(pinned) = self.pinned {
            conditions.insert("pinned".into(), Scalar::from(pinned));
        }
        conditions
    }
}
